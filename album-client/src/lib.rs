//! # album-client
//!
//! Client side of photo-album: a persistent stale-while-revalidate cache, the
//! HTTP API binding, and the orchestrator that pages through the catalog and
//! feeds an incremental renderer.
//!
//! Nothing here is global. The composition root builds a [`CacheManager`],
//! a [`PhotoApi`], a [`Renderer`] and a [`Notifier`] and hands them to
//! [`Gallery`].

pub mod api;
pub mod cache;
pub mod clock;
pub mod error;
pub mod gallery;
pub mod notify;
pub mod render;
pub mod storage;
pub mod viewport;

pub use api::{HttpPhotoApi, PhotoApi};
pub use cache::{CacheEntry, CacheHit, CacheManager, CacheOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ClientError, ClientResult, StorageError};
pub use gallery::{
    page_key, CacheStatus, ClientPaginationState, DataSource, FetchMode, Gallery, GalleryOptions,
    LoadOutcome, PaginationStatus, Phase, RevalidateOutcome, ALL_PHOTOS_KEY,
};
pub use notify::{Notifier, Toast, ToastLevel, ToastLog, TracingNotifier};
pub use render::{GridRenderer, ImageState, LoadingIndicator, PhotoCard, Renderer, TextRenderer};
pub use storage::{CacheStorage, FileStorage, MemoryStorage};
pub use viewport::{ImmediateObserver, ProximityObserver, Viewport, ViewportObserver};
