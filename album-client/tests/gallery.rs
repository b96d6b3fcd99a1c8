use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use album_client::{
    CacheManager, CacheOptions, ClientError, ClientResult, DataSource, FetchMode, Gallery,
    GalleryOptions, GridRenderer, ImmediateObserver, LoadOutcome, ManualClock, MemoryStorage,
    Phase, PhotoApi, Renderer, RevalidateOutcome, ToastLevel, ToastLog, Viewport,
};
use album_core::{paginate, PhotoStore};
use album_types::{ErrorKind, PaginatedPhotos, PaginationParams, Photo, PhotoId};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

const TTL: Duration = Duration::from_secs(60);
const LIMIT: u32 = 6;

/// In-process stand-in for the album server.
struct FakeApi {
    photos: Mutex<Vec<Photo>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    fn builtin() -> Arc<Self> {
        let store = PhotoStore::builtin().unwrap();
        Arc::new(Self {
            photos: Mutex::new(store.list().to_vec()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
        })
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_photos(&self, photos: Vec<Photo>) {
        *self.photos.lock() = photos;
    }

    /// Block the next request until the returned handle is notified.
    fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    async fn enter(&self) -> ClientResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Network {
                message: "connection refused".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PhotoApi for FakeApi {
    async fn fetch_all(&self) -> ClientResult<Vec<Photo>> {
        self.enter().await?;
        Ok(self.photos.lock().clone())
    }

    async fn fetch_page(&self, page: u32, limit: u32) -> ClientResult<PaginatedPhotos> {
        self.enter().await?;
        Ok(paginate(PaginationParams { page, limit }, &self.photos.lock()))
    }

    async fn fetch_photo(&self, id: PhotoId) -> ClientResult<Photo> {
        self.enter().await?;
        self.photos
            .lock()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ClientError::Api {
                kind: ErrorKind::NotFound,
                status: 404,
                message: "Photo not found".into(),
            })
    }
}

type TestGallery = Gallery<Arc<FakeApi>, GridRenderer<ImmediateObserver>, Arc<ToastLog>>;

struct Harness {
    api: Arc<FakeApi>,
    storage: Arc<MemoryStorage>,
    clock: Arc<ManualClock>,
    toasts: Arc<ToastLog>,
    mode: FetchMode,
    limit: u32,
    gallery: TestGallery,
}

impl Harness {
    fn new(mode: FetchMode) -> Self {
        let api = FakeApi::builtin();
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let toasts = Arc::new(ToastLog::new());
        let gallery = build(&api, &storage, &clock, &toasts, mode, LIMIT);
        Self {
            api,
            storage,
            clock,
            toasts,
            mode,
            limit: LIMIT,
            gallery,
        }
    }

    /// Simulate a page reload: fresh gallery and cache over the same storage.
    fn reload(&mut self) {
        self.gallery = build(
            &self.api,
            &self.storage,
            &self.clock,
            &self.toasts,
            self.mode,
            self.limit,
        );
    }

    /// Reload with a different page size over the same storage.
    fn reload_with_limit(&mut self, limit: u32) {
        self.limit = limit;
        self.reload();
    }

    fn card_ids(&self) -> Vec<u64> {
        self.gallery
            .with_renderer(|r| r.card_ids().iter().map(|id| id.as_u64()).collect())
    }
}

fn build(
    api: &Arc<FakeApi>,
    storage: &Arc<MemoryStorage>,
    clock: &Arc<ManualClock>,
    toasts: &Arc<ToastLog>,
    mode: FetchMode,
    limit: u32,
) -> TestGallery {
    let cache = CacheManager::new(
        storage.clone(),
        clock.clone(),
        CacheOptions {
            ttl: TTL,
            ..CacheOptions::default()
        },
    );
    Gallery::new(
        api.clone(),
        Arc::new(cache),
        GridRenderer::new(ImmediateObserver),
        toasts.clone(),
        GalleryOptions {
            limit,
            mode,
            ..GalleryOptions::default()
        },
    )
}

fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<u64> {
    range.collect()
}

#[tokio::test]
async fn initial_load_renders_first_page() {
    let h = Harness::new(FetchMode::Paginated);

    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::Network,
            added: 6
        }
    ));
    assert_eq!(h.card_ids(), ids(1..=6));
    assert_eq!(h.gallery.phase(), Phase::Ready);

    let status = h.gallery.status();
    assert_eq!(status.page, 2);
    assert_eq!(status.total, 18);
    assert_eq!(status.total_pages, 3);
    assert!(status.has_more);
    assert_eq!(status.loaded, 6);

    h.gallery.with_renderer(|r| {
        assert_eq!(r.counter(), Some("Showing 6 of 18 photos"));
        assert!(r.load_more_visible());
    });
    assert!(h.gallery.cache().get("photos_page_1_limit_6").is_some());
}

#[tokio::test]
async fn load_more_appends_until_exhausted() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    assert!(h.gallery.load_more().await.is_loaded());
    assert!(h.gallery.load_more().await.is_loaded());
    assert_eq!(h.card_ids(), ids(1..=18));
    assert_eq!(h.gallery.phase(), Phase::Exhausted);

    assert!(matches!(h.gallery.load_more().await, LoadOutcome::Skipped));
    assert_eq!(h.api.calls(), 3);

    h.gallery.with_renderer(|r| {
        assert_eq!(
            r.announcements(),
            &[
                "6 more photos loaded. 12 photos total.".to_string(),
                "6 more photos loaded. 18 photos total.".to_string(),
            ]
        );
        assert!(!r.load_more_visible());
    });
}

#[tokio::test]
async fn load_more_before_first_batch_is_skipped() {
    let h = Harness::new(FetchMode::Paginated);
    assert!(matches!(h.gallery.load_more().await, LoadOutcome::Skipped));
    assert_eq!(h.api.calls(), 0);
}

#[tokio::test]
async fn changing_page_size_does_not_reuse_cached_pages() {
    let mut h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;
    assert_eq!(h.card_ids(), ids(1..=6));

    h.reload_with_limit(12);
    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::Network,
            added: 12
        }
    ));
    while h.gallery.load_more().await.is_loaded() {}

    assert_eq!(h.card_ids(), ids(1..=18));
    let status = h.gallery.status();
    assert_eq!(status.total_pages, 2);
    assert_eq!(status.loaded, 18);
    assert_eq!(h.gallery.phase(), Phase::Exhausted);
    assert!(h.gallery.cache().get("photos_page_1_limit_6").is_some());
    assert!(h.gallery.cache().get("photos_page_1_limit_12").is_some());
}

#[tokio::test]
async fn fresh_cached_page_skips_network() {
    let mut h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    h.reload();
    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::Cache,
            ..
        }
    ));
    assert_eq!(h.api.calls(), 1);
    assert_eq!(h.card_ids(), ids(1..=6));
}

#[tokio::test]
async fn stale_cached_page_is_refetched() {
    let mut h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    h.clock.advance(TTL + Duration::from_secs(1));
    h.reload();
    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::Network,
            ..
        }
    ));
    assert_eq!(h.api.calls(), 2);
}

#[tokio::test]
async fn initial_failure_falls_back_to_stale_cache() {
    let mut h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    h.clock.advance(TTL + Duration::from_secs(1));
    h.api.fail(true);
    h.reload();

    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::StaleCache,
            ..
        }
    ));
    assert_eq!(h.card_ids(), ids(1..=6));
    assert_eq!(h.gallery.phase(), Phase::Ready);

    let toasts = h.toasts.take();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Warning);
    assert_eq!(
        toasts[0].message,
        "Showing cached photos. Network error occurred."
    );
}

#[tokio::test]
async fn initial_failure_without_cache_shows_error_state() {
    let h = Harness::new(FetchMode::Paginated);
    h.api.fail(true);

    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Failed(ClientError::Network { .. })
    ));
    assert_eq!(h.gallery.phase(), Phase::Failed);
    h.gallery.with_renderer(|r| {
        assert_eq!(
            r.error(),
            Some("Failed to load photos. Please try again later.")
        );
        assert_eq!(r.rendered_count(), 0);
    });
    assert!(h.toasts.snapshot().is_empty());
}

#[tokio::test]
async fn expired_cache_is_not_a_fallback() {
    let mut h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    h.clock.advance(TTL * 2 + Duration::from_secs(1));
    h.api.fail(true);
    h.reload();

    assert!(matches!(
        h.gallery.fetch_initial().await,
        LoadOutcome::Failed(_)
    ));
    assert_eq!(h.gallery.phase(), Phase::Failed);
}

#[tokio::test]
async fn load_more_failure_keeps_data_and_allows_retry() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    h.api.fail(true);
    assert!(matches!(h.gallery.load_more().await, LoadOutcome::Failed(_)));
    assert_eq!(h.gallery.phase(), Phase::Ready);
    assert!(h.gallery.status().has_more);
    assert_eq!(h.card_ids(), ids(1..=6));

    let toasts = h.toasts.take();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Error);
    assert_eq!(toasts[0].message, "Failed to load more photos.");

    h.api.fail(false);
    assert!(matches!(
        h.gallery.load_more().await,
        LoadOutcome::Loaded { added: 6, .. }
    ));
    assert_eq!(h.card_ids(), ids(1..=12));
    assert_eq!(h.gallery.status().page, 3);
}

#[tokio::test]
async fn overlapping_pages_are_deduplicated() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    // A photo inserted at the front shifts page 2 back by one.
    let mut photos = vec![Photo::new(100, "/images/new.png")];
    photos.extend(PhotoStore::builtin().unwrap().list().iter().cloned());
    h.api.set_photos(photos);

    assert!(matches!(
        h.gallery.load_more().await,
        LoadOutcome::Loaded { added: 5, .. }
    ));
    assert_eq!(h.card_ids(), ids(1..=11));
    assert_eq!(h.gallery.state().all_photos.len(), 11);
    h.gallery.with_renderer(|r| {
        assert_eq!(
            r.announcements().last().map(String::as_str),
            Some("5 more photos loaded. 11 photos total.")
        );
    });
}

#[tokio::test]
async fn concurrent_load_more_is_guarded() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    let gate = h.api.hold_next();
    let (first, second) = tokio::join!(h.gallery.load_more(), async {
        tokio::task::yield_now().await;
        let outcome = h.gallery.load_more().await;
        gate.notify_one();
        outcome
    });

    assert!(first.is_loaded());
    assert!(matches!(second, LoadOutcome::Skipped));
    assert_eq!(h.card_ids(), ids(1..=12));
    assert_eq!(h.api.calls(), 2);
}

#[tokio::test]
async fn superseded_initial_response_is_discarded() {
    let h = Harness::new(FetchMode::Paginated);

    let gate = h.api.hold_next();
    let (first, second) = tokio::join!(h.gallery.fetch_initial(), async {
        tokio::task::yield_now().await;
        let outcome = h.gallery.fetch_initial().await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(first, LoadOutcome::Superseded));
    assert!(second.is_loaded());
    assert_eq!(h.card_ids(), ids(1..=6));
    assert_eq!(h.gallery.status().page, 2);
}

#[tokio::test]
async fn reset_discards_in_flight_load_more() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    let gate = h.api.hold_next();
    let (more, reset) = tokio::join!(h.gallery.load_more(), async {
        tokio::task::yield_now().await;
        let outcome = h.gallery.fetch_initial().await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(more, LoadOutcome::Superseded));
    assert!(matches!(
        reset,
        LoadOutcome::Loaded {
            source: DataSource::Cache,
            ..
        }
    ));
    assert_eq!(h.card_ids(), ids(1..=6));
    assert_eq!(h.gallery.status().loaded, 6);
    assert!(h.gallery.with_renderer(|r| r.announcements().is_empty()));
}

#[tokio::test]
async fn scrolling_near_the_end_loads_next_page() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;

    assert!(matches!(
        h.gallery.on_scroll(Viewport::new(0, 1)).await,
        LoadOutcome::Skipped
    ));
    assert!(h.gallery.on_scroll(Viewport::new(0, 2)).await.is_loaded());
    assert_eq!(h.card_ids(), ids(1..=12));
}

#[tokio::test]
async fn all_mode_loads_flat_catalog() {
    let h = Harness::new(FetchMode::All);

    assert!(matches!(
        h.gallery.fetch_initial().await,
        LoadOutcome::Loaded {
            source: DataSource::Network,
            added: 18
        }
    ));
    assert_eq!(h.gallery.phase(), Phase::Exhausted);
    assert!(matches!(h.gallery.load_more().await, LoadOutcome::Skipped));
    h.gallery.with_renderer(|r| {
        assert_eq!(r.counter(), Some("Showing 18 of 18 photos"));
        assert!(!r.load_more_visible());
    });

    let cache = h.gallery.cache_status();
    assert!(cache.has_cached_data);
    assert!(!cache.is_stale);
    assert_eq!(cache.cache_size, 1);
}

#[tokio::test]
async fn all_mode_serves_stale_cache_then_revalidates() {
    let mut h = Harness::new(FetchMode::All);
    h.gallery.fetch_initial().await;

    let mut photos = PhotoStore::builtin().unwrap().list().to_vec();
    photos.push(Photo::new(19, "/images/new.png"));
    h.api.set_photos(photos);
    h.clock.advance(TTL + Duration::from_secs(1));
    h.reload();

    let outcome = h.gallery.fetch_initial().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::StaleCache,
            added: 18
        }
    ));
    assert!(outcome.is_stale());
    assert_eq!(h.card_ids(), ids(1..=18));
    assert!(h.gallery.cache_status().is_stale);
    assert!(h.toasts.snapshot().is_empty());

    assert!(matches!(
        h.gallery.revalidate().await,
        RevalidateOutcome::Updated
    ));
    assert_eq!(h.card_ids(), ids(1..=19));
    assert!(!h.gallery.cache_status().is_stale);

    let toasts = h.toasts.take();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Success);
    assert_eq!(toasts[0].message, "Photos updated!");
}

#[tokio::test]
async fn unchanged_revalidation_only_refreshes_timestamp() {
    let h = Harness::new(FetchMode::All);
    h.gallery.fetch_initial().await;

    h.clock.advance(TTL + Duration::from_secs(1));
    assert!(h.gallery.cache_status().is_stale);

    assert!(matches!(
        h.gallery.on_visible().await,
        Some(RevalidateOutcome::Unchanged)
    ));
    assert!(!h.gallery.cache_status().is_stale);
    assert!(h.toasts.snapshot().is_empty());
}

#[tokio::test]
async fn visible_with_fresh_cache_does_nothing() {
    let h = Harness::new(FetchMode::All);
    h.gallery.fetch_initial().await;

    assert!(h.gallery.on_visible().await.is_none());
    assert_eq!(h.api.calls(), 1);
}

#[tokio::test]
async fn failed_revalidation_leaves_view_alone() {
    let h = Harness::new(FetchMode::All);
    h.gallery.fetch_initial().await;

    h.clock.advance(TTL + Duration::from_secs(1));
    h.api.fail(true);
    assert!(matches!(
        h.gallery.on_visible().await,
        Some(RevalidateOutcome::Failed(_))
    ));
    assert_eq!(h.card_ids(), ids(1..=18));
    assert!(h.toasts.snapshot().is_empty());
}

#[tokio::test]
async fn connectivity_changes_are_announced() {
    let h = Harness::new(FetchMode::All);

    h.gallery.on_offline();
    assert!(h.gallery.on_online().await.is_none());

    let toasts = h.toasts.take();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].level, ToastLevel::Warning);
    assert_eq!(toasts[0].message, "You are offline. Showing cached content.");
    assert_eq!(toasts[1].level, ToastLevel::Success);
    assert_eq!(toasts[1].message, "You are back online!");
}

#[tokio::test]
async fn clearing_the_cache_forces_a_refetch() {
    let h = Harness::new(FetchMode::Paginated);
    h.gallery.fetch_initial().await;
    h.gallery.load_more().await;

    let outcome = h.gallery.clear_cache_and_reload().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Loaded {
            source: DataSource::Network,
            ..
        }
    ));
    assert_eq!(h.api.calls(), 3);
    assert_eq!(h.card_ids(), ids(1..=6));
    assert_eq!(h.gallery.cache().len(), 1);
    assert_eq!(h.toasts.messages(), vec!["Cache cleared!".to_string()]);
    h.gallery.with_renderer(|r| {
        assert!(r.announcements().is_empty());
        assert_eq!(r.counter(), Some("Showing 6 of 18 photos"));
    });
}

#[tokio::test]
async fn single_photo_lookup() {
    let h = Harness::new(FetchMode::Paginated);
    let photo = h.gallery.photo(PhotoId(2)).await.unwrap();
    assert_eq!(photo.url, "/images/fist.png");

    let err = h.gallery.photo(PhotoId(999)).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}
