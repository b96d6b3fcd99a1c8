//! # album-core
//!
//! Core library for the photo-album server.
//!
//! This crate owns the read-only photo catalog, the pagination engine and the
//! validation rules applied to untrusted request input.

pub mod config;
pub mod pagination;
pub mod store;
pub mod validation;

pub use config::{Config, ConfigError, RuntimeMode};
pub use pagination::{normalize, normalize_query, paginate, RawParam, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
pub use store::{CatalogError, PhotoStore};
pub use validation::{parse_photo_id, sanitize_input, PhotoIdError};
