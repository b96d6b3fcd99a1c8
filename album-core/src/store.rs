//! Read-only photo catalog.
//!
//! The store is loaded once at startup and never mutated afterwards. Its
//! ordering is the order of the source document and defines the canonical
//! pagination order.

use album_types::{Photo, PhotoId};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Catalog shipped with the crate, used when no other source is configured.
const BUILTIN_CATALOG: &str = include_str!("../assets/photos.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Photo id must be a positive integer (entry {index})")]
    ZeroId { index: usize },

    #[error("Duplicate photo id: {0}")]
    DuplicateId(PhotoId),
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    photos: Vec<Photo>,
    index: HashMap<PhotoId, usize>,
}

impl PhotoStore {
    /// Build a store from an ordered list of records.
    pub fn new(photos: Vec<Photo>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(photos.len());
        for (pos, photo) in photos.iter().enumerate() {
            if photo.id.as_u64() == 0 {
                return Err(CatalogError::ZeroId { index: pos });
            }
            if index.insert(photo.id, pos).is_some() {
                return Err(CatalogError::DuplicateId(photo.id));
            }
        }

        Ok(Self { photos, index })
    }

    /// Parse a JSON array of `{id, url}` records. Extra fields are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let photos: Vec<Photo> = serde_json::from_str(json)?;
        Self::new(photos)
    }

    /// Load a catalog from a JSON file on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// The bundled 18-photo catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn list(&self) -> &[Photo] {
        &self.photos
    }

    pub fn get(&self, id: PhotoId) -> Option<&Photo> {
        self.index.get(&id).map(|&pos| &self.photos[pos])
    }

    pub fn exists(&self, id: PhotoId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}
