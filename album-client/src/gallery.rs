//! Fetch orchestration: pages through the catalog, consults the cache, and
//! drives the renderer.
//!
//! State lives behind short `parking_lot` critical sections that are never
//! held across an `.await`. When both are needed the state lock is taken
//! before the renderer lock. Toasts are sent after both are released.
//!
//! Every initial fetch starts a new session by bumping a generation counter.
//! A response that comes back for an older generation is dropped without
//! touching state, cache or view.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use album_types::{PaginatedPhotos, PaginationMeta, Photo, PhotoId};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::PhotoApi;
use crate::cache::CacheManager;
use crate::error::{ClientError, ClientResult};
use crate::notify::{Notifier, Toast};
use crate::render::{LoadingIndicator, Renderer};
use crate::viewport::Viewport;

/// Cache key of the flat catalog.
pub const ALL_PHOTOS_KEY: &str = "photos_all";

pub const DEFAULT_PAGE_SIZE: u32 = 12;

const MSG_STALE_FALLBACK: &str = "Showing cached photos. Network error occurred.";
const MSG_INITIAL_FAILED: &str = "Failed to load photos. Please try again later.";
const MSG_MORE_FAILED: &str = "Failed to load more photos.";
const MSG_UPDATED: &str = "Photos updated!";
const MSG_CACHE_CLEARED: &str = "Cache cleared!";
const MSG_ONLINE: &str = "You are back online!";
const MSG_OFFLINE: &str = "You are offline. Showing cached content.";

/// Cache key of one page. Pages of different sizes never share an entry.
pub fn page_key(page: u32, limit: u32) -> String {
    format!("photos_page_{page}_limit_{limit}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Page by page, appending as the reader scrolls
    #[default]
    Paginated,
    /// The whole catalog in one request, stale-while-revalidate
    All,
}

#[derive(Debug, Clone)]
pub struct GalleryOptions {
    pub limit: u32,
    pub mode: FetchMode,
    /// How close (in cards) the viewport must get to the end before the next
    /// page is requested.
    pub scroll_margin: usize,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            mode: FetchMode::Paginated,
            scroll_margin: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    LoadingInitial,
    Ready,
    LoadingMore,
    /// Everything the server has is loaded
    Exhausted,
    /// Nothing could be shown
    Failed,
}

impl Phase {
    pub fn is_loading(self) -> bool {
        matches!(self, Phase::LoadingInitial | Phase::LoadingMore)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPaginationState {
    pub phase: Phase,
    /// Next page to request
    pub page: u32,
    pub limit: u32,
    /// Catalog size; zero until the first response
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub all_photos: Vec<Photo>,
    seen: HashSet<PhotoId>,
}

impl ClientPaginationState {
    fn new(limit: u32) -> Self {
        Self {
            phase: Phase::Idle,
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
            has_more: true,
            all_photos: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    fn update_from(&mut self, meta: &PaginationMeta) {
        self.page = meta.page;
        self.total = meta.total;
        self.total_pages = meta.total_pages;
        self.has_more = meta.has_more;
        if self.has_more {
            self.page = self.page.saturating_add(1);
        }
    }

    fn replace_photos(&mut self, photos: &[Photo]) -> usize {
        self.all_photos.clear();
        self.seen.clear();
        self.extend_unique(photos)
    }

    fn extend_unique(&mut self, photos: &[Photo]) -> usize {
        let before = self.all_photos.len();
        for photo in photos {
            if self.seen.insert(photo.id) {
                self.all_photos.push(photo.clone());
            }
        }
        self.all_photos.len() - before
    }

    fn settle(&mut self) {
        self.phase = if self.has_more {
            Phase::Ready
        } else {
            Phase::Exhausted
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationStatus {
    pub page: u32,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub loaded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub has_cached_data: bool,
    pub is_stale: bool,
    pub cache_size: usize,
}

/// Where a batch of photos came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Network,
    Cache,
    /// Stale entry shown because the network was unavailable or while a
    /// refresh is pending
    StaleCache,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { source: DataSource, added: usize },
    /// Nothing to do: already loading, exhausted, or no session yet
    Skipped,
    /// A newer session started while this request was in flight
    Superseded,
    Failed(ClientError),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }

    /// Painted from a stale cache entry; a [`Gallery::revalidate`] is due.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            LoadOutcome::Loaded {
                source: DataSource::StaleCache,
                ..
            }
        )
    }
}

#[derive(Debug)]
pub enum RevalidateOutcome {
    Updated,
    Unchanged,
    Superseded,
    Failed(ClientError),
}

pub struct Gallery<A, R, N> {
    api: A,
    cache: Arc<CacheManager>,
    renderer: Mutex<R>,
    notifier: N,
    options: GalleryOptions,
    state: Mutex<ClientPaginationState>,
    generation: AtomicU64,
}

impl<A, R, N> Gallery<A, R, N>
where
    A: PhotoApi,
    R: Renderer,
    N: Notifier,
{
    pub fn new(
        api: A,
        cache: Arc<CacheManager>,
        renderer: R,
        notifier: N,
        options: GalleryOptions,
    ) -> Self {
        let state = ClientPaginationState::new(options.limit);
        Self {
            api,
            cache,
            renderer: Mutex::new(renderer),
            notifier,
            options,
            state: Mutex::new(state),
            generation: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &GalleryOptions {
        &self.options
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn state(&self) -> ClientPaginationState {
        self.state.lock().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Run `f` against the renderer.
    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.renderer.lock())
    }

    pub fn status(&self) -> PaginationStatus {
        let state = self.state.lock();
        PaginationStatus {
            page: state.page,
            total: state.total,
            total_pages: state.total_pages,
            has_more: state.has_more,
            loaded: state.all_photos.len(),
        }
    }

    pub fn cache_status(&self) -> CacheStatus {
        let cached = self.cache.get(ALL_PHOTOS_KEY);
        CacheStatus {
            has_cached_data: cached.is_some(),
            is_stale: cached.map(|hit| hit.is_stale).unwrap_or(false),
            cache_size: self.cache.len(),
        }
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset everything and start a new session. Returns its generation.
    fn begin_session(&self) -> u64 {
        let mut state = self.state.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *state = ClientPaginationState::new(self.options.limit);
        state.phase = Phase::LoadingInitial;
        self.renderer.lock().set_loading(LoadingIndicator::Initial);
        debug!(generation, "started gallery session");
        generation
    }

    /// Load the first batch, replacing whatever was shown.
    ///
    /// Returns as soon as something is painted. A stale cache hit comes back
    /// as [`DataSource::StaleCache`] without touching the network; follow it
    /// with [`Gallery::revalidate`].
    pub async fn fetch_initial(&self) -> LoadOutcome {
        let generation = self.begin_session();
        match self.options.mode {
            FetchMode::Paginated => self.fetch_page(generation, 1, true).await,
            FetchMode::All => self.fetch_all(generation).await,
        }
    }

    /// Load the next page. No-op while loading, once exhausted, or before
    /// the first batch is shown.
    pub async fn load_more(&self) -> LoadOutcome {
        let (generation, page) = {
            let mut state = self.state.lock();
            if state.phase != Phase::Ready || !state.has_more {
                return LoadOutcome::Skipped;
            }
            state.phase = Phase::LoadingMore;
            self.renderer.lock().set_loading(LoadingIndicator::More);
            (self.current_generation(), state.page)
        };
        self.fetch_page(generation, page, false).await
    }

    async fn fetch_page(&self, generation: u64, page: u32, initial: bool) -> LoadOutcome {
        let key = page_key(page, self.options.limit);

        let fresh = self
            .cache
            .get_as::<PaginatedPhotos>(&key)
            .filter(|hit| !hit.is_stale);
        if let Some(hit) = fresh {
            debug!(page, "serving page from cache");
            return self.apply_page(generation, hit.data, initial, DataSource::Cache);
        }

        let result = self.api.fetch_page(page, self.options.limit).await;
        if self.current_generation() != generation {
            debug!(page, generation, "dropping response from superseded session");
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(batch) => {
                self.cache.set(&key, &batch);
                self.apply_page(generation, batch, initial, DataSource::Network)
            }
            Err(err) => self.page_failed(generation, page, initial, err),
        }
    }

    fn apply_page(
        &self,
        generation: u64,
        batch: PaginatedPhotos,
        initial: bool,
        source: DataSource,
    ) -> LoadOutcome {
        let mut state = self.state.lock();
        if self.current_generation() != generation {
            return LoadOutcome::Superseded;
        }

        state.update_from(&batch.pagination);
        let added = if initial {
            state.replace_photos(&batch.photos)
        } else {
            state.extend_unique(&batch.photos)
        };
        state.settle();

        let mut renderer = self.renderer.lock();
        renderer.set_loading(LoadingIndicator::Hidden);
        if initial {
            renderer.render_initial(&batch.photos);
        } else {
            renderer.append_batch(&batch.photos);
        }
        renderer.show_progress(state.all_photos.len(), state.total, state.has_more);

        debug!(
            page = batch.pagination.page,
            added,
            loaded = state.all_photos.len(),
            total = state.total,
            ?source,
            "applied page"
        );
        LoadOutcome::Loaded { source, added }
    }

    fn page_failed(
        &self,
        generation: u64,
        page: u32,
        initial: bool,
        err: ClientError,
    ) -> LoadOutcome {
        warn!(page, %err, "error fetching photos");

        if initial {
            let key = page_key(page, self.options.limit);
            if let Some(hit) = self.cache.get_as::<PaginatedPhotos>(&key) {
                let outcome = self.apply_page(generation, hit.data, true, DataSource::StaleCache);
                if outcome.is_loaded() {
                    self.notifier.notify(Toast::warning(MSG_STALE_FALLBACK));
                }
                return outcome;
            }
        }

        {
            let mut state = self.state.lock();
            if self.current_generation() != generation {
                return LoadOutcome::Superseded;
            }
            let mut renderer = self.renderer.lock();
            renderer.set_loading(LoadingIndicator::Hidden);
            if initial {
                state.phase = Phase::Failed;
                renderer.show_error(MSG_INITIAL_FAILED);
            } else {
                state.phase = Phase::Ready;
            }
        }

        if !initial {
            self.notifier.notify(Toast::error(MSG_MORE_FAILED));
        }
        LoadOutcome::Failed(err)
    }

    async fn fetch_all(&self, generation: u64) -> LoadOutcome {
        if let Some(hit) = self.cache.get_as::<Vec<Photo>>(ALL_PHOTOS_KEY) {
            let source = if hit.is_stale {
                DataSource::StaleCache
            } else {
                DataSource::Cache
            };
            if hit.is_stale {
                debug!("serving stale catalog, caller revalidates");
            }
            return self.apply_all(generation, &hit.data, source);
        }

        let result = self.api.fetch_all().await;
        if self.current_generation() != generation {
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(photos) => {
                self.cache.set(ALL_PHOTOS_KEY, &photos);
                self.apply_all(generation, &photos, DataSource::Network)
            }
            Err(err) => {
                warn!(%err, "error fetching photos");
                if let Some(hit) = self.cache.get_as::<Vec<Photo>>(ALL_PHOTOS_KEY) {
                    let outcome = self.apply_all(generation, &hit.data, DataSource::StaleCache);
                    if outcome.is_loaded() {
                        self.notifier.notify(Toast::warning(MSG_STALE_FALLBACK));
                    }
                    return outcome;
                }

                let mut state = self.state.lock();
                if self.current_generation() != generation {
                    return LoadOutcome::Superseded;
                }
                state.phase = Phase::Failed;
                let mut renderer = self.renderer.lock();
                renderer.set_loading(LoadingIndicator::Hidden);
                renderer.show_error(MSG_INITIAL_FAILED);
                LoadOutcome::Failed(err)
            }
        }
    }

    fn apply_all(&self, generation: u64, photos: &[Photo], source: DataSource) -> LoadOutcome {
        let mut state = self.state.lock();
        if self.current_generation() != generation {
            return LoadOutcome::Superseded;
        }

        let added = state.replace_photos(photos);
        state.page = 1;
        state.total = state.all_photos.len();
        state.total_pages = usize::from(state.total > 0);
        state.has_more = false;
        state.settle();

        let mut renderer = self.renderer.lock();
        renderer.set_loading(LoadingIndicator::Hidden);
        renderer.render_initial(photos);
        renderer.show_progress(state.all_photos.len(), state.total, false);

        LoadOutcome::Loaded { source, added }
    }

    /// Re-fetch the flat catalog and refresh the cache. In flat mode a
    /// changed catalog is re-rendered and announced.
    pub async fn revalidate(&self) -> RevalidateOutcome {
        let generation = self.current_generation();

        let photos = match self.api.fetch_all().await {
            Ok(photos) => photos,
            Err(err) => {
                warn!(%err, "background revalidation failed");
                return RevalidateOutcome::Failed(err);
            }
        };

        let changed = self
            .cache
            .get_as::<Vec<Photo>>(ALL_PHOTOS_KEY)
            .map(|hit| hit.data != photos)
            .unwrap_or(false);
        self.cache.set(ALL_PHOTOS_KEY, &photos);

        if !changed {
            return RevalidateOutcome::Unchanged;
        }
        if self.options.mode != FetchMode::All {
            debug!("catalog changed; paginated view left as is");
            return RevalidateOutcome::Updated;
        }

        info!(count = photos.len(), "new photos detected, updating view");
        match self.apply_all(generation, &photos, DataSource::Network) {
            LoadOutcome::Superseded => RevalidateOutcome::Superseded,
            _ => {
                self.notifier.notify(Toast::success(MSG_UPDATED));
                RevalidateOutcome::Updated
            }
        }
    }

    async fn revalidate_if_stale(&self) -> Option<RevalidateOutcome> {
        let stale = self
            .cache
            .get(ALL_PHOTOS_KEY)
            .map(|hit| hit.is_stale)
            .unwrap_or(false);
        if !stale {
            return None;
        }
        Some(self.revalidate().await)
    }

    /// The surface became visible again.
    pub async fn on_visible(&self) -> Option<RevalidateOutcome> {
        self.revalidate_if_stale().await
    }

    pub async fn on_online(&self) -> Option<RevalidateOutcome> {
        self.notifier.notify(Toast::success(MSG_ONLINE));
        self.revalidate_if_stale().await
    }

    pub fn on_offline(&self) {
        self.notifier.notify(Toast::warning(MSG_OFFLINE));
    }

    pub async fn clear_cache_and_reload(&self) -> LoadOutcome {
        self.cache.clear();
        self.notifier.notify(Toast::success(MSG_CACHE_CLEARED));
        self.fetch_initial().await
    }

    /// Report a scroll position. Loads deferred images and, when the
    /// viewport nears the last card, the next page.
    pub async fn on_scroll(&self, viewport: Viewport) -> LoadOutcome {
        let near_end = {
            let mut renderer = self.renderer.lock();
            renderer.on_viewport(viewport);
            viewport.near_end(renderer.rendered_count(), self.options.scroll_margin)
        };

        if self.options.mode == FetchMode::Paginated && near_end {
            self.load_more().await
        } else {
            LoadOutcome::Skipped
        }
    }

    /// Fetch a single photo by id. Not cached.
    pub async fn photo(&self, id: PhotoId) -> ClientResult<Photo> {
        self.api.fetch_photo(id).await
    }
}
