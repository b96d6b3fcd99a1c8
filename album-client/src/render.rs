//! Incremental photo grid rendering.
//!
//! [`GridRenderer`] keeps an in-memory model of the grid (cards, empty state,
//! error banner, announcements, counter) and is what the gallery tests drive.
//! [`TextRenderer`] paints the same events as lines of text.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use album_types::{Photo, PhotoId};
use tracing::warn;

use crate::viewport::{Viewport, ViewportObserver};

pub const EMPTY_MESSAGE: &str = "No photos available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingIndicator {
    #[default]
    Hidden,
    /// Full-page spinner for the first batch
    Initial,
    /// Inline "Loading more photos..." row
    More,
}

pub trait Renderer: Send {
    /// Replace whatever is shown with `photos`.
    fn render_initial(&mut self, photos: &[Photo]);

    /// Paint cards for ids not already shown. Returns how many were added.
    fn append_batch(&mut self, photos: &[Photo]) -> usize;

    fn set_loading(&mut self, indicator: LoadingIndicator);

    fn show_error(&mut self, message: &str);

    /// Update the counter and the load-more affordance.
    fn show_progress(&mut self, loaded: usize, total: usize, has_more: bool);

    /// Report a scroll position; returns how many deferred images started
    /// loading.
    fn on_viewport(&mut self, _viewport: Viewport) -> usize {
        0
    }

    fn rendered_count(&self) -> usize;
}

fn announcement(added: usize, total: usize) -> String {
    format!("{added} more photos loaded. {total} photos total.")
}

fn counter(loaded: usize, total: usize) -> String {
    format!("Showing {loaded} of {total} photos")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// Placeholder shown; waiting for the viewport
    Deferred,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCard {
    pub id: PhotoId,
    pub src: String,
    pub alt: String,
    pub image: ImageState,
}

impl PhotoCard {
    fn new(photo: &Photo, image: ImageState) -> Self {
        Self {
            id: photo.id,
            src: photo.url.clone(),
            alt: format!("Photo {}", photo.id),
            image,
        }
    }
}

/// Grid model with deferred image loading.
#[derive(Debug)]
pub struct GridRenderer<O> {
    observer: O,
    cards: Vec<PhotoCard>,
    shown: HashSet<PhotoId>,
    empty_message: Option<String>,
    error: Option<String>,
    loading: LoadingIndicator,
    announcements: Vec<String>,
    counter: Option<String>,
    load_more_visible: bool,
}

impl<O: ViewportObserver> GridRenderer<O> {
    pub fn new(observer: O) -> Self {
        Self {
            observer,
            cards: Vec::new(),
            shown: HashSet::new(),
            empty_message: None,
            error: None,
            loading: LoadingIndicator::Hidden,
            announcements: Vec::new(),
            counter: None,
            load_more_visible: false,
        }
    }

    fn push_card(&mut self, photo: &Photo) -> bool {
        if !self.shown.insert(photo.id) {
            return false;
        }
        let slot = self.cards.len();
        let image = if self.observer.register(photo.id, slot) {
            ImageState::Loaded
        } else {
            ImageState::Deferred
        };
        self.cards.push(PhotoCard::new(photo, image));
        true
    }

    pub fn cards(&self) -> &[PhotoCard] {
        &self.cards
    }

    pub fn card_ids(&self) -> Vec<PhotoId> {
        self.cards.iter().map(|c| c.id).collect()
    }

    pub fn empty_message(&self) -> Option<&str> {
        self.empty_message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> LoadingIndicator {
        self.loading
    }

    pub fn announcements(&self) -> &[String] {
        &self.announcements
    }

    pub fn counter(&self) -> Option<&str> {
        self.counter.as_deref()
    }

    pub fn load_more_visible(&self) -> bool {
        self.load_more_visible
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<O: ViewportObserver> Renderer for GridRenderer<O> {
    fn render_initial(&mut self, photos: &[Photo]) {
        self.observer.disconnect();
        self.cards.clear();
        self.shown.clear();
        self.error = None;
        self.announcements.clear();
        self.counter = None;
        self.load_more_visible = false;

        if photos.is_empty() {
            self.empty_message = Some(EMPTY_MESSAGE.to_string());
            return;
        }

        self.empty_message = None;
        for photo in photos {
            self.push_card(photo);
        }
    }

    fn append_batch(&mut self, photos: &[Photo]) -> usize {
        if photos.is_empty() {
            return 0;
        }

        let added = photos.iter().filter(|p| self.push_card(p)).count();
        if added > 0 {
            self.empty_message = None;
            self.announcements
                .push(announcement(added, self.cards.len()));
        }
        added
    }

    fn set_loading(&mut self, indicator: LoadingIndicator) {
        self.loading = indicator;
        if indicator != LoadingIndicator::Hidden {
            self.error = None;
        }
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn show_progress(&mut self, loaded: usize, total: usize, has_more: bool) {
        self.counter = Some(counter(loaded, total));
        self.load_more_visible = has_more;
    }

    fn on_viewport(&mut self, viewport: Viewport) -> usize {
        let due = self.observer.poll(viewport);
        let mut loaded = 0;
        for card in self.cards.iter_mut() {
            if card.image == ImageState::Deferred && due.contains(&card.id) {
                card.image = ImageState::Loaded;
                loaded += 1;
            }
        }
        loaded
    }

    fn rendered_count(&self) -> usize {
        self.cards.len()
    }
}

/// Writes grid events as text, one line each.
pub struct TextRenderer<W> {
    out: W,
    shown: HashSet<PhotoId>,
    loading: LoadingIndicator,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: HashSet::new(),
            loading: LoadingIndicator::Hidden,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{args}") {
            warn!(%err, "failed to write to terminal");
        }
    }

    fn card(&mut self, photo: &Photo) -> bool {
        if !self.shown.insert(photo.id) {
            return false;
        }
        let slot = self.shown.len();
        self.line(format_args!(
            "{slot:>4}. Photo {:<4} {}",
            photo.id.as_u64(),
            photo.url
        ));
        true
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render_initial(&mut self, photos: &[Photo]) {
        self.shown.clear();
        if photos.is_empty() {
            self.line(format_args!("{EMPTY_MESSAGE}"));
            return;
        }
        for photo in photos {
            self.card(photo);
        }
    }

    fn append_batch(&mut self, photos: &[Photo]) -> usize {
        let added = photos.iter().filter(|p| self.card(p)).count();
        if added > 0 {
            let total = self.shown.len();
            self.line(format_args!("{}", announcement(added, total)));
        }
        added
    }

    fn set_loading(&mut self, indicator: LoadingIndicator) {
        if indicator == self.loading {
            return;
        }
        self.loading = indicator;
        match indicator {
            LoadingIndicator::Hidden => {}
            LoadingIndicator::Initial => self.line(format_args!("Loading photos...")),
            LoadingIndicator::More => self.line(format_args!("Loading more photos...")),
        }
    }

    fn show_error(&mut self, message: &str) {
        self.line(format_args!("error: {message}"));
    }

    fn show_progress(&mut self, loaded: usize, total: usize, has_more: bool) {
        let more = if has_more { " (more available)" } else { "" };
        self.line(format_args!("{}{more}", counter(loaded, total)));
    }

    fn rendered_count(&self) -> usize {
        self.shown.len()
    }
}
