//! Gallery view state.
//!
//! The page is a small state machine over three values:
//!
//! - the selected category (drives which photos are in the grid),
//! - the navigation photo id (read from the address; drives the detail view),
//! - the last-viewed photo (read from [`LastViewedStore`] on load; drives the
//!   scroll-back effect).
//!
//! The generator renders the initial state of this machine into HTML, and
//! `static/gallery.js` runs the same transitions in the browser.
//!
//! ## Scroll-back
//!
//! Closing the detail view remembers the photo that was showing. Once no
//! photo is open and a remembered id exists, [`GalleryView::run_effects`]
//! yields a single [`Effect::ScrollIntoView`] for it, then forgets it in both
//! the view and the store. An id that is not in the current grid produces no
//! effect but is still forgotten.

use crate::memory::LastViewedStore;
use crate::modal::{DetailModal, NavigationState};
use crate::types::PhotoRecord;

/// Outcome of [`GalleryView::select_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Changed,
    /// Already selected; nothing recomputed.
    Unchanged,
    /// Not one of the gallery's categories; state untouched.
    Unknown,
}

/// Side effect the page must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Scroll the grid item for `photo_id` to the vertical center.
    ScrollIntoView { photo_id: u32 },
}

/// Photos whose `public_id` contains `category`, in their original order.
pub fn category_images<'a>(images: &'a [PhotoRecord], category: &str) -> Vec<&'a PhotoRecord> {
    images
        .iter()
        .filter(|img| img.public_id.contains(category))
        .collect()
}

pub struct GalleryView<'a, M: LastViewedStore> {
    categories: &'a [String],
    images: &'a [PhotoRecord],
    memory: M,
    selected: Option<usize>,
    navigation: NavigationState,
    last_viewed: Option<u32>,
    grid: Vec<usize>,
    grid_revision: u32,
}

impl<'a, M: LastViewedStore> GalleryView<'a, M> {
    /// Initial state: first category selected, nothing open, last-viewed
    /// taken from `memory`.
    pub fn new(categories: &'a [String], images: &'a [PhotoRecord], memory: M) -> Self {
        let last_viewed = memory.get();
        let mut view = Self {
            categories,
            images,
            memory,
            selected: None,
            navigation: NavigationState::closed(),
            last_viewed,
            grid: Vec::new(),
            grid_revision: 0,
        };
        if !categories.is_empty() {
            view.selected = Some(0);
            view.recompute_grid();
        }
        view
    }

    fn recompute_grid(&mut self) {
        self.grid = match self.selected_category() {
            Some(category) => self
                .images
                .iter()
                .enumerate()
                .filter(|(_, img)| img.public_id.contains(category))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };
        self.grid_revision += 1;
    }

    pub fn selected_category(&self) -> Option<&'a str> {
        let categories = self.categories;
        self.selected.map(|i| categories[i].as_str())
    }

    pub fn select_category(&mut self, category: &str) -> Selection {
        let Some(index) = self.categories.iter().position(|c| c == category) else {
            return Selection::Unknown;
        };
        if self.selected == Some(index) {
            return Selection::Unchanged;
        }
        self.selected = Some(index);
        self.recompute_grid();
        Selection::Changed
    }

    /// Photos currently in the grid.
    pub fn grid(&self) -> Vec<&'a PhotoRecord> {
        let images = self.images;
        self.grid.iter().map(|&i| &images[i]).collect()
    }

    /// Bumped every time the grid is recomputed.
    pub fn grid_revision(&self) -> u32 {
        self.grid_revision
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation
    }

    pub fn last_viewed(&self) -> Option<u32> {
        self.last_viewed
    }

    /// Apply an address change. Ids that name no photo leave nothing open.
    pub fn navigate(&mut self, navigation: NavigationState) {
        self.navigation = match DetailModal::open(self.images, navigation) {
            Some(_) => navigation,
            None => NavigationState::closed(),
        };
    }

    /// Open the detail view on a photo. Returns whether it opened.
    pub fn open_detail(&mut self, id: u32) -> bool {
        self.navigate(NavigationState::photo(id));
        self.navigation.is_open()
    }

    pub fn modal(&self) -> Option<DetailModal<'a>> {
        DetailModal::open(self.images, self.navigation)
    }

    /// Close the detail view, remembering the photo it showed.
    pub fn close_detail(&mut self) -> Option<u32> {
        let id = self.modal()?.close();
        self.memory.set(Some(id));
        self.last_viewed = Some(id);
        self.navigation = NavigationState::closed();
        Some(id)
    }

    /// Effects due after the latest transition. At most one scroll per
    /// remembered id.
    pub fn run_effects(&mut self) -> Option<Effect> {
        if self.navigation.is_open() {
            return None;
        }
        let photo_id = self.last_viewed.take()?;
        self.memory.set(None);

        let in_grid = self.grid.iter().any(|&i| self.images[i].id == photo_id);
        if !in_grid {
            tracing::debug!(photo_id, "scroll target not in grid");
            return None;
        }
        Some(Effect::ScrollIntoView { photo_id })
    }
}
