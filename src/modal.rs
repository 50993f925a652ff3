//! Detail view state and the navigable-location contract.
//!
//! Which photo is open is part of the address, never hidden page state:
//!
//! | Location | Meaning |
//! |---|---|
//! | `/` | grid only |
//! | `/?photoId=3` | grid with photo 3 open in the overlay |
//! | `/p/3/` | shareable deep link to photo 3 |
//!
//! The grid links point at the query form; the page script rewrites the
//! address to the deep-link form without a reload, and `p/<id>/index.html`
//! exists on disk so a pasted deep link works without any script at all.
//! A location whose id is missing, malformed or out of range simply means
//! "no photo open".

use crate::types::PhotoRecord;

/// Address of the grid with no photo open.
pub const BASE_ROUTE: &str = "/";
/// Query parameter carrying the open photo id.
pub const PHOTO_QUERY_PARAM: &str = "photoId";
/// Path prefix of deep links.
pub const DEEP_LINK_PREFIX: &str = "/p/";

/// Grid link target for a photo (query form).
pub fn photo_href(id: u32) -> String {
    format!("{BASE_ROUTE}?{PHOTO_QUERY_PARAM}={id}")
}

/// Shareable deep link for a photo (path form).
pub fn photo_deep_link(id: u32) -> String {
    format!("{DEEP_LINK_PREFIX}{id}/")
}

/// Parse a photo id made only of ASCII digits. Signs, whitespace and
/// values past `u32::MAX` are rejected.
pub fn parse_photo_id(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// The open photo, as encoded in the address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationState {
    photo_id: Option<u32>,
}

impl NavigationState {
    /// Grid only.
    pub fn closed() -> Self {
        Self { photo_id: None }
    }

    pub fn photo(id: u32) -> Self {
        Self { photo_id: Some(id) }
    }

    /// Parse a location. `query` may include the leading `?`.
    ///
    /// The query form wins when both are present. Values are not
    /// percent-decoded: every link the generator writes is plain digits, so
    /// an encoded id like `%35` reads as "no photo" here, where the browser
    /// would decode it first.
    pub fn from_location(path: &str, query: &str) -> Self {
        let from_query = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == PHOTO_QUERY_PARAM)
            .and_then(|(_, value)| parse_photo_id(value));
        if from_query.is_some() {
            return Self {
                photo_id: from_query,
            };
        }

        let from_path = path
            .strip_prefix(DEEP_LINK_PREFIX)
            .and_then(|rest| rest.split('/').next())
            .and_then(parse_photo_id);
        Self {
            photo_id: from_path,
        }
    }

    pub fn photo_id(&self) -> Option<u32> {
        self.photo_id
    }

    pub fn is_open(&self) -> bool {
        self.photo_id.is_some()
    }

    /// Canonical address for this state (deep-link form when open).
    pub fn to_location(&self) -> String {
        match self.photo_id {
            Some(id) => photo_deep_link(id),
            None => BASE_ROUTE.to_string(),
        }
    }
}

/// The single-photo viewer over the full, unfiltered photo sequence.
#[derive(Debug, Clone, Copy)]
pub struct DetailModal<'a> {
    images: &'a [PhotoRecord],
    index: usize,
}

impl<'a> DetailModal<'a> {
    /// Open on the photo named by `navigation`; `None` if nothing valid is named.
    pub fn open(images: &'a [PhotoRecord], navigation: NavigationState) -> Option<Self> {
        let id = navigation.photo_id()?;
        let index = images.iter().position(|img| img.id == id)?;
        Some(Self { images, index })
    }

    pub fn current(&self) -> &'a PhotoRecord {
        &self.images[self.index]
    }

    /// 1-based position, for "3 / 40" style counters.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    pub fn previous(&self) -> Option<&'a PhotoRecord> {
        self.index.checked_sub(1).map(|i| &self.images[i])
    }

    pub fn next(&self) -> Option<&'a PhotoRecord> {
        self.images.get(self.index + 1)
    }

    /// Location after stepping forward; `None` at the last photo.
    pub fn navigate_next(&self) -> Option<NavigationState> {
        self.next().map(|img| NavigationState::photo(img.id))
    }

    /// Location after stepping back; `None` at the first photo.
    pub fn navigate_previous(&self) -> Option<NavigationState> {
        self.previous().map(|img| NavigationState::photo(img.id))
    }

    /// Dismiss the viewer, handing back the id that was on screen.
    pub fn close(self) -> u32 {
        self.current().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::records;

    #[test]
    fn hrefs() {
        assert_eq!(photo_href(3), "/?photoId=3");
        assert_eq!(photo_deep_link(3), "/p/3/");
    }

    #[test]
    fn parse_query_form() {
        let nav = NavigationState::from_location("/", "?photoId=12");
        assert_eq!(nav.photo_id(), Some(12));
        let nav = NavigationState::from_location("/", "utm=x&photoId=4");
        assert_eq!(nav.photo_id(), Some(4));
    }

    #[test]
    fn parse_path_form() {
        for path in ["/p/7", "/p/7/", "/p/7/index.html"] {
            assert_eq!(
                NavigationState::from_location(path, "").photo_id(),
                Some(7),
                "{path}"
            );
        }
    }

    #[test]
    fn query_wins_over_path() {
        let nav = NavigationState::from_location("/p/7/", "photoId=2");
        assert_eq!(nav.photo_id(), Some(2));
    }

    #[test]
    fn garbage_means_closed() {
        for (path, query) in [
            ("/", ""),
            ("/", "photoId="),
            ("/", "photoId=abc"),
            ("/", "photoId=-1"),
            ("/p/", ""),
            ("/p/x/", ""),
            ("/photos/3", ""),
        ] {
            assert!(
                !NavigationState::from_location(path, query).is_open(),
                "{path}?{query}"
            );
        }
    }

    #[test]
    fn ids_must_be_plain_digits() {
        for (path, query) in [
            ("/", "photoId=+5"),
            ("/", "photoId=%35"),
            ("/", "photoId= 5"),
            ("/p/+5/", ""),
            ("/", "photoId=4294967296"),
        ] {
            assert!(
                !NavigationState::from_location(path, query).is_open(),
                "{path}?{query}"
            );
        }
        assert_eq!(parse_photo_id("007"), Some(7));
        assert_eq!(parse_photo_id(""), None);
    }

    #[test]
    fn to_location_roundtrip() {
        let nav = NavigationState::photo(9);
        assert_eq!(nav.to_location(), "/p/9/");
        assert_eq!(NavigationState::from_location(&nav.to_location(), ""), nav);
        assert_eq!(NavigationState::closed().to_location(), "/");
    }

    #[test]
    fn open_on_valid_id() {
        let images = records(5);
        let modal = DetailModal::open(&images, NavigationState::photo(2)).unwrap();
        assert_eq!(modal.current().id, 2);
        assert_eq!(modal.position(), 3);
        assert_eq!(modal.total(), 5);
    }

    #[test]
    fn open_on_missing_or_unknown_id() {
        let images = records(5);
        assert!(DetailModal::open(&images, NavigationState::closed()).is_none());
        assert!(DetailModal::open(&images, NavigationState::photo(99)).is_none());
        assert!(DetailModal::open(&[], NavigationState::photo(0)).is_none());
    }

    #[test]
    fn traversal_stops_at_both_ends() {
        let images = records(3);
        let first = DetailModal::open(&images, NavigationState::photo(0)).unwrap();
        assert!(first.navigate_previous().is_none());
        assert_eq!(first.navigate_next(), Some(NavigationState::photo(1)));

        let last = DetailModal::open(&images, NavigationState::photo(2)).unwrap();
        assert!(last.navigate_next().is_none());
        assert_eq!(last.navigate_previous(), Some(NavigationState::photo(1)));
    }

    #[test]
    fn walk_forward_through_whole_sequence() {
        let images = records(4);
        let mut nav = NavigationState::photo(0);
        let mut seen = vec![];
        while let Some(modal) = DetailModal::open(&images, nav) {
            seen.push(modal.current().id);
            match modal.navigate_next() {
                Some(next) => nav = next,
                None => break,
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn close_returns_displayed_id() {
        let images = records(3);
        let modal = DetailModal::open(&images, NavigationState::photo(0)).unwrap();
        let nav = modal.navigate_next().unwrap();
        let modal = DetailModal::open(&images, nav).unwrap();
        assert_eq!(modal.close(), 1);
    }
}
