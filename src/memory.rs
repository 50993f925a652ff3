//! Last-viewed-photo memory.
//!
//! When the detail view closes, the id of the photo it showed is remembered
//! so the grid can scroll back to it. In the browser this lives in
//! `sessionStorage` under [`LAST_VIEWED_KEY`]: it survives client-side
//! navigation and deep-link round trips but not a new browsing session.
//!
//! The view layer only sees [`LastViewedStore`]. [`SessionMemory`] adapts any
//! string key-value storage to it with the same encoding the page script
//! uses (decimal id, removed when cleared). [`MapStorage`] is the in-process
//! storage used at build time and in tests.

use crate::modal::parse_photo_id;
use std::cell::RefCell;
use std::collections::HashMap;

/// Storage key shared with the page script.
pub const LAST_VIEWED_KEY: &str = "cloud-gal:last-viewed-photo";

/// Remembered id of the most recently closed photo. Last write wins.
pub trait LastViewedStore {
    fn get(&self) -> Option<u32>;
    fn set(&self, id: Option<u32>);
}

impl<T: LastViewedStore + ?Sized> LastViewedStore for &T {
    fn get(&self) -> Option<u32> {
        (**self).get()
    }

    fn set(&self, id: Option<u32>) {
        (**self).set(id)
    }
}

/// String key-value storage with `sessionStorage` semantics.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// In-process storage. Single-threaded, like the page it stands in for.
#[derive(Debug, Default)]
pub struct MapStorage {
    items: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MapStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// [`LastViewedStore`] over a [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct SessionMemory<S> {
    storage: S,
}

impl<S: KeyValueStore> SessionMemory<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Memory backed by an in-process map.
pub type InMemoryStore = SessionMemory<MapStorage>;

impl<S: KeyValueStore> LastViewedStore for SessionMemory<S> {
    // Anything that isn't a non-negative integer reads as "nothing remembered".
    fn get(&self) -> Option<u32> {
        self.storage
            .get_item(LAST_VIEWED_KEY)
            .and_then(|raw| parse_photo_id(raw.trim()))
    }

    fn set(&self, id: Option<u32>) {
        match id {
            Some(id) => self.storage.set_item(LAST_VIEWED_KEY, &id.to_string()),
            None => self.storage.remove_item(LAST_VIEWED_KEY),
        }
    }
}
