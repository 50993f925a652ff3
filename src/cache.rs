//! Placeholder cache for incremental builds.
//!
//! Every photo needs one round trip to the media service to produce its blur
//! placeholder. For a 400-photo gallery that is 400 requests per build, and
//! the answer never changes for a given asset. This module lets the prepare
//! stage skip the request when the same asset was already encoded with the
//! same placeholder parameters.
//!
//! # Design
//!
//! The cache is **content-addressed**: each entry is keyed by a SHA-256 of
//! the inputs that determine the placeholder (`public_id`, `format`, rendition
//! width, quality) and stores the finished `data:` URI. Photo ids are not
//! part of the key since they are reassigned on every build.
//!
//! ## Storage
//!
//! A JSON file at `<temp_dir>/.placeholder-cache.json`. A missing, corrupt or
//! version-mismatched file loads as an empty cache.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to the `build` or `prepare` command. This starts from an
//! empty cache, so every placeholder is fetched again and the file is
//! rewritten with fresh entries.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache file within the temp directory.
const CACHE_FILENAME: &str = ".placeholder-cache.json";

/// Bump to invalidate every existing cache when the key or payload changes.
const CACHE_VERSION: u32 = 1;

/// On-disk placeholder cache: content key → data URI.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlaceholderCache {
    pub version: u32,
    pub entries: HashMap<String, String>,
}

impl PlaceholderCache {
    /// Create an empty cache (used for `--no-cache` or first build).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the temp directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed.
    pub fn load(dir: &Path) -> Self {
        let content = match std::fs::read_to_string(cache_path(dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(%err, "ignoring unreadable placeholder cache");
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            return Self::empty();
        }
        cache
    }

    pub fn save(&self, dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(dir), json)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: String, data_url: String) {
        self.entries.insert(key, data_url);
    }

    /// Drop entries not in `live`, so removed photos don't accumulate.
    pub fn retain_keys(&mut self, live: &[String]) {
        self.entries.retain(|key, _| live.contains(key));
    }
}

/// SHA-256 of everything that determines a placeholder, as a hex string.
pub fn placeholder_key(public_id: &str, format: &str, width: u32, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"placeholder\0");
    hasher.update(public_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(format.as_bytes());
    hasher.update(b"\0");
    hasher.update(width.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Resolve the cache file path for a temp directory.
pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILENAME)
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} fetched ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} fetched", self.misses)
        }
    }
}
