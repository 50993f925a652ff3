//! Shared types used across all pipeline stages.
//!
//! These types are serialized to JSON between stages (fetch → prepare → generate)
//! and must be identical across all three modules.

use crate::config::SiteConfig;
use serde::{Deserialize, Serialize};

/// Upper bound on assets returned by a single media index query.
pub const MAX_RESULTS: u32 = 400;

/// One asset as returned by the media index query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Hierarchical path on the media service, e.g. `12/villains-joker/img1`.
    pub public_id: String,
    /// File extension the service delivers by default (`jpg`, `png`, ...).
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// Stage 1 output: the raw index of a media folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    pub folder: String,
    pub assets: Vec<AssetDescriptor>,
}

/// A single gallery entry.
///
/// Immutable once built. `id` is assigned by position in the query result,
/// so it is only stable for one build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: u32,
    pub public_id: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Inline low-resolution preview (`data:image/jpeg;base64,...`).
    #[serde(
        rename = "blurDataUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub blur_data_url: Option<String>,
}

/// Stage 2 output: everything the page needs, computed once per build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryData {
    /// Categories in order of first appearance, no duplicates.
    pub categories: Vec<String>,
    pub images: Vec<PhotoRecord>,
    pub config: SiteConfig,
}
