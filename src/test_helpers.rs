//! Shared test utilities for the cloud-gal test suite.
//!
//! Builders for the data that flows between stages (`AssetDescriptor`,
//! `PhotoRecord`, `GalleryData`) and a tiny in-memory JPEG for anything that
//! needs real image bytes.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let gallery = sample_gallery();
//! assert_eq!(gallery.categories, vec!["joker", "batman", "guests"]);
//! let record = find_photo(&gallery, "3/villains-joker/c");
//! assert_eq!(record.id, 2);
//! ```

use crate::config::SiteConfig;
use crate::types::{AssetDescriptor, GalleryData, PhotoRecord};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

// =========================================================================
// Assets
// =========================================================================

/// An 800×600 JPEG asset.
pub fn asset(public_id: &str) -> AssetDescriptor {
    AssetDescriptor {
        public_id: public_id.to_string(),
        format: "jpg".to_string(),
        width: 800,
        height: 600,
    }
}

/// `n` well-formed assets sorted by `public_id` descending, like the index
/// query returns them. Zero-padded so no id is a substring of another.
pub fn numbered_assets(n: usize) -> Vec<AssetDescriptor> {
    (0..n)
        .map(|i| asset(&format!("{:03}/group-cat{}/photo{:03}", n - i, i % 5, i)))
        .collect()
}

/// A real JPEG of the given size, encoded in memory.
pub fn tiny_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 30) as u8, (y * 40) as u8, 128])
    });
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode_image(&img)
        .unwrap();
    out
}

// =========================================================================
// Photo records
// =========================================================================

/// A record with a fixed placeholder.
pub fn photo(id: u32, public_id: &str) -> PhotoRecord {
    PhotoRecord {
        id,
        public_id: public_id.to_string(),
        format: "jpg".to_string(),
        width: 800,
        height: 600,
        blur_data_url: Some("data:image/jpeg;base64,/9j/AA==".to_string()),
    }
}

/// `n` records with ids `0..n`, all in one category.
pub fn records(n: u32) -> Vec<PhotoRecord> {
    (0..n)
        .map(|i| photo(i, &format!("{}/villains-joker/img{i}", n - i)))
        .collect()
}

/// Five photos across three categories:
///
/// | id | public_id | category |
/// |---|---|---|
/// | 0 | `5/villains-joker/a` | joker |
/// | 1 | `4/heroes-batman/b` | batman |
/// | 2 | `3/villains-joker/c` | joker |
/// | 3 | `2/civilians-guests/d` | guests |
/// | 4 | `1/heroes-batman/e` | batman |
pub fn sample_gallery() -> GalleryData {
    let mut config = SiteConfig::default();
    config.media.cloud_name = "demo".to_string();
    config.media.folder = "party".to_string();

    GalleryData {
        categories: vec!["joker".into(), "batman".into(), "guests".into()],
        images: vec![
            photo(0, "5/villains-joker/a"),
            photo(1, "4/heroes-batman/b"),
            photo(2, "3/villains-joker/c"),
            photo(3, "2/civilians-guests/d"),
            photo(4, "1/heroes-batman/e"),
        ],
        config,
    }
}

/// Find a record by `public_id`. Panics if not found.
pub fn find_photo<'a>(gallery: &'a GalleryData, public_id: &str) -> &'a PhotoRecord {
    gallery
        .images
        .iter()
        .find(|r| r.public_id == public_id)
        .unwrap_or_else(|| {
            let ids: Vec<&str> = gallery.images.iter().map(|r| r.public_id.as_str()).collect();
            panic!("photo '{public_id}' not found. Available: {ids:?}")
        })
}
