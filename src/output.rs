//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not request-centric**. The primary
//! display for every photo is its positional index and `public_id`; what
//! happened to it (cached, fetched, skipped) and where it ended up are shown
//! as secondary context. Read top to bottom, the output is an inventory of
//! the gallery.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Folder party (3 assets)
//!     001 12/villains-joker/img1 (jpg, 800x600)
//!     002 11/heroes-batman/img2 (jpg, 1200x800)
//!     003 10/civilians-guests/img3 (png, 600x900)
//! ```
//!
//! ## Prepare
//!
//! ```text
//! Indexed 3 photos in 3 categories
//!     joker, batman, guests
//!     001 12/villains-joker/img1: fetched
//!     003 10/civilians-guests/img3: cached
//!     002 11/heroes-batman/img2: fetched
//! Placeholders: 1 cached, 2 fetched (3 total)
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! 001 joker (1 photos)
//!     001 12/villains-joker/img1 → p/0/index.html
//! 002 batman (1 photos)
//!     002 11/heroes-batman/img2 → p/1/index.html
//! Generated 2 categories, 2 photo pages
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure —
//! no I/O, no side effects.

use crate::config::SiteConfig;
use crate::gallery::{BuildEvent, BuildResult, PlaceholderStatus};
use crate::generate::photo_page_path;
use crate::naming::category_label;
use crate::types::{AssetManifest, GalleryData};
use crate::view::category_images;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a photo line: positional index + `public_id`.
fn photo_line(index: usize, public_id: &str) -> String {
    format!("{} {}", format_index(index), public_id)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 1: Fetch output
// ============================================================================

/// Format the asset index returned by the media service.
pub fn format_fetch_output(manifest: &AssetManifest) -> Vec<String> {
    let mut lines = vec![format!(
        "Folder {} ({} assets)",
        manifest.folder,
        manifest.assets.len()
    )];
    for (i, asset) in manifest.assets.iter().enumerate() {
        lines.push(format!(
            "{}{} ({}, {}x{})",
            indent(1),
            photo_line(i + 1, &asset.public_id),
            asset.format,
            asset.width,
            asset.height
        ));
    }
    lines
}

pub fn print_fetch_output(manifest: &AssetManifest) {
    print_lines(format_fetch_output(manifest));
}

// ============================================================================
// Stage 2: Prepare output
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Indexed {
            photo_count,
            categories,
        } => {
            let mut lines = vec![format!(
                "Indexed {} photos in {} categories",
                photo_count,
                categories.len()
            )];
            if !categories.is_empty() {
                lines.push(format!("{}{}", indent(1), categories.join(", ")));
            }
            lines
        }
        BuildEvent::Skipped { public_id, reason } => {
            vec![format!("{}Skipped {}: {}", indent(1), public_id, reason)]
        }
        BuildEvent::PlaceholderReady {
            id,
            public_id,
            status,
        } => {
            let status = match status {
                PlaceholderStatus::Cached => "cached",
                PlaceholderStatus::Fetched => "fetched",
            };
            vec![format!(
                "{}{}: {}",
                indent(1),
                photo_line(*id as usize + 1, public_id),
                status
            )]
        }
    }
}

/// Closing summary of the prepare stage.
pub fn format_prepare_summary(result: &BuildResult) -> Vec<String> {
    vec![format!("Placeholders: {}", result.cache_stats)]
}

pub fn print_prepare_summary(result: &BuildResult) {
    print_lines(format_prepare_summary(result));
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

/// Format generate stage output, grouped by category.
///
/// A photo whose id matches more than one category is listed under each;
/// it still has a single page.
pub fn format_generate_output(gallery: &GalleryData) -> Vec<String> {
    let mut lines = vec!["Home \u{2192} index.html".to_string()];

    for (i, category) in gallery.categories.iter().enumerate() {
        let photos = category_images(&gallery.images, category);
        lines.push(format!(
            "{} {} ({} photos)",
            format_index(i + 1),
            category_label(category),
            photos.len()
        ));
        for record in photos {
            lines.push(format!(
                "{}{} \u{2192} {}",
                indent(1),
                photo_line(record.id as usize + 1, &record.public_id),
                photo_page_path(record.id).display()
            ));
        }
    }

    lines.push(format!(
        "Generated {} categories, {} photo pages",
        gallery.categories.len(),
        gallery.images.len()
    ));
    lines
}

pub fn print_generate_output(gallery: &GalleryData) {
    print_lines(format_generate_output(gallery));
}

// ============================================================================
// Check output
// ============================================================================

/// Summarise a validated config and whether credentials are available.
pub fn format_check_output(config: &SiteConfig, has_credentials: bool) -> Vec<String> {
    let or_unset = |s: &str| {
        if s.is_empty() {
            "(unset)".to_string()
        } else {
            s.to_string()
        }
    };
    vec![
        "Config OK".to_string(),
        format!("{}Cloud: {}", indent(1), or_unset(&config.media.cloud_name)),
        format!("{}Folder: {}", indent(1), or_unset(&config.media.folder)),
        format!(
            "{}Credentials: {}",
            indent(1),
            if has_credentials { "present" } else { "missing" }
        ),
        format!(
            "{}Placeholders: {}px at quality {}",
            indent(1),
            config.placeholder.width,
            config.placeholder.quality
        ),
    ]
}

pub fn print_check_output(config: &SiteConfig, has_credentials: bool) {
    print_lines(format_check_output(config, has_credentials));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::test_helpers::{asset, sample_gallery};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_beyond_three_digits() {
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    #[test]
    fn fetch_output_lists_assets() {
        let manifest = AssetManifest {
            folder: "party".to_string(),
            assets: vec![asset("12/villains-joker/img1"), asset("11/heroes-batman/b")],
        };
        let lines = format_fetch_output(&manifest);
        assert_eq!(lines[0], "Folder party (2 assets)");
        assert_eq!(lines[1], "    001 12/villains-joker/img1 (jpg, 800x600)");
        assert_eq!(lines[2], "    002 11/heroes-batman/b (jpg, 800x600)");
    }

    #[test]
    fn fetch_output_empty_folder() {
        let manifest = AssetManifest {
            folder: "party".to_string(),
            assets: vec![],
        };
        assert_eq!(format_fetch_output(&manifest), vec!["Folder party (0 assets)"]);
    }

    // =========================================================================
    // Prepare
    // =========================================================================

    #[test]
    fn indexed_event() {
        let lines = format_build_event(&BuildEvent::Indexed {
            photo_count: 3,
            categories: vec!["joker".into(), "batman".into()],
        });
        assert_eq!(
            lines,
            vec!["Indexed 3 photos in 2 categories", "    joker, batman"]
        );
    }

    #[test]
    fn placeholder_event_is_one_based() {
        let lines = format_build_event(&BuildEvent::PlaceholderReady {
            id: 0,
            public_id: "12/villains-joker/img1".into(),
            status: PlaceholderStatus::Cached,
        });
        assert_eq!(lines, vec!["    001 12/villains-joker/img1: cached"]);
    }

    #[test]
    fn skipped_event() {
        let lines = format_build_event(&BuildEvent::Skipped {
            public_id: "broken".into(),
            reason: "no second segment".into(),
        });
        assert_eq!(lines, vec!["    Skipped broken: no second segment"]);
    }

    #[test]
    fn prepare_summary_shows_cache_stats() {
        let gallery = sample_gallery();
        let result = BuildResult {
            gallery,
            cache_stats: CacheStats { hits: 1, misses: 2 },
        };
        assert_eq!(
            format_prepare_summary(&result),
            vec!["Placeholders: 1 cached, 2 fetched (3 total)"]
        );
    }

    // =========================================================================
    // Generate
    // =========================================================================

    #[test]
    fn generate_output_grouped_by_category() {
        let lines = format_generate_output(&sample_gallery());
        assert_eq!(lines[0], "Home \u{2192} index.html");
        assert_eq!(lines[1], "001 joker (2 photos)");
        assert_eq!(lines[2], "    001 5/villains-joker/a \u{2192} p/0/index.html");
        assert_eq!(lines[3], "    003 3/villains-joker/c \u{2192} p/2/index.html");
        assert_eq!(lines[4], "002 batman (2 photos)");
        assert_eq!(
            lines.last().unwrap(),
            "Generated 3 categories, 5 photo pages"
        );
    }

    #[test]
    fn generate_output_uses_category_label() {
        let mut gallery = sample_gallery();
        gallery.categories = vec!["bat_family".into()];
        gallery.images.clear();
        let lines = format_generate_output(&gallery);
        assert_eq!(lines[1], "001 bat family (0 photos)");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_reports_credentials() {
        let config = sample_gallery().config;
        let lines = format_check_output(&config, false);
        assert_eq!(lines[0], "Config OK");
        assert!(lines.contains(&"    Cloud: demo".to_string()));
        assert!(lines.contains(&"    Credentials: missing".to_string()));

        let lines = format_check_output(&SiteConfig::default(), true);
        assert!(lines.contains(&"    Cloud: (unset)".to_string()));
        assert!(lines.contains(&"    Credentials: present".to_string()));
    }
}
