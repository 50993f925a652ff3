//! Gallery data builder.
//!
//! Stage 2 of the build pipeline. Takes the asset index from stage 1 and
//! produces everything the page needs: the ordered category list and one
//! [`PhotoRecord`] per asset, each carrying its blur placeholder.
//!
//! ## Algorithm
//!
//! 1. Parse each asset's category from its `public_id` ([`parse_category`]);
//!    append it to the category list the first time it is seen.
//! 2. Assign zero-based sequential ids in index order.
//! 3. Fan out placeholder generation, one task per photo, on the rayon pool.
//! 4. Join all tasks and attach each placeholder by position.
//!
//! ## All-or-nothing
//!
//! The fan-out is fail-fast: the first placeholder error aborts the join and
//! the whole stage returns that error. No `gallery.json` is written and the
//! cache is left untouched, so a failed build never leaves a half-populated
//! gallery behind. There are no retries.
//!
//! Indexed parallel iterators collect in input order, which is what makes
//! the positional match in step 4 sound.

use crate::cache::{CacheStats, PlaceholderCache, placeholder_key};
use crate::config::{OnMalformed, SiteConfig};
use crate::media::{MediaBackend, MediaError, fetch_index};
use crate::naming::{CategoryError, parse_category};
use crate::placeholder::{PlaceholderError, generate_placeholder};
use crate::types::{AssetDescriptor, AssetManifest, GalleryData, PhotoRecord};
use rayon::prelude::*;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Media index query failed: {0}")]
    Media(#[from] MediaError),
    #[error("Malformed public id: {0}")]
    Category(#[from] CategoryError),
    #[error("Placeholder for '{public_id}' failed: {source}")]
    Placeholder {
        public_id: String,
        #[source]
        source: PlaceholderError,
    },
}

/// Where a placeholder came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStatus {
    Cached,
    Fetched,
}

/// Progress events emitted while building.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// Category pass finished.
    Indexed {
        photo_count: usize,
        categories: Vec<String>,
    },
    /// An asset was dropped because its id has no category.
    Skipped { public_id: String, reason: String },
    /// One placeholder finished. Arrives in completion order, not id order.
    PlaceholderReady {
        id: u32,
        public_id: String,
        status: PlaceholderStatus,
    },
}

/// Result of the prepare stage.
#[derive(Debug)]
pub struct BuildResult {
    pub gallery: GalleryData,
    pub cache_stats: CacheStats,
}

/// Categories in first-appearance order, plus the assets that carry one.
///
/// With [`OnMalformed::Fail`] the first malformed id is returned as an error.
/// With [`OnMalformed::Skip`] it is dropped and reported through `events`.
pub fn partition_categories<'a>(
    assets: &'a [AssetDescriptor],
    on_malformed: OnMalformed,
    events: Option<&Sender<BuildEvent>>,
) -> Result<(Vec<String>, Vec<&'a AssetDescriptor>), BuildError> {
    let mut categories: Vec<String> = Vec::new();
    let mut kept = Vec::with_capacity(assets.len());

    for asset in assets {
        match parse_category(&asset.public_id) {
            Ok(category) => {
                if !categories.contains(&category) {
                    categories.push(category);
                }
                kept.push(asset);
            }
            Err(err) => match on_malformed {
                OnMalformed::Fail => return Err(err.into()),
                OnMalformed::Skip => {
                    tracing::warn!(public_id = %asset.public_id, %err, "skipping asset");
                    if let Some(tx) = events {
                        let _ = tx.send(BuildEvent::Skipped {
                            public_id: asset.public_id.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            },
        }
    }

    Ok((categories, kept))
}

/// Photo records with sequential ids and no placeholder yet.
pub fn assign_records(assets: &[&AssetDescriptor]) -> Vec<PhotoRecord> {
    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| PhotoRecord {
            id: i as u32,
            public_id: asset.public_id.clone(),
            format: asset.format.clone(),
            width: asset.width,
            height: asset.height,
            blur_data_url: None,
        })
        .collect()
}

/// Build the gallery from an asset index.
///
/// `cache` is consulted during the fan-out and only updated once every
/// placeholder succeeded.
pub fn build_gallery(
    backend: &impl MediaBackend,
    assets: &[AssetDescriptor],
    config: &SiteConfig,
    cache: &mut PlaceholderCache,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildResult, BuildError> {
    let (categories, kept) =
        partition_categories(assets, config.categories.on_malformed, events.as_ref())?;
    let mut images = assign_records(&kept);

    if let Some(tx) = &events {
        let _ = tx.send(BuildEvent::Indexed {
            photo_count: images.len(),
            categories: categories.clone(),
        });
    }

    let params = &config.placeholder;
    let lookup: &PlaceholderCache = cache;

    let placeholders: Vec<(String, String, PlaceholderStatus)> = images
        .par_iter()
        .map(|record| {
            let key = placeholder_key(
                &record.public_id,
                &record.format,
                params.width,
                params.quality,
            );
            let (url, status) = match lookup.get(&key) {
                Some(hit) => (hit.to_string(), PlaceholderStatus::Cached),
                None => {
                    let url = generate_placeholder(
                        backend,
                        &config.media,
                        params,
                        &record.public_id,
                        &record.format,
                    )
                    .map_err(|source| BuildError::Placeholder {
                        public_id: record.public_id.clone(),
                        source,
                    })?;
                    (url, PlaceholderStatus::Fetched)
                }
            };
            if let Some(tx) = &events {
                let _ = tx.send(BuildEvent::PlaceholderReady {
                    id: record.id,
                    public_id: record.public_id.clone(),
                    status,
                });
            }
            Ok((key, url, status))
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let mut cache_stats = CacheStats::default();
    let mut live_keys = Vec::with_capacity(placeholders.len());
    for (record, (key, url, status)) in images.iter_mut().zip(placeholders) {
        match status {
            PlaceholderStatus::Cached => cache_stats.hit(),
            PlaceholderStatus::Fetched => cache_stats.miss(),
        }
        cache.insert(key.clone(), url.clone());
        live_keys.push(key);
        record.blur_data_url = Some(url);
    }
    cache.retain_keys(&live_keys);

    tracing::info!(
        photos = images.len(),
        categories = categories.len(),
        "gallery data built"
    );

    Ok(BuildResult {
        gallery: GalleryData {
            categories,
            images,
            config: config.clone(),
        },
        cache_stats,
    })
}

/// Query the media index, then build the gallery from its result.
pub fn fetch_and_build(
    backend: &impl MediaBackend,
    config: &SiteConfig,
    cache: &mut PlaceholderCache,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildResult, BuildError> {
    let manifest = fetch_index(backend, &config.media)?;
    build_gallery(backend, &manifest.assets, config, cache, events)
}

/// Prepare stage entry point: `assets.json` in, gallery data out.
///
/// The placeholder cache lives in `cache_dir`; with `use_cache == false` it
/// starts empty (and is overwritten on success).
pub fn prepare(
    backend: &impl MediaBackend,
    assets_path: &Path,
    cache_dir: &Path,
    config: &SiteConfig,
    use_cache: bool,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildResult, BuildError> {
    let content = std::fs::read_to_string(assets_path)?;
    let manifest: AssetManifest = serde_json::from_str(&content)?;

    let mut cache = if use_cache {
        PlaceholderCache::load(cache_dir)
    } else {
        PlaceholderCache::empty()
    };

    let result = build_gallery(backend, &manifest.assets, config, &mut cache, events)?;
    std::fs::create_dir_all(cache_dir)?;
    cache.save(cache_dir)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::MockMediaBackend;
    use crate::test_helpers::{asset, numbered_assets, tiny_jpeg};
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.media.cloud_name = "demo".to_string();
        config.media.folder = "party".to_string();
        config
    }

    fn build(
        backend: &MockMediaBackend,
        assets: &[AssetDescriptor],
        config: &SiteConfig,
    ) -> Result<BuildResult, BuildError> {
        let mut cache = PlaceholderCache::empty();
        build_gallery(backend, assets, config, &mut cache, None)
    }

    // =========================================================================
    // Category partitioning
    // =========================================================================

    #[test]
    fn categories_in_first_appearance_order_without_duplicates() {
        let assets = vec![
            asset("12/villains-joker/a"),
            asset("11/heroes-batman/b"),
            asset("10/villains-joker/c"),
            asset("9/civilians-guests/d"),
            asset("8/heroes-batman/e"),
        ];
        let (categories, kept) = partition_categories(&assets, OnMalformed::Fail, None).unwrap();
        assert_eq!(categories, vec!["joker", "batman", "guests"]);
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn malformed_id_fails_by_default() {
        let assets = vec![asset("12/villains-joker/a"), asset("no-category")];
        let err = partition_categories(&assets, OnMalformed::Fail, None).unwrap_err();
        assert!(matches!(err, BuildError::Category(CategoryError::MissingSegment { .. })));
    }

    #[test]
    fn malformed_id_skipped_when_configured() {
        let (tx, rx) = std::sync::mpsc::channel();
        let assets = vec![asset("12/villains/a"), asset("11/heroes-batman/b")];
        let (categories, kept) =
            partition_categories(&assets, OnMalformed::Skip, Some(&tx)).unwrap();
        drop(tx);

        assert_eq!(categories, vec!["batman"]);
        assert_eq!(kept.len(), 1);
        let events: Vec<_> = rx.iter().collect();
        assert!(matches!(
            &events[..],
            [BuildEvent::Skipped { public_id, .. }] if public_id == "12/villains/a"
        ));
    }

    #[test]
    fn ids_are_sequential_after_skipping() {
        let mut config = config();
        config.categories.on_malformed = OnMalformed::Skip;
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let assets = vec![
            asset("3/heroes-batman/a"),
            asset("broken"),
            asset("1/heroes-robin/c"),
        ];
        let result = build(&backend, &assets, &config).unwrap();
        let ids: Vec<u32> = result.gallery.images.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(result.gallery.images[1].public_id, "1/heroes-robin/c");
    }

    // =========================================================================
    // Full build with mock backend
    // =========================================================================

    #[test]
    fn build_assigns_records_and_placeholders() {
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let assets = vec![AssetDescriptor {
            public_id: "12/villains-joker/img1".to_string(),
            format: "jpg".to_string(),
            width: 800,
            height: 600,
        }];
        let result = build(&backend, &assets, &config()).unwrap();

        assert_eq!(result.gallery.categories, vec!["joker"]);
        let record = &result.gallery.images[0];
        assert_eq!(record.id, 0);
        assert_eq!(record.public_id, "12/villains-joker/img1");
        assert_eq!(record.format, "jpg");
        assert_eq!((record.width, record.height), (800, 600));
        assert!(
            record
                .blur_data_url
                .as_deref()
                .unwrap()
                .starts_with("data:image/jpeg;base64,")
        );
        assert_eq!(result.cache_stats.misses, 1);
    }

    #[test]
    fn empty_index_builds_empty_gallery() {
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = build(&backend, &[], &config()).unwrap();
        assert!(result.gallery.categories.is_empty());
        assert!(result.gallery.images.is_empty());
        assert!(backend.fetched_urls().is_empty());
    }

    #[test]
    fn max_index_builds_every_record_in_order() {
        let assets = numbered_assets(400);
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = build(&backend, &assets, &config()).unwrap();

        assert_eq!(result.gallery.images.len(), 400);
        for (i, (record, asset)) in result.gallery.images.iter().zip(&assets).enumerate() {
            assert_eq!(record.id, i as u32);
            assert_eq!(record.public_id, asset.public_id);
            assert!(record.blur_data_url.is_some());
        }
        assert_eq!(backend.fetched_urls().len(), 400);
    }

    #[test]
    fn placeholders_line_up_with_their_records() {
        let config = config();
        let assets = numbered_assets(400);
        let backend = assets
            .iter()
            .enumerate()
            .fold(MockMediaBackend::default(), |backend, (i, asset)| {
                let (w, h) = (1 + i as u32 % 20, 1 + i as u32 / 20);
                backend.with_body_for(&asset.public_id, &asset.format, tiny_jpeg(w, h))
            });
        let result = build(&backend, &assets, &config).unwrap();

        for (record, asset) in result.gallery.images.iter().zip(&assets) {
            let expected = generate_placeholder(
                &backend,
                &config.media,
                &config.placeholder,
                &asset.public_id,
                &asset.format,
            )
            .unwrap();
            assert_eq!(
                record.blur_data_url.as_deref(),
                Some(expected.as_str()),
                "placeholder for {}",
                asset.public_id
            );
        }
    }

    #[test]
    fn single_placeholder_failure_fails_the_build() {
        let assets = numbered_assets(20);
        let failing = assets[7].public_id.clone();
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6)).failing_on(&failing);
        let mut cache = PlaceholderCache::empty();

        let err = build_gallery(&backend, &assets, &config(), &mut cache, None).unwrap_err();

        match err {
            BuildError::Placeholder { public_id, .. } => assert_eq!(public_id, failing),
            other => panic!("expected placeholder error, got {other:?}"),
        }
        assert!(cache.entries.is_empty(), "cache must not change on failure");
    }

    #[test]
    fn cached_placeholders_skip_the_network() {
        let assets = vec![asset("2/heroes-batman/a"), asset("1/heroes-robin/b")];
        let cfg = config();
        let mut cache = PlaceholderCache::empty();
        let key = placeholder_key(
            "2/heroes-batman/a",
            "jpg",
            cfg.placeholder.width,
            cfg.placeholder.quality,
        );
        cache.insert(key, "data:image/jpeg;base64,CACHED".to_string());

        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = build_gallery(&backend, &assets, &cfg, &mut cache, None).unwrap();

        assert_eq!(
            result.gallery.images[0].blur_data_url.as_deref(),
            Some("data:image/jpeg;base64,CACHED")
        );
        assert_eq!(backend.fetched_urls().len(), 1);
        assert_eq!(result.cache_stats.hits, 1);
        assert_eq!(result.cache_stats.misses, 1);
        assert_eq!(cache.entries.len(), 2);
    }

    #[test]
    fn build_emits_one_event_per_placeholder() {
        let (tx, rx) = std::sync::mpsc::channel();
        let assets = numbered_assets(5);
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let mut cache = PlaceholderCache::empty();
        build_gallery(&backend, &assets, &config(), &mut cache, Some(tx)).unwrap();

        let events: Vec<_> = rx.iter().collect();
        let ready = events
            .iter()
            .filter(|e| matches!(e, BuildEvent::PlaceholderReady { .. }))
            .count();
        assert_eq!(ready, 5);
        assert!(matches!(events[0], BuildEvent::Indexed { photo_count: 5, .. }));
    }

    #[test]
    fn fetch_and_build_queries_configured_folder() {
        let backend = MockMediaBackend::new(numbered_assets(3), tiny_jpeg(8, 6));
        let mut cache = PlaceholderCache::empty();
        let result = fetch_and_build(&backend, &config(), &mut cache, None).unwrap();

        assert_eq!(result.gallery.images.len(), 3);
        let searches = backend.searches.lock().unwrap();
        assert_eq!(searches[0].folder, "party");
        assert_eq!(searches[0].max_results, 400);
    }

    #[test]
    fn prepare_reads_manifest_and_saves_cache() {
        let tmp = TempDir::new().unwrap();
        let manifest = AssetManifest {
            folder: "party".to_string(),
            assets: numbered_assets(2),
        };
        let assets_path = tmp.path().join("assets.json");
        std::fs::write(&assets_path, serde_json::to_string(&manifest).unwrap()).unwrap();

        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = prepare(&backend, &assets_path, tmp.path(), &config(), true, None).unwrap();
        assert_eq!(result.gallery.images.len(), 2);
        assert_eq!(PlaceholderCache::load(tmp.path()).entries.len(), 2);

        // Second run is served entirely from the cache.
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = prepare(&backend, &assets_path, tmp.path(), &config(), true, None).unwrap();
        assert_eq!(result.cache_stats.hits, 2);
        assert!(backend.fetched_urls().is_empty());

        // --no-cache fetches again.
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = prepare(&backend, &assets_path, tmp.path(), &config(), false, None).unwrap();
        assert_eq!(result.cache_stats.misses, 2);
        assert_eq!(backend.fetched_urls().len(), 2);
    }

    #[test]
    fn gallery_json_uses_blur_data_url_field_name() {
        let backend = MockMediaBackend::new(vec![], tiny_jpeg(8, 6));
        let result = build(&backend, &numbered_assets(1), &config()).unwrap();
        let json = serde_json::to_string(&result.gallery).unwrap();
        assert!(json.contains("\"blurDataUrl\":\"data:image/jpeg;base64,"));
    }
}
