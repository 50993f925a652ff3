//! # Cloud Gal
//!
//! A static site generator for photo galleries whose photos live on a media
//! CDN (Cloudinary-style delivery and search APIs). The media service is the
//! data source: every asset under one folder becomes a grid tile, and its
//! category is read from its public id.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Cloud Gal builds through three independent stages, each producing a JSON
//! file that the next stage consumes:
//!
//! ```text
//! 1. Fetch     media index  →  assets.json   (folder → asset descriptors)
//! 2. Prepare   assets.json  →  gallery.json  (categories, records, blur placeholders)
//! 3. Generate  gallery.json →  dist/         (final HTML site)
//! ```
//!
//! Only the first two stages touch the network. `gallery.json` is everything
//! the page needs, computed once per build; the browser never talks to the
//! media index.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`media`] | Stage 1 — media index client, `MediaBackend` seam, delivery URLs |
//! | [`gallery`] | Stage 2 — category list, photo records, parallel placeholder fan-out |
//! | [`generate`] | Stage 3 — renders the index and per-photo pages using Maud |
//! | [`placeholder`] | Tiny rendition → minified JPEG → `data:` URI |
//! | [`cache`] | Content-addressed placeholder cache for incremental builds |
//! | [`naming`] | Category extraction from `<folder>/<group>-<category>/<name>` ids |
//! | [`view`] | Gallery view state machine: category filter, detail, scroll-back |
//! | [`modal`] | Detail view traversal and the navigable-location contract |
//! | [`memory`] | Last-viewed-photo memory (`sessionStorage` in the browser) |
//! | [`config`] | `config.toml` loading, validation, env overrides, CSS generation |
//! | [`types`] | Shared types serialized between stages |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## All-or-Nothing Prepare
//!
//! Placeholder generation fans out one task per photo. A single failure fails
//! the stage; no partial `gallery.json` is ever written. A gallery with a few
//! silently missing previews is worse than a failed deploy that can be retried.
//!
//! ## Location Is State
//!
//! Which photo is open lives in the address (`/?photoId=N` or `/p/N/`), not in
//! page state, so every open photo is shareable and the back button closes it.
//! Each photo also gets a real `p/<id>/index.html`, so deep links work on any
//! static host. See [`modal`].
//!
//! ## One State Machine, Two Runtimes
//!
//! [`view::GalleryView`] defines the page's transitions and is what the
//! generator renders as the initial HTML. `static/gallery.js` runs the same
//! transitions in the browser. The Rust side is where the behaviour is tested.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed templates are build errors and all interpolation is
//! auto-escaped.

pub mod cache;
pub mod config;
pub mod gallery;
pub mod generate;
pub mod media;
pub mod memory;
pub mod modal;
pub mod naming;
pub mod output;
pub mod placeholder;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod test_helpers;
