//! HTML site generation.
//!
//! Stage 3 of the build pipeline. Takes the gallery data from stage 2 and
//! writes the final static site.
//!
//! ## Generated Pages
//!
//! - **Index page** (`/index.html`): hero panel with category buttons, the
//!   photo grid, and a hidden detail overlay driven by `gallery.js`
//! - **Photo pages** (`/p/{id}/index.html`): one per photo, so deep links
//!   resolve on any static host, with or without script
//!
//! ## Initial State
//!
//! The index page is the [`GalleryView`] initial state rendered to HTML: the
//! first category is selected and only its photos are visible. Every photo is
//! still emitted (hidden when outside the selection) so category switches in
//! the browser never touch the network for markup.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── p/
//! │   ├── 0/index.html
//! │   ├── 1/index.html
//! │   └── ...
//! └── assets/                    # copied from <source>/assets
//!     ├── logo.svg
//!     └── favicon.ico
//! ```
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: base styles (colors injected from config)
//! - `static/gallery.js`: category filter, detail overlay, address sync and
//!   scroll-back
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::config::{self, SiteConfig};
use crate::media::scaled_url;
use crate::memory::{InMemoryStore, LAST_VIEWED_KEY};
use crate::modal::{BASE_ROUTE, DetailModal, NavigationState, photo_deep_link, photo_href};
use crate::naming::category_label;
use crate::types::{GalleryData, PhotoRecord};
use crate::view::GalleryView;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to walk assets directory: {0}")]
    Walk(#[from] walkdir::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/gallery.js");

/// Responsive hint for grid images: 1 to 4 columns.
const GRID_SIZES: &str =
    "(max-width: 640px) 100vw, (max-width: 1280px) 50vw, (max-width: 1536px) 33vw, 25vw";

/// Path of a photo's deep-link page, relative to the output root.
pub fn photo_page_path(id: u32) -> PathBuf {
    Path::new("p").join(id.to_string()).join("index.html")
}

pub fn generate(
    gallery_path: &Path,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<GalleryData, GenerateError> {
    let content = fs::read_to_string(gallery_path)?;
    let gallery: GalleryData = serde_json::from_str(&content)?;

    let color_css = config::generate_color_css(&gallery.config.colors);
    let css = format!("{}\n\n{}", color_css, CSS_STATIC);

    fs::create_dir_all(output_dir)?;

    let assets_src = source_dir.join(&gallery.config.assets_dir);
    if assets_src.is_dir() {
        let copied = copy_assets(&assets_src, &output_dir.join("assets"))?;
        tracing::debug!(copied, "copied static assets");
    }

    let index_html = render_index(&gallery, &css)?;
    fs::write(output_dir.join("index.html"), index_html.into_string())?;

    for record in &gallery.images {
        let Some(modal) = DetailModal::open(&gallery.images, NavigationState::photo(record.id))
        else {
            continue;
        };
        let page = output_dir.join(photo_page_path(record.id));
        if let Some(parent) = page.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(page, render_photo_page(&gallery, modal, &css).into_string())?;
    }

    tracing::info!(
        photos = gallery.images.len(),
        output = %output_dir.display(),
        "site generated"
    );
    Ok(gallery)
}

/// Copy every file under `src` into `dst`, preserving layout.
fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn render_markdown(source: &str) -> Markup {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(source));
    PreEscaped(out)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    title: &str,
    config: &SiteConfig,
    css: &str,
    page: &str,
    content: Markup,
) -> Markup {
    let site = &config.site;
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(site.description);
                meta property="og:type" content="website";
                meta property="og:title" content=(title);
                meta property="og:description" content=(site.description);
                @if !site.og_image.is_empty() {
                    meta property="og:image" content=(site.og_image);
                }
                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:title" content=(title);
                meta name="twitter:description" content=(site.description);
                @if !site.og_image.is_empty() {
                    meta name="twitter:image" content=(site.og_image);
                }
                style { (PreEscaped(css)) }
            }
            body data-page=(page) data-last-viewed-key=(LAST_VIEWED_KEY) data-base-route=(BASE_ROUTE) {
                (content)
                script { (PreEscaped(JS)) }
            }
        }
    }
}

/// Hero panel: logo, title, intro and the category buttons.
fn hero_panel(gallery: &GalleryData, selected: Option<&str>) -> Markup {
    let site = &gallery.config.site;
    html! {
        section.hero {
            @if !site.logo.is_empty() {
                img.hero-logo src={ "/assets/" (site.logo) } alt="";
            }
            h1 { (site.title) }
            @if !site.intro.is_empty() {
                div.hero-intro { (render_markdown(&site.intro)) }
            }
            nav.categories {
                @for category in &gallery.categories {
                    @let is_selected = selected == Some(category.as_str());
                    button.category-button.selected[is_selected]
                        type="button"
                        data-category=(category)
                        aria-pressed=(if is_selected { "true" } else { "false" }) {
                        (category_label(category))
                    }
                }
            }
        }
    }
}

/// One grid tile. `visible` is false for photos outside the selected category.
fn grid_item(record: &PhotoRecord, config: &SiteConfig, visible: bool) -> Markup {
    let src = scaled_url(
        &config.media,
        config.grid.width,
        &record.public_id,
        &record.format,
    );
    let blur = record
        .blur_data_url
        .as_deref()
        .map(|url| format!("background-image: url(\"{url}\");"));
    html! {
        a.photo-link
            href=(photo_href(record.id))
            data-photo-id=(record.id)
            data-deep-link=(photo_deep_link(record.id))
            data-public-id=(record.public_id)
            hidden[!visible] {
            img.photo
                src=(src)
                alt=(config.site.photo_alt)
                width=(config.grid.width)
                height=(config.grid.height)
                sizes=(GRID_SIZES)
                loading="lazy"
                decoding="async"
                style=[blur];
        }
    }
}

fn site_footer(config: &SiteConfig) -> Markup {
    html! {
        @if !config.site.footer.is_empty() {
            footer.site-footer { (render_markdown(&config.site.footer)) }
        }
    }
}

/// Per-photo data the overlay needs, embedded as JSON.
#[derive(Serialize)]
struct OverlayPhoto<'a> {
    id: u32,
    src: String,
    width: u32,
    height: u32,
    #[serde(rename = "blurDataUrl", skip_serializing_if = "Option::is_none")]
    blur_data_url: Option<&'a str>,
}

/// JSON for a `<script type="application/json">` island.
fn overlay_data(gallery: &GalleryData) -> Result<String, serde_json::Error> {
    let config = &gallery.config;
    let photos: Vec<OverlayPhoto> = gallery
        .images
        .iter()
        .map(|record| OverlayPhoto {
            id: record.id,
            src: scaled_url(
                &config.media,
                config.grid.modal_width,
                &record.public_id,
                &record.format,
            ),
            width: record.width,
            height: record.height,
            blur_data_url: record.blur_data_url.as_deref(),
        })
        .collect();
    // "</script>" inside a public id must not end the element.
    Ok(serde_json::to_string(&photos)?.replace("</", "<\\/"))
}

/// Hidden detail overlay, filled in by the page script.
fn overlay(photo_alt: &str) -> Markup {
    html! {
        div #detail .detail-overlay hidden role="dialog" aria-modal="true" {
            button.detail-close type="button" aria-label="Close" { "×" }
            button.detail-prev type="button" aria-label="Previous photo" { "‹" }
            figure.detail-frame {
                img.detail-photo alt=(photo_alt);
            }
            button.detail-next type="button" aria-label="Next photo" { "›" }
            p.detail-counter {}
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the index page in its initial view state.
fn render_index(gallery: &GalleryData, css: &str) -> Result<Markup, GenerateError> {
    let view = GalleryView::new(
        &gallery.categories,
        &gallery.images,
        InMemoryStore::default(),
    );
    let visible: Vec<u32> = view.grid().iter().map(|r| r.id).collect();
    let data = overlay_data(gallery)?;
    let config = &gallery.config;

    let content = html! {
        main.gallery-page {
            div.gallery-grid {
                (hero_panel(gallery, view.selected_category()))
                @for record in &gallery.images {
                    (grid_item(record, config, visible.contains(&record.id)))
                }
            }
        }
        (site_footer(config))
        (overlay(&config.site.photo_alt))
        script #gallery-data type="application/json" { (PreEscaped(data)) }
    };

    Ok(base_document(&config.site.title, config, css, "index", content))
}

/// Renders the standalone page for one photo.
fn render_photo_page(gallery: &GalleryData, modal: DetailModal<'_>, css: &str) -> Markup {
    let config = &gallery.config;
    let record = modal.current();
    let src = scaled_url(
        &config.media,
        config.grid.modal_width,
        &record.public_id,
        &record.format,
    );
    let page_title = format!(
        "{} - {} / {}",
        config.site.title,
        modal.position(),
        modal.total()
    );
    let aspect_style = format!(
        "--aspect-ratio: {};",
        record.width as f64 / record.height.max(1) as f64
    );

    let content = html! {
        main.photo-page data-photo-id=(record.id) {
            figure.detail-frame style=(aspect_style) {
                img.detail-photo src=(src) alt=(config.site.photo_alt) width=(record.width) height=(record.height);
            }
            nav.photo-nav {
                @if let Some(prev) = modal.previous() {
                    a.detail-prev href=(photo_deep_link(prev.id)) aria-label="Previous photo" { "‹" }
                }
                a.detail-close href=(BASE_ROUTE) data-photo-id=(record.id) aria-label="Close" { "×" }
                @if let Some(next) = modal.next() {
                    a.detail-next href=(photo_deep_link(next.id)) aria-label="Next photo" { "›" }
                }
            }
            p.detail-counter { (modal.position()) " / " (modal.total()) }
        }
    };

    base_document(&page_title, config, css, "photo", content)
}

// ============================================================================
// Tests
// ============================================================================
