//! Blur placeholder generation.
//!
//! For each photo the media service renders a tiny JPEG (8px wide by
//! default). That rendition is minified and inlined into the page as a
//! `data:` URI, so the grid paints a blurred preview before the real image
//! arrives.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Rendition request | [`MediaBackend::fetch`] on `f_jpg,w_<w>,q_<q>` |
//! | Minify | `image` decode + `JpegEncoder` re-encode, keep the smaller |
//! | Inline | `base64` standard engine |
//!
//! Each call is a pure function of the asset's `public_id` and `format` plus
//! the configured rendition parameters, with one outbound request.

use crate::config::{MediaConfig, PlaceholderConfig};
use crate::media::{MediaBackend, MediaError, delivery_url};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceholderError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("rendition is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Transformation string of the placeholder rendition.
pub fn transformation(params: &PlaceholderConfig) -> String {
    format!("f_jpg,w_{},q_{}", params.width, params.quality)
}

/// URL of the tiny rendition for one asset.
pub fn rendition_url(
    media: &MediaConfig,
    params: &PlaceholderConfig,
    public_id: &str,
    format: &str,
) -> String {
    delivery_url(
        &media.delivery_base,
        &media.cloud_name,
        &transformation(params),
        public_id,
        format,
    )
}

/// Re-encode a JPEG as baseline at `quality`, keeping whichever is smaller.
///
/// The service's rendition is already tiny; this mostly strips metadata
/// segments. Bytes that don't decode are rejected here rather than shipped
/// as a broken `data:` URI.
pub fn minify_jpeg(bytes: &[u8], quality: u32) -> Result<Vec<u8>, PlaceholderError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = decoded.to_rgb8();

    let mut reencoded = Vec::new();
    let q = quality.clamp(1, 100) as u8;
    JpegEncoder::new_with_quality(&mut reencoded, q).encode_image(&rgb)?;

    if reencoded.len() < bytes.len() {
        Ok(reencoded)
    } else {
        Ok(bytes.to_vec())
    }
}

/// Inline JPEG bytes as a `data:` URI.
pub fn data_url(jpeg: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    )
}

/// Fetch, minify and inline the placeholder for one asset.
pub fn generate_placeholder(
    backend: &impl MediaBackend,
    media: &MediaConfig,
    params: &PlaceholderConfig,
    public_id: &str,
    format: &str,
) -> Result<String, PlaceholderError> {
    let url = rendition_url(media, params, public_id, format);
    let bytes = backend.fetch(&url)?;
    let minified = minify_jpeg(&bytes, params.quality)?;
    Ok(data_url(&minified))
}
