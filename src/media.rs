//! Media index client and delivery URL construction.
//!
//! Stage 1 of the build pipeline. Asks the media service which assets live
//! under the configured folder and records their identifying metadata.
//!
//! ## Backend seam
//!
//! All network access goes through [`MediaBackend`]: a search call returning
//! asset descriptors, and a plain GET for rendition bytes. The production
//! implementation is [`CloudinaryBackend`], a blocking `reqwest` client. The
//! rest of the pipeline is backend-agnostic, so tests run against
//! [`tests::MockMediaBackend`] without touching the network.
//!
//! ## Search request
//!
//! ```text
//! POST <api_base>/<cloud_name>/resources/search
//! Authorization: Basic base64(<api_key>:<api_secret>)
//!
//! {"expression": "folder:<folder>/*",
//!  "sort_by": [{"public_id": "desc"}],
//!  "max_results": 400}
//! ```
//!
//! ## Delivery URLs
//!
//! Every rendition the page references follows one template:
//!
//! ```text
//! <delivery_base>/<cloud_name>/image/upload/<transformation>/<public_id>.<format>
//! ```
//!
//! e.g. `https://res.cloudinary.com/demo/image/upload/c_scale,w_720/12/villains-joker/img1.jpg`.

use crate::config::MediaConfig;
use crate::types::{AssetDescriptor, AssetManifest, MAX_RESULTS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),
}

/// API key pair for the search endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    /// Read credentials through a lookup function (normally `std::env::var`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MediaError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|v| !v.is_empty())
            .ok_or(MediaError::MissingCredential(ENV_API_KEY))?;
        let api_secret = lookup(ENV_API_SECRET)
            .filter(|v| !v.is_empty())
            .ok_or(MediaError::MissingCredential(ENV_API_SECRET))?;
        Ok(Self {
            api_key,
            api_secret,
        })
    }

    pub fn from_env() -> Result<Self, MediaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

// Keep the secret out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Parameters of one index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub folder: String,
    pub max_results: u32,
}

impl SearchQuery {
    pub fn from_config(media: &MediaConfig) -> Self {
        Self {
            folder: media.folder.clone(),
            max_results: media.max_results.min(MAX_RESULTS),
        }
    }

    /// Search expression selecting every asset below the folder.
    pub fn expression(&self) -> String {
        format!("folder:{}/*", self.folder)
    }

    fn body(&self) -> SearchBody {
        SearchBody {
            expression: self.expression(),
            sort_by: vec![SortField {
                public_id: SortDirection::Desc,
            }],
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchBody {
    expression: String,
    sort_by: Vec<SortField>,
    max_results: u32,
}

#[derive(Debug, Serialize)]
struct SortField {
    public_id: SortDirection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum SortDirection {
    Desc,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<AssetDescriptor>,
}

/// Network operations the pipeline needs from the media service.
///
/// `Sync` so one backend can be shared across the placeholder fan-out.
pub trait MediaBackend: Sync {
    /// Assets matching the query, sorted by `public_id` descending.
    fn search(&self, query: &SearchQuery) -> Result<Vec<AssetDescriptor>, MediaError>;

    /// Raw bytes of a delivery URL.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError>;
}

/// Cloudinary-compatible backend over a blocking HTTP client.
pub struct CloudinaryBackend {
    client: reqwest::blocking::Client,
    api_base: String,
    cloud_name: String,
    credentials: Option<Credentials>,
}

impl CloudinaryBackend {
    /// Build a backend. Credentials are only needed for [`MediaBackend::search`];
    /// delivery fetches are public.
    pub fn new(media: &MediaConfig, credentials: Option<Credentials>) -> Result<Self, MediaError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(media.timeout_secs))
            .user_agent(concat!("cloud-gal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: media.api_base.trim_end_matches('/').to_string(),
            cloud_name: media.cloud_name.clone(),
            credentials,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/{}/resources/search", self.api_base, self.cloud_name)
    }
}

fn check_status(
    url: &str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, MediaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(MediaError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

impl MediaBackend for CloudinaryBackend {
    fn search(&self, query: &SearchQuery) -> Result<Vec<AssetDescriptor>, MediaError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(MediaError::MissingCredential(ENV_API_KEY))?;
        let url = self.search_url();
        tracing::debug!(%url, expression = %query.expression(), "searching media index");

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .json(&query.body())
            .send()?;
        let parsed: SearchResponse = check_status(&url, response)?.json()?;

        let mut assets = parsed.resources;
        assets.truncate(query.max_results as usize);
        tracing::debug!(count = assets.len(), "media index returned");
        Ok(assets)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        tracing::debug!(%url, "fetching rendition");
        let response = self.client.get(url).send()?;
        let bytes = check_status(url, response)?.bytes()?;
        Ok(bytes.to_vec())
    }
}

/// Query the index for the configured folder.
///
/// Any service error aborts; there is no partial index.
pub fn fetch_index(
    backend: &impl MediaBackend,
    media: &MediaConfig,
) -> Result<AssetManifest, MediaError> {
    let query = SearchQuery::from_config(media);
    let assets = backend.search(&query)?;
    Ok(AssetManifest {
        folder: query.folder,
        assets,
    })
}

/// Build a delivery URL for an asset under a transformation string.
pub fn delivery_url(
    delivery_base: &str,
    cloud_name: &str,
    transformation: &str,
    public_id: &str,
    format: &str,
) -> String {
    format!(
        "{}/{}/image/upload/{}/{}.{}",
        delivery_base.trim_end_matches('/'),
        cloud_name,
        transformation,
        public_id,
        format
    )
}

/// Delivery URL of an asset scaled to `width` pixels.
pub fn scaled_url(media: &MediaConfig, width: u32, public_id: &str, format: &str) -> String {
    delivery_url(
        &media.delivery_base,
        &media.cloud_name,
        &format!("c_scale,w_{width}"),
        public_id,
        format,
    )
}
