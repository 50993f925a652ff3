//! Category parsing for the `<n>/<group>-<category>/<name>` public id convention.
//!
//! Photos are uploaded into numbered folders whose names carry the category
//! after a hyphen:
//!
//! - `12/villains-joker/img1` → `joker`
//! - `3/heroes-wonder_woman/IMG_0042` → `wonder_woman`
//! - `7/civilians-party-table/x` → `party` (only the token after the first hyphen)
//!
//! ## Display Labels
//!
//! Underscores in a category are converted to spaces for display:
//! `wonder_woman` → "wonder woman".

use thiserror::Error;

/// Why a public id carries no category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("public id '{public_id}' has no second path segment")]
    MissingSegment { public_id: String },
    #[error("segment '{segment}' of public id '{public_id}' has no hyphen")]
    MissingHyphen { public_id: String, segment: String },
    #[error("segment '{segment}' of public id '{public_id}' has an empty category")]
    EmptyCategory { public_id: String, segment: String },
}

/// Extract the category from a public id.
///
/// Takes the second `/`-separated segment, then the token between its first
/// hyphen and the next one (or the end of the segment).
pub fn parse_category(public_id: &str) -> Result<String, CategoryError> {
    let segment = public_id
        .split('/')
        .nth(1)
        .ok_or_else(|| CategoryError::MissingSegment {
            public_id: public_id.to_string(),
        })?;

    let token = segment
        .split('-')
        .nth(1)
        .ok_or_else(|| CategoryError::MissingHyphen {
            public_id: public_id.to_string(),
            segment: segment.to_string(),
        })?;

    if token.is_empty() {
        return Err(CategoryError::EmptyCategory {
            public_id: public_id.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(token.to_string())
}

/// Human-readable label for a category button.
pub fn category_label(category: &str) -> String {
    category.replace('_', " ")
}
