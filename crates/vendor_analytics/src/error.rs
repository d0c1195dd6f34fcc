use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by a [`crate::Transport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no async runtime available for network I/O")]
    NoRuntime,
    #[error("invalid request url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid authorization header: {0}")]
    InvalidAuthHeader(String),
    #[error("request to `{url}` failed: {reason}")]
    Request { url: String, reason: String },
    #[error("failed to read response body from `{url}`: {reason}")]
    Body { url: String, reason: String },
}

/// Why a schema document could not be turned into a usable [`crate::Schema`].
///
/// The store never hands these to event callers; they are logged and the store
/// settles on [`crate::Schema::empty`].
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("schema fetch from `{url}` returned status {status}")]
    Status { url: String, status: u16 },
    #[error("schema document is not a JSON object")]
    NotAnObject,
    #[error("schema key `{key}` must be a list of strings")]
    NotAList { key: &'static str },
    #[error("schema key `vendorSlugRegex` must be a string")]
    PatternNotAString,
    #[error("invalid vendorSlugRegex `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
    #[error("failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reason an event was dropped instead of dispatched.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Rejection {
    #[error("vendor slug is empty after normalization")]
    EmptyVendor,
    #[error("schema has no usable vendor slug pattern")]
    MissingSlugPattern,
    #[error("vendor slug `{vendor}` does not match the schema pattern")]
    VendorPattern { vendor: String },
    #[error("page `{page}` is not in allowedPages")]
    PageNotAllowed { page: String },
    #[error("plan `{plan}` is not in allowedPlans")]
    PlanNotAllowed { plan: String },
    #[error("tier `{tier}` is not in allowedPlans")]
    TierNotAllowed { tier: String },
    #[error("placement `{placement}` is not in allowedPlacements")]
    PlacementNotAllowed { placement: String },
    #[error("click type is empty after normalization")]
    EmptyClickType,
    #[error("click type `{click_type}` is not in allowedClickTypes")]
    ClickTypeNotAllowed { click_type: String },
}

/// Errors while assembling an [`crate::AnalyticsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Reasons a drift check could not complete.
///
/// These are distinct from a detected drift: the comparison never ran.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("failed to read baked schema `{path}`: {source}")]
    BakedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse baked schema `{path}`: {source}")]
    BakedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("schema fetch failed: {status}")]
    Status { status: u16 },
    #[error("schema fetch returned HTML (status {status}); likely an interposed challenge page, check the auth token or edge rules")]
    HtmlChallenge { status: u16 },
    #[error("failed to parse live schema JSON: {0}")]
    LiveParse(#[source] serde_json::Error),
}
