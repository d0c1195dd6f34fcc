#![forbid(unsafe_code)]
//! Schema-driven validation and dispatch for vendor directory analytics.
//!
//! Visit and click events arrive from page markup as untrusted JSON fields. The pipeline is:
//! - [`SchemaStore`] loads the allowlist schema once per store; a failed load settles on
//!   [`Schema::empty`], which rejects every event.
//! - [`normalize`] turns raw fields into canonical slugs and lowercase names.
//! - [`validate_visit`] / [`validate_click`] check normalized fields against the schema and
//!   return a [`Rejection`] reason instead of failing.
//! - [`EventDispatcher`] posts validated events as a detached task; delivery failures are logged
//!   and never reach the caller.
//!
//! [`Analytics`] strings these together for a page. [`drift`] holds the baked-vs-live schema
//! comparison behind `xtask analytics-drift`.

mod config;
mod dispatch;
pub mod drift;
mod error;
pub mod normalize;
mod request;
mod schema;
mod store;
mod tracker;
mod transport;
mod validate;

pub use config::{
    AnalyticsConfig, DEFAULT_ENDPOINT, DEFAULT_LIVE_SCHEMA_URL, DEFAULT_SCHEMA_URL, DEFAULT_TIMEOUT,
    ENDPOINT_ENV, SCHEMA_TOKEN_ENV, SCHEMA_URL_ENV,
};
pub use dispatch::{tracked_click_url, ClickPayload, Detached, EventDispatcher, VisitPayload};
pub use error::{ConfigError, DriftError, Rejection, SchemaLoadError, TransportError};
pub use normalize::TIER_ALIASES;
pub use request::{ClickRequest, PageContext, VisitRequest};
pub use schema::{Schema, SlugPattern};
pub use store::SchemaStore;
pub use tracker::{Analytics, AnalyticsBuilder};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportFuture};
pub use validate::{validate_click, validate_visit, PlanSelection, ValidatedClick, ValidatedVisit};
