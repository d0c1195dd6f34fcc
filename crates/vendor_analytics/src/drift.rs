//! Baked-vs-live schema comparison used by `xtask analytics-drift`.

use std::{collections::BTreeSet, fs, path::Path};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{error::DriftError, transport::Transport};

/// Schema keys that make up the analytics contract, in report order.
pub const DRIFT_KEYS: &[&str] = &[
    "allowedPages",
    "allowedTiers",
    "allowedClickTypes",
    "vendorSlugRegex",
    "internalDomains",
    "plans",
    "placements",
    "apiVersion",
];

/// One contract key whose baked and live values differ.
///
/// List-valued keys are reported in their normalized (sorted, unique) form.
/// `None` means the key is absent from that side.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DriftEntry {
    pub key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baked: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<Value>,
}

impl DriftEntry {
    pub fn to_human_line(&self) -> String {
        format!(
            " - {}: baked={} live={}",
            self.key,
            compact_json(self.baked.as_ref()),
            compact_json(self.live.as_ref())
        )
    }
}

fn compact_json(value: Option<&Value>) -> String {
    value.map_or_else(|| "undefined".to_string(), Value::to_string)
}

/// Terminal states of a drift check.
#[derive(Debug)]
pub enum DriftOutcome {
    Match,
    Drift(Vec<DriftEntry>),
    Failed(DriftError),
}

impl DriftOutcome {
    /// Process exit status: only a clean match is zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Match => 0,
            Self::Drift(_) | Self::Failed(_) => 1,
        }
    }
}

/// Trimmed, deduplicated, sorted view of a list value; anything else is empty.
pub fn normalize_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => text.trim().to_string(),
            other => other.to_string().trim().to_string(),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Compares the contract keys of two schema documents.
pub fn diff_contract(baked: &Value, live: &Value) -> Vec<DriftEntry> {
    let mut diffs = Vec::new();
    for &key in DRIFT_KEYS {
        let a = baked.get(key);
        let b = live.get(key);
        let is_list = |v: Option<&Value>| matches!(v, Some(Value::Array(_)));
        if is_list(a) || is_list(b) {
            let a_list = normalize_list(a);
            let b_list = normalize_list(b);
            if a_list != b_list {
                diffs.push(DriftEntry {
                    key,
                    baked: Some(Value::from(a_list)),
                    live: Some(Value::from(b_list)),
                });
            }
        } else if a != b {
            diffs.push(DriftEntry {
                key,
                baked: a.cloned(),
                live: b.cloned(),
            });
        }
    }
    diffs
}

pub fn read_baked_schema(path: &Path) -> Result<Value, DriftError> {
    let raw = fs::read(path).map_err(|source| DriftError::BakedRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| DriftError::BakedParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Fetches the live schema document. HTML bodies are reported separately from
/// ordinary HTTP failures since they usually mean a challenge page sat in front.
pub async fn fetch_live_schema(
    transport: &dyn Transport,
    url: &str,
    bearer: Option<&str>,
) -> Result<Value, DriftError> {
    debug!(%url, authenticated = bearer.is_some(), "fetching live analytics schema");
    let response = transport
        .get(url.to_string(), bearer.map(str::to_string))
        .await?;
    if response.looks_like_html() {
        warn!(%url, status = response.status, "live schema request answered with HTML");
        return Err(DriftError::HtmlChallenge {
            status: response.status,
        });
    }
    if !response.is_success() {
        warn!(%url, status = response.status, "live schema request failed");
        return Err(DriftError::Status {
            status: response.status,
        });
    }
    serde_json::from_slice(&response.body).map_err(DriftError::LiveParse)
}

/// Runs the whole check: read baseline, fetch live, compare.
pub async fn check_drift(
    transport: &dyn Transport,
    baked_path: &Path,
    url: &str,
    bearer: Option<&str>,
) -> DriftOutcome {
    let baked = match read_baked_schema(baked_path) {
        Ok(baked) => baked,
        Err(error) => return DriftOutcome::Failed(error),
    };
    let live = match fetch_live_schema(transport, url, bearer).await {
        Ok(live) => live,
        Err(error) => return DriftOutcome::Failed(error),
    };
    let diffs = diff_contract(&baked, &live);
    if diffs.is_empty() {
        DriftOutcome::Match
    } else {
        DriftOutcome::Drift(diffs)
    }
}
