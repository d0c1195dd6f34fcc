//! Canonical forms for untrusted event fields.
//!
//! Every function accepts a raw JSON value because event fields originate in page
//! markup and URLs: anything that is not a string normalizes to the empty string
//! (or the empty set), which the validator then rejects.

use std::collections::BTreeSet;

use serde_json::Value;

/// Legacy tier spellings and the plan vocabulary they map onto.
pub const TIER_ALIASES: &[(&str, &str)] = &[("paid", "basic"), ("free", "unpaid")];

fn as_text(raw: &Value) -> Option<&str> {
    raw.as_str()
}

fn lower_trimmed(raw: &Value) -> String {
    as_text(raw)
        .map(|text| text.trim().to_lowercase())
        .unwrap_or_default()
}

/// Slugifies a vendor identifier: lowercase ASCII alphanumerics separated by single hyphens.
pub fn normalize_vendor_slug(raw: &Value) -> String {
    as_text(raw).map(slugify).unwrap_or_default()
}

pub(crate) fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_hyphen = true;
            continue;
        }
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit()) {
            continue;
        }
        if pending_hyphen && !slug.is_empty() {
            slug.push('-');
        }
        pending_hyphen = false;
        slug.push(ch);
    }

    slug
}

pub fn normalize_page(raw: &Value) -> String {
    lower_trimmed(raw)
}

pub fn normalize_plan(raw: &Value) -> String {
    lower_trimmed(raw)
}

pub fn normalize_click_type(raw: &Value) -> String {
    lower_trimmed(raw)
}

/// Lowercases a tier and maps legacy spellings through [`TIER_ALIASES`].
pub fn normalize_tier(raw: &Value) -> String {
    let tier = lower_trimmed(raw);
    TIER_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == tier)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(tier)
}

/// Accepts a list of strings or a comma-delimited string.
pub fn normalize_placements(raw: &Value) -> BTreeSet<String> {
    let items: Vec<&str> = match raw {
        Value::String(text) => text.split(',').collect(),
        Value::Array(values) => values.iter().filter_map(as_text).collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
