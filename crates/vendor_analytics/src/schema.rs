use std::collections::BTreeSet;

use fancy_regex::Regex;
use serde_json::{Map, Value};

use crate::error::SchemaLoadError;

pub const PAGES_KEY: &str = "allowedPages";
pub const PLANS_KEY: &str = "allowedPlans";
pub const LEGACY_TIERS_KEY: &str = "allowedTiers";
pub const PLACEMENTS_KEY: &str = "allowedPlacements";
pub const CLICK_TYPES_KEY: &str = "allowedClickTypes";
pub const SLUG_REGEX_KEY: &str = "vendorSlugRegex";
const RESOLVED_KEY: &str = "resolved";

/// A vendor slug pattern anchored so that it must match the whole slug.
///
/// Patterns are shared with the browser site, so look-around such as
/// `^(?!admin$)[a-z0-9-]+$` is accepted.
#[derive(Clone, Debug)]
pub struct SlugPattern {
    source: String,
    anchored: Regex,
}

impl SlugPattern {
    pub fn new(source: &str) -> Result<Self, fancy_regex::Error> {
        let anchored = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// A pattern that exceeds the backtracking limit counts as a mismatch.
    pub fn is_full_match(&self, slug: &str) -> bool {
        matches!(self.anchored.is_match(slug), Ok(true))
    }
}

impl PartialEq for SlugPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Allowlists every event is validated against. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pages: BTreeSet<String>,
    plans: BTreeSet<String>,
    placements: BTreeSet<String>,
    click_types: BTreeSet<String>,
    slug_pattern: Option<SlugPattern>,
}

impl Schema {
    /// The fail-closed schema: every set empty and no slug pattern, so nothing validates.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SchemaLoadError> {
        let document: Value = serde_json::from_slice(bytes)?;
        Self::from_document(&document)
    }

    /// Builds a schema from a parsed schema document.
    ///
    /// Keys are read from the top level first, then from a nested `resolved` block.
    /// `allowedPlans` wins over the legacy `allowedTiers` when both are present.
    pub fn from_document(document: &Value) -> Result<Self, SchemaLoadError> {
        let root = document.as_object().ok_or(SchemaLoadError::NotAnObject)?;

        let plans = match lookup(root, PLANS_KEY) {
            Some(value) => string_set(value, PLANS_KEY)?,
            None => lookup(root, LEGACY_TIERS_KEY)
                .map(|value| string_set(value, LEGACY_TIERS_KEY))
                .transpose()?
                .unwrap_or_default(),
        };

        let slug_pattern = match lookup(root, SLUG_REGEX_KEY) {
            None => None,
            Some(Value::String(pattern)) => {
                Some(
                    SlugPattern::new(pattern).map_err(|source| SchemaLoadError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })?,
                )
            }
            Some(_) => return Err(SchemaLoadError::PatternNotAString),
        };

        Ok(Self {
            pages: optional_set(root, PAGES_KEY)?,
            plans,
            placements: optional_set(root, PLACEMENTS_KEY)?,
            click_types: optional_set(root, CLICK_TYPES_KEY)?,
            slug_pattern,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
            && self.plans.is_empty()
            && self.placements.is_empty()
            && self.click_types.is_empty()
            && self.slug_pattern.is_none()
    }

    pub fn allowed_pages(&self) -> &BTreeSet<String> {
        &self.pages
    }

    pub fn allowed_plans(&self) -> &BTreeSet<String> {
        &self.plans
    }

    pub fn allowed_placements(&self) -> &BTreeSet<String> {
        &self.placements
    }

    pub fn allowed_click_types(&self) -> &BTreeSet<String> {
        &self.click_types
    }

    pub fn slug_pattern(&self) -> Option<&SlugPattern> {
        self.slug_pattern.as_ref()
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let present = |value: &&Value| !value.is_null();
    root.get(key).filter(present).or_else(|| {
        root.get(RESOLVED_KEY)
            .and_then(Value::as_object)
            .and_then(|resolved| resolved.get(key))
            .filter(present)
    })
}

fn optional_set(
    root: &Map<String, Value>,
    key: &'static str,
) -> Result<BTreeSet<String>, SchemaLoadError> {
    lookup(root, key)
        .map(|value| string_set(value, key))
        .transpose()
        .map(Option::unwrap_or_default)
}

fn string_set(value: &Value, key: &'static str) -> Result<BTreeSet<String>, SchemaLoadError> {
    let items = value.as_array().ok_or(SchemaLoadError::NotAList { key })?;
    Ok(items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}
