use std::collections::BTreeSet;

use crate::{
    error::Rejection,
    normalize::{
        normalize_click_type, normalize_page, normalize_placements, normalize_plan,
        normalize_tier, normalize_vendor_slug,
    },
    request::{ClickRequest, VisitRequest},
    schema::Schema,
};

/// Which listing level a visit reports. A plan always supersedes a tier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum PlanSelection {
    Plan(String),
    /// Legacy tier, already mapped through the alias table.
    Tier(String),
    #[default]
    Unspecified,
}

impl PlanSelection {
    /// Resolves normalized plan/tier values. Empty strings count as absent.
    pub fn resolve(plan: String, tier: String) -> Self {
        if !plan.is_empty() {
            Self::Plan(plan)
        } else if !tier.is_empty() {
            Self::Tier(tier)
        } else {
            Self::Unspecified
        }
    }

    pub fn plan(&self) -> Option<&str> {
        match self {
            Self::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn tier(&self) -> Option<&str> {
        match self {
            Self::Tier(tier) => Some(tier),
            _ => None,
        }
    }
}

/// A visit that passed every allowlist check; only these reach the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatedVisit {
    vendor: String,
    page: String,
    plan: PlanSelection,
    placements: BTreeSet<String>,
}

impl ValidatedVisit {
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn plan(&self) -> &PlanSelection {
        &self.plan
    }

    pub fn placements(&self) -> &BTreeSet<String> {
        &self.placements
    }
}

/// A click that passed validation. Tier never survives into a click.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatedClick {
    vendor: String,
    click_type: String,
}

impl ValidatedClick {
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn click_type(&self) -> &str {
        &self.click_type
    }
}

fn check_vendor(raw: &serde_json::Value, schema: &Schema) -> Result<String, Rejection> {
    let vendor = normalize_vendor_slug(raw);
    if vendor.is_empty() {
        return Err(Rejection::EmptyVendor);
    }
    let pattern = schema
        .slug_pattern()
        .ok_or(Rejection::MissingSlugPattern)?;
    if !pattern.is_full_match(&vendor) {
        return Err(Rejection::VendorPattern { vendor });
    }
    Ok(vendor)
}

/// Normalizes and checks a visit against `schema`. Fails closed on anything missing.
pub fn validate_visit(request: &VisitRequest, schema: &Schema) -> Result<ValidatedVisit, Rejection> {
    let vendor = check_vendor(&request.vendor, schema)?;

    let page = normalize_page(&request.page);
    if !schema.allowed_pages().contains(&page) {
        return Err(Rejection::PageNotAllowed { page });
    }

    let plan = PlanSelection::resolve(
        normalize_plan(&request.plan),
        normalize_tier(&request.tier),
    );
    match &plan {
        PlanSelection::Plan(plan) if !schema.allowed_plans().contains(plan) => {
            return Err(Rejection::PlanNotAllowed { plan: plan.clone() });
        }
        PlanSelection::Tier(tier) if !schema.allowed_plans().contains(tier) => {
            return Err(Rejection::TierNotAllowed { tier: tier.clone() });
        }
        _ => {}
    }

    let placements = normalize_placements(&request.placements);
    if let Some(placement) = placements
        .iter()
        .find(|placement| !schema.allowed_placements().contains(*placement))
    {
        return Err(Rejection::PlacementNotAllowed {
            placement: placement.clone(),
        });
    }

    Ok(ValidatedVisit {
        vendor,
        page,
        plan,
        placements,
    })
}

/// Normalizes and checks a click. `request.tier` is deliberately not consulted.
pub fn validate_click(request: &ClickRequest, schema: &Schema) -> Result<ValidatedClick, Rejection> {
    let vendor = check_vendor(&request.vendor, schema)?;

    let click_type = normalize_click_type(&request.target);
    if click_type.is_empty() {
        return Err(Rejection::EmptyClickType);
    }
    if !schema.allowed_click_types().contains(&click_type) {
        return Err(Rejection::ClickTypeNotAllowed { click_type });
    }

    Ok(ValidatedClick { vendor, click_type })
}
