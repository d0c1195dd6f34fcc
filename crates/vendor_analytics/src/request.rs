use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw visit fields as handed over by the page. Nothing here has been normalized or checked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitRequest {
    pub vendor: Value,
    pub page: Value,
    pub plan: Value,
    pub placements: Value,
    pub tier: Value,
}

impl VisitRequest {
    pub fn new(vendor: impl Into<Value>, page: impl Into<Value>) -> Self {
        Self {
            vendor: vendor.into(),
            page: page.into(),
            ..Self::default()
        }
    }

    pub fn plan(mut self, plan: impl Into<Value>) -> Self {
        self.plan = plan.into();
        self
    }

    /// Accepts a list of placement names or a comma-delimited string.
    pub fn placements(mut self, placements: impl Into<Value>) -> Self {
        self.placements = placements.into();
        self
    }

    pub fn tier(mut self, tier: impl Into<Value>) -> Self {
        self.tier = tier.into();
        self
    }
}

/// Raw outbound-click fields. `target` is the click type (`website`, `phone`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickRequest {
    pub vendor: Value,
    #[serde(alias = "type")]
    pub target: Value,
    pub tier: Value,
}

impl ClickRequest {
    pub fn new(vendor: impl Into<Value>, target: impl Into<Value>) -> Self {
        Self {
            vendor: vendor.into(),
            target: target.into(),
            tier: Value::Null,
        }
    }

    /// Click requests built without a vendor use one from the page.
    pub fn for_page(target: impl Into<Value>) -> Self {
        Self::new(Value::Null, target)
    }

    pub fn tier(mut self, tier: impl Into<Value>) -> Self {
        self.tier = tier.into();
        self
    }

    /// Fills in `vendor` when the request carries none.
    pub fn with_default_vendor(mut self, vendor: Option<&str>) -> Self {
        let missing = match &self.vendor {
            Value::Null => true,
            Value::String(text) => text.trim().is_empty(),
            _ => false,
        };
        if missing {
            if let Some(vendor) = vendor {
                self.vendor = Value::String(vendor.to_string());
            }
        }
        self
    }
}

/// Where the events are emitted from; merged into every wire payload.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PageContext {
    pub url: String,
    pub referrer: String,
    /// Vendor the page belongs to, used for clicks that do not name one.
    pub vendor: Option<String>,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }
}
