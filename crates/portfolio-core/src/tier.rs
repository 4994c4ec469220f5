//! Price identifier to plan tier resolution.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Free,
    Lite,
    Starter,
    Growth,
    Enterprise,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "FREE"),
            Tier::Lite => write!(f, "LITE"),
            Tier::Starter => write!(f, "STARTER"),
            Tier::Growth => write!(f, "GROWTH"),
            Tier::Enterprise => write!(f, "ENTERPRISE"),
        }
    }
}

/// Tier assumed for a paid price id the table does not know.
pub const FALLBACK_TIER: Tier = Tier::Starter;

/// Configured mapping of billing price ids to tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierTable {
    prices: HashMap<String, Tier>,
    extra_seat_price_id: Option<String>,
}

impl TierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, price_id: impl Into<String>, tier: Tier) -> Self {
        self.insert(price_id, tier);
        self
    }

    pub fn with_extra_seat_price(mut self, price_id: impl Into<String>) -> Self {
        self.extra_seat_price_id = Some(price_id.into());
        self
    }

    pub fn insert(&mut self, price_id: impl Into<String>, tier: Tier) {
        let price_id = price_id.into();
        let price_id = price_id.trim();
        if !price_id.is_empty() {
            self.prices.insert(price_id.to_string(), tier);
        }
    }

    pub fn set_extra_seat_price(&mut self, price_id: Option<String>) {
        self.extra_seat_price_id = price_id.filter(|p| !p.trim().is_empty());
    }

    /// Add-on seat price that never counts as a primary plan.
    pub fn extra_seat_price_id(&self) -> Option<&str> {
        self.extra_seat_price_id.as_deref()
    }

    /// No price id means FREE; an unknown price id is assumed to be some paid
    /// plan and resolves to [`FALLBACK_TIER`].
    pub fn resolve(&self, price_id: Option<&str>) -> Tier {
        match price_id.map(str::trim).filter(|p| !p.is_empty()) {
            None => Tier::Free,
            Some(p) => self.prices.get(p).copied().unwrap_or(FALLBACK_TIER),
        }
    }
}
