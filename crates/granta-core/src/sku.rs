//! SKU catalog and billing-plan mapping.
//!
//! The reconciler cares about a fixed catalog of marketplace SKUs plus one
//! designated free-tier SKU granted to non-paying customers. Billing plans
//! map to at most one catalog SKU; a plan without a mapping means there is
//! nothing to grant for it.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::PlanId;

/// The SKU granted to customers who are not paying for any plan.
pub const FREE_TIER_SKU: &str = "MW04192";

/// Every SKU the reconciler manages, free tier included.
pub const RECONCILER_SKUS: [&str; 5] = ["MW00584", "MW02701", "MW02702", "MW04770", FREE_TIER_SKU];

/// A marketplace catalog code identifying a grantable entitlement product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Creates a SKU from its catalog code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The designated free-tier SKU.
    #[must_use]
    pub fn free_tier() -> Self {
        Self(FREE_TIER_SKU.to_string())
    }

    /// Returns the catalog code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the free-tier SKU.
    #[must_use]
    pub fn is_free_tier(&self) -> bool {
        self.0 == FREE_TIER_SKU
    }
}

impl Display for Sku {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Sku {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// Iterate the full reconciler SKU catalog.
pub fn catalog() -> impl Iterator<Item = Sku> {
    RECONCILER_SKUS.iter().map(|code| Sku::from(*code))
}

/// A billing-provider plan, optionally mapped to one catalog SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Billing-provider plan identifier.
    pub id: &'static str,
    /// The catalog SKU this plan entitles, if any.
    pub sku: Option<&'static str>,
}

impl Plan {
    /// The SKU this plan entitles, if the plan has a mapping.
    #[must_use]
    pub fn sku(&self) -> Option<Sku> {
        self.sku.map(Sku::from)
    }
}

/// Known billing plans. Legacy plans without a marketplace counterpart
/// carry no SKU and trigger no entitlement creation.
const PLANS: &[Plan] = &[
    Plan {
        id: "free",
        sku: None,
    },
    Plan {
        id: "personal-30",
        sku: None,
    },
    Plan {
        id: "personal-2018",
        sku: Some("MW00584"),
    },
    Plan {
        id: "bus-micro-2018",
        sku: Some("MW02701"),
    },
    Plan {
        id: "bus-small-2018",
        sku: Some("MW02702"),
    },
    Plan {
        id: "bus-medium-2018",
        sku: Some("MW04770"),
    },
];

/// Look up a plan by its billing-provider identifier.
#[must_use]
pub fn plan_for_id(plan_id: &PlanId) -> Option<&'static Plan> {
    PLANS.iter().find(|plan| plan.id == plan_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_is_in_catalog() {
        assert!(catalog().any(|sku| sku.is_free_tier()));
    }

    #[test]
    fn mapped_plan_skus_are_in_catalog() {
        for plan in PLANS {
            if let Some(sku) = plan.sku() {
                assert!(
                    catalog().any(|catalog_sku| catalog_sku == sku),
                    "plan {} maps to unknown SKU {sku}",
                    plan.id
                );
            }
        }
    }

    #[test]
    fn unknown_plan_has_no_mapping() {
        assert!(plan_for_id(&PlanId::new("enterprise-1999")).is_none());
    }

    #[test]
    fn legacy_plan_maps_to_no_sku() {
        let plan = plan_for_id(&PlanId::new("personal-30")).unwrap();
        assert!(plan.sku().is_none());
    }

    #[test]
    fn paid_plan_maps_to_its_sku() {
        let plan = plan_for_id(&PlanId::new("bus-small-2018")).unwrap();
        assert_eq!(plan.sku(), Some(Sku::new("MW02702")));
    }
}
