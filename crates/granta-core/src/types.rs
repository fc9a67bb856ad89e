//! Domain entities exchanged between the reconciler and its collaborators.

use serde::{Deserialize, Serialize};

use crate::ids::{BillingReference, CustomerId, PlanId, SubscriptionId, UserId};
use crate::sku::Sku;

/// A user account as seen by the reconciler.
///
/// Owned by the identity store; immutable for the engine's purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier in the local identity store.
    pub id: UserId,

    /// Login name, used only for log context.
    pub username: String,

    /// Email address used to look up marketplace customer ids.
    pub email: String,

    /// Reference to the user's billing-provider customer record, if the
    /// user ever entered a billing relationship.
    pub billing_reference: Option<BillingReference>,
}

/// A marketplace-held (customer id, SKU) grant.
///
/// A customer may hold more than one record for the same SKU; duplicate
/// state is a recognized anomaly the reconciler cleans up, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Opaque identifier used to remove this record.
    pub id: SubscriptionId,

    /// The customer holding the grant.
    pub customer_id: CustomerId,

    /// The granted SKU.
    pub sku: Sku,
}

/// The active subscription on a billing-provider customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSubscription {
    /// The plan the customer is subscribed to.
    pub plan_id: PlanId,
}

/// A billing-provider customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCustomer {
    /// The reference this record was retrieved with.
    pub reference: BillingReference,

    /// The customer's active subscription, absent if they cancelled or
    /// never subscribed.
    pub subscription: Option<BillingSubscription>,
}
