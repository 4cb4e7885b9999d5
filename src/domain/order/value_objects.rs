use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Whole currency units (₹). All stored amounts are non-negative.
pub type Money = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    ReadyForPickup,
    PickedUp,
    OutForDelivery,
    Delivered,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Rejected)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::ReadyForPickup => "ready_for_pickup",
            Self::PickedUp => "picked_up",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Actors
// ============================================================================

/// Closed role set. Role claims come from the identity layer and are
/// advisory: ownership is re-checked against the order before any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    RestaurantOwner,
    DeliveryPartner,
    Admin,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Customer => "customer",
            Self::RestaurantOwner => "restaurant_owner",
            Self::DeliveryPartner => "delivery_partner",
            Self::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// Authenticated caller of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn customer(id: Uuid) -> Self {
        Self::new(id, ActorRole::Customer)
    }

    pub fn restaurant_owner(id: Uuid) -> Self {
        Self::new(id, ActorRole::RestaurantOwner)
    }

    pub fn delivery_partner(id: Uuid) -> Self {
        Self::new(id, ActorRole::DeliveryPartner)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, ActorRole::Admin)
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// A customization applied to a line item, priced from the catalog at
/// placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub name: String,
    pub choice: String,
    pub additional_price: Money,
}

/// One catalog item in the order, with name and prices snapshotted at
/// placement. The snapshot is immutable regardless of later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub catalog_item_ref: Uuid,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub customizations: Vec<Customization>,
    pub special_instructions: Option<String>,
    pub line_subtotal: Money,
}

impl LineItem {
    /// Customizations are per unit, so their prices multiply by quantity.
    pub fn new(
        catalog_item_ref: Uuid,
        name: String,
        unit_price: Money,
        quantity: u32,
        customizations: Vec<Customization>,
        special_instructions: Option<String>,
    ) -> Self {
        let per_unit: Money =
            unit_price + customizations.iter().map(|c| c.additional_price).sum::<Money>();
        let line_subtotal = per_unit * quantity as Money;
        Self {
            catalog_item_ref,
            name,
            unit_price,
            quantity,
            customizations,
            special_instructions,
            line_subtotal,
        }
    }
}

// ============================================================================
// Delivery Address
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub landmark: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

// ============================================================================
// Payment
// ============================================================================

/// Payment method is recorded, not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    NetBanking,
    Wallet,
    #[serde(rename = "cod")]
    CashOnDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

impl PaymentInfo {
    pub fn recorded(method: PaymentMethod) -> Self {
        Self {
            method,
            status: PaymentStatus::Pending,
        }
    }
}

// ============================================================================
// Status History
// ============================================================================

/// One entry in the append-only status history. The last entry's status
/// always equals the order's current status; timestamps never decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
    pub actor_ref: Option<Uuid>,
}

// ============================================================================
// Milestones
// ============================================================================

/// One optional timestamp per milestone status reached. Each slot is written
/// at most once; the state graph guarantees they fill in transition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    pub confirmed: Option<DateTime<Utc>>,
    pub preparation_started: Option<DateTime<Utc>>,
    pub ready_for_pickup: Option<DateTime<Utc>>,
    pub picked_up: Option<DateTime<Utc>>,
    pub out_for_delivery: Option<DateTime<Utc>>,
    pub delivered: Option<DateTime<Utc>>,
}

impl Milestones {
    /// Record the milestone for a newly reached status. Statuses without a
    /// milestone slot (pending, cancelled, rejected) are ignored, as is a
    /// slot that is already set.
    pub fn record(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        let slot = match status {
            OrderStatus::Confirmed => &mut self.confirmed,
            OrderStatus::Preparing => &mut self.preparation_started,
            OrderStatus::ReadyForPickup => &mut self.ready_for_pickup,
            OrderStatus::PickedUp => &mut self.picked_up,
            OrderStatus::OutForDelivery => &mut self.out_for_delivery,
            OrderStatus::Delivered => &mut self.delivered,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(at);
        }
    }
}

// ============================================================================
// Cancellation & Rating
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_by: ActorRole,
    pub cancelled_at: DateTime<Utc>,
    pub refund_amount: Money,
}

/// Scores are 1..=5; set at most once, only on a delivered order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub food: u8,
    pub delivery: u8,
    pub overall: u8,
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

// ============================================================================
// Unit Tests
// ============================================================================
