use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::utils::IsTransient;

mod memory;

pub use memory::InMemoryOrderStore;

// ============================================================================
// Order Store - Persistence Boundary
// ============================================================================
//
// The store exposes create, point-read, optimistic read-modify-write, and
// exactly one conditional-update primitive: the delivery claim. Everything
// except the claim is single-actor-gated by role and ownership, so plain
// versioned updates suffice there.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found: {order_id}")]
    NotFound { order_id: Uuid },

    #[error("order already exists: {order_id}")]
    DuplicateOrder { order_id: Uuid },

    #[error("version conflict on order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        order_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// The claim precondition did not hold at write time. `assigned` tells
    /// whether a partner reference was already present.
    #[error("order {order_id} not claimable (status {status}, assigned: {assigned})")]
    ClaimRejected {
        order_id: Uuid,
        status: OrderStatus,
        assigned: bool,
    },
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Field subset written by the claim primitive, prepared by the command
/// handler before the store applies it atomically.
#[derive(Debug, Clone)]
pub struct ClaimUpdate {
    pub partner_ref: Uuid,
    pub picked_up_at: DateTime<Utc>,
}

/// Listing scopes: one per actor kind, plus the claim feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    ByCustomer(Uuid),
    ByRestaurant(Uuid),
    ByDeliveryPartner(Uuid),
    /// Ready for pickup and unassigned; what delivery partners poll
    /// between claims. Served oldest placement first so the
    /// longest-waiting order is picked up next.
    Claimable,
    All,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a freshly placed order.
    async fn insert(&self, order: Order) -> Result<Order, StoreError>;

    /// Point read of the current committed snapshot.
    async fn get(&self, order_id: Uuid) -> Result<Order, StoreError>;

    /// Replace the snapshot if the stored version still matches
    /// `expected_version`; the committed copy carries the bumped version.
    async fn update(&self, order: Order, expected_version: i64) -> Result<Order, StoreError>;

    /// The single atomic conditional update: assign the partner and mark the
    /// order picked up if and only if, at the moment of the write, it is
    /// still ready for pickup and unassigned. Exactly one concurrent caller
    /// can succeed.
    async fn claim(&self, order_id: Uuid, update: ClaimUpdate) -> Result<Order, StoreError>;

    /// Committed snapshots in scope, newest placement first.
    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError>;
}
