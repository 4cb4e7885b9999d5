use uuid::Uuid;

use crate::storage::StoreError;
use crate::utils::IsTransient;

use super::transitions::LifecycleEvent;
use super::value_objects::{ActorRole, Money, OrderStatus};

// ============================================================================
// Order Rejections
// ============================================================================
//
// Every command returns either the updated order snapshot or exactly one of
// these. No variant is ever paired with a partial state change.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    // Input validation
    #[error("order must contain at least one item")]
    EmptyItems,

    #[error("invalid item quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },

    #[error("negative amount: {amount}")]
    NegativeAmount { amount: Money },

    #[error("discount exceeds the order total")]
    DiscountExceedsTotal,

    #[error("restaurant not found: {restaurant_ref}")]
    UnknownRestaurant { restaurant_ref: Uuid },

    #[error("restaurant {restaurant_ref} is not accepting orders")]
    RestaurantNotAcceptingOrders { restaurant_ref: Uuid },

    #[error("catalog item not found: {item_ref}")]
    UnknownItem { item_ref: Uuid },

    #[error("item {item_ref} does not belong to restaurant {restaurant_ref}")]
    ItemNotFromRestaurant { item_ref: Uuid, restaurant_ref: Uuid },

    #[error("item {item_ref} is currently unavailable")]
    ItemUnavailable { item_ref: Uuid },

    #[error("unknown customization {name:?} for item {item_ref}")]
    UnknownCustomization { item_ref: Uuid, name: String },

    #[error("coupon code {code:?} is not valid")]
    InvalidCoupon { code: String },

    #[error("coupon {code:?} requires a subtotal of at least {min_subtotal}")]
    CouponMinimumNotMet { code: String, min_subtotal: Money },

    #[error("rating score out of range: {score}")]
    RatingOutOfRange { score: u8 },

    #[error("customer reference does not match the placing actor")]
    CustomerMismatch,

    // Authorization
    #[error("actor is not the owner of the order's restaurant")]
    NotRestaurantOwner,

    #[error("actor is not the delivery partner assigned to this order")]
    NotAssignedPartner,

    #[error("actor is not the customer who placed this order")]
    NotOrderCustomer,

    #[error("role {role} may not perform this operation")]
    RoleNotAllowed { role: ActorRole },

    // State machine. Carries the current status so the caller can resync.
    #[error("{event} is not legal while the order is {current}")]
    InvalidTransition {
        current: OrderStatus,
        event: LifecycleEvent,
    },

    // Single-winner delivery claim
    #[error("order {order_id} is already assigned to a delivery partner")]
    ClaimConflict { order_id: Uuid },

    #[error("order not found: {order_id}")]
    NotFound { order_id: Uuid },

    #[error("order {order_id} has already been rated")]
    AlreadyRated { order_id: Uuid },

    // Persistence failures that survived the domain mapping below
    #[error(transparent)]
    Store(StoreError),
}

/// The closed rejection taxonomy exposed to transports and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    Validation,
    Authorization,
    InvalidTransition,
    ClaimConflict,
    NotFound,
    AlreadyRated,
    Transient,
}

impl OrderError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::EmptyItems
            | Self::InvalidQuantity { .. }
            | Self::NegativeAmount { .. }
            | Self::DiscountExceedsTotal
            | Self::UnknownRestaurant { .. }
            | Self::RestaurantNotAcceptingOrders { .. }
            | Self::UnknownItem { .. }
            | Self::ItemNotFromRestaurant { .. }
            | Self::ItemUnavailable { .. }
            | Self::UnknownCustomization { .. }
            | Self::InvalidCoupon { .. }
            | Self::CouponMinimumNotMet { .. }
            | Self::RatingOutOfRange { .. }
            | Self::CustomerMismatch => RejectionKind::Validation,

            Self::NotRestaurantOwner
            | Self::NotAssignedPartner
            | Self::NotOrderCustomer
            | Self::RoleNotAllowed { .. } => RejectionKind::Authorization,

            Self::InvalidTransition { .. } => RejectionKind::InvalidTransition,
            Self::ClaimConflict { .. } => RejectionKind::ClaimConflict,
            Self::NotFound { .. } => RejectionKind::NotFound,
            Self::AlreadyRated { .. } => RejectionKind::AlreadyRated,
            Self::Store(_) => RejectionKind::Transient,
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { order_id } => Self::NotFound { order_id },
            // The claim primitive reports what it saw at write time: an
            // already-assigned order lost the race; an unassigned order in
            // the wrong status was never claimable.
            StoreError::ClaimRejected {
                order_id,
                status,
                assigned,
            } => {
                if assigned {
                    Self::ClaimConflict { order_id }
                } else {
                    Self::InvalidTransition {
                        current: status,
                        event: LifecycleEvent::Claim,
                    }
                }
            }
            other => Self::Store(other),
        }
    }
}

impl IsTransient for OrderError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
