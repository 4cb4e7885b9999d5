use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::Order;
use super::errors::OrderError;
use super::value_objects::{Actor, ActorRole, OrderStatus};

// ============================================================================
// Transition Validator / Authorization Gate
// ============================================================================
//
// Pure decision logic: given the current snapshot, the requested lifecycle
// event and the acting identity, either name the resulting status or reject.
// Nothing here mutates state; the command handler commits only after this
// gate has passed.
//
// ============================================================================

/// Events that drive the order state machine. `Rate` never appears in the
/// edge table; it exists so rejections of out-of-place rating calls can name
/// the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Confirm,
    Reject,
    StartPreparing,
    MarkReady,
    Claim,
    Dispatch,
    Deliver,
    Cancel,
    Rate,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::StartPreparing => "start_preparing",
            Self::MarkReady => "mark_ready",
            Self::Claim => "claim",
            Self::Dispatch => "dispatch",
            Self::Deliver => "deliver",
            Self::Cancel => "cancel",
            Self::Rate => "rate",
        };
        f.write_str(s)
    }
}

/// The directed edge table. Cancellation stops being possible once pickup is
/// imminent: committed preparation and delivery effort are not unwound.
pub fn target_status(current: OrderStatus, event: LifecycleEvent) -> Option<OrderStatus> {
    use LifecycleEvent as E;
    use OrderStatus as S;

    match (current, event) {
        (S::Pending, E::Confirm) => Some(S::Confirmed),
        (S::Pending, E::Reject) => Some(S::Rejected),
        (S::Pending, E::Cancel) => Some(S::Cancelled),
        (S::Confirmed, E::StartPreparing) => Some(S::Preparing),
        (S::Confirmed, E::Cancel) => Some(S::Cancelled),
        (S::Preparing, E::MarkReady) => Some(S::ReadyForPickup),
        (S::Preparing, E::Cancel) => Some(S::Cancelled),
        (S::ReadyForPickup, E::Claim) => Some(S::PickedUp),
        (S::PickedUp, E::Dispatch) => Some(S::OutForDelivery),
        (S::OutForDelivery, E::Deliver) => Some(S::Delivered),
        _ => None,
    }
}

/// Combined role/ownership and edge check. `restaurant_owner` is the owner
/// of the order's restaurant as resolved from the catalog by the caller; the
/// actor's role claim alone is never sufficient.
///
/// Admin passes the ownership checks for every event but remains subject to
/// the same edges. Claiming stays exclusive to delivery partners because the
/// claim records the caller as the assigned partner.
pub fn authorize(
    order: &Order,
    event: LifecycleEvent,
    actor: &Actor,
    restaurant_owner: Option<Uuid>,
) -> Result<OrderStatus, OrderError> {
    check_actor(order, event, actor, restaurant_owner)?;

    target_status(order.status, event).ok_or(OrderError::InvalidTransition {
        current: order.status,
        event,
    })
}

fn check_actor(
    order: &Order,
    event: LifecycleEvent,
    actor: &Actor,
    restaurant_owner: Option<Uuid>,
) -> Result<(), OrderError> {
    use LifecycleEvent as E;

    match event {
        E::Confirm | E::Reject | E::StartPreparing | E::MarkReady => match actor.role {
            ActorRole::Admin => Ok(()),
            ActorRole::RestaurantOwner if restaurant_owner == Some(actor.id) => Ok(()),
            ActorRole::RestaurantOwner => Err(OrderError::NotRestaurantOwner),
            role => Err(OrderError::RoleNotAllowed { role }),
        },
        E::Claim => match actor.role {
            ActorRole::DeliveryPartner => Ok(()),
            role => Err(OrderError::RoleNotAllowed { role }),
        },
        E::Dispatch | E::Deliver => match actor.role {
            ActorRole::Admin => Ok(()),
            ActorRole::DeliveryPartner if order.delivery_partner_ref == Some(actor.id) => Ok(()),
            ActorRole::DeliveryPartner => Err(OrderError::NotAssignedPartner),
            role => Err(OrderError::RoleNotAllowed { role }),
        },
        E::Cancel => match actor.role {
            ActorRole::Admin => Ok(()),
            ActorRole::Customer if order.customer_ref == Some(actor.id) => Ok(()),
            ActorRole::Customer => Err(OrderError::NotOrderCustomer),
            role => Err(OrderError::RoleNotAllowed { role }),
        },
        // Rating is validated by the command handler; it has no edge.
        E::Rate => Err(OrderError::InvalidTransition {
            current: order.status,
            event,
        }),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
