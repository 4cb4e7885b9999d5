use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::PricingBreakdown;
use super::value_objects::{
    Actor, Cancellation, DeliveryAddress, LineItem, Milestones, PaymentInfo, PaymentMethod,
    PaymentStatus, Rating, StatusEntry,
};
use super::OrderStatus;

// ============================================================================
// Order Aggregate
// ============================================================================
//
// The order plus its line items, pricing snapshot, status history and
// milestones form one consistency unit: every mutation below is applied to
// an in-memory copy and committed to the store as a whole, or not at all.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub version: i64,

    pub customer_ref: Option<Uuid>,
    pub restaurant_ref: Uuid,
    pub line_items: Vec<LineItem>,
    pub pricing: PricingBreakdown,
    /// Promotion behind `pricing.discount`, when one was applied.
    pub coupon_code: Option<String>,
    pub delivery_address: DeliveryAddress,
    pub payment: PaymentInfo,
    pub special_instructions: Option<String>,

    pub status: OrderStatus,
    pub status_history: Vec<StatusEntry>,
    pub milestones: Milestones,

    pub delivery_partner_ref: Option<Uuid>,
    pub cancellation: Option<Cancellation>,
    pub rating: Option<Rating>,

    pub placed_at: DateTime<Utc>,
}

/// Validated placement data. The command handler resolves catalog snapshots
/// and pricing before constructing this.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_ref: Option<Uuid>,
    pub restaurant_ref: Uuid,
    pub line_items: Vec<LineItem>,
    pub pricing: PricingBreakdown,
    pub coupon_code: Option<String>,
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub special_instructions: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order with its first history entry. For guest
    /// checkout the history entry carries no actor reference.
    pub fn place(new: NewOrder) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number: generate_order_number(new.placed_at),
            version: 1,
            customer_ref: new.customer_ref,
            restaurant_ref: new.restaurant_ref,
            line_items: new.line_items,
            pricing: new.pricing,
            coupon_code: new.coupon_code,
            delivery_address: new.delivery_address,
            payment: PaymentInfo::recorded(new.payment_method),
            special_instructions: new.special_instructions,
            status: OrderStatus::Pending,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                timestamp: new.placed_at,
                note: Some("Order placed".to_string()),
                actor_ref: new.customer_ref,
            }],
            milestones: Milestones::default(),
            delivery_partner_ref: None,
            cancellation: None,
            rating: None,
            placed_at: new.placed_at,
        }
    }

    /// Move to `target` and append the matching history entry and milestone.
    /// Callers must have validated the transition; this only records it.
    pub fn apply_transition(
        &mut self,
        target: OrderStatus,
        actor: &Actor,
        note: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.status = target;
        self.milestones.record(target, at);
        self.status_history.push(StatusEntry {
            status: target,
            timestamp: at,
            note,
            actor_ref: Some(actor.id),
        });
    }

    /// Cancel the order, recording who cancelled and any refund due. A
    /// payment that was recorded as completed flips to refunded in the same
    /// snapshot.
    pub fn record_cancellation(&mut self, actor: &Actor, reason: String, at: DateTime<Utc>) {
        let refund_amount = if self.payment.status == PaymentStatus::Completed {
            self.payment.status = PaymentStatus::Refunded;
            self.pricing.total
        } else {
            0
        };
        self.cancellation = Some(Cancellation {
            reason: reason.clone(),
            cancelled_by: actor.role,
            cancelled_at: at,
            refund_amount,
        });
        self.apply_transition(OrderStatus::Cancelled, actor, Some(reason), at);
    }

    pub fn record_rating(&mut self, rating: Rating) {
        self.rating = Some(rating);
    }

    /// A delivery partner may claim this order exclusively.
    pub fn is_claimable(&self) -> bool {
        self.status == OrderStatus::ReadyForPickup && self.delivery_partner_ref.is_none()
    }

    /// Assign the winning partner and mark the order picked up. Invoked by
    /// the store inside its atomic conditional update, never directly by
    /// command handling code.
    pub fn apply_claim(&mut self, partner_ref: Uuid, at: DateTime<Utc>) {
        self.delivery_partner_ref = Some(partner_ref);
        self.status = OrderStatus::PickedUp;
        self.milestones.record(OrderStatus::PickedUp, at);
        self.status_history.push(StatusEntry {
            status: OrderStatus::PickedUp,
            timestamp: at,
            note: Some("Order picked up by delivery partner".to_string()),
            actor_ref: Some(partner_ref),
        });
    }

    pub fn last_history_entry(&self) -> &StatusEntry {
        // The constructor writes the first entry, so the history is never empty.
        self.status_history
            .last()
            .expect("order history has at least the placement entry")
    }
}

/// Human-readable, globally unique order number. The date prefix keeps it
/// readable; the UUID-derived suffix keeps concurrent placements from ever
/// colliding.
fn generate_order_number(placed_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("UE{}-{}", placed_at.format("%y%m%d"), suffix)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::pricing::{compute_pricing, PricingConfig};
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn test_address() -> DeliveryAddress {
        DeliveryAddress {
            name: "Asha Rao".to_string(),
            phone: "98450-12345".to_string(),
            street: "Hostel Block C, Room 214".to_string(),
            city: "Bengaluru".to_string(),
            landmark: None,
            coordinates: None,
        }
    }

    fn placed_order() -> Order {
        let items = vec![LineItem::new(
            Uuid::new_v4(),
            "Veg Thali".to_string(),
            150,
            2,
            vec![],
            None,
        )];
        let pricing = compute_pricing(&items, 0, &PricingConfig::default()).unwrap();
        Order::place(NewOrder {
            customer_ref: Some(Uuid::new_v4()),
            restaurant_ref: Uuid::new_v4(),
            line_items: items,
            pricing,
            coupon_code: None,
            delivery_address: test_address(),
            payment_method: PaymentMethod::Upi,
            special_instructions: None,
            placed_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        })
    }

    #[test]
    fn test_place_starts_pending_with_history() {
        let order = placed_order();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.version, 1);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.last_history_entry().status, OrderStatus::Pending);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert!(order.delivery_partner_ref.is_none());
        assert!(order.order_number.starts_with("UE250601-"));
    }

    #[test]
    fn test_order_numbers_do_not_collide() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let numbers: HashSet<String> =
            (0..1000).map(|_| generate_order_number(now)).collect();
        assert_eq!(numbers.len(), 1000);
    }

    #[test]
    fn test_transition_appends_history_and_milestone() {
        let mut order = placed_order();
        let owner = Actor::restaurant_owner(Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap();

        order.apply_transition(OrderStatus::Confirmed, &owner, None, at);

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.status_history.len(), 2);
        assert_eq!(order.last_history_entry().status, OrderStatus::Confirmed);
        assert_eq!(order.last_history_entry().actor_ref, Some(owner.id));
        assert_eq!(order.milestones.confirmed, Some(at));
    }

    #[test]
    fn test_history_timestamps_non_decreasing_across_lifecycle() {
        let mut order = placed_order();
        let owner = Actor::restaurant_owner(Uuid::new_v4());
        let partner = Uuid::new_v4();
        let base = order.placed_at;

        order.apply_transition(
            OrderStatus::Confirmed,
            &owner,
            None,
            base + chrono::Duration::minutes(2),
        );
        order.apply_transition(
            OrderStatus::Preparing,
            &owner,
            None,
            base + chrono::Duration::minutes(4),
        );
        order.apply_transition(
            OrderStatus::ReadyForPickup,
            &owner,
            None,
            base + chrono::Duration::minutes(20),
        );
        order.apply_claim(partner, base + chrono::Duration::minutes(25));

        let timestamps: Vec<_> = order.status_history.iter().map(|e| e.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(order.last_history_entry().status, order.status);
    }

    #[test]
    fn test_claim_assigns_partner_and_picks_up() {
        let mut order = placed_order();
        let owner = Actor::restaurant_owner(Uuid::new_v4());
        let partner = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();

        order.apply_transition(OrderStatus::Confirmed, &owner, None, at);
        order.apply_transition(OrderStatus::Preparing, &owner, None, at);
        order.apply_transition(OrderStatus::ReadyForPickup, &owner, None, at);
        assert!(order.is_claimable());

        order.apply_claim(partner, at);

        assert!(!order.is_claimable());
        assert_eq!(order.status, OrderStatus::PickedUp);
        assert_eq!(order.delivery_partner_ref, Some(partner));
        assert_eq!(order.milestones.picked_up, Some(at));
        assert_eq!(order.last_history_entry().actor_ref, Some(partner));
    }

    #[test]
    fn test_cancellation_records_role_and_refund() {
        let mut order = placed_order();
        let customer = Actor::customer(order.customer_ref.unwrap());
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 10, 0).unwrap();

        order.record_cancellation(&customer, "Changed my mind".to_string(), at);

        assert_eq!(order.status, OrderStatus::Cancelled);
        let cancellation = order.cancellation.as_ref().unwrap();
        assert_eq!(cancellation.cancelled_by, crate::domain::order::ActorRole::Customer);
        // Payment was never captured, so nothing is refunded.
        assert_eq!(cancellation.refund_amount, 0);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_cancellation_refunds_completed_payment() {
        let mut order = placed_order();
        order.payment.status = PaymentStatus::Completed;
        let admin = Actor::admin(Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 10, 0).unwrap();

        order.record_cancellation(&admin, "Restaurant unreachable".to_string(), at);

        let cancellation = order.cancellation.as_ref().unwrap();
        assert_eq!(cancellation.refund_amount, order.pricing.total);
        assert_eq!(order.payment.status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_order_serializes_for_snapshot_readers() {
        let order = placed_order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
