use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::Order;

use super::{ClaimUpdate, OrderFilter, OrderStore, StoreError};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Snapshot store backed by a single map guarded by one RwLock. The claim
// check-and-write runs entirely under the write guard, which is what makes
// it the store's one indivisible conditional update; a database-backed
// implementation would use a conditional UPDATE for the same effect.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder { order_id: order.id });
        }
        orders.insert(order.id, order.clone());

        tracing::debug!(order_id = %order.id, order_number = %order.order_number, "Order stored");
        Ok(order)
    }

    async fn get(&self, order_id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound { order_id })
    }

    async fn update(&self, mut order: Order, expected_version: i64) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get(&order.id)
            .ok_or(StoreError::NotFound { order_id: order.id })?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                order_id: order.id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        order.version = expected_version + 1;
        orders.insert(order.id, order.clone());

        tracing::debug!(
            order_id = %order.id,
            version = order.version,
            status = %order.status,
            "Order snapshot committed"
        );
        Ok(order)
    }

    async fn claim(&self, order_id: Uuid, update: ClaimUpdate) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound { order_id })?;

        if !stored.is_claimable() {
            return Err(StoreError::ClaimRejected {
                order_id,
                status: stored.status,
                assigned: stored.delivery_partner_ref.is_some(),
            });
        }

        stored.apply_claim(update.partner_ref, update.picked_up_at);
        stored.version += 1;

        tracing::debug!(
            order_id = %order_id,
            partner = %update.partner_ref,
            "Claim committed"
        );
        Ok(stored.clone())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|order| match filter {
                OrderFilter::ByCustomer(id) => order.customer_ref == Some(id),
                OrderFilter::ByRestaurant(id) => order.restaurant_ref == id,
                OrderFilter::ByDeliveryPartner(id) => order.delivery_partner_ref == Some(id),
                OrderFilter::Claimable => order.is_claimable(),
                OrderFilter::All => true,
            })
            .cloned()
            .collect();
        // The claim feed serves the longest-waiting order first; every other
        // listing is newest first.
        match filter {
            OrderFilter::Claimable => matched.sort_by(|a, b| a.placed_at.cmp(&b.placed_at)),
            _ => matched.sort_by(|a, b| b.placed_at.cmp(&a.placed_at)),
        }
        Ok(matched)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
