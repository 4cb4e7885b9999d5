use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::Money;

// ============================================================================
// Catalog Gateway - External Collaborator Boundary
// ============================================================================
//
// Restaurant onboarding and menu CRUD live outside this core. Order
// placement consults the catalog at call time and snapshots what it returns;
// cached or client-supplied prices are never trusted.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub active: bool,
    pub approved: bool,
}

impl RestaurantProfile {
    /// Only active, approved restaurants take orders.
    pub fn accepting_orders(&self) -> bool {
        self.active && self.approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizationOption {
    pub name: String,
    pub choice: String,
    pub additional_price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub restaurant_ref: Uuid,
    pub name: String,
    pub price: Money,
    /// Promotional sale price; must stay below `price` while set.
    pub discounted_price: Option<Money>,
    pub available: bool,
    pub options: Vec<CustomizationOption>,
}

impl CatalogItem {
    /// The unit price a new order pays right now.
    pub fn effective_price(&self) -> Money {
        self.discounted_price.unwrap_or(self.price)
    }
}

/// Platform promotion. Order discounts are derived from these records;
/// clients only ever name a code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount_amount: Money,
    /// Smallest subtotal the coupon applies to.
    pub min_subtotal: Money,
    pub active: bool,
}

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn restaurant(&self, id: Uuid) -> Option<RestaurantProfile>;

    async fn catalog_item(&self, id: Uuid) -> Option<CatalogItem>;

    /// Reverse lookup used when listing a restaurant owner's orders.
    async fn restaurant_for_owner(&self, owner_id: Uuid) -> Option<RestaurantProfile>;

    async fn coupon(&self, code: &str) -> Option<Coupon>;
}

// ============================================================================
// In-Memory Catalog
// ============================================================================

/// Catalog backed by process memory, for tests and the demo binary. The real
/// deployment points the gateway at the catalog service instead.
#[derive(Default)]
pub struct InMemoryCatalog {
    restaurants: RwLock<HashMap<Uuid, RestaurantProfile>>,
    items: RwLock<HashMap<Uuid, CatalogItem>>,
    coupons: RwLock<HashMap<String, Coupon>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_restaurant(&self, restaurant: RestaurantProfile) {
        self.restaurants
            .write()
            .await
            .insert(restaurant.id, restaurant);
    }

    pub async fn upsert_item(&self, item: CatalogItem) {
        self.items.write().await.insert(item.id, item);
    }

    pub async fn upsert_coupon(&self, coupon: Coupon) {
        self.coupons
            .write()
            .await
            .insert(coupon.code.clone(), coupon);
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn restaurant(&self, id: Uuid) -> Option<RestaurantProfile> {
        self.restaurants.read().await.get(&id).cloned()
    }

    async fn catalog_item(&self, id: Uuid) -> Option<CatalogItem> {
        self.items.read().await.get(&id).cloned()
    }

    async fn restaurant_for_owner(&self, owner_id: Uuid) -> Option<RestaurantProfile> {
        self.restaurants
            .read()
            .await
            .values()
            .find(|r| r.owner_id == owner_id)
            .cloned()
    }

    async fn coupon(&self, code: &str) -> Option<Coupon> {
        self.coupons.read().await.get(code).cloned()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
