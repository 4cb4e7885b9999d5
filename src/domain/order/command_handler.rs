use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::CatalogGateway;
use crate::storage::{ClaimUpdate, OrderFilter, OrderStore};
use crate::utils::Clock;

use super::aggregate::{NewOrder, Order};
use super::commands::{LineItemRequest, OrderCommand, RatingRequest};
use super::errors::OrderError;
use super::pricing::{compute_pricing, PricingConfig};
use super::transitions::{self, LifecycleEvent};
use super::value_objects::{
    Actor, ActorRole, Customization, DeliveryAddress, LineItem, Money, OrderStatus, PaymentMethod,
    Rating,
};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → validation/authorization → aggregate mutation →
// single store commit. Every command either fully applies (status, history,
// milestone and any payment/cancellation/rating fields together) or returns
// a rejection with the store untouched.
//
// ============================================================================

pub struct OrderCommandHandler {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogGateway>,
    clock: Arc<dyn Clock>,
    pricing: PricingConfig,
}

impl OrderCommandHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogGateway>,
        clock: Arc<dyn Clock>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            pricing,
        }
    }

    /// Handle a mutating command for the given actor and return the newly
    /// committed snapshot.
    pub async fn handle(
        &self,
        actor: &Actor,
        command: OrderCommand,
    ) -> Result<Order, OrderError> {
        match command {
            OrderCommand::PlaceOrder {
                customer_ref,
                restaurant_ref,
                items,
                delivery_address,
                payment_method,
                special_instructions,
                coupon_code,
            } => {
                self.place_order(
                    actor,
                    customer_ref,
                    restaurant_ref,
                    items,
                    delivery_address,
                    payment_method,
                    special_instructions,
                    coupon_code,
                )
                .await
            }
            OrderCommand::ConfirmOrder { order_id, note } => {
                self.apply_lifecycle(actor, order_id, LifecycleEvent::Confirm, note)
                    .await
            }
            OrderCommand::RejectOrder { order_id, note } => {
                self.apply_lifecycle(actor, order_id, LifecycleEvent::Reject, note)
                    .await
            }
            OrderCommand::AdvanceToPreparing { order_id } => {
                self.apply_lifecycle(actor, order_id, LifecycleEvent::StartPreparing, None)
                    .await
            }
            OrderCommand::MarkReadyForPickup { order_id } => {
                self.apply_lifecycle(actor, order_id, LifecycleEvent::MarkReady, None)
                    .await
            }
            OrderCommand::ClaimOrder { order_id } => self.claim_order(actor, order_id).await,
            OrderCommand::AdvanceToOutForDelivery { order_id } => {
                self.apply_lifecycle(actor, order_id, LifecycleEvent::Dispatch, None)
                    .await
            }
            OrderCommand::MarkDelivered { order_id, note } => {
                self.apply_lifecycle(actor, order_id, LifecycleEvent::Deliver, note)
                    .await
            }
            OrderCommand::CancelOrder { order_id, reason } => {
                self.cancel_order(actor, order_id, reason).await
            }
            OrderCommand::RateOrder { order_id, rating } => {
                self.rate_order(actor, order_id, rating).await
            }
        }
    }

    /// Point read, scoped to orders the actor is a party to. Admin reads
    /// anything; everyone else gets the same not-found as for a missing id.
    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;

        let visible = match actor.role {
            ActorRole::Admin => true,
            ActorRole::Customer => order.customer_ref == Some(actor.id),
            ActorRole::DeliveryPartner => order.delivery_partner_ref == Some(actor.id),
            ActorRole::RestaurantOwner => self
                .catalog
                .restaurant(order.restaurant_ref)
                .await
                .is_some_and(|r| r.owner_id == actor.id),
        };

        if visible {
            Ok(order)
        } else {
            Err(OrderError::NotFound { order_id })
        }
    }

    /// All orders the actor is a party to, newest placement first.
    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<Order>, OrderError> {
        let filter = match actor.role {
            ActorRole::Admin => OrderFilter::All,
            ActorRole::Customer => OrderFilter::ByCustomer(actor.id),
            ActorRole::DeliveryPartner => OrderFilter::ByDeliveryPartner(actor.id),
            ActorRole::RestaurantOwner => {
                match self.catalog.restaurant_for_owner(actor.id).await {
                    Some(restaurant) => OrderFilter::ByRestaurant(restaurant.id),
                    None => return Ok(vec![]),
                }
            }
        };
        Ok(self.store.list(filter).await?)
    }

    /// Orders a delivery partner may claim right now: ready for pickup and
    /// not yet assigned, longest-waiting first. The feed a partner polls
    /// between deliveries and after losing a claim race.
    pub async fn list_claimable_orders(&self, actor: &Actor) -> Result<Vec<Order>, OrderError> {
        if actor.role != ActorRole::DeliveryPartner {
            return Err(OrderError::RoleNotAllowed { role: actor.role });
        }
        Ok(self.store.list(OrderFilter::Claimable).await?)
    }

    // ------------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    async fn place_order(
        &self,
        actor: &Actor,
        customer_ref: Option<Uuid>,
        restaurant_ref: Uuid,
        items: Vec<LineItemRequest>,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
        special_instructions: Option<String>,
        coupon_code: Option<String>,
    ) -> Result<Order, OrderError> {
        if actor.role != ActorRole::Customer {
            return Err(OrderError::RoleNotAllowed { role: actor.role });
        }
        // Guest checkout passes no customer reference; an authenticated
        // customer may only place for themselves.
        if let Some(customer) = customer_ref {
            if customer != actor.id {
                return Err(OrderError::CustomerMismatch);
            }
        }

        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        let restaurant = self
            .catalog
            .restaurant(restaurant_ref)
            .await
            .ok_or(OrderError::UnknownRestaurant { restaurant_ref })?;
        if !restaurant.accepting_orders() {
            return Err(OrderError::RestaurantNotAcceptingOrders { restaurant_ref });
        }

        let mut line_items = Vec::with_capacity(items.len());
        for request in items {
            line_items.push(self.resolve_line_item(restaurant_ref, request).await?);
        }

        let discount = match coupon_code.as_deref() {
            Some(code) => self.resolve_coupon(code, &line_items).await?,
            None => 0,
        };

        let pricing = compute_pricing(&line_items, discount, &self.pricing)?;
        let order = Order::place(NewOrder {
            customer_ref,
            restaurant_ref,
            line_items,
            pricing,
            coupon_code,
            delivery_address,
            payment_method,
            special_instructions,
            placed_at: self.clock.now(),
        });

        let committed = self.store.insert(order).await?;
        tracing::info!(
            order_id = %committed.id,
            order_number = %committed.order_number,
            restaurant = %restaurant.name,
            total = committed.pricing.total,
            "Order placed"
        );
        Ok(committed)
    }

    /// Snapshot one requested line against the live catalog: the item must
    /// belong to the ordering restaurant and be available right now, and all
    /// prices come from the catalog, never the client.
    async fn resolve_line_item(
        &self,
        restaurant_ref: Uuid,
        request: LineItemRequest,
    ) -> Result<LineItem, OrderError> {
        let item_ref = request.catalog_item_ref;
        let item = self
            .catalog
            .catalog_item(item_ref)
            .await
            .ok_or(OrderError::UnknownItem { item_ref })?;

        if item.restaurant_ref != restaurant_ref {
            return Err(OrderError::ItemNotFromRestaurant {
                item_ref,
                restaurant_ref,
            });
        }
        if !item.available {
            return Err(OrderError::ItemUnavailable { item_ref });
        }

        let mut customizations = Vec::with_capacity(request.customizations.len());
        for choice in request.customizations {
            let option = item
                .options
                .iter()
                .find(|o| o.name == choice.name && o.choice == choice.choice)
                .ok_or_else(|| OrderError::UnknownCustomization {
                    item_ref,
                    name: choice.name.clone(),
                })?;
            customizations.push(Customization {
                name: option.name.clone(),
                choice: option.choice.clone(),
                additional_price: option.additional_price,
            });
        }

        let unit_price = item.effective_price();
        Ok(LineItem::new(
            item.id,
            item.name,
            unit_price,
            request.quantity,
            customizations,
            request.special_instructions,
        ))
    }

    /// Derive the order discount from a platform promotion. The client names
    /// a code; the amount always comes from the promo record, capped at the
    /// subtotal so fees are never discounted away.
    async fn resolve_coupon(&self, code: &str, items: &[LineItem]) -> Result<Money, OrderError> {
        let coupon = self
            .catalog
            .coupon(code)
            .await
            .filter(|c| c.active)
            .ok_or_else(|| OrderError::InvalidCoupon {
                code: code.to_string(),
            })?;

        let subtotal: Money = items.iter().map(|i| i.line_subtotal).sum();
        if subtotal < coupon.min_subtotal {
            return Err(OrderError::CouponMinimumNotMet {
                code: coupon.code,
                min_subtotal: coupon.min_subtotal,
            });
        }

        Ok(coupon.discount_amount.min(subtotal))
    }

    // ------------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------------

    async fn apply_lifecycle(
        &self,
        actor: &Actor,
        order_id: Uuid,
        event: LifecycleEvent,
        note: Option<String>,
    ) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;

        let restaurant_owner = match event {
            LifecycleEvent::Confirm
            | LifecycleEvent::Reject
            | LifecycleEvent::StartPreparing
            | LifecycleEvent::MarkReady => self
                .catalog
                .restaurant(order.restaurant_ref)
                .await
                .map(|r| r.owner_id),
            _ => None,
        };

        let target = transitions::authorize(&order, event, actor, restaurant_owner)?;

        let mut updated = order.clone();
        updated.apply_transition(target, actor, note, self.clock.now());
        let committed = self.store.update(updated, order.version).await?;

        tracing::info!(
            order_id = %order_id,
            from = %order.status,
            to = %committed.status,
            actor = %actor.id,
            role = %actor.role,
            "Order transitioned"
        );
        Ok(committed)
    }

    async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
        reason: String,
    ) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;
        transitions::authorize(&order, LifecycleEvent::Cancel, actor, None)?;

        let mut updated = order.clone();
        updated.record_cancellation(actor, reason, self.clock.now());
        let committed = self.store.update(updated, order.version).await?;

        tracing::info!(
            order_id = %order_id,
            cancelled_by = %actor.role,
            refund = committed
                .cancellation
                .as_ref()
                .map(|c| c.refund_amount)
                .unwrap_or(0),
            "Order cancelled"
        );
        Ok(committed)
    }

    // ------------------------------------------------------------------------
    // Delivery claim
    // ------------------------------------------------------------------------

    /// Single-winner assignment. No read-then-write here: the store's
    /// conditional update is the only place the claimable check happens, so
    /// concurrent claimants cannot both observe an unassigned order.
    async fn claim_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, OrderError> {
        if actor.role != ActorRole::DeliveryPartner {
            return Err(OrderError::RoleNotAllowed { role: actor.role });
        }

        let claimed = self
            .store
            .claim(
                order_id,
                ClaimUpdate {
                    partner_ref: actor.id,
                    picked_up_at: self.clock.now(),
                },
            )
            .await?;

        tracing::info!(
            order_id = %order_id,
            partner = %actor.id,
            "Order claimed for delivery"
        );
        Ok(claimed)
    }

    // ------------------------------------------------------------------------
    // Rating
    // ------------------------------------------------------------------------

    async fn rate_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
        rating: RatingRequest,
    ) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;

        if actor.role != ActorRole::Customer {
            return Err(OrderError::RoleNotAllowed { role: actor.role });
        }
        if order.customer_ref != Some(actor.id) {
            return Err(OrderError::NotOrderCustomer);
        }
        if order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidTransition {
                current: order.status,
                event: LifecycleEvent::Rate,
            });
        }
        if order.rating.is_some() {
            return Err(OrderError::AlreadyRated { order_id });
        }
        for score in [rating.food, rating.delivery, rating.overall] {
            if !(1..=5).contains(&score) {
                return Err(OrderError::RatingOutOfRange { score });
            }
        }

        let mut updated = order.clone();
        updated.record_rating(Rating {
            food: rating.food,
            delivery: rating.delivery,
            overall: rating.overall,
            review: rating.review,
            rated_at: self.clock.now(),
        });
        let committed = self.store.update(updated, order.version).await?;

        tracing::info!(order_id = %order_id, overall = rating.overall, "Order rated");
        Ok(committed)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
