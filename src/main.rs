use std::sync::Arc;

use futures_util::future::join_all;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod catalog;
mod domain;
mod storage;
mod utils;

use catalog::{CatalogItem, Coupon, CustomizationOption, InMemoryCatalog, RestaurantProfile};
use domain::order::{
    Actor, CustomizationChoice, DeliveryAddress, LineItemRequest, OrderCommand,
    OrderCommandHandler, PaymentMethod, PricingConfig, RatingRequest,
};
use storage::InMemoryOrderStore;
use utils::{retry_on_transient, RetryConfig, RetryResult, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging with environment-based filtering; override with
    // RUST_LOG, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,unieats_orders=debug")),
        )
        .init();

    tracing::info!("🚀 UniEats order lifecycle demo");

    // === 1. Seed the catalog the way the campus onboarding flow would ===
    let owner = Actor::restaurant_owner(Uuid::new_v4());
    let restaurant_ref = Uuid::new_v4();

    let catalog = Arc::new(InMemoryCatalog::new());
    catalog
        .upsert_restaurant(RestaurantProfile {
            id: restaurant_ref,
            owner_id: owner.id,
            name: "Hilltop Dhaba".to_string(),
            active: true,
            approved: true,
        })
        .await;

    let wrap_ref = Uuid::new_v4();
    catalog
        .upsert_item(CatalogItem {
            id: wrap_ref,
            restaurant_ref,
            name: "Paneer Tikka Wrap".to_string(),
            price: 320,
            discounted_price: None,
            available: true,
            options: vec![CustomizationOption {
                name: "Spice level".to_string(),
                choice: "Extra hot".to_string(),
                additional_price: 0,
            }],
        })
        .await;

    let chai_ref = Uuid::new_v4();
    catalog
        .upsert_item(CatalogItem {
            id: chai_ref,
            restaurant_ref,
            name: "Masala Chai".to_string(),
            price: 45,
            discounted_price: None,
            available: true,
            options: vec![],
        })
        .await;

    catalog
        .upsert_coupon(Coupon {
            code: "CAMPUS50".to_string(),
            discount_amount: 50,
            min_subtotal: 500,
            active: true,
        })
        .await;

    // === 2. Wire the handler against the in-memory store ===
    let handler = Arc::new(OrderCommandHandler::new(
        Arc::new(InMemoryOrderStore::new()),
        catalog,
        Arc::new(SystemClock),
        PricingConfig::default(),
    ));

    // === 3. A student places an order ===
    let customer = Actor::customer(Uuid::new_v4());
    let order = handler
        .handle(
            &customer,
            OrderCommand::PlaceOrder {
                customer_ref: Some(customer.id),
                restaurant_ref,
                items: vec![
                    LineItemRequest {
                        catalog_item_ref: wrap_ref,
                        quantity: 2,
                        customizations: vec![CustomizationChoice {
                            name: "Spice level".to_string(),
                            choice: "Extra hot".to_string(),
                        }],
                        special_instructions: None,
                    },
                    LineItemRequest {
                        catalog_item_ref: chai_ref,
                        quantity: 3,
                        customizations: vec![],
                        special_instructions: None,
                    },
                ],
                delivery_address: DeliveryAddress {
                    name: "Sanya Gupta".to_string(),
                    phone: "98765-43210".to_string(),
                    street: "Girls Hostel, Room 112".to_string(),
                    city: "Bengaluru".to_string(),
                    landmark: Some("Opposite sports complex".to_string()),
                    coordinates: None,
                },
                payment_method: PaymentMethod::Upi,
                special_instructions: None,
                coupon_code: Some("CAMPUS50".to_string()),
            },
        )
        .await?;

    tracing::info!(
        order_number = %order.order_number,
        total = order.pricing.total,
        discount = order.pricing.discount,
        "✅ Order placed"
    );

    // === 4. The restaurant works the order ===
    // Transient persistence failures are the caller's to retry; commands are
    // safe to repeat because they fully apply or reject identically.
    let confirm = retry_on_transient(RetryConfig::default(), |_attempt| {
        handler.handle(
            &owner,
            OrderCommand::ConfirmOrder {
                order_id: order.id,
                note: None,
            },
        )
    })
    .await;
    match confirm {
        RetryResult::Success(_) => {}
        RetryResult::Exhausted(err) | RetryResult::Permanent(err) => return Err(err.into()),
    }
    handler
        .handle(&owner, OrderCommand::AdvanceToPreparing { order_id: order.id })
        .await?;
    handler
        .handle(&owner, OrderCommand::MarkReadyForPickup { order_id: order.id })
        .await?;
    tracing::info!("✅ Order ready for pickup");

    // === 5. Two delivery partners find the order in the claim feed and race;
    //        exactly one wins ===
    let partners = [
        Actor::delivery_partner(Uuid::new_v4()),
        Actor::delivery_partner(Uuid::new_v4()),
    ];
    let feed = handler.list_claimable_orders(&partners[0]).await?;
    tracing::info!(claimable = feed.len(), "🛵 Orders waiting in the claim feed");

    let attempts = partners.map(|partner| {
        let handler = handler.clone();
        let order_id = order.id;
        tokio::spawn(async move {
            let outcome = handler
                .handle(&partner, OrderCommand::ClaimOrder { order_id })
                .await;
            (partner, outcome)
        })
    });

    let mut winner = None;
    for joined in join_all(attempts).await {
        let (partner, outcome) = joined?;
        match outcome {
            Ok(_) => {
                tracing::info!(partner = %partner.id, "✅ Claim won");
                winner = Some(partner);
            }
            Err(err) => tracing::info!(
                partner = %partner.id,
                kind = ?err.kind(),
                error = %err,
                "❌ Claim lost"
            ),
        }
    }
    let winner = winner.expect("one partner always wins the claim");

    // === 6. The winner completes the delivery ===
    handler
        .handle(
            &winner,
            OrderCommand::AdvanceToOutForDelivery { order_id: order.id },
        )
        .await?;
    let delivered = handler
        .handle(
            &winner,
            OrderCommand::MarkDelivered {
                order_id: order.id,
                note: Some("Left at hostel reception".to_string()),
            },
        )
        .await?;
    tracing::info!(
        delivered_at = ?delivered.milestones.delivered,
        "✅ Order delivered"
    );

    // === 7. The student rates the order ===
    let rated = handler
        .handle(
            &customer,
            OrderCommand::RateOrder {
                order_id: order.id,
                rating: RatingRequest {
                    food: 5,
                    delivery: 4,
                    overall: 5,
                    review: Some("Wrap was still warm".to_string()),
                },
            },
        )
        .await?;

    tracing::info!("🎉 Lifecycle complete");
    tracing::debug!(
        snapshot = %serde_json::to_string_pretty(&rated)?,
        "Final order snapshot"
    );

    Ok(())
}
