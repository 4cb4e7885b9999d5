use uuid::Uuid;

use super::value_objects::{DeliveryAddress, PaymentMethod};

// ============================================================================
// Order Commands - Represent actor intent
// ============================================================================
//
// Each command is handled together with the acting identity; prices never
// travel in a command. Clients name catalog items, customization choices and
// a coupon code; the handler snapshots prices from the catalog and derives
// the discount from the promo record.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        customer_ref: Option<Uuid>,
        restaurant_ref: Uuid,
        items: Vec<LineItemRequest>,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
        special_instructions: Option<String>,
        coupon_code: Option<String>,
    },
    ConfirmOrder {
        order_id: Uuid,
        note: Option<String>,
    },
    RejectOrder {
        order_id: Uuid,
        note: Option<String>,
    },
    AdvanceToPreparing {
        order_id: Uuid,
    },
    MarkReadyForPickup {
        order_id: Uuid,
    },
    ClaimOrder {
        order_id: Uuid,
    },
    AdvanceToOutForDelivery {
        order_id: Uuid,
    },
    MarkDelivered {
        order_id: Uuid,
        note: Option<String>,
    },
    CancelOrder {
        order_id: Uuid,
        reason: String,
    },
    RateOrder {
        order_id: Uuid,
        rating: RatingRequest,
    },
}

/// One requested cart line. Quantity and choices only; the catalog is the
/// source of truth for everything priced.
#[derive(Debug, Clone)]
pub struct LineItemRequest {
    pub catalog_item_ref: Uuid,
    pub quantity: u32,
    pub customizations: Vec<CustomizationChoice>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomizationChoice {
    pub name: String,
    pub choice: String,
}

#[derive(Debug, Clone)]
pub struct RatingRequest {
    pub food: u8,
    pub delivery: u8,
    pub overall: u8,
    pub review: Option<String>,
}
