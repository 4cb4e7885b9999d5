use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::{LineItem, Money};

// ============================================================================
// Pricing Engine
// ============================================================================
//
// Pure computation of a price breakdown from line items. Deterministic and
// side-effect free, so a stored breakdown can always be re-derived from the
// stored line items for verification.
//
// Rounding rule: round half up, on integer basis-point math.
//
// ============================================================================

/// Fee rates and thresholds. Held as basis points so the math stays in
/// integers; the defaults match the platform's published fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub tax_bps: u32,
    pub platform_fee_bps: u32,
    /// Orders strictly above this subtotal ship free.
    pub free_delivery_threshold: Money,
    pub base_delivery_fee: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_bps: 500,
            platform_fee_bps: 200,
            free_delivery_threshold: 300,
            base_delivery_fee: 40,
        }
    }
}

/// Computed once at placement and never silently recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub platform_fee: Money,
    pub discount: Money,
    pub total: Money,
}

/// Round half up: `amount * bps / 10_000` with the half-unit nudge applied
/// before the integer division. `amount` must be non-negative.
fn apply_rate_half_up(amount: Money, bps: u32) -> Money {
    (amount * bps as Money + 5_000) / 10_000
}

pub fn compute_pricing(
    items: &[LineItem],
    discount: Money,
    config: &PricingConfig,
) -> Result<PricingBreakdown, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyItems);
    }
    if discount < 0 {
        return Err(OrderError::NegativeAmount { amount: discount });
    }

    for item in items {
        if item.quantity < 1 {
            return Err(OrderError::InvalidQuantity {
                quantity: item.quantity,
            });
        }
        if item.unit_price < 0 {
            return Err(OrderError::NegativeAmount {
                amount: item.unit_price,
            });
        }
        for customization in &item.customizations {
            if customization.additional_price < 0 {
                return Err(OrderError::NegativeAmount {
                    amount: customization.additional_price,
                });
            }
        }
    }

    let subtotal: Money = items.iter().map(|i| i.line_subtotal).sum();
    let tax = apply_rate_half_up(subtotal, config.tax_bps);
    let delivery_fee = if subtotal > config.free_delivery_threshold {
        0
    } else {
        config.base_delivery_fee
    };
    let platform_fee = apply_rate_half_up(subtotal, config.platform_fee_bps);

    let total = subtotal + tax + delivery_fee + platform_fee - discount;
    if total < 0 {
        return Err(OrderError::DiscountExceedsTotal);
    }

    Ok(PricingBreakdown {
        subtotal,
        tax,
        delivery_fee,
        platform_fee,
        discount,
        total,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::value_objects::Customization;
    use uuid::Uuid;

    fn item(price: Money, quantity: u32) -> LineItem {
        LineItem::new(
            Uuid::new_v4(),
            "Test item".to_string(),
            price,
            quantity,
            vec![],
            None,
        )
    }

    #[test]
    fn test_breakdown_above_free_delivery_threshold() {
        // (320 x 2) + (45 x 3) = 775; 5% tax rounds 38.75 up to 39,
        // 2% platform fee rounds 15.5 up to 16, delivery is free above 300.
        let items = vec![item(320, 2), item(45, 3)];
        let pricing = compute_pricing(&items, 0, &PricingConfig::default()).unwrap();

        assert_eq!(pricing.subtotal, 775);
        assert_eq!(pricing.tax, 39);
        assert_eq!(pricing.delivery_fee, 0);
        assert_eq!(pricing.platform_fee, 16);
        assert_eq!(pricing.discount, 0);
        assert_eq!(pricing.total, 830);
    }

    #[test]
    fn test_delivery_fee_charged_at_threshold() {
        // Free delivery requires strictly more than the threshold.
        let at_threshold = compute_pricing(&[item(300, 1)], 0, &PricingConfig::default()).unwrap();
        assert_eq!(at_threshold.delivery_fee, 40);

        let above = compute_pricing(&[item(301, 1)], 0, &PricingConfig::default()).unwrap();
        assert_eq!(above.delivery_fee, 0);
    }

    #[test]
    fn test_rounding_is_half_up() {
        // subtotal 10: tax 0.50 -> 1, platform fee 0.20 -> 0
        let pricing = compute_pricing(&[item(10, 1)], 0, &PricingConfig::default()).unwrap();
        assert_eq!(pricing.tax, 1);
        assert_eq!(pricing.platform_fee, 0);

        // subtotal 49: tax 2.45 -> 2, platform fee 0.98 -> 1
        let pricing = compute_pricing(&[item(49, 1)], 0, &PricingConfig::default()).unwrap();
        assert_eq!(pricing.tax, 2);
        assert_eq!(pricing.platform_fee, 1);
    }

    #[test]
    fn test_customization_prices_feed_subtotal() {
        let with_extra = LineItem::new(
            Uuid::new_v4(),
            "Paneer Wrap".to_string(),
            100,
            2,
            vec![Customization {
                name: "Extra cheese".to_string(),
                choice: "Yes".to_string(),
                additional_price: 25,
            }],
            None,
        );
        let pricing = compute_pricing(&[with_extra], 0, &PricingConfig::default()).unwrap();
        assert_eq!(pricing.subtotal, 250);
    }

    #[test]
    fn test_discount_reduces_total() {
        let pricing = compute_pricing(&[item(400, 1)], 50, &PricingConfig::default()).unwrap();
        // 400 + 20 tax + 0 delivery + 8 platform - 50
        assert_eq!(pricing.total, 378);
        assert_eq!(pricing.discount, 50);
    }

    #[test]
    fn test_empty_items_rejected() {
        let result = compute_pricing(&[], 0, &PricingConfig::default());
        assert!(matches!(result, Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = compute_pricing(&[item(50, 0)], 0, &PricingConfig::default());
        assert!(matches!(
            result,
            Err(OrderError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let result = compute_pricing(&[item(-10, 1)], 0, &PricingConfig::default());
        assert!(matches!(
            result,
            Err(OrderError::NegativeAmount { amount: -10 })
        ));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let result = compute_pricing(&[item(50, 1)], -5, &PricingConfig::default());
        assert!(matches!(
            result,
            Err(OrderError::NegativeAmount { amount: -5 })
        ));
    }

    #[test]
    fn test_discount_larger_than_total_rejected() {
        let result = compute_pricing(&[item(10, 1)], 10_000, &PricingConfig::default());
        assert!(matches!(result, Err(OrderError::DiscountExceedsTotal)));
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let items = vec![item(320, 2), item(45, 3), item(90, 1)];
        let first = compute_pricing(&items, 25, &PricingConfig::default()).unwrap();
        let second = compute_pricing(&items, 25, &PricingConfig::default()).unwrap();
        assert_eq!(first, second);
    }
}
