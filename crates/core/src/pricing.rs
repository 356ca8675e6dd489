//! Advisory order pricing.
//!
//! The storefront API computes the same breakdown when it creates an order and
//! persists its own figures on the order. The values computed here are only
//! shown before submission; if product prices change between page load and
//! submission the two may differ, and the order's figures win. Nothing here
//! attempts to reconcile them.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Tax rate applied to the item subtotal (18%).
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Subtotals strictly above this amount ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Flat shipping charge for subtotals at or below the threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Items, tax, shipping, and total for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceBreakdown {
    /// Sum of unit price x quantity over all lines.
    pub items: Decimal,
    /// Tax on the items subtotal, rounded to two decimal places.
    pub tax: Decimal,
    /// Shipping charge (zero above the free-shipping threshold).
    pub shipping: Decimal,
    /// `items + tax + shipping`.
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Compute the breakdown for an items subtotal.
    #[must_use]
    pub fn from_subtotal(items: Decimal) -> Self {
        let tax = (items * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let shipping = if items > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING
        };

        Self {
            items,
            tax,
            shipping,
            total: items + tax + shipping,
        }
    }

    /// Compute the breakdown for `(unit_price, quantity)` lines.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = (Decimal, u32)>) -> Self {
        Self::from_subtotal(subtotal(lines))
    }

    /// Whether the shipping charge was waived.
    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

/// Sum of `unit_price * quantity` over all lines.
#[must_use]
pub fn subtotal(lines: impl IntoIterator<Item = (Decimal, u32)>) -> Decimal {
    lines
        .into_iter()
        .map(|(unit, quantity)| unit * Decimal::from(quantity))
        .sum()
}
