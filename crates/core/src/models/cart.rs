//! Cart types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;
use crate::pricing::{self, PriceBreakdown};
use crate::types::{CartItemId, ProductId};

/// A cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
    /// Unit price captured when the line was added, if the server recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl CartItem {
    /// Unit price for this line: the captured snapshot, else the product price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.price.unwrap_or(self.product.price)
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// The signed-in user's cart as returned by every cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        pricing::subtotal(self.lines())
    }

    /// Advisory tax/shipping/total for the current lines.
    #[must_use]
    pub fn pricing(&self) -> PriceBreakdown {
        PriceBreakdown::from_lines(self.lines())
    }

    /// Look up a line by its ID.
    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn lines(&self) -> impl Iterator<Item = (Decimal, u32)> + '_ {
        self.items
            .iter()
            .map(|item| (item.unit_price(), item.quantity))
    }
}

/// Body for `POST /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `PUT /cart/{itemId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32, snapshot: Option<i64>) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product: Product {
                id: ProductId::new(format!("product-{id}")),
                name: format!("Product {id}"),
                description: String::new(),
                price: Decimal::new(price, 0),
                category: "General".to_string(),
                stock: 10,
                images: vec![],
            },
            quantity,
            price: snapshot.map(|p| Decimal::new(p, 0)),
        }
    }

    #[test]
    fn test_subtotal_sums_lines() {
        let cart = Cart {
            items: vec![item("a", 500, 2, None), item("b", 100, 2, None)],
        };

        assert_eq!(cart.subtotal(), Decimal::new(1200, 0));
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.pricing().total, Decimal::new(141_600, 2));
    }

    #[test]
    fn test_snapshot_price_wins_over_product_price() {
        let line = item("a", 500, 3, Some(450));
        assert_eq!(line.unit_price(), Decimal::new(450, 0));
        assert_eq!(line.line_total(), Decimal::new(1350, 0));
    }

    #[test]
    fn test_cart_response_without_items() {
        let cart: Cart = serde_json::from_str("{}").unwrap_or_else(|e| panic!("{e}"));
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }
}
