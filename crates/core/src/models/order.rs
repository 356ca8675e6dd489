//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment::{PaymentMethod, PaymentSession};
use super::product::Product;
use crate::pricing::PriceBreakdown;
use crate::types::{CurrencyCode, GatewayOrderId, OrderId, OrderStatus, ProductId, UserId, price};

/// Shipping address captured by the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: "India".to_string(),
        }
    }
}

/// A field of [`ShippingAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Street,
    City,
    State,
    ZipCode,
    Country,
}

impl AddressField {
    /// Label shown next to the form input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Street => "Street Address",
            Self::City => "City",
            Self::State => "State",
            Self::ZipCode => "ZIP Code",
            Self::Country => "Country",
        }
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl ShippingAddress {
    /// Fields that are empty after trimming whitespace.
    ///
    /// Every field is required; there is no format validation beyond that.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<AddressField> {
        [
            (AddressField::Street, &self.street),
            (AddressField::City, &self.city),
            (AddressField::State, &self.state),
            (AddressField::ZipCode, &self.zip_code),
            (AddressField::Country, &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Product reference on an order line: a bare ID or the populated product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(ProductId),
    Product(Box<Product>),
}

impl ProductRef {
    /// The referenced product's ID.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) => id,
            Self::Product(product) => &product.id,
        }
    }
}

/// Order owner: a bare ID, or a `{name, email}` profile on admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderUser {
    Id(UserId),
    Profile(UserSummary),
}

/// Populated order owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A line on a placed order. Prices are frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A placed order.
///
/// Immutable once paid, except for status transitions made by administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderUser>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub items_price: Decimal,
    #[serde(default)]
    pub tax_price: Decimal,
    #[serde(default)]
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The server's authoritative price breakdown for this order.
    #[must_use]
    pub const fn pricing(&self) -> PriceBreakdown {
        PriceBreakdown {
            items: self.items_price,
            tax: self.tax_price,
            shipping: self.shipping_price,
            total: self.total_price,
        }
    }

    /// Total in minor currency units, as handed to the payment gateway.
    #[must_use]
    pub fn total_minor_units(&self) -> Option<i64> {
        price::to_minor_units(self.total_price)
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.order_items.iter().map(|item| item.quantity).sum()
    }
}

/// Body for `POST /orders`. The server builds the order from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Response of `POST /orders`.
///
/// The gateway fields are present only when the payment method needs
/// confirmation from the external gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: Order,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_order_id: Option<GatewayOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

impl CreateOrderResponse {
    /// Build the payment session for this order, if the response carries
    /// gateway details and the total fits in minor units.
    #[must_use]
    pub fn payment_session(&self, currency: CurrencyCode) -> Option<PaymentSession> {
        let gateway_order_id = self.razorpay_order_id.clone()?;
        let key_id = self.key_id.clone().filter(|key| !key.is_empty())?;

        Some(PaymentSession {
            order_id: self.order.id.clone(),
            gateway_order_id,
            key_id,
            amount_minor: self.order.total_minor_units()?,
            currency,
        })
    }
}

/// Response of `POST /orders/{id}/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub order: Order,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "_id": "o1",
        "user": {"_id": "u1", "name": "Asha", "email": "asha@example.com"},
        "orderItems": [
            {"product": "p1", "name": "Mouse", "quantity": 2, "price": 600}
        ],
        "shippingAddress": {
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "KA",
            "zipCode": "560001",
            "country": "India"
        },
        "paymentMethod": "razorpay",
        "itemsPrice": 1200,
        "taxPrice": 216,
        "shippingPrice": 0,
        "totalPrice": 1416,
        "isPaid": false,
        "status": "pending",
        "createdAt": "2026-10-01T10:00:00.000Z"
    }"#;

    #[test]
    fn test_order_deserializes_from_api_shape() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(order.id.as_str(), "o1");
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(matches!(order.user, Some(OrderUser::Profile(ref u)) if u.name == "Asha"));
        assert!(matches!(
            order.order_items.first().and_then(|i| i.product.as_ref()),
            Some(ProductRef::Id(id)) if id.as_str() == "p1"
        ));
        assert_eq!(order.total_minor_units(), Some(141_600));
    }

    #[test]
    fn test_payment_session_requires_gateway_details() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap_or_else(|e| panic!("{e}"));

        let without = CreateOrderResponse {
            order: order.clone(),
            razorpay_order_id: None,
            key_id: Some("rzp_test_key".to_string()),
        };
        assert!(without.payment_session(CurrencyCode::INR).is_none());

        let with = CreateOrderResponse {
            order,
            razorpay_order_id: Some(GatewayOrderId::new("order_N1")),
            key_id: Some("rzp_test_key".to_string()),
        };
        let session = with.payment_session(CurrencyCode::INR);
        assert_eq!(
            session.map(|s| (s.amount_minor, s.gateway_order_id)),
            Some((141_600, GatewayOrderId::new("order_N1")))
        );
    }

    #[test]
    fn test_missing_address_fields() {
        let address = ShippingAddress {
            street: "12 MG Road".to_string(),
            city: "   ".to_string(),
            ..ShippingAddress::default()
        };

        assert_eq!(
            address.missing_fields(),
            vec![AddressField::City, AddressField::State, AddressField::ZipCode]
        );
    }
}
