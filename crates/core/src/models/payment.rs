//! Payment method and gateway correlation types.

use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, GatewayOrderId, GatewayPaymentId, OrderId};

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Card/UPI/net banking through the external gateway.
    #[default]
    #[serde(rename = "razorpay")]
    Razorpay,
    /// Paid on delivery; no gateway confirmation involved.
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Whether the order is only paid once the external gateway confirms it.
    #[must_use]
    pub const fn requires_gateway(self) -> bool {
        matches!(self, Self::Razorpay)
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Razorpay => "razorpay",
            Self::CashOnDelivery => "cod",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "razorpay" => Ok(Self::Razorpay),
            "cod" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Correlates a created order with one gateway transaction.
///
/// Lives only between order creation and the gateway's terminal event. A
/// retried checkout always gets a fresh session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Storefront order being paid.
    pub order_id: OrderId,
    /// Gateway-side order/session identifier.
    pub gateway_order_id: GatewayOrderId,
    /// Public key used to open the gateway UI.
    pub key_id: String,
    /// Total in minor currency units (paise).
    pub amount_minor: i64,
    pub currency: CurrencyCode,
}

/// Signed success payload delivered by the gateway.
///
/// Serializes to the body of `POST /orders/{id}/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(rename = "razorpayOrderId")]
    pub gateway_order_id: GatewayOrderId,
    #[serde(rename = "razorpayPaymentId")]
    pub payment_id: GatewayPaymentId,
    #[serde(rename = "razorpaySignature")]
    pub signature: String,
}

/// Failure notice delivered by the gateway (card declined, window closed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub description: String,
}

impl PaymentFailure {
    /// Failure with only a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            code: None,
            description: description.into(),
        }
    }
}
