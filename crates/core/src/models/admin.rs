//! Admin dashboard types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderStatus;

/// Store-wide counters shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_revenue: Decimal,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub processing_orders: u64,
}

/// Body for `PUT /admin/orders/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}
