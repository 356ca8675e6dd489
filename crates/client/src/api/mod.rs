//! Storefront REST API.
//!
//! # Architecture
//!
//! - The server is source of truth - NO local merging, every mutation returns
//!   the authoritative collection
//! - JSON bodies, bearer-token `Authorization` header read from the
//!   [`Session`](crate::session::Session) once per request
//! - [`StorefrontApi`] is the seam the store slices are written against;
//!   [`ApiClient`] is the `reqwest` implementation
//!
//! # Endpoints
//!
//! - `auth` - login, current user
//! - `cart` - get, add, update, remove, clear
//! - `orders` - create, list, get, verify payment, invoice
//! - `products` - list (filter/sort/paginate), get, categories
//! - `admin` - stats, all orders, status update

mod client;

pub use client::ApiClient;

use std::future::Future;

use shopease_core::{
    AddToCart, AdminStats, Cart, CartItemId, CreateOrderRequest, CreateOrderResponse,
    CurrentUser, LoginRequest, LoginResponse, Order, OrderId, OrderStatus, PaymentConfirmation,
    Product, ProductId, ProductPage, ProductQuery, UpdateCartItem, VerifyPaymentResponse,
};
use thiserror::Error;

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No bearer token, or the server rejected it (401).
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Non-success status. `message` is the server's `{message}` field.
    #[error("{}", rejected_message(*.status, .message.as_deref()))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, if any.
        message: Option<String>,
    },

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The configured base URL cannot have paths appended.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

fn rejected_message(status: u16, message: Option<&str>) -> String {
    message.map_or_else(|| format!("HTTP {status}"), str::to_owned)
}

impl ApiError {
    /// The server's own error message, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Message to show the user: the server's message verbatim, else
    /// `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            other => other.server_message().unwrap_or(fallback).to_string(),
        }
    }

    /// HTTP status, for rejected responses.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::NotAuthenticated => Some(401),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }
}

/// Operations of the storefront REST API.
///
/// Every cart mutation resolves to the server's full post-mutation cart.
pub trait StorefrontApi: Clone + Send + Sync + 'static {
    /// `POST /auth/login`
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// `GET /auth/me`
    fn current_user(&self) -> impl Future<Output = Result<CurrentUser, ApiError>> + Send;

    /// `GET /cart`
    fn get_cart(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `POST /cart`
    fn add_to_cart(&self, body: &AddToCart)
    -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `PUT /cart/{itemId}`
    fn update_cart_item(
        &self,
        item_id: &CartItemId,
        body: UpdateCartItem,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `DELETE /cart/{itemId}`
    fn remove_cart_item(
        &self,
        item_id: &CartItemId,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `DELETE /cart`
    fn clear_cart(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /orders`
    fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<CreateOrderResponse, ApiError>> + Send;

    /// `GET /orders`
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// `GET /orders/{id}`
    fn get_order(&self, id: &OrderId) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// `POST /orders/{id}/verify`
    fn verify_payment(
        &self,
        id: &OrderId,
        confirmation: &PaymentConfirmation,
    ) -> impl Future<Output = Result<VerifyPaymentResponse, ApiError>> + Send;

    /// `GET /orders/{id}/invoice` (PDF bytes)
    fn order_invoice(&self, id: &OrderId)
    -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;

    /// `GET /products`
    fn list_products(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<ProductPage, ApiError>> + Send;

    /// `GET /products/{id}`
    fn get_product(&self, id: &ProductId)
    -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// `GET /products/categories`
    fn categories(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// `GET /admin/stats`
    fn admin_stats(&self) -> impl Future<Output = Result<AdminStats, ApiError>> + Send;

    /// `GET /admin/orders`
    fn admin_orders(&self) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// `PUT /admin/orders/{id}/status`
    fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
