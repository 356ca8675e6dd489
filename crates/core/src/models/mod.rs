//! Wire models exchanged with the storefront REST API.
//!
//! Field names follow the API's JSON (camelCase, `_id` for identity). The
//! server is the source of truth for every model here; the client only caches
//! what it last received.

pub mod admin;
pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use admin::{AdminStats, UpdateOrderStatus};
pub use cart::{AddToCart, Cart, CartItem, UpdateCartItem};
pub use order::{
    AddressField, CreateOrderRequest, CreateOrderResponse, Order, OrderItem, OrderUser,
    ProductRef, ShippingAddress, UserSummary, VerifyPaymentResponse,
};
pub use payment::{PaymentConfirmation, PaymentFailure, PaymentMethod, PaymentSession};
pub use product::{Product, ProductPage, ProductQuery, SortDirection, SortField};
pub use user::{CurrentUser, LoginRequest, LoginResponse};
