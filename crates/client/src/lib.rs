//! ShopEase storefront client library.
//!
//! Everything the storefront UI needs short of rendering: an authenticated
//! REST client, per-entity store slices that mirror server responses, the
//! checkout coordinator that drives the external payment gateway, route
//! guards, and user-facing notifications.
//!
//! # Architecture
//!
//! - The server is the source of truth. Slices replace their local copy with
//!   whatever the server returns and never merge optimistically.
//! - There is no global store. A [`Store`] value is created once and passed
//!   to every view.
//! - The bearer credential lives in an explicit [`Session`]; only the token is
//!   persisted between runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopease_client::{ApiClient, ClientConfig, Session, Store};
//!
//! let config = ClientConfig::from_env()?;
//! let session = Session::from_config(&config);
//! session.restore().await?;
//!
//! let api = ApiClient::new(&config, session.clone())?;
//! let store = Store::new(session, api);
//!
//! let cart = store.cart().fetch().await;
//! println!("{} items", cart.data.item_count());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod notify;
pub mod session;
pub mod slices;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, StorefrontApi};
pub use checkout::{
    CheckoutCoordinator, CheckoutFailure, CheckoutForm, CheckoutOutcome, CheckoutSettings,
    CheckoutState, FailureStage,
};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use gateway::{
    GatewayError, GatewayEvent, GatewayLoader, GatewayModule, LazyGateway, PaymentRequest,
};
pub use guard::{Route, require_admin, require_auth};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore, TokenStoreError};
pub use slices::{
    AdminData, AdminSlice, CartSlice, OrderData, OrderSlice, ProductData, ProductSlice, SliceState,
};
pub use store::Store;
