//! Unified error handling for store operations.
//!
//! Every failure a view can see is a [`ClientError`]. None of them are fatal:
//! the view shows [`ClientError::notice`], optionally follows
//! [`ClientError::redirect`], and keeps whatever state it already had.

use shopease_core::OrderId;
use thiserror::Error;

use crate::api::ApiError;
use crate::guard::Route;
use crate::notify::Notice;
use crate::session::TokenStoreError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No session, or the server no longer accepts its token.
    #[error("Please login to access this page")]
    NotAuthenticated,

    /// Signed in, but not allowed to see the page.
    #[error("You do not have permission to access this page")]
    Forbidden,

    /// Required input missing; nothing was sent to the server.
    #[error("{0}")]
    Validation(String),

    /// Requested quantity exceeds the stock known to the client.
    #[error("Insufficient stock: requested {requested}, only {available} available")]
    InsufficientStock {
        /// Quantity the user asked for.
        requested: u32,
        /// Stock on the product as last fetched.
        available: u32,
    },

    /// The server refused the request; the message is shown verbatim.
    #[error("{0}")]
    ServerRejected(String),

    /// Checkout submitted with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// An order is being created or a payment verified right now.
    #[error("Checkout is already in progress")]
    CheckoutInProgress,

    /// `await_payment` called with no open gateway session.
    #[error("No payment is awaiting confirmation")]
    NoPendingPayment,

    /// A newer checkout submission replaced this payment session.
    #[error("Payment session was superseded by a newer checkout")]
    Superseded,

    /// The gateway confirmed payment but the server rejected the signed
    /// payload. The order exists and is unpaid; the cart is intact.
    #[error("Payment verification failed: {message}")]
    PaymentVerificationFailed {
        /// Order that remains unpaid.
        order_id: OrderId,
        /// Server message.
        message: String,
    },

    /// The gateway reported a failure or could not be used. The order, if
    /// one was created, is unpaid; checkout must be resubmitted.
    #[error("Payment failed: {description}")]
    PaymentGatewayFailed {
        /// Order that remains unpaid, if it was created.
        order_id: Option<OrderId>,
        /// Gateway's description of the failure.
        description: String,
    },

    /// The persisted session could not be read or written.
    #[error("Session storage error: {0}")]
    Session(#[from] TokenStoreError),
}

impl ClientError {
    /// Translate an API failure, using `fallback` when the server gave no
    /// message of its own.
    #[must_use]
    pub fn from_api(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::NotAuthenticated => Self::NotAuthenticated,
            other => {
                if other.server_message().is_none() {
                    tracing::warn!(error = %other, "Request failed without a server message");
                }
                Self::ServerRejected(other.user_message(fallback))
            }
        }
    }

    /// Where the view should navigate, if anywhere.
    #[must_use]
    pub const fn redirect(&self) -> Option<Route> {
        match self {
            Self::NotAuthenticated => Some(Route::Login),
            Self::Forbidden => Some(Route::Home),
            Self::EmptyCart => Some(Route::Cart),
            _ => None,
        }
    }

    /// The transient notification for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }

    /// Whether the user can fix this by editing input and resubmitting.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InsufficientStock { .. } | Self::EmptyCart
        )
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::ServerRejected("Insufficient stock for Mouse".to_string());
        assert_eq!(err.to_string(), "Insufficient stock for Mouse");

        let err = ClientError::PaymentGatewayFailed {
            order_id: None,
            description: "Card declined".to_string(),
        };
        assert_eq!(err.to_string(), "Payment failed: Card declined");
    }

    #[test]
    fn test_client_error_redirects() {
        assert_eq!(ClientError::NotAuthenticated.redirect(), Some(Route::Login));
        assert_eq!(ClientError::Forbidden.redirect(), Some(Route::Home));
        assert_eq!(ClientError::EmptyCart.redirect(), Some(Route::Cart));
        assert_eq!(ClientError::CheckoutInProgress.redirect(), None);
    }

    #[test]
    fn test_from_api_keeps_server_message_verbatim() {
        let err = ClientError::from_api(
            ApiError::Rejected {
                status: 400,
                message: Some("Product is out of stock".to_string()),
            },
            "Failed to create order",
        );
        assert_eq!(err.to_string(), "Product is out of stock");

        let err = ClientError::from_api(
            ApiError::Rejected {
                status: 500,
                message: None,
            },
            "Failed to create order",
        );
        assert_eq!(err.to_string(), "Failed to create order");

        let err = ClientError::from_api(ApiError::NotAuthenticated, "Failed to fetch cart");
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
