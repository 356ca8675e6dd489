//! Payment gateway boundary.
//!
//! The gateway is an external module that opens a payment window and later
//! delivers exactly one terminal event for it. It is modeled as an event
//! channel: [`GatewayModule::open`] returns a `oneshot` receiver the checkout
//! coordinator awaits. Dropping the sender without an event (the window was
//! closed) reads as a cancelled payment.
//!
//! Loading the module is expensive (in a browser, injecting the gateway's
//! script). [`LazyGateway`] loads it on first use and reuses the same handle
//! for every later checkout.

use std::future::Future;
use std::sync::Arc;

use shopease_core::{
    CurrencyCode, GatewayOrderId, PaymentConfirmation, PaymentFailure, PaymentSession,
};
use thiserror::Error;
use tokio::sync::{OnceCell, oneshot};
use tracing::{info, instrument};

/// Errors from loading or opening the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to load payment gateway: {0}")]
    Load(String),

    #[error("Failed to open payment window: {0}")]
    Open(String),
}

/// What the payment window is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Public gateway key from the create-order response.
    pub key_id: String,
    /// Order total in minor currency units.
    pub amount_minor: i64,
    pub currency: CurrencyCode,
    /// Merchant name shown in the window.
    pub name: String,
    pub description: String,
    pub gateway_order_id: GatewayOrderId,
    /// Customer name pre-filled in the window.
    pub prefill_name: String,
}

impl PaymentRequest {
    /// Request for a created order's payment session.
    #[must_use]
    pub fn for_session(
        session: &PaymentSession,
        store_name: impl Into<String>,
        prefill_name: impl Into<String>,
    ) -> Self {
        Self {
            key_id: session.key_id.clone(),
            amount_minor: session.amount_minor,
            currency: session.currency,
            name: store_name.into(),
            description: format!("Order #{}", session.order_id),
            gateway_order_id: session.gateway_order_id.clone(),
            prefill_name: prefill_name.into(),
        }
    }
}

/// The single terminal event of a payment window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Payment captured; the signed payload must be verified by the server.
    Confirmed(PaymentConfirmation),
    /// Payment declined or abandoned.
    Failed(PaymentFailure),
}

/// A loaded gateway module.
pub trait GatewayModule: Send + Sync {
    /// Open a payment window.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Open` if the window cannot be shown.
    fn open(&self, request: PaymentRequest)
    -> Result<oneshot::Receiver<GatewayEvent>, GatewayError>;

    /// Close the window for `gateway_order_id`. Its receiver resolves with
    /// no event. Closing an unknown or finished session does nothing.
    fn close(&self, gateway_order_id: &GatewayOrderId);
}

/// Loads the gateway module.
pub trait GatewayLoader: Send + Sync + 'static {
    /// Load the module.
    fn load(&self) -> impl Future<Output = Result<Arc<dyn GatewayModule>, GatewayError>> + Send;
}

/// Gateway module loaded once, on first need.
///
/// A failed load is not cached; the next call tries again.
pub struct LazyGateway<L> {
    loader: L,
    module: OnceCell<Arc<dyn GatewayModule>>,
}

impl<L> std::fmt::Debug for LazyGateway<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyGateway")
            .field("loaded", &self.module.initialized())
            .finish_non_exhaustive()
    }
}

impl<L: GatewayLoader> LazyGateway<L> {
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            module: OnceCell::new(),
        }
    }

    /// The shared module, loading it if this is the first call.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the module cannot be loaded.
    #[instrument(skip(self))]
    pub async fn module(&self) -> Result<Arc<dyn GatewayModule>, GatewayError> {
        let module = self
            .module
            .get_or_try_init(|| async {
                let module = self.loader.load().await?;
                info!("Payment gateway loaded");
                Ok::<_, GatewayError>(module)
            })
            .await?;
        Ok(Arc::clone(module))
    }

    /// Whether the module has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.module.initialized()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use shopease_core::OrderId;

    use super::*;
    use crate::testing::ScriptedLoader;

    #[tokio::test]
    async fn test_module_loads_once() {
        let loader = ScriptedLoader::default();
        let gateway = LazyGateway::new(loader.clone());
        assert!(!gateway.is_loaded());

        let (a, b) = tokio::join!(gateway.module(), gateway.module());
        assert!(a.is_ok() && b.is_ok());
        gateway.module().await.unwrap();

        assert!(gateway.is_loaded());
        assert_eq!(loader.loads(), 1);
    }

    struct FlakyLoader {
        attempts: Arc<AtomicUsize>,
    }

    impl GatewayLoader for FlakyLoader {
        async fn load(&self) -> Result<Arc<dyn GatewayModule>, GatewayError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(GatewayError::Load("network unreachable".to_string()))
            } else {
                Ok(Arc::new(crate::testing::ScriptedGateway::default()) as Arc<dyn GatewayModule>)
            }
        }
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let gateway = LazyGateway::new(FlakyLoader {
            attempts: Arc::clone(&attempts),
        });

        assert!(matches!(gateway.module().await, Err(GatewayError::Load(_))));
        assert!(!gateway.is_loaded());
        assert!(gateway.module().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_payment_request_for_session() {
        let session = PaymentSession {
            order_id: OrderId::new("o42"),
            gateway_order_id: GatewayOrderId::new("order_gw1"),
            key_id: "rzp_test_key".to_string(),
            amount_minor: 141_600,
            currency: CurrencyCode::INR,
        };

        let request = PaymentRequest::for_session(&session, "ShopEase", "12 MG Road");
        assert_eq!(request.description, "Order #o42");
        assert_eq!(request.amount_minor, 141_600);
        assert_eq!(request.name, "ShopEase");
        assert_eq!(request.prefill_name, "12 MG Road");
    }
}
