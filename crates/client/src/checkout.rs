//! Checkout coordinator.
//!
//! Drives one purchase from a submitted form to a paid order:
//!
//! ```text
//! Idle ──submit──▶ OrderCreating ──(cash on delivery)──────────────▶ Completed
//!                       │
//!                       ├──(gateway)──▶ AwaitingPayment ──confirmed──▶ Verifying ──▶ Completed
//!                       │                     │                           │
//!                       ▼                     ▼ failed                    ▼ rejected
//!                     Failed                Failed                      Failed
//! ```
//!
//! The cart is cleared exactly once per flow, on the way into `Completed`.
//! A failed flow leaves the cart as it was and is retried by submitting
//! again, which creates a fresh order and payment session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shopease_core::{
    CreateOrderRequest, CurrencyCode, GatewayOrderId, OrderId, PaymentMethod, PaymentSession,
    ShippingAddress,
};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::api::StorefrontApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::gateway::{GatewayEvent, GatewayLoader, GatewayModule, LazyGateway, PaymentRequest};
use crate::guard::Route;
use crate::store::Store;

/// What the user submits on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutForm {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    fn validate(&self) -> Result<()> {
        let missing = self.shipping_address.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
        Err(ClientError::Validation(format!(
            "Please fill in: {}",
            labels.join(", ")
        )))
    }
}

/// Step of the flow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    OrderCreation,
    Payment,
    Verification,
}

/// Why the last flow stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutFailure {
    pub stage: FailureStage,
    /// The created order, which stays unpaid.
    pub order_id: Option<OrderId>,
    pub message: String,
}

/// Where the checkout flow is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    OrderCreating,
    AwaitingPayment(PaymentSession),
    Verifying {
        order_id: OrderId,
    },
    Completed {
        order_id: OrderId,
    },
    Failed(CheckoutFailure),
}

impl CheckoutState {
    /// Whether a request is in flight that a new submission must not race.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::OrderCreating | Self::Verifying { .. })
    }
}

/// Result of a successful step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The payment window is open; call
    /// [`CheckoutCoordinator::await_payment`].
    AwaitingPayment(PaymentSession),
    /// The order is placed (and paid, if it needed to be).
    Completed { order_id: OrderId },
}

impl CheckoutOutcome {
    /// Where to navigate after this step.
    #[must_use]
    pub fn redirect(&self) -> Option<Route> {
        match self {
            Self::AwaitingPayment(_) => None,
            Self::Completed { order_id } => Some(Route::OrderDetail(order_id.clone())),
        }
    }
}

/// Merchant details shown in the payment window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub store_name: String,
    pub currency: CurrencyCode,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            store_name: "ShopEase".to_string(),
            currency: CurrencyCode::default(),
        }
    }
}

impl CheckoutSettings {
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            store_name: config.store_name.clone(),
            currency: config.currency,
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// An open payment window and the flow it belongs to.
struct PendingPayment {
    generation: u64,
    session: PaymentSession,
    module: Arc<dyn GatewayModule>,
    events: Option<oneshot::Receiver<GatewayEvent>>,
}

#[derive(Default)]
struct Flow {
    state: CheckoutState,
    /// Bumped by every submission and reset. A step whose generation is no
    /// longer current has been superseded and must not touch the flow.
    generation: u64,
    pending: Option<PendingPayment>,
}

/// Runs checkout flows against a [`Store`] and a lazily loaded gateway.
///
/// Cheaply cloneable; clones drive the same flow.
pub struct CheckoutCoordinator<A, L> {
    inner: Arc<CoordinatorInner<A, L>>,
}

struct CoordinatorInner<A, L> {
    store: Store<A>,
    gateway: LazyGateway<L>,
    settings: CheckoutSettings,
    flow: Mutex<Flow>,
}

impl<A, L> Clone for CheckoutCoordinator<A, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, L> std::fmt::Debug for CheckoutCoordinator<A, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutCoordinator")
            .field("settings", &self.inner.settings)
            .field("gateway", &self.inner.gateway)
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi, L: GatewayLoader> CheckoutCoordinator<A, L> {
    #[must_use]
    pub fn new(store: Store<A>, gateway: LazyGateway<L>, settings: CheckoutSettings) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                gateway,
                settings,
                flow: Mutex::new(Flow::default()),
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.flow().state.clone()
    }

    /// Validate the form, create the order, and either complete it (cash on
    /// delivery) or open the payment window.
    ///
    /// Submitting while a payment window is open closes it; its awaiter gets
    /// `Superseded`.
    ///
    /// # Errors
    ///
    /// - `Validation` / `EmptyCart`: nothing was sent; state is unchanged
    /// - `CheckoutInProgress`: an order is being created or verified
    /// - `ServerRejected` (or `NotAuthenticated`): order creation failed
    /// - `PaymentGatewayFailed`: the order exists but the gateway could not be
    ///   opened
    /// - `Superseded`: a newer submission or reset replaced this one before its
    ///   payment window opened
    #[instrument(skip(self, form), fields(payment_method = %form.payment_method))]
    pub async fn submit(&self, form: CheckoutForm) -> Result<CheckoutOutcome> {
        let store = &self.inner.store;

        if let Err(err) = form.validate() {
            store.notifier().publish(err.notice());
            return Err(err);
        }
        if store.cart().state().await.data.is_empty() {
            let err = ClientError::EmptyCart;
            store.notifier().publish(err.notice());
            return Err(err);
        }

        let (generation, stale) = {
            let mut flow = self.flow();
            if flow.state.is_busy() {
                return Err(ClientError::CheckoutInProgress);
            }
            flow.generation += 1;
            flow.state = CheckoutState::OrderCreating;
            (flow.generation, flow.pending.take())
        };
        if let Some(stale) = stale {
            debug!(gateway_order_id = %stale.session.gateway_order_id, "Closing superseded payment session");
            stale.module.close(&stale.session.gateway_order_id);
        }

        let request = CreateOrderRequest {
            shipping_address: form.shipping_address.clone(),
            payment_method: form.payment_method,
        };
        let response = match store.orders().create(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.fail(generation, FailureStage::OrderCreation, None, &err);
                return Err(err);
            }
        };
        let order_id = response.order.id.clone();
        info!(order_id = %order_id, "Order created");

        if !form.payment_method.requires_gateway() {
            if !self.is_current(generation) {
                return Err(ClientError::Superseded);
            }
            self.complete(generation, &order_id).await;
            store.notifier().success("Order placed successfully!");
            return Ok(CheckoutOutcome::Completed { order_id });
        }

        let Some(session) = response.payment_session(self.inner.settings.currency) else {
            return Err(self.payment_failed(
                generation,
                order_id,
                "Payment gateway details missing from order response".to_string(),
            ));
        };

        let module = match self.inner.gateway.module().await {
            Ok(module) => module,
            Err(e) => {
                return Err(self.payment_failed(generation, order_id, e.to_string()));
            }
        };

        // Generation check and open share one lock: at most one window is live
        let opened = {
            let mut flow = self.flow();
            if flow.generation != generation {
                debug!(order_id = %order_id, "Submission superseded before opening payment window");
                return Err(ClientError::Superseded);
            }
            let request = PaymentRequest::for_session(
                &session,
                self.inner.settings.store_name.clone(),
                form.shipping_address.street.clone(),
            );
            module.open(request).map(|events| {
                flow.state = CheckoutState::AwaitingPayment(session.clone());
                flow.pending = Some(PendingPayment {
                    generation,
                    session: session.clone(),
                    module: Arc::clone(&module),
                    events: Some(events),
                });
            })
        };

        match opened {
            Ok(()) => {
                info!(gateway_order_id = %session.gateway_order_id, "Awaiting payment");
                Ok(CheckoutOutcome::AwaitingPayment(session))
            }
            Err(e) => Err(self.payment_failed(generation, order_id, e.to_string())),
        }
    }

    /// Wait for the open payment window's terminal event, verify a
    /// confirmation with the server, and complete the order.
    ///
    /// # Errors
    ///
    /// - `NoPendingPayment`: no window is open
    /// - `CheckoutInProgress`: another caller is already waiting
    /// - `Superseded`: a newer submission or reset closed this window
    /// - `PaymentGatewayFailed`: the gateway reported failure
    /// - `PaymentVerificationFailed`: the server rejected the signed payload
    #[instrument(skip(self))]
    pub async fn await_payment(&self) -> Result<CheckoutOutcome> {
        let (generation, session, events) = {
            let mut flow = self.flow();
            let pending = flow.pending.as_mut().ok_or(ClientError::NoPendingPayment)?;
            let events = pending
                .events
                .take()
                .ok_or(ClientError::CheckoutInProgress)?;
            (pending.generation, pending.session.clone(), events)
        };

        let event = events.await;
        let order_id = session.order_id.clone();

        {
            let mut flow = self.flow();
            if flow.generation != generation {
                debug!(gateway_order_id = %session.gateway_order_id, "Ignoring event for superseded session");
                return Err(ClientError::Superseded);
            }
            flow.pending = None;
            if matches!(event, Ok(GatewayEvent::Confirmed(_))) {
                flow.state = CheckoutState::Verifying {
                    order_id: order_id.clone(),
                };
            }
        }

        let confirmation = match event {
            Ok(GatewayEvent::Confirmed(confirmation)) => confirmation,
            Ok(GatewayEvent::Failed(failure)) => {
                return Err(self.payment_failed(generation, order_id, failure.description));
            }
            Err(_) => {
                return Err(self.payment_failed(
                    generation,
                    order_id,
                    "Payment cancelled".to_string(),
                ));
            }
        };

        let store = &self.inner.store;
        match store.orders().verify(&order_id, &confirmation).await {
            Ok(_) => {
                self.complete(generation, &order_id).await;
                store.notifier().success("Payment successful!");
                Ok(CheckoutOutcome::Completed { order_id })
            }
            Err(err) => {
                warn!(order_id = %order_id, error = %err, "Payment verification failed");
                if self.set_failed(
                    generation,
                    FailureStage::Verification,
                    Some(order_id),
                    err.to_string(),
                ) {
                    store.notifier().error("Payment verification failed");
                }
                Err(err)
            }
        }
    }

    /// Submit and, for gateway payments, wait for the payment to resolve.
    ///
    /// # Errors
    ///
    /// Any error of [`submit`](Self::submit) or
    /// [`await_payment`](Self::await_payment).
    pub async fn checkout(&self, form: CheckoutForm) -> Result<CheckoutOutcome> {
        match self.submit(form).await? {
            CheckoutOutcome::AwaitingPayment(_) => self.await_payment().await,
            completed @ CheckoutOutcome::Completed { .. } => Ok(completed),
        }
    }

    /// Return to `Idle`, closing any open payment window.
    pub fn reset(&self) {
        let stale = {
            let mut flow = self.flow();
            flow.generation += 1;
            flow.state = CheckoutState::Idle;
            flow.pending.take()
        };
        if let Some(stale) = stale {
            stale.module.close(&stale.session.gateway_order_id);
        }
    }

    /// The gateway session of the open window, if any.
    #[must_use]
    pub fn pending_gateway_order(&self) -> Option<GatewayOrderId> {
        self.flow()
            .pending
            .as_ref()
            .map(|p| p.session.gateway_order_id.clone())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn flow(&self) -> MutexGuard<'_, Flow> {
        self.inner
            .flow
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.flow().generation == generation
    }

    /// Clear the cart and enter `Completed`.
    async fn complete(&self, generation: u64, order_id: &OrderId) {
        if let Err(e) = self.inner.store.cart().clear().await {
            warn!(order_id = %order_id, error = %e, "Order placed but cart could not be cleared");
        }

        let mut flow = self.flow();
        if flow.generation == generation {
            flow.state = CheckoutState::Completed {
                order_id: order_id.clone(),
            };
        }
        info!(order_id = %order_id, "Checkout completed");
    }

    fn payment_failed(
        &self,
        generation: u64,
        order_id: OrderId,
        description: String,
    ) -> ClientError {
        let err = ClientError::PaymentGatewayFailed {
            order_id: Some(order_id.clone()),
            description,
        };
        self.fail(generation, FailureStage::Payment, Some(order_id), &err);
        err
    }

    /// Enter `Failed` and notify the user with the error's own message. A
    /// superseded flow fails silently.
    fn fail(
        &self,
        generation: u64,
        stage: FailureStage,
        order_id: Option<OrderId>,
        err: &ClientError,
    ) {
        warn!(?stage, error = %err, "Checkout failed");
        if self.set_failed(generation, stage, order_id, err.to_string()) {
            self.inner.store.notifier().publish(err.notice());
        }
    }

    fn set_failed(
        &self,
        generation: u64,
        stage: FailureStage,
        order_id: Option<OrderId>,
        message: String,
    ) -> bool {
        let mut flow = self.flow();
        if flow.generation != generation {
            return false;
        }
        flow.state = CheckoutState::Failed(CheckoutFailure {
            stage,
            order_id,
            message,
        });
        true
    }
}
