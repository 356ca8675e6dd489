//! A payment gateway that answers every window immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use shopease_client::{GatewayError, GatewayEvent, GatewayLoader, GatewayModule, PaymentRequest};
use shopease_core::{GatewayOrderId, GatewayPaymentId, PaymentConfirmation, PaymentFailure};
use tokio::sync::oneshot;

/// How the gateway answers the next windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Confirm with this signature.
    Confirm(String),
    /// Report a failure with this description.
    Decline(String),
    /// Close the window without an event.
    Dismiss,
}

/// Gateway that resolves each window as soon as it opens.
#[derive(Debug)]
pub struct AutoGateway {
    answer: Mutex<Answer>,
    opened: Mutex<Vec<PaymentRequest>>,
}

impl AutoGateway {
    #[must_use]
    pub fn new(answer: Answer) -> Self {
        Self {
            answer: Mutex::new(answer),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Change the answer for windows opened from now on.
    pub fn answer(&self, answer: Answer) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = answer;
    }

    /// Every request a window was opened with.
    #[must_use]
    pub fn opened(&self) -> Vec<PaymentRequest> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GatewayModule for AutoGateway {
    fn open(
        &self,
        request: PaymentRequest,
    ) -> Result<oneshot::Receiver<GatewayEvent>, GatewayError> {
        let (tx, rx) = oneshot::channel();
        let answer = self
            .answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let event = match answer {
            Answer::Confirm(signature) => Some(GatewayEvent::Confirmed(PaymentConfirmation {
                payment_id: GatewayPaymentId::new(format!("pay_{}", request.gateway_order_id)),
                gateway_order_id: request.gateway_order_id.clone(),
                signature,
            })),
            Answer::Decline(description) => {
                Some(GatewayEvent::Failed(PaymentFailure::new(description)))
            }
            Answer::Dismiss => None,
        };
        if let Some(event) = event {
            let _ = tx.send(event);
        }

        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(rx)
    }

    fn close(&self, gateway_order_id: &GatewayOrderId) {
        tracing::debug!(%gateway_order_id, "Test gateway window closed");
    }
}

/// Hands out one shared [`AutoGateway`] and counts loads.
#[derive(Debug, Clone)]
pub struct AutoGatewayLoader {
    pub gateway: Arc<AutoGateway>,
    loads: Arc<AtomicUsize>,
}

impl AutoGatewayLoader {
    #[must_use]
    pub fn new(answer: Answer) -> Self {
        Self {
            gateway: Arc::new(AutoGateway::new(answer)),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Loader whose gateway confirms with the signature the API accepts.
    #[must_use]
    pub fn confirming() -> Self {
        Self::new(Answer::Confirm(crate::VALID_SIGNATURE.to_string()))
    }

    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl GatewayLoader for AutoGatewayLoader {
    async fn load(&self) -> Result<Arc<dyn GatewayModule>, GatewayError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.gateway) as Arc<dyn GatewayModule>)
    }
}
