//! Payment window rendered in the terminal.
//!
//! The request is printed and the customer pastes the payment ID and
//! signature their gateway dashboard shows. An empty line cancels.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::{Arc, Mutex, PoisonError};

use shopease_client::{GatewayError, GatewayEvent, GatewayLoader, GatewayModule, PaymentRequest};
use shopease_core::{GatewayOrderId, PaymentConfirmation, PaymentFailure};
use tokio::sync::oneshot;

use crate::views;

/// Loads the terminal payment window.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalGatewayLoader;

impl GatewayLoader for TerminalGatewayLoader {
    async fn load(&self) -> Result<Arc<dyn GatewayModule>, GatewayError> {
        Ok(Arc::new(TerminalGateway::default()))
    }
}

type PendingSender = Arc<Mutex<Option<oneshot::Sender<GatewayEvent>>>>;

#[derive(Debug, Default)]
struct TerminalGateway {
    prompts: Mutex<HashMap<GatewayOrderId, PendingSender>>,
}

impl GatewayModule for TerminalGateway {
    fn open(
        &self,
        request: PaymentRequest,
    ) -> Result<oneshot::Receiver<GatewayEvent>, GatewayError> {
        views::payment_request(&request);

        let (tx, rx) = oneshot::channel();
        let sender: PendingSender = Arc::new(Mutex::new(Some(tx)));
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request.gateway_order_id.clone(), Arc::clone(&sender));

        // Stdin cannot be interrupted; a closed window just drops the answer
        tokio::task::spawn_blocking(move || {
            let event = read_confirmation(&request.gateway_order_id);
            let tx = sender.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(tx) = tx {
                let _ = tx.send(event);
            }
        });
        Ok(rx)
    }

    fn close(&self, gateway_order_id: &GatewayOrderId) {
        let sender = self
            .prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(gateway_order_id);
        if let Some(sender) = sender {
            tracing::debug!(%gateway_order_id, "Closing payment prompt");
            sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
    }
}

/// Read `<payment_id> <signature>` from stdin.
fn read_confirmation(gateway_order_id: &GatewayOrderId) -> GatewayEvent {
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        tracing::warn!(error = %e, "Failed to read payment confirmation");
        return GatewayEvent::Failed(PaymentFailure::new("Could not read payment details"));
    }
    parse_confirmation(gateway_order_id, &line)
}

fn parse_confirmation(gateway_order_id: &GatewayOrderId, line: &str) -> GatewayEvent {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(payment_id), Some(signature)) => GatewayEvent::Confirmed(PaymentConfirmation {
            gateway_order_id: gateway_order_id.clone(),
            payment_id: payment_id.into(),
            signature: signature.to_string(),
        }),
        (None, _) => GatewayEvent::Failed(PaymentFailure::new("Payment cancelled by user")),
        (Some(_), None) => GatewayEvent::Failed(PaymentFailure {
            code: Some("BAD_REQUEST_ERROR".to_string()),
            description: "Payment signature missing".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation() {
        let order = GatewayOrderId::new("order_rzp_1");

        match parse_confirmation(&order, "pay_123 sig_abc\n") {
            GatewayEvent::Confirmed(confirmation) => {
                assert_eq!(confirmation.gateway_order_id, order);
                assert_eq!(confirmation.payment_id.as_str(), "pay_123");
                assert_eq!(confirmation.signature, "sig_abc");
            }
            GatewayEvent::Failed(failure) => panic!("unexpected failure: {failure:?}"),
        }
    }

    #[test]
    fn test_empty_line_cancels() {
        let order = GatewayOrderId::new("order_rzp_1");
        assert_eq!(
            parse_confirmation(&order, "\n"),
            GatewayEvent::Failed(PaymentFailure::new("Payment cancelled by user"))
        );
        assert!(matches!(
            parse_confirmation(&order, "pay_123"),
            GatewayEvent::Failed(PaymentFailure { code: Some(_), .. })
        ));
    }
}
