//! Checkout page.

use shopease_client::{
    CheckoutCoordinator, CheckoutForm, CheckoutOutcome, CheckoutSettings, LazyGateway,
    require_auth,
};

use super::{CliError, Context, loaded};
use crate::gateway::TerminalGatewayLoader;
use crate::views;

/// Check out the cart. Gateway payments are confirmed in the terminal.
pub async fn run(ctx: &Context, form: CheckoutForm) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;

    let cart = loaded(ctx.store.cart().fetch().await)?;
    views::cart(&cart, ctx.config.currency);

    let coordinator = CheckoutCoordinator::new(
        ctx.store.clone(),
        LazyGateway::new(TerminalGatewayLoader),
        CheckoutSettings::from_config(&ctx.config),
    );

    let outcome = coordinator.checkout(form).await;
    tracing::debug!(state = ?coordinator.state(), "Checkout finished");

    match outcome? {
        CheckoutOutcome::Completed { order_id } => {
            let orders = ctx.store.orders();
            let data = loaded(orders.fetch_one(&order_id).await)?;
            if let Some(order) = &data.current {
                views::order_detail(order, ctx.config.currency);
            }
            Ok(())
        }
        CheckoutOutcome::AwaitingPayment(session) => {
            // checkout() always waits for the gateway's answer
            Err(CliError::Load(format!(
                "Payment for order {} is still pending",
                session.order_id
            )))
        }
    }
}
