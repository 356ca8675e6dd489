//! Order history pages.

use std::path::PathBuf;

use shopease_client::require_auth;
use shopease_core::OrderId;

use super::{CliError, Context, loaded};
use crate::views;

pub async fn list(ctx: &Context) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let data = loaded(ctx.store.orders().fetch_list().await)?;
    views::order_list(&data.orders, ctx.config.currency);
    Ok(())
}

pub async fn show(ctx: &Context, id: &OrderId) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let orders = ctx.store.orders();
    let data = loaded(orders.fetch_one(id).await)?;
    if let Some(order) = &data.current {
        views::order_detail(order, ctx.config.currency);
    }
    orders.clear_current().await;
    Ok(())
}

/// Save the invoice PDF, by default to `invoice-<id>.pdf`.
pub async fn invoice(
    ctx: &Context,
    id: &OrderId,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let pdf = ctx.store.orders().invoice(id).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(format!("invoice-{id}.pdf")));
    tokio::fs::write(&path, &pdf).await?;
    tracing::info!(path = %path.display(), bytes = pdf.len(), "Invoice saved");
    ctx.store
        .notifier()
        .success(format!("Invoice saved to {}", path.display()));
    Ok(())
}
