//! Admin pages. Every command requires the admin role.

use shopease_client::require_admin;
use shopease_core::{OrderId, OrderStatus};

use super::{CliError, Context, loaded};
use crate::views;

pub async fn stats(ctx: &Context) -> Result<(), CliError> {
    require_admin(ctx.store.session()).await?;
    let data = loaded(ctx.store.admin().fetch_stats().await)?;
    views::admin_stats(&data.stats, ctx.config.currency);
    Ok(())
}

pub async fn orders(ctx: &Context) -> Result<(), CliError> {
    require_admin(ctx.store.session()).await?;
    let data = loaded(ctx.store.admin().fetch_orders().await)?;
    views::order_list(&data.orders, ctx.config.currency);
    Ok(())
}

pub async fn set_status(ctx: &Context, id: &OrderId, status: OrderStatus) -> Result<(), CliError> {
    require_admin(ctx.store.session()).await?;
    let admin = ctx.store.admin();
    admin.update_status(id, status).await?;
    ctx.store.notifier().success("Order status updated");

    let data = loaded(admin.state().await)?;
    views::order_list(&data.orders, ctx.config.currency);
    Ok(())
}
