//! Cart page.

use shopease_client::require_auth;
use shopease_core::{Cart, CartItemId, ProductId};

use super::{CliError, Context, loaded};
use crate::views;

pub async fn show(ctx: &Context) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let cart = loaded(ctx.store.cart().fetch().await)?;
    views::cart(&cart, ctx.config.currency);
    Ok(())
}

/// Add a product. The product is loaded first so its stock can be checked.
pub async fn add(ctx: &Context, product_id: &ProductId, quantity: u32) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;

    let products = ctx.store.products();
    let data = loaded(products.fetch_one(product_id).await)?;
    products.clear_current().await;
    let Some(product) = data.current else {
        return Err(CliError::Load("Product not found".to_string()));
    };

    let cart = ctx.store.cart().add(&product, quantity).await?;
    ctx.store.notifier().success("Product added to cart");
    views::cart(&cart, ctx.config.currency);
    Ok(())
}

pub async fn update(ctx: &Context, item_id: &CartItemId, quantity: u32) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let cart_slice = ctx.store.cart();
    loaded(cart_slice.fetch().await)?;

    let cart = cart_slice.update_quantity(item_id, quantity).await?;
    if removed(&cart, item_id) {
        ctx.store.notifier().success("Item removed from cart");
    }
    views::cart(&cart, ctx.config.currency);
    Ok(())
}

/// A quantity below 1 drops the line; the returned cart no longer lists it.
fn removed(cart: &Cart, item_id: &CartItemId) -> bool {
    cart.item(item_id).is_none()
}

pub async fn remove(ctx: &Context, item_id: &CartItemId) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    let cart = ctx.store.cart().remove(item_id).await?;
    ctx.store.notifier().success("Item removed from cart");
    views::cart(&cart, ctx.config.currency);
    Ok(())
}

pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    require_auth(ctx.store.session()).await?;
    ctx.store.cart().clear().await?;
    ctx.store.notifier().success("Cart cleared");
    Ok(())
}
