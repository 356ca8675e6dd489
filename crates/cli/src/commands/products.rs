//! Catalog pages. Browsing does not require a session.

use shopease_core::{ProductId, ProductQuery};

use super::{CliError, Context, loaded};
use crate::views;

pub async fn list(ctx: &Context, query: &ProductQuery) -> Result<(), CliError> {
    let data = loaded(ctx.store.products().fetch_list(query).await)?;
    views::product_list(&data, ctx.config.currency);
    Ok(())
}

pub async fn show(ctx: &Context, id: &ProductId) -> Result<(), CliError> {
    let products = ctx.store.products();
    let data = loaded(products.fetch_one(id).await)?;
    if let Some(product) = &data.current {
        views::product_detail(product, ctx.config.currency);
    }
    products.clear_current().await;
    Ok(())
}

pub async fn categories(ctx: &Context) -> Result<(), CliError> {
    let data = loaded(ctx.store.products().fetch_categories().await)?;
    views::categories(&data.categories);
    Ok(())
}
