//! Cart slice.

use std::sync::Arc;

use rust_decimal::Decimal;
use shopease_core::{AddToCart, Cart, CartItemId, PriceBreakdown, Product, UpdateCartItem};
use tracing::{debug, instrument};

use super::{SliceState, Slot};
use crate::api::{ApiError, StorefrontApi};
use crate::error::{ClientError, Result};

/// The signed-in user's cart, as last returned by the server.
#[derive(Debug, Clone)]
pub struct CartSlice<A> {
    api: A,
    slot: Arc<Slot<Cart>>,
}

impl<A: StorefrontApi> CartSlice<A> {
    pub(crate) fn new(api: A) -> Self {
        Self {
            api,
            slot: Arc::default(),
        }
    }

    /// Replace the local cart with the server's.
    ///
    /// A failure is recorded in the returned state; the previous cart stays.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> SliceState<Cart> {
        self.slot.pending().await;
        let result = self.api.get_cart().await;
        // Errors are recorded in the slice
        let _ = self.settle(result, "Failed to fetch cart").await;
        self.slot.snapshot().await
    }

    /// Add `quantity` of `product`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a zero quantity and `InsufficientStock` when
    /// the quantity exceeds the product's stock, both without calling the
    /// server. Server rejections are returned and recorded.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(ClientError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if quantity > product.stock {
            return Err(ClientError::InsufficientStock {
                requested: quantity,
                available: product.stock,
            });
        }

        self.slot.pending().await;
        let body = AddToCart {
            product_id: product.id.clone(),
            quantity,
        };
        let result = self.api.add_to_cart(&body).await;
        self.settle(result, "Failed to add to cart").await
    }

    /// Set an item's quantity. A quantity below 1 removes the item.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the item is not in the local cart and
    /// `InsufficientStock` if the quantity exceeds the product's stock, both
    /// without calling the server.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_quantity(&self, item_id: &CartItemId, quantity: u32) -> Result<Cart> {
        let Some(item) = self.slot.data().await.item(item_id).cloned() else {
            return Err(ClientError::Validation("Item not found in cart".to_string()));
        };

        if quantity < 1 {
            debug!("Quantity below 1, removing item");
            return self.remove(item_id).await;
        }
        if quantity > item.product.stock {
            return Err(ClientError::InsufficientStock {
                requested: quantity,
                available: item.product.stock,
            });
        }

        self.slot.pending().await;
        let result = self
            .api
            .update_cart_item(item_id, UpdateCartItem { quantity })
            .await;
        self.settle(result, "Failed to update cart").await
    }

    /// Remove an item.
    ///
    /// # Errors
    ///
    /// Server rejections are returned and recorded.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(&self, item_id: &CartItemId) -> Result<Cart> {
        self.slot.pending().await;
        let result = self.api.remove_cart_item(item_id).await;
        self.settle(result, "Failed to remove from cart").await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Server rejections are returned and recorded; the local cart is kept.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        self.slot.pending().await;
        match self.api.clear_cart().await {
            Ok(()) => {
                self.slot.fulfilled(|cart| cart.items.clear()).await;
                Ok(())
            }
            Err(e) => {
                let err = ClientError::from_api(e, "Failed to clear cart");
                self.slot.rejected(&err).await;
                Err(err)
            }
        }
    }

    pub async fn state(&self) -> SliceState<Cart> {
        self.slot.snapshot().await
    }

    /// Sum of unit price × quantity over the local cart.
    pub async fn subtotal(&self) -> Decimal {
        self.slot.data().await.subtotal()
    }

    /// Advisory tax, shipping, and total for the local cart.
    pub async fn pricing(&self) -> PriceBreakdown {
        self.slot.data().await.pricing()
    }

    /// Forget the local cart (logout).
    pub(crate) async fn reset(&self) {
        self.slot.update(|cart| cart.items.clear()).await;
    }

    async fn settle(
        &self,
        result: std::result::Result<Cart, ApiError>,
        fallback: &str,
    ) -> Result<Cart> {
        match result {
            Ok(cart) => {
                self.slot.fulfilled(|data| data.clone_from(&cart)).await;
                Ok(cart)
            }
            Err(e) => {
                let err = ClientError::from_api(e, fallback);
                self.slot.rejected(&err).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, product};

    fn slice() -> (FakeApi, CartSlice<FakeApi>) {
        let api = FakeApi::new();
        (api.clone(), CartSlice::new(api))
    }

    #[tokio::test]
    async fn test_fetch_replaces_local_cart() {
        let (api, cart) = slice();
        api.seed_cart("p1", 2);

        let state = cart.fetch().await;
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.data.item_count(), 2);

        api.seed_cart("p2", 1);
        let state = cart.fetch().await;
        assert_eq!(state.data, api.state().cart);
    }

    #[tokio::test]
    async fn test_overlapping_fetches_keep_last_settled_cart() {
        let (api, cart) = slice();
        api.seed_cart("p1", 1);

        let hold = api.hold("get_cart");
        let slow = tokio::spawn({
            let cart = cart.clone();
            async move { cart.fetch().await }
        });
        while api.calls("get_cart") == 0 {
            tokio::task::yield_now().await;
        }

        api.seed_cart("p2", 1);
        let fast = cart.fetch().await;
        assert_eq!(fast.data.item_count(), 2);

        // The held request settles last and sees the newest server cart
        api.seed_cart("p1", 2);
        hold.notify_one();
        let slow = slow.await.unwrap();

        let server = api.state().cart.clone();
        assert_eq!(server.item_count(), 4);
        assert_eq!(slow.data, server);
        assert_eq!(cart.state().await.data, server);
        assert!(!cart.state().await.loading);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_cart() {
        let (api, cart) = slice();
        api.seed_cart("p1", 1);
        cart.fetch().await;

        api.fail("get_cart", 500, None);
        let state = cart.fetch().await;

        assert_eq!(state.error.as_deref(), Some("Failed to fetch cart"));
        assert_eq!(state.data.items.len(), 1);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_add_rejects_quantity_over_stock_before_call() {
        let (api, cart) = slice();

        let err = cart.add(&product("p2", "Keyboard", 250, 2), 3).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InsufficientStock {
                requested: 3,
                available: 2
            }
        ));
        assert!(matches!(
            cart.add(&product("p2", "Keyboard", 250, 2), 0).await,
            Err(ClientError::Validation(_))
        ));
        assert_eq!(api.calls("add_to_cart"), 0);
    }

    #[tokio::test]
    async fn test_add_takes_server_cart() {
        let (_, cart) = slice();

        let returned = cart.add(&product("p1", "Wireless Mouse", 600, 5), 2).await.unwrap();
        assert_eq!(returned.item_count(), 2);
        assert_eq!(cart.state().await.data, returned);
        assert_eq!(cart.subtotal().await, Decimal::from(1200));
    }

    #[tokio::test]
    async fn test_update_quantity_below_one_removes() {
        let (api, cart) = slice();
        api.seed_cart("p1", 2);
        let item_id = cart.fetch().await.data.items[0].id.clone();

        let returned = cart.update_quantity(&item_id, 0).await.unwrap();

        assert!(returned.is_empty());
        assert_eq!(api.calls("remove_cart_item"), 1);
        assert_eq!(api.calls("update_cart_item"), 0);
    }

    #[tokio::test]
    async fn test_update_quantity_over_stock_is_rejected_locally() {
        let (api, cart) = slice();
        api.seed_cart("p2", 1);
        let item_id = cart.fetch().await.data.items[0].id.clone();

        assert!(matches!(
            cart.update_quantity(&item_id, 3).await,
            Err(ClientError::InsufficientStock { .. })
        ));
        assert_eq!(api.calls("update_cart_item"), 0);

        let returned = cart.update_quantity(&item_id, 2).await.unwrap();
        assert_eq!(returned.item_count(), 2);
    }

    #[tokio::test]
    async fn test_server_rejection_is_recorded_and_returned() {
        let (api, cart) = slice();
        api.fail("add_to_cart", 400, Some("Product is no longer available"));

        let err = cart
            .add(&product("p1", "Wireless Mouse", 600, 5), 1)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Product is no longer available");
        assert_eq!(
            cart.state().await.error.as_deref(),
            Some("Product is no longer available")
        );
    }

    #[tokio::test]
    async fn test_clear_empties_cart() {
        let (api, cart) = slice();
        api.seed_cart("p1", 1);
        cart.fetch().await;

        cart.clear().await.unwrap();

        assert!(cart.state().await.data.is_empty());
        assert_eq!(api.calls("clear_cart"), 1);
    }
}
