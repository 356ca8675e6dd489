//! Admin dashboard slice.

use std::sync::Arc;

use shopease_core::{AdminStats, Order, OrderId, OrderStatus};
use tracing::instrument;

use super::{SliceState, Slot};
use crate::api::StorefrontApi;
use crate::error::{ClientError, Result};

/// Store-wide figures and every customer's orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminData {
    pub stats: AdminStats,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone)]
pub struct AdminSlice<A> {
    api: A,
    slot: Arc<Slot<AdminData>>,
}

impl<A: StorefrontApi> AdminSlice<A> {
    pub(crate) fn new(api: A) -> Self {
        Self {
            api,
            slot: Arc::default(),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_stats(&self) -> SliceState<AdminData> {
        self.slot.pending().await;
        match self.api.admin_stats().await {
            Ok(stats) => self.slot.fulfilled(|data| data.stats = stats).await,
            Err(e) => {
                let err = ClientError::from_api(e, "Failed to fetch stats");
                self.slot.rejected(&err).await;
            }
        }
        self.slot.snapshot().await
    }

    #[instrument(skip(self))]
    pub async fn fetch_orders(&self) -> SliceState<AdminData> {
        self.slot.pending().await;
        match self.api.admin_orders().await {
            Ok(orders) => self.slot.fulfilled(|data| data.orders = orders).await,
            Err(e) => {
                let err = ClientError::from_api(e, "Failed to fetch orders");
                self.slot.rejected(&err).await;
            }
        }
        self.slot.snapshot().await
    }

    /// Move an order to `status`, then reload the order list.
    ///
    /// # Errors
    ///
    /// Server rejections are returned and recorded; the list is not reloaded.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<()> {
        self.slot.pending().await;
        if let Err(e) = self.api.update_order_status(id, status).await {
            let err = ClientError::from_api(e, "Failed to update order status");
            self.slot.rejected(&err).await;
            return Err(err);
        }
        self.fetch_orders().await;
        Ok(())
    }

    pub async fn state(&self) -> SliceState<AdminData> {
        self.slot.snapshot().await
    }

    pub(crate) async fn reset(&self) {
        self.slot.update(|data| *data = AdminData::default()).await;
    }
}
