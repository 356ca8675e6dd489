//! Order slice.

use std::sync::Arc;

use shopease_core::{
    CreateOrderRequest, CreateOrderResponse, GatewayOrderId, Order, OrderId, PaymentConfirmation,
};
use tracing::instrument;

use super::{SliceState, Slot};
use crate::api::StorefrontApi;
use crate::error::{ClientError, Result};

/// Orders known to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderData {
    /// The user's order history.
    pub orders: Vec<Order>,
    /// The order being viewed or paid for.
    pub current: Option<Order>,
    /// Gateway session of the current order, until it is verified.
    pub gateway_order_id: Option<GatewayOrderId>,
}

#[derive(Debug, Clone)]
pub struct OrderSlice<A> {
    api: A,
    slot: Arc<Slot<OrderData>>,
}

impl<A: StorefrontApi> OrderSlice<A> {
    pub(crate) fn new(api: A) -> Self {
        Self {
            api,
            slot: Arc::default(),
        }
    }

    /// Create an order from the server-side cart.
    ///
    /// # Errors
    ///
    /// Server rejections are returned verbatim and recorded.
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    pub async fn create(&self, request: &CreateOrderRequest) -> Result<CreateOrderResponse> {
        self.slot.pending().await;
        match self.api.create_order(request).await {
            Ok(response) => {
                self.slot
                    .fulfilled(|data| {
                        data.current = Some(response.order.clone());
                        data.gateway_order_id.clone_from(&response.razorpay_order_id);
                    })
                    .await;
                Ok(response)
            }
            Err(e) => Err(self.reject(ClientError::from_api(e, "Failed to create order")).await),
        }
    }

    /// Submit the gateway's signed confirmation for server verification.
    ///
    /// # Errors
    ///
    /// Returns `PaymentVerificationFailed` if the server rejects the payload.
    /// The order stays unpaid.
    #[instrument(skip(self, confirmation), fields(order_id = %order_id))]
    pub async fn verify(
        &self,
        order_id: &OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<Order> {
        self.slot.pending().await;
        match self.api.verify_payment(order_id, confirmation).await {
            Ok(response) => {
                let order = response.order;
                self.slot
                    .fulfilled(|data| {
                        if let Some(existing) = data.orders.iter_mut().find(|o| o.id == order.id) {
                            existing.clone_from(&order);
                        }
                        data.current = Some(order.clone());
                        data.gateway_order_id = None;
                    })
                    .await;
                Ok(order)
            }
            Err(e) => {
                let err = match ClientError::from_api(e, "Payment verification failed") {
                    ClientError::ServerRejected(message) => ClientError::PaymentVerificationFailed {
                        order_id: order_id.clone(),
                        message,
                    },
                    other => other,
                };
                Err(self.reject(err).await)
            }
        }
    }

    /// Replace the order history with the server's.
    #[instrument(skip(self))]
    pub async fn fetch_list(&self) -> SliceState<OrderData> {
        self.slot.pending().await;
        match self.api.list_orders().await {
            Ok(orders) => self.slot.fulfilled(|data| data.orders = orders).await,
            Err(e) => {
                self.reject(ClientError::from_api(e, "Failed to fetch orders")).await;
            }
        }
        self.slot.snapshot().await
    }

    /// Load one order as the current order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn fetch_one(&self, order_id: &OrderId) -> SliceState<OrderData> {
        self.slot.pending().await;
        match self.api.get_order(order_id).await {
            Ok(order) => self.slot.fulfilled(|data| data.current = Some(order)).await,
            Err(e) => {
                self.reject(ClientError::from_api(e, "Failed to fetch order")).await;
            }
        }
        self.slot.snapshot().await
    }

    /// Download the order's invoice as PDF bytes. Slice state is untouched.
    ///
    /// # Errors
    ///
    /// Server rejections are returned.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn invoice(&self, order_id: &OrderId) -> Result<Vec<u8>> {
        self.api
            .order_invoice(order_id)
            .await
            .map_err(|e| ClientError::from_api(e, "Failed to download invoice"))
    }

    /// Drop the current order (leaving its detail view).
    pub async fn clear_current(&self) {
        self.slot
            .update(|data| {
                data.current = None;
                data.gateway_order_id = None;
            })
            .await;
    }

    pub async fn state(&self) -> SliceState<OrderData> {
        self.slot.snapshot().await
    }

    pub(crate) async fn reset(&self) {
        self.slot.update(|data| *data = OrderData::default()).await;
    }

    async fn reject(&self, err: ClientError) -> ClientError {
        self.slot.rejected(&err).await;
        err
    }
}
