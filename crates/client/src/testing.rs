//! In-memory doubles for unit tests: a fake storefront API and a scripted
//! payment gateway.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use secrecy::SecretString;
use shopease_core::{
    AddToCart, AdminStats, Cart, CartItem, CartItemId, CreateOrderRequest, CreateOrderResponse,
    CurrentUser, GatewayOrderId, GatewayPaymentId, LoginRequest, LoginResponse, Order, OrderId,
    OrderItem, OrderStatus, PaymentConfirmation, PaymentFailure, Product, ProductId, ProductPage,
    ProductQuery, ProductRef, UpdateCartItem, UserId, UserRole, VerifyPaymentResponse,
};
use tokio::sync::{Notify, oneshot};

use crate::api::{ApiError, StorefrontApi};
use crate::gateway::{GatewayError, GatewayEvent, GatewayLoader, GatewayModule, PaymentRequest};
use crate::session::Session;

/// Signature the fake server accepts.
pub const VALID_SIGNATURE: &str = "valid-signature";
pub const GATEWAY_KEY: &str = "rzp_test_key";
pub const PASSWORD: &str = "secret";

pub fn product(id: &str, name: &str, price: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: Decimal::from(price),
        category: "Electronics".to_string(),
        stock,
        images: Vec::new(),
    }
}

pub fn user(role: UserRole) -> CurrentUser {
    CurrentUser {
        id: UserId::new("u1"),
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        role,
    }
}

/// A session that is already signed in as `role`.
pub async fn signed_in(role: UserRole) -> Session {
    let session = Session::in_memory();
    session
        .begin(SecretString::from("tok_test"), user(role))
        .await
        .unwrap();
    session
}

// =============================================================================
// FakeApi
// =============================================================================

#[derive(Debug, Default)]
pub struct FakeState {
    pub products: Vec<Product>,
    pub cart: Cart,
    pub orders: Vec<Order>,
    pub users: Vec<CurrentUser>,
    pub stats: AdminStats,
    /// Whether gateway orders get a gateway session id and key.
    pub gateway_details: bool,
    /// Operations that fail with the given status and message.
    pub failures: HashMap<&'static str, (u16, Option<String>)>,
    /// Operations that wait for a permit before answering.
    pub holds: HashMap<&'static str, Arc<Notify>>,
    pub calls: Vec<&'static str>,
    next_id: u32,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

/// Storefront API backed by in-memory state.
#[derive(Debug, Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        {
            let mut state = api.state();
            state.products = vec![
                product("p1", "Wireless Mouse", 600, 5),
                product("p2", "Keyboard", 250, 2),
            ];
            state.users = vec![user(UserRole::User)];
            state.gateway_details = true;
        }
        api
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Put `quantity` of product `id` straight into the server cart.
    pub fn seed_cart(&self, id: &str, quantity: u32) {
        let mut state = self.state();
        let product = state
            .products
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
            .unwrap();
        let item_id = state.next_id("ci");
        state.cart.items.push(CartItem {
            id: CartItemId::new(item_id),
            price: Some(product.price),
            product,
            quantity,
        });
    }

    pub fn fail(&self, op: &'static str, status: u16, message: Option<&str>) {
        self.state()
            .failures
            .insert(op, (status, message.map(str::to_owned)));
    }

    /// Make `op` wait until the returned handle is notified.
    pub fn hold(&self, op: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state().holds.insert(op, Arc::clone(&notify));
        notify
    }

    pub fn calls(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.state().orders.iter().find(|o| &o.id == id).cloned()
    }

    async fn enter(&self, op: &'static str) -> Result<(), ApiError> {
        let hold = {
            let mut state = self.state();
            state.calls.push(op);
            state.holds.remove(op)
        };
        if let Some(hold) = hold {
            hold.notified().await;
        }

        match self.state().failures.get(op) {
            Some((status, message)) => Err(ApiError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn rejected(status: u16, message: &str) -> ApiError {
    ApiError::Rejected {
        status,
        message: Some(message.to_string()),
    }
}

impl StorefrontApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.enter("login").await?;
        let state = self.state();
        state
            .users
            .iter()
            .find(|u| u.email == request.email && request.password == PASSWORD)
            .map(|user| LoginResponse {
                token: format!("tok_{}", user.id),
                user: user.clone(),
            })
            .ok_or_else(|| rejected(401, "Invalid email or password"))
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.enter("current_user").await?;
        self.state()
            .users
            .first()
            .cloned()
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.enter("get_cart").await?;
        Ok(self.state().cart.clone())
    }

    async fn add_to_cart(&self, body: &AddToCart) -> Result<Cart, ApiError> {
        self.enter("add_to_cart").await?;
        let mut state = self.state();
        let product = state
            .products
            .iter()
            .find(|p| p.id == body.product_id)
            .cloned()
            .ok_or_else(|| rejected(404, "Product not found"))?;

        if let Some(item) = state
            .cart
            .items
            .iter_mut()
            .find(|i| i.product.id == body.product_id)
        {
            if item.quantity + body.quantity > product.stock {
                return Err(rejected(400, "Insufficient stock"));
            }
            item.quantity += body.quantity;
        } else {
            if body.quantity > product.stock {
                return Err(rejected(400, "Insufficient stock"));
            }
            let id = state.next_id("ci");
            state.cart.items.push(CartItem {
                id: CartItemId::new(id),
                price: Some(product.price),
                product,
                quantity: body.quantity,
            });
        }
        Ok(state.cart.clone())
    }

    async fn update_cart_item(
        &self,
        item_id: &CartItemId,
        body: UpdateCartItem,
    ) -> Result<Cart, ApiError> {
        self.enter("update_cart_item").await?;
        let mut state = self.state();
        let item = state
            .cart
            .items
            .iter_mut()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| rejected(404, "Item not found in cart"))?;
        item.quantity = body.quantity;
        Ok(state.cart.clone())
    }

    async fn remove_cart_item(&self, item_id: &CartItemId) -> Result<Cart, ApiError> {
        self.enter("remove_cart_item").await?;
        let mut state = self.state();
        state.cart.items.retain(|i| &i.id != item_id);
        Ok(state.cart.clone())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.enter("clear_cart").await?;
        self.state().cart.items.clear();
        Ok(())
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, ApiError> {
        self.enter("create_order").await?;
        let mut state = self.state();
        if state.cart.is_empty() {
            return Err(rejected(400, "Cart is empty"));
        }

        let pricing = state.cart.pricing();
        let id = state.next_id("o");
        let order = Order {
            id: OrderId::new(id),
            user: None,
            order_items: state
                .cart
                .items
                .iter()
                .map(|item| OrderItem {
                    product: Some(ProductRef::Id(item.product.id.clone())),
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    price: item.unit_price(),
                    image: None,
                })
                .collect(),
            shipping_address: request.shipping_address.clone(),
            payment_method: request.payment_method,
            items_price: pricing.items,
            tax_price: pricing.tax,
            shipping_price: pricing.shipping,
            total_price: pricing.total,
            is_paid: false,
            paid_at: None,
            status: OrderStatus::Pending,
            created_at: None,
        };
        state.orders.push(order.clone());

        let gateway = request.payment_method.requires_gateway() && state.gateway_details;
        let razorpay_order_id = if gateway {
            Some(GatewayOrderId::new(state.next_id("order_gw")))
        } else {
            None
        };
        Ok(CreateOrderResponse {
            order,
            razorpay_order_id,
            key_id: gateway.then(|| GATEWAY_KEY.to_string()),
        })
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.enter("list_orders").await?;
        Ok(self.state().orders.clone())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.enter("get_order").await?;
        self.order(id)
            .ok_or_else(|| rejected(404, "Order not found"))
    }

    async fn verify_payment(
        &self,
        id: &OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifyPaymentResponse, ApiError> {
        self.enter("verify_payment").await?;
        if confirmation.signature != VALID_SIGNATURE {
            return Err(rejected(400, "Invalid payment signature"));
        }
        let mut state = self.state();
        let order = state
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| rejected(404, "Order not found"))?;
        order.is_paid = true;
        order.status = OrderStatus::Processing;
        Ok(VerifyPaymentResponse {
            order: order.clone(),
        })
    }

    async fn order_invoice(&self, id: &OrderId) -> Result<Vec<u8>, ApiError> {
        self.enter("order_invoice").await?;
        self.order(id)
            .map(|o| format!("%PDF invoice {}", o.id).into_bytes())
            .ok_or_else(|| rejected(404, "Order not found"))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        self.enter("list_products").await?;
        let state = self.state();
        let products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| c.is_empty() || p.category == c)
            })
            .filter(|p| {
                query.search.as_deref().is_none_or(|s| {
                    p.name.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .cloned()
            .collect();
        Ok(ProductPage {
            total: products.len() as u64,
            products,
            total_pages: 1,
            current_page: query.page.max(1),
        })
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.enter("get_product").await?;
        self.state()
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| rejected(404, "Product not found"))
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.enter("categories").await?;
        let mut categories: Vec<String> = self
            .state()
            .products
            .iter()
            .map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.enter("admin_stats").await?;
        Ok(self.state().stats.clone())
    }

    async fn admin_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.enter("admin_orders").await?;
        Ok(self.state().orders.clone())
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        self.enter("update_order_status").await?;
        let mut state = self.state();
        let order = state
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| rejected(404, "Order not found"))?;
        order.status = status;
        Ok(())
    }
}

// =============================================================================
// Scripted gateway
// =============================================================================

/// Gateway whose events are fired by the test.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    opened: Mutex<Vec<PaymentRequest>>,
    closed: Mutex<Vec<GatewayOrderId>>,
    senders: Mutex<HashMap<GatewayOrderId, oneshot::Sender<GatewayEvent>>>,
}

impl ScriptedGateway {
    pub fn opened(&self) -> Vec<PaymentRequest> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<GatewayOrderId> {
        self.closed.lock().unwrap().clone()
    }

    /// Sessions opened and not yet closed or resolved.
    pub fn open_sessions(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    /// Latest opened session's gateway order id.
    pub fn current(&self) -> GatewayOrderId {
        self.opened().last().unwrap().gateway_order_id.clone()
    }

    fn fire(&self, id: &GatewayOrderId, event: GatewayEvent) -> bool {
        self.senders
            .lock()
            .unwrap()
            .remove(id)
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    pub fn confirm(&self, id: &GatewayOrderId, signature: &str) -> bool {
        self.fire(
            id,
            GatewayEvent::Confirmed(PaymentConfirmation {
                gateway_order_id: id.clone(),
                payment_id: GatewayPaymentId::new(format!("pay_{id}")),
                signature: signature.to_string(),
            }),
        )
    }

    pub fn decline(&self, id: &GatewayOrderId, description: &str) -> bool {
        self.fire(id, GatewayEvent::Failed(PaymentFailure::new(description)))
    }
}

impl GatewayModule for ScriptedGateway {
    fn open(&self, request: PaymentRequest) -> Result<oneshot::Receiver<GatewayEvent>, GatewayError> {
        let (tx, rx) = oneshot::channel();
        self.senders
            .lock()
            .unwrap()
            .insert(request.gateway_order_id.clone(), tx);
        self.opened.lock().unwrap().push(request);
        Ok(rx)
    }

    fn close(&self, gateway_order_id: &GatewayOrderId) {
        self.senders.lock().unwrap().remove(gateway_order_id);
        self.closed.lock().unwrap().push(gateway_order_id.clone());
    }
}

/// Loader that hands out one shared [`ScriptedGateway`] and counts loads.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLoader {
    pub gateway: Arc<ScriptedGateway>,
    loads: Arc<AtomicUsize>,
}

impl ScriptedLoader {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl GatewayLoader for ScriptedLoader {
    async fn load(&self) -> Result<Arc<dyn GatewayModule>, GatewayError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.gateway) as Arc<dyn GatewayModule>)
    }
}
