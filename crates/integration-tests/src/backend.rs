//! In-memory storefront API.
//!
//! Implements the REST surface the client talks to, with the same response
//! shapes and `{ "message": ... }` error bodies as the production API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{HeaderValue, Method, StatusCode, header, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use shopease_core::{
    AddToCart, AdminStats, Cart, CartItem, CartItemId, CreateOrderRequest, CreateOrderResponse,
    CurrentUser, GatewayOrderId, LoginRequest, LoginResponse, Order, OrderId, OrderItem,
    OrderStatus, OrderUser, PaymentConfirmation, PriceBreakdown, Product, ProductId, ProductPage,
    ProductRef, UpdateCartItem, UpdateOrderStatus, UserId, UserRole, UserSummary,
    VerifyPaymentResponse,
};

/// Products per listing page.
pub const PAGE_SIZE: usize = 12;

/// Signature the fake API accepts for any payment.
pub const VALID_SIGNATURE: &str = "valid-signature";

/// Public gateway key returned with gateway orders.
pub const GATEWAY_KEY: &str = "rzp_test_key";

pub const CUSTOMER_EMAIL: &str = "asha@example.com";
pub const CUSTOMER_PASSWORD: &str = "secret";
pub const ADMIN_EMAIL: &str = "admin@shopease.test";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// A user the API can authenticate.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: CurrentUser,
    pub password: String,
}

/// A request the API received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path and query, e.g. `/api/products?search=mouse`.
    pub uri: String,
    /// Whether a bearer token was attached.
    pub authorized: bool,
}

/// Everything the API stores.
#[derive(Debug, Default)]
pub struct Backend {
    pub products: Vec<Product>,
    pub accounts: Vec<Account>,
    pub carts: HashMap<UserId, Cart>,
    pub orders: Vec<Order>,
    /// Gateway session opened for each gateway order.
    pub gateway_orders: HashMap<OrderId, GatewayOrderId>,
    /// Whether gateway orders come back with a gateway session and key.
    pub gateway_details: bool,
    /// When set, every request is answered `429` with this `Retry-After`.
    pub retry_after: Option<u64>,
    pub requests: Vec<RecordedRequest>,
    next_id: u64,
}

impl Backend {
    /// A catalog of four products, one customer, and one administrator.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            products: vec![
                product("p1", "Wireless Mouse", "Electronics", 600, 5),
                product("p2", "Mechanical Keyboard", "Electronics", 2500, 2),
                product("p3", "Cotton T-Shirt", "Clothing", 450, 10),
                product("p4", "Coffee Mug", "Home", 250, 0),
            ],
            accounts: vec![
                Account {
                    user: CurrentUser {
                        id: UserId::new("u1"),
                        name: "Asha".to_string(),
                        email: CUSTOMER_EMAIL.to_string(),
                        role: UserRole::User,
                    },
                    password: CUSTOMER_PASSWORD.to_string(),
                },
                Account {
                    user: CurrentUser {
                        id: UserId::new("u-admin"),
                        name: "Store Admin".to_string(),
                        email: ADMIN_EMAIL.to_string(),
                        role: UserRole::Admin,
                    },
                    password: ADMIN_PASSWORD.to_string(),
                },
            ],
            gateway_details: true,
            ..Self::default()
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn product(&self, id: &ProductId) -> Result<Product, ApiFailure> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ApiFailure::not_found("Product not found"))
    }

    fn cart(&mut self, user: &UserId) -> &mut Cart {
        self.carts.entry(user.clone()).or_default()
    }

    fn owned_order(&mut self, user: &CurrentUser, id: &OrderId) -> Result<&mut Order, ApiFailure> {
        self.orders
            .iter_mut()
            .find(|o| &o.id == id && (user.is_admin() || owner_id(o) == Some(&user.id)))
            .ok_or_else(|| ApiFailure::not_found("Order not found"))
    }

    /// Order with its owner expanded to `{name, email}`.
    fn with_profile(&self, order: &Order) -> Order {
        let mut order = order.clone();
        let owner = owner_id(&order)
            .and_then(|id| self.accounts.iter().find(|a| &a.user.id == id))
            .map(|account| {
                OrderUser::Profile(UserSummary {
                    id: Some(account.user.id.clone()),
                    name: account.user.name.clone(),
                    email: account.user.email.clone(),
                })
            });
        if let Some(owner) = owner {
            order.user = Some(owner);
        }
        order
    }
}

fn product(id: &str, name: &str, category: &str, price: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("{name} from the ShopEase catalog"),
        price: Decimal::from(price),
        category: category.to_string(),
        stock,
        images: vec![format!("https://cdn.shopease.test/{id}.jpg")],
    }
}

fn owner_id(order: &Order) -> Option<&UserId> {
    match order.user.as_ref()? {
        OrderUser::Id(id) => Some(id),
        OrderUser::Profile(profile) => profile.id.as_ref(),
    }
}

/// Bearer token issued to a user.
#[must_use]
pub fn token_for(user: &UserId) -> String {
    format!("tok_{user}")
}

/// Shared handle on the backend state.
#[derive(Debug, Clone, Default)]
pub struct Shared(Arc<Mutex<Backend>>);

impl Shared {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self(Arc::new(Mutex::new(backend)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Backend> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Errors and extractors
// =============================================================================

/// An error response with a `{ "message": ... }` body.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

/// The user behind the request's bearer token.
pub struct Customer(pub CurrentUser);

impl FromRequestParts<Shared> for Customer {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, state: &Shared) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiFailure::unauthorized("Not authorized, no token"))?;

        state
            .lock()
            .accounts
            .iter()
            .find(|account| token_for(&account.user.id) == token)
            .map(|account| Self(account.user.clone()))
            .ok_or_else(|| ApiFailure::unauthorized("Not authorized, token failed"))
    }
}

/// An authenticated administrator.
pub struct Admin(pub CurrentUser);

impl FromRequestParts<Shared> for Admin {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, state: &Shared) -> Result<Self, Self::Rejection> {
        let Customer(user) = Customer::from_request_parts(parts, state).await?;
        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(ApiFailure::new(
                StatusCode::FORBIDDEN,
                "Not authorized as an admin",
            ))
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiFailure>;

// =============================================================================
// Router
// =============================================================================

/// The API, mounted under `/api`.
pub fn router(shared: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{item_id}", put(update_cart_item).delete(remove_cart_item))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/verify", post(verify_payment))
        .route("/orders/{id}/invoice", get(invoice))
        .route("/products", get(list_products))
        .route("/products/categories", get(categories))
        .route("/products/{id}", get(get_product))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/orders", get(admin_orders))
        .route("/admin/orders/{id}/status", put(update_order_status));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(shared.clone(), record))
        .with_state(shared)
}

/// Log the request and apply the configured rate limit.
async fn record(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let retry_after = {
        let mut backend = shared.lock();
        backend.requests.push(RecordedRequest {
            method: request.method().clone(),
            uri: request
                .uri()
                .path_and_query()
                .map_or_else(|| request.uri().path().to_string(), ToString::to_string),
            authorized: request.headers().contains_key(header::AUTHORIZATION),
        });
        backend.retry_after
    };

    if let Some(seconds) = retry_after {
        let mut response =
            ApiFailure::new(StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        return response;
    }

    next.run(request).await
}

// =============================================================================
// Auth
// =============================================================================

async fn login(State(shared): State<Shared>, Json(body): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    let backend = shared.lock();
    let account = backend
        .accounts
        .iter()
        .find(|a| a.user.email == body.email && a.password == body.password)
        .ok_or_else(|| ApiFailure::unauthorized("Invalid email or password"))?;

    Ok(Json(LoginResponse {
        token: token_for(&account.user.id),
        user: account.user.clone(),
    }))
}

async fn me(Customer(user): Customer) -> Json<CurrentUser> {
    Json(user)
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(State(shared): State<Shared>, Customer(user): Customer) -> Json<Cart> {
    Json(shared.lock().cart(&user.id).clone())
}

async fn add_to_cart(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Json(body): Json<AddToCart>,
) -> ApiResult<Cart> {
    if body.quantity == 0 {
        return Err(ApiFailure::bad_request("Quantity must be at least 1"));
    }

    let mut backend = shared.lock();
    let product = backend.product(&body.product_id)?;
    let item_id = CartItemId::new(backend.next_id("ci"));
    let cart = backend.cart(&user.id);

    let in_cart = cart
        .items
        .iter()
        .find(|i| i.product.id == product.id)
        .map_or(0, |i| i.quantity);
    if in_cart + body.quantity > product.stock {
        return Err(ApiFailure::bad_request("Insufficient stock"));
    }

    match cart.items.iter_mut().find(|i| i.product.id == product.id) {
        Some(item) => item.quantity += body.quantity,
        None => cart.items.push(CartItem {
            id: item_id,
            price: Some(product.price),
            product,
            quantity: body.quantity,
        }),
    }
    Ok(Json(cart.clone()))
}

async fn update_cart_item(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateCartItem>,
) -> ApiResult<Cart> {
    let mut backend = shared.lock();
    let cart = backend.cart(&user.id);
    let item = cart
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| ApiFailure::not_found("Item not found in cart"))?;

    if body.quantity > item.product.stock {
        return Err(ApiFailure::bad_request("Insufficient stock"));
    }
    item.quantity = body.quantity;
    Ok(Json(cart.clone()))
}

async fn remove_cart_item(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Path(item_id): Path<CartItemId>,
) -> Json<Cart> {
    let mut backend = shared.lock();
    let cart = backend.cart(&user.id);
    cart.items.retain(|i| i.id != item_id);
    Json(cart.clone())
}

async fn clear_cart(State(shared): State<Shared>, Customer(user): Customer) -> Json<serde_json::Value> {
    shared.lock().cart(&user.id).items.clear();
    Json(json!({ "message": "Cart cleared" }))
}

// =============================================================================
// Orders
// =============================================================================

async fn create_order(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<CreateOrderResponse> {
    if !body.shipping_address.missing_fields().is_empty() {
        return Err(ApiFailure::bad_request("Please provide a complete shipping address"));
    }

    let mut backend = shared.lock();
    let cart = backend.cart(&user.id).clone();
    if cart.is_empty() {
        return Err(ApiFailure::bad_request("Cart is empty"));
    }
    for item in &cart.items {
        let product = backend.product(&item.product.id)?;
        if item.quantity > product.stock {
            return Err(ApiFailure::bad_request(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }
    }

    let pricing = PriceBreakdown::from_lines(
        cart.items
            .iter()
            .map(|item| (item.unit_price(), item.quantity)),
    );
    let order = Order {
        id: OrderId::new(backend.next_id("o")),
        user: Some(OrderUser::Id(user.id.clone())),
        order_items: cart
            .items
            .iter()
            .map(|item| OrderItem {
                product: Some(ProductRef::Id(item.product.id.clone())),
                name: item.product.name.clone(),
                quantity: item.quantity,
                price: item.unit_price(),
                image: item.product.image().map(str::to_owned),
            })
            .collect(),
        shipping_address: body.shipping_address,
        payment_method: body.payment_method,
        items_price: pricing.items,
        tax_price: pricing.tax,
        shipping_price: pricing.shipping,
        total_price: pricing.total,
        is_paid: false,
        paid_at: None,
        status: OrderStatus::Pending,
        created_at: Some(Utc::now()),
    };
    backend.orders.push(order.clone());

    let gateway = body.payment_method.requires_gateway() && backend.gateway_details;
    let razorpay_order_id = if gateway {
        let gateway_order_id = GatewayOrderId::new(backend.next_id("order_rzp_"));
        backend
            .gateway_orders
            .insert(order.id.clone(), gateway_order_id.clone());
        Some(gateway_order_id)
    } else {
        None
    };

    tracing::debug!(order_id = %order.id, gateway, "Fake API created order");
    Ok(Json(CreateOrderResponse {
        order,
        razorpay_order_id,
        key_id: gateway.then(|| GATEWAY_KEY.to_string()),
    }))
}

async fn list_orders(State(shared): State<Shared>, Customer(user): Customer) -> Json<Vec<Order>> {
    let orders = shared
        .lock()
        .orders
        .iter()
        .filter(|o| owner_id(o) == Some(&user.id))
        .cloned()
        .collect();
    Json(orders)
}

async fn get_order(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Path(id): Path<OrderId>,
) -> ApiResult<Order> {
    Ok(Json(shared.lock().owned_order(&user, &id)?.clone()))
}

async fn verify_payment(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Path(id): Path<OrderId>,
    Json(body): Json<PaymentConfirmation>,
) -> ApiResult<VerifyPaymentResponse> {
    let mut backend = shared.lock();
    let expected = backend.gateway_orders.get(&id).cloned();
    if body.signature != VALID_SIGNATURE || expected.as_ref() != Some(&body.gateway_order_id) {
        return Err(ApiFailure::bad_request("Invalid payment signature"));
    }

    let order = backend.owned_order(&user, &id)?;
    order.is_paid = true;
    order.paid_at = Some(Utc::now());
    order.status = OrderStatus::Processing;
    Ok(Json(VerifyPaymentResponse {
        order: order.clone(),
    }))
}

async fn invoice(
    State(shared): State<Shared>,
    Customer(user): Customer,
    Path(id): Path<OrderId>,
) -> Result<Response, ApiFailure> {
    let mut backend = shared.lock();
    let order = backend.owned_order(&user, &id)?;
    let pdf = format!(
        "%PDF-1.4\n% ShopEase invoice {} total {}\n%%EOF\n",
        order.id, order.total_price
    );
    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf.into_bytes()).into_response())
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductFilters {
    search: Option<String>,
    category: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
    page: Option<usize>,
}

fn parse_price(raw: Option<&str>) -> Result<Option<Decimal>, ApiFailure> {
    raw.map(|value| {
        value
            .parse::<Decimal>()
            .map_err(|_| ApiFailure::bad_request(format!("Invalid price filter: {value}")))
    })
    .transpose()
}

async fn list_products(
    State(shared): State<Shared>,
    Query(filters): Query<ProductFilters>,
) -> ApiResult<ProductPage> {
    let min_price = parse_price(filters.min_price.as_deref())?;
    let max_price = parse_price(filters.max_price.as_deref())?;
    let search = filters.search.map(|s| s.to_lowercase());

    let mut products: Vec<Product> = shared
        .lock()
        .products
        .iter()
        .filter(|p| search.as_deref().is_none_or(|s| p.name.to_lowercase().contains(s)))
        .filter(|p| filters.category.as_deref().is_none_or(|c| p.category == c))
        .filter(|p| min_price.is_none_or(|min| p.price >= min))
        .filter(|p| max_price.is_none_or(|max| p.price <= max))
        .cloned()
        .collect();

    // Catalog order stands in for creation time
    match filters.sort_by.as_deref() {
        Some("price") => products.sort_by(|a, b| a.price.cmp(&b.price)),
        Some("name") => products.sort_by(|a, b| a.name.cmp(&b.name)),
        _ => {}
    }
    if filters.order.as_deref() != Some("asc") {
        products.reverse();
    }

    let total = products.len();
    let total_pages = total.div_ceil(PAGE_SIZE).max(1);
    let current_page = filters.page.unwrap_or(1).clamp(1, total_pages);
    let products = products
        .into_iter()
        .skip((current_page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    Ok(Json(ProductPage {
        products,
        total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        current_page: u32::try_from(current_page).unwrap_or(u32::MAX),
        total: total as u64,
    }))
}

async fn get_product(State(shared): State<Shared>, Path(id): Path<ProductId>) -> ApiResult<Product> {
    Ok(Json(shared.lock().product(&id)?))
}

async fn categories(State(shared): State<Shared>) -> Json<Vec<String>> {
    let mut categories: Vec<String> = shared
        .lock()
        .products
        .iter()
        .map(|p| p.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    Json(categories)
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_stats(State(shared): State<Shared>, Admin(_): Admin) -> Json<AdminStats> {
    let backend = shared.lock();
    let count = |status: OrderStatus| backend.orders.iter().filter(|o| o.status == status).count() as u64;

    Json(AdminStats {
        total_products: backend.products.len() as u64,
        total_orders: backend.orders.len() as u64,
        total_revenue: backend
            .orders
            .iter()
            .filter(|o| o.is_paid)
            .map(|o| o.total_price)
            .sum(),
        pending_orders: count(OrderStatus::Pending),
        processing_orders: count(OrderStatus::Processing),
    })
}

async fn admin_orders(State(shared): State<Shared>, Admin(_): Admin) -> Json<Vec<Order>> {
    let backend = shared.lock();
    let orders = backend
        .orders
        .iter()
        .rev()
        .map(|o| backend.with_profile(o))
        .collect();
    Json(orders)
}

async fn update_order_status(
    State(shared): State<Shared>,
    Admin(admin): Admin,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderStatus>,
) -> ApiResult<Order> {
    let mut backend = shared.lock();
    let order = backend.owned_order(&admin, &id)?;
    order.status = body.status;
    Ok(Json(order.clone()))
}
