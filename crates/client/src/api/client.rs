//! `reqwest` implementation of [`StorefrontApi`].

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopease_core::{
    AddToCart, AdminStats, Cart, CartItemId, CreateOrderRequest, CreateOrderResponse,
    CurrentUser, LoginRequest, LoginResponse, Order, OrderId, OrderStatus, PaymentConfirmation,
    Product, ProductId, ProductPage, ProductQuery, UpdateCartItem, UpdateOrderStatus,
    VerifyPaymentResponse,
};
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, StorefrontApi};
use crate::config::ClientConfig;
use crate::session::Session;

/// Characters of a response body included in error logs.
const LOG_BODY_LIMIT: usize = 500;

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fail with `NotAuthenticated` before sending if there is no token.
    Required,
    /// Send the token if there is one.
    Optional,
    /// Never send the token.
    None,
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// HTTP client for the storefront REST API.
///
/// Cheaply cloneable. The bearer token is read from the shared [`Session`]
/// when each request is built, so logging in or out takes effect on the next
/// call without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL
    /// cannot have paths appended.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The session this client reads its token from.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Resolve path segments against the base URL. Segments are
    /// percent-encoded, so ids can never escape their path position.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a request with the session's bearer token attached.
    async fn request(
        &self,
        method: Method,
        url: Url,
        auth: Auth,
    ) -> Result<RequestBuilder, ApiError> {
        let builder = self.inner.client.request(method, url);

        let token = match auth {
            Auth::None => None,
            Auth::Optional => self.inner.session.bearer().await,
            Auth::Required => Some(
                self.inner
                    .session
                    .bearer()
                    .await
                    .ok_or(ApiError::NotAuthenticated)?,
            ),
        };

        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and map every non-success status to an error.
    ///
    /// A 401 on an authenticated request means the token is no longer
    /// accepted. On an anonymous request (login) it is an ordinary rejection
    /// whose message the user should see.
    async fn execute(&self, builder: RequestBuilder, auth: Auth) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED && auth != Auth::None {
            debug!("Server rejected bearer token");
            return Err(ApiError::NotAuthenticated);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %truncate(&body),
                "Storefront API returned non-success status"
            );
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty());
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Send a request and parse the JSON response body.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let response = self.execute(builder, auth).await?;

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text),
                    "Failed to parse storefront API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        auth: Auth,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let builder = self.request(Method::GET, url, auth).await?;
        self.execute_json(builder, auth).await
    }

    async fn send_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let builder = self.request(method, url, Auth::Required).await?.json(body);
        self.execute_json(builder, Auth::Required).await
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

// =============================================================================
// StorefrontApi
// =============================================================================

impl StorefrontApi for ApiClient {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let builder = self.request(Method::POST, url, Auth::None).await?.json(request);
        self.execute_json(builder, Auth::None).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get_json(&["auth", "me"], Auth::Required).await
    }

    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.get_json(&["cart"], Auth::Required).await
    }

    #[instrument(skip(self), fields(product_id = %body.product_id, quantity = body.quantity))]
    async fn add_to_cart(&self, body: &AddToCart) -> Result<Cart, ApiError> {
        self.send_json(Method::POST, &["cart"], body).await
    }

    #[instrument(skip(self), fields(item_id = %item_id, quantity = body.quantity))]
    async fn update_cart_item(
        &self,
        item_id: &CartItemId,
        body: UpdateCartItem,
    ) -> Result<Cart, ApiError> {
        self.send_json(Method::PUT, &["cart", item_id.as_str()], &body)
            .await
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn remove_cart_item(&self, item_id: &CartItemId) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["cart", item_id.as_str()])?;
        let builder = self.request(Method::DELETE, url, Auth::Required).await?;
        self.execute_json(builder, Auth::Required).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart"])?;
        let builder = self.request(Method::DELETE, url, Auth::Required).await?;
        self.execute(builder, Auth::Required).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreateOrderResponse, ApiError> {
        self.send_json(Method::POST, &["orders"], request).await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_json(&["orders"], Auth::Required).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.get_json(&["orders", id.as_str()], Auth::Required).await
    }

    #[instrument(skip(self, confirmation), fields(order_id = %id, payment_id = %confirmation.payment_id))]
    async fn verify_payment(
        &self,
        id: &OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifyPaymentResponse, ApiError> {
        self.send_json(Method::POST, &["orders", id.as_str(), "verify"], confirmation)
            .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn order_invoice(&self, id: &OrderId) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["orders", id.as_str(), "invoice"])?;
        let builder = self.request(Method::GET, url, Auth::Required).await?;
        let response = self.execute(builder, Auth::Required).await?;
        Ok(response.bytes().await?.to_vec())
    }

    #[instrument(skip(self))]
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        let builder = self.request(Method::GET, url, Auth::Optional).await?;
        self.execute_json(builder, Auth::Optional).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.get_json(&["products", id.as_str()], Auth::Optional).await
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["products", "categories"], Auth::Optional)
            .await
    }

    #[instrument(skip(self))]
    async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get_json(&["admin", "stats"], Auth::Required).await
    }

    #[instrument(skip(self))]
    async fn admin_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_json(&["admin", "orders"], Auth::Required).await
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", "orders", id.as_str(), "status"])?;
        let builder = self
            .request(Method::PUT, url, Auth::Required)
            .await?
            .json(&UpdateOrderStatus { status });
        self.execute(builder, Auth::Required).await?;
        Ok(())
    }
}
