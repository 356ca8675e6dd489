//! The application store: session, API client, slices, and notifier.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shopease_core::{CurrentUser, LoginRequest};
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, StorefrontApi};
use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use crate::session::Session;
use crate::slices::{AdminSlice, CartSlice, OrderSlice, ProductSlice};

/// Everything a view needs, created once and passed around.
///
/// Cheaply cloneable; all clones share the same slices.
pub struct Store<A = ApiClient> {
    inner: Arc<StoreInner<A>>,
}

struct StoreInner<A> {
    session: Session,
    api: A,
    cart: CartSlice<A>,
    orders: OrderSlice<A>,
    products: ProductSlice<A>,
    admin: AdminSlice<A>,
    notifier: Notifier,
}

impl<A> Clone for Store<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for Store<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi> Store<A> {
    /// Create a store. `api` must read its token from `session`.
    #[must_use]
    pub fn new(session: Session, api: A) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                cart: CartSlice::new(api.clone()),
                orders: OrderSlice::new(api.clone()),
                products: ProductSlice::new(api.clone()),
                admin: AdminSlice::new(api.clone()),
                api,
                session,
                notifier: Notifier::new(),
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    #[must_use]
    pub fn cart(&self) -> &CartSlice<A> {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderSlice<A> {
        &self.inner.orders
    }

    #[must_use]
    pub fn products(&self) -> &ProductSlice<A> {
        &self.inner.products
    }

    #[must_use]
    pub fn admin(&self) -> &AdminSlice<A> {
        &self.inner.admin
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in, persist the token, and load the cart.
    ///
    /// # Errors
    ///
    /// Returns the server's message on bad credentials, or a session error if
    /// the token cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<CurrentUser> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
        };
        let response = self
            .inner
            .api
            .login(&request)
            .await
            .map_err(|e| ClientError::from_api(e, "Login failed"))?;

        self.inner
            .session
            .begin(SecretString::from(response.token), response.user.clone())
            .await?;
        info!(user_id = %response.user.id, "Logged in");

        self.inner.cart.fetch().await;
        Ok(response.user)
    }

    /// Sign out and forget everything fetched for the user.
    ///
    /// # Errors
    ///
    /// Returns a session error if the persisted token cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let ended = self.inner.session.end().await;
        self.inner.cart.reset().await;
        self.inner.orders.reset().await;
        self.inner.admin.reset().await;
        ended?;
        info!("Logged out");
        Ok(())
    }

    /// Rehydrate after a restart: load the persisted token, fetch the user,
    /// and load the cart.
    ///
    /// A token the server no longer accepts is discarded and `None` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns session storage errors and failures other than a rejected
    /// token.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<CurrentUser>> {
        if !self.inner.session.restore().await? {
            return Ok(None);
        }

        match self.inner.api.current_user().await {
            Ok(user) => {
                self.inner.session.set_user(user.clone()).await;
                self.inner.cart.fetch().await;
                Ok(Some(user))
            }
            Err(ApiError::NotAuthenticated) => {
                warn!("Stored session is no longer valid");
                self.inner.session.end().await?;
                Ok(None)
            }
            Err(e) => Err(ClientError::from_api(e, "Failed to load user")),
        }
    }
}
