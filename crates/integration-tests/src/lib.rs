//! Integration tests for the ShopEase client.
//!
//! The tests run the real [`ApiClient`] over HTTP against an in-process fake
//! of the storefront API (see [`backend`]), so request building, bearer
//! handling, and error decoding are exercised end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopease-integration-tests
//! ```
//!
//! Every test spawns its own server on an ephemeral port; no external
//! services are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

pub mod backend;
pub mod gateway;

use std::net::SocketAddr;
use std::sync::MutexGuard;

use secrecy::SecretString;
use shopease_client::{ApiClient, ClientConfig, Session, Store};
use tokio::task::JoinHandle;

pub use backend::{
    ADMIN_EMAIL, ADMIN_PASSWORD, Backend, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, GATEWAY_KEY,
    RecordedRequest, VALID_SIGNATURE,
};
pub use gateway::{Answer, AutoGateway, AutoGatewayLoader};

/// A fake storefront API listening on `127.0.0.1`.
///
/// The server stops when this value is dropped.
pub struct TestServer {
    addr: SocketAddr,
    shared: backend::Shared,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the seeded catalog and accounts.
    pub async fn spawn() -> Self {
        Self::spawn_with(Backend::seeded()).await
    }

    /// Start a server over the given state.
    pub async fn spawn_with(state: Backend) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read listener address");

        let shared = backend::Shared::new(state);
        let app = backend::router(shared.clone());
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake storefront API stopped");
            }
        });

        Self { addr, shared, task }
    }

    /// Base URL of the API, including the `/api` prefix.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api_url(&self.api_url()).expect("Test API URL is valid")
    }

    /// An API client with a fresh in-memory session.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        self.api_with(Session::in_memory())
    }

    /// An API client using `session`.
    #[must_use]
    pub fn api_with(&self, session: Session) -> ApiClient {
        ApiClient::new(&self.config(), session).expect("Failed to build API client")
    }

    /// A store with a fresh in-memory session.
    #[must_use]
    pub fn store(&self) -> Store {
        let session = Session::in_memory();
        Store::new(session.clone(), self.api_with(session))
    }

    /// A store already signed in with the given credentials.
    pub async fn signed_in(&self, email: &str, password: &str) -> Store {
        let store = self.store();
        store
            .login(email, &SecretString::from(password.to_owned()))
            .await
            .expect("Test login failed");
        store
    }

    /// Direct access to the server's state.
    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        self.shared.lock()
    }

    /// Requests received so far whose path starts with `/api{prefix}`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        let prefix = format!("/api{prefix}");
        self.backend()
            .requests
            .iter()
            .filter(|r| r.uri.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
