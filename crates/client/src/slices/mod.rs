//! Per-entity store slices.
//!
//! Each slice holds the last server response for one entity together with a
//! loading flag and the last error message. Every async operation moves the
//! slice through the same three phases:
//!
//! - pending: `loading = true`, `error = None`
//! - fulfilled: `loading = false`, data replaced with the server response
//! - rejected: `loading = false`, `error` set, data left as it was
//!
//! Concurrent operations on one slice are not ordered; whichever response
//! lands last is what the slice shows.

mod admin;
mod cart;
mod order;
mod product;

pub use admin::{AdminData, AdminSlice};
pub use cart::CartSlice;
pub use order::{OrderData, OrderSlice};
pub use product::{ProductData, ProductSlice};

use tokio::sync::RwLock;

use crate::error::ClientError;

/// A point-in-time copy of one slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SliceState<T> {
    /// Last data the server returned.
    pub data: T,
    /// Whether an operation is in flight.
    pub loading: bool,
    /// Message from the last failed operation.
    pub error: Option<String>,
}

/// Shared storage behind a slice.
#[derive(Debug, Default)]
pub(crate) struct Slot<T> {
    state: RwLock<SliceState<T>>,
}

impl<T: Clone> Slot<T> {
    pub(crate) async fn pending(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    /// Apply a successful response.
    pub(crate) async fn fulfilled(&self, update: impl FnOnce(&mut T)) {
        let mut state = self.state.write().await;
        update(&mut state.data);
        state.loading = false;
    }

    pub(crate) async fn rejected(&self, error: &ClientError) {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(error.to_string());
    }

    /// Change data outside of a request cycle.
    pub(crate) async fn update(&self, update: impl FnOnce(&mut T)) {
        update(&mut self.state.write().await.data);
    }

    pub(crate) async fn snapshot(&self) -> SliceState<T> {
        self.state.read().await.clone()
    }

    pub(crate) async fn data(&self) -> T {
        self.state.read().await.data.clone()
    }
}
