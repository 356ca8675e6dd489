//! Catalog slice.

use std::sync::Arc;

use shopease_core::{Product, ProductId, ProductQuery};
use tracing::instrument;

use super::{SliceState, Slot};
use crate::api::StorefrontApi;
use crate::error::ClientError;

/// Catalog listing, the product being viewed, and the category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductData {
    pub products: Vec<Product>,
    pub current: Option<Product>,
    pub categories: Vec<String>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total: u64,
}

impl Default for ProductData {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            current: None,
            categories: Vec::new(),
            total_pages: 1,
            current_page: 1,
            total: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductSlice<A> {
    api: A,
    slot: Arc<Slot<ProductData>>,
}

impl<A: StorefrontApi> ProductSlice<A> {
    pub(crate) fn new(api: A) -> Self {
        Self {
            api,
            slot: Arc::default(),
        }
    }

    /// Load one page of the filtered, sorted catalog.
    #[instrument(skip(self))]
    pub async fn fetch_list(&self, query: &ProductQuery) -> SliceState<ProductData> {
        self.slot.pending().await;
        match self.api.list_products(query).await {
            Ok(page) => {
                self.slot
                    .fulfilled(|data| {
                        data.products = page.products;
                        data.total_pages = page.total_pages;
                        data.current_page = page.current_page;
                        data.total = page.total;
                    })
                    .await;
            }
            Err(e) => {
                let err = ClientError::from_api(e, "Failed to fetch products");
                self.slot.rejected(&err).await;
            }
        }
        self.slot.snapshot().await
    }

    /// Load one product as the current product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_one(&self, id: &ProductId) -> SliceState<ProductData> {
        self.slot.pending().await;
        match self.api.get_product(id).await {
            Ok(product) => {
                self.slot
                    .fulfilled(|data| data.current = Some(product))
                    .await;
            }
            Err(e) => {
                let err = ClientError::from_api(e, "Failed to fetch product");
                self.slot.rejected(&err).await;
            }
        }
        self.slot.snapshot().await
    }

    /// Load the category list used by the catalog filters.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> SliceState<ProductData> {
        self.slot.pending().await;
        match self.api.categories().await {
            Ok(categories) => {
                self.slot
                    .fulfilled(|data| data.categories = categories)
                    .await;
            }
            Err(e) => {
                let err = ClientError::from_api(e, "Failed to fetch categories");
                self.slot.rejected(&err).await;
            }
        }
        self.slot.snapshot().await
    }

    pub async fn clear_current(&self) {
        self.slot.update(|data| data.current = None).await;
    }

    pub async fn state(&self) -> SliceState<ProductData> {
        self.slot.snapshot().await
    }
}
