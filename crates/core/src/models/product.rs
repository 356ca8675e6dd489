//! Catalog types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A catalog product. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    /// Units available at the time the product was fetched.
    #[serde(default)]
    pub stock: u32,
    /// Image URLs, primary image first.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// The primary image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total: u64,
}

const fn first_page() -> u32 {
    1
}

impl Default for ProductPage {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            total_pages: 1,
            current_page: 1,
            total: 0,
        }
    }
}

/// Sortable product fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Name,
}

impl SortField {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Price => "price",
            Self::Name => "name",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" | "newest" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "name" => Ok(Self::Name),
            _ => Err(format!("invalid sort field: {s}")),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("invalid sort direction: {s}")),
        }
    }
}

/// Filters, sorting, and pagination for the product listing.
///
/// Defaults to newest first, page 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: SortField,
    pub order: SortDirection,
    /// 1-based page number; `0` is treated as unset.
    pub page: u32,
}

impl ProductQuery {
    /// Query string pairs for the listing endpoint.
    ///
    /// Empty or unset filters are omitted entirely.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        if let Some(search) = non_empty(&self.search) {
            pairs.push(("search", search));
        }
        if let Some(category) = non_empty(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs.push(("sortBy", self.sort_by.as_str().to_owned()));
        pairs.push(("order", self.order.as_str().to_owned()));
        if self.page > 0 {
            pairs.push(("page", self.page.to_string()));
        }

        pairs
    }

    /// Same filters, different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_only_sends_sorting() {
        let pairs = ProductQuery::default().to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("sortBy", "createdAt".to_string()),
                ("order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_omits_blank_filters() {
        let query = ProductQuery {
            search: Some("  ".to_string()),
            category: Some("Electronics".to_string()),
            min_price: Some(Decimal::new(100, 0)),
            max_price: None,
            sort_by: SortField::Price,
            order: SortDirection::Asc,
            page: 2,
        };

        let pairs = query.to_query_pairs();
        assert!(!pairs.iter().any(|(k, _)| *k == "search"));
        assert!(!pairs.iter().any(|(k, _)| *k == "maxPrice"));
        assert!(pairs.contains(&("category", "Electronics".to_string())));
        assert!(pairs.contains(&("minPrice", "100".to_string())));
        assert!(pairs.contains(&("sortBy", "price".to_string())));
        assert!(pairs.contains(&("page", "2".to_string())));
    }

    #[test]
    fn test_product_deserializes_from_api_shape() {
        let json = r#"{
            "_id": "p1",
            "name": "Wireless Mouse",
            "price": 799,
            "stock": 12,
            "category": "Electronics",
            "images": ["https://cdn.example.com/mouse.jpg"]
        }"#;

        let product: Product = serde_json::from_str(json).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.price, Decimal::new(799, 0));
        assert_eq!(product.image(), Some("https://cdn.example.com/mouse.jpg"));
        assert!(product.description.is_empty());
    }

    #[test]
    fn test_product_page_defaults() {
        let page: ProductPage = serde_json::from_str("{}").unwrap_or_default();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }
}
