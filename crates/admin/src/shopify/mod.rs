//! Shopify Admin API access.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is the seam between handlers and Shopify. Handlers
//!   only ever see raw query results through it, so tests can swap in fakes.
//! - [`AdminClient`] is the production implementation: GraphQL for the
//!   product list, REST for single-product lookups, plus the OAuth code
//!   exchange.
//! - [`projection`] turns the raw GraphQL result into `ProductSummary`s.
//!
//! Every call takes the caller's [`ShopifySession`] explicitly; the client
//! holds no per-shop state.

mod admin;
pub mod projection;

pub use admin::{AdminClient, OAuthToken, queries};
pub use projection::{ProjectionError, project, project_node};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ShopifySession;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth code exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Shopify answered with a status we do not handle.
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remote product catalog.
///
/// Implementations return raw JSON exactly as the platform produced it;
/// shape checking happens in [`projection`].
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the first `first` products with variants and images.
    ///
    /// Returns the GraphQL `data` object, which holds `products.edges`.
    async fn fetch_products(
        &self,
        session: &ShopifySession,
        first: i64,
    ) -> Result<serde_json::Value, AdminShopifyError>;

    /// Fetch one product through the REST Admin API by its numeric ID.
    async fn fetch_product(
        &self,
        session: &ShopifySession,
        legacy_id: u64,
    ) -> Result<serde_json::Value, AdminShopifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_shopify_error_display() {
        let err = AdminShopifyError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                path: vec![],
            },
            GraphQLError {
                message: "Throttled".to_string(),
                path: vec![],
            },
        ];
        let err = AdminShopifyError::GraphQL(errors);
        assert_eq!(err.to_string(), "GraphQL errors: Field not found; Throttled");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = AdminShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }

    #[test]
    fn test_status_error() {
        let err = AdminShopifyError::Status(502);
        assert_eq!(err.to_string(), "Unexpected HTTP status: 502");
    }
}
