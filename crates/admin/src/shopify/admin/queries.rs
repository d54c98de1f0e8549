//! GraphQL query definitions for Shopify Admin API.
//!
//! Each query implements `graphql_client::GraphQLQuery` so the client can
//! build request bodies generically. Response data is kept as raw JSON; the
//! typed, fail-closed schema lives in `shopify::projection`.
//!
//! `#[derive(GraphQLQuery)]` is not used because no Admin API schema file
//! is vendored in this repository.

use graphql_client::{GraphQLQuery, QueryBody};

/// Variants fetched per product.
pub const VARIANT_COUNT: i64 = 5;

/// Images fetched per product.
pub const IMAGE_COUNT: i64 = 5;

// =============================================================================
// Product selection list
// =============================================================================

/// First N products with the fields needed for selection.
pub struct SelectionProducts;

pub mod selection_products {
    use serde::Serialize;

    pub const OPERATION_NAME: &str = "SelectionProducts";

    pub const QUERY: &str = r"query SelectionProducts($first: Int!, $variantCount: Int!, $imageCount: Int!) {
  products(first: $first) {
    edges {
      node {
        id
        title
        handle
        descriptionHtml
        tags
        variants(first: $variantCount) {
          edges {
            node {
              id
              title
              sku
              availableForSale
            }
          }
        }
        images(first: $imageCount) {
          edges {
            node {
              id
              url
              altText
            }
          }
        }
        publishedAt
      }
    }
  }
}";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        pub variant_count: i64,
        pub image_count: i64,
    }

    impl Variables {
        /// Variables for the first `first` products.
        #[must_use]
        pub const fn first(first: i64) -> Self {
            Self {
                first,
                variant_count: super::VARIANT_COUNT,
                image_count: super::IMAGE_COUNT,
            }
        }
    }

    /// Raw `data` object; validated by `shopify::projection::project`.
    pub type ResponseData = serde_json::Value;
}

impl GraphQLQuery for SelectionProducts {
    type Variables = selection_products::Variables;
    type ResponseData = selection_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: selection_products::QUERY,
            operation_name: selection_products::OPERATION_NAME,
        }
    }
}
