//! Flatten the raw product query result into `ProductSummary`s.
//!
//! The raw result is checked against an explicit serde schema that mirrors
//! the `SelectionProducts` query. Any missing or mistyped field fails the
//! whole projection with [`ProjectionError::MalformedResponse`]. Nullable
//! fields must still be present (as `null`).
//!
//! The projection is pure: same input, same output, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use product_curator_core::{ImageRef, ProductGid, ProductImage, ProductSummary, ProductVariant};

/// The raw result did not match the expected shape.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("malformed product response: {0}")]
    MalformedResponse(String),
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

// =============================================================================
// Wire schema
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: ProductGid,
    title: String,
    handle: String,
    description_html: String,
    tags: Vec<String>,
    variants: Connection<VariantNode>,
    images: Connection<ImageNode>,
    #[serde(deserialize_with = "required_nullable")]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    id: String,
    title: String,
    #[serde(deserialize_with = "required_nullable")]
    sku: Option<String>,
    available_for_sale: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageNode {
    id: String,
    url: String,
    #[serde(deserialize_with = "required_nullable")]
    alt_text: Option<String>,
}

/// Deserialize an `Option` without serde's implicit "missing means `None`".
fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

impl From<ProductNode> for ProductSummary {
    fn from(node: ProductNode) -> Self {
        let images: Vec<ProductImage> = node
            .images
            .edges
            .into_iter()
            .map(|e| ProductImage {
                id: e.node.id,
                url: e.node.url,
                alt_text: e.node.alt_text,
            })
            .collect();
        let featured_image = images.first().map(ImageRef::from);

        Self {
            id: node.id,
            title: node.title,
            handle: node.handle,
            description_html: node.description_html,
            tags: node.tags,
            variants: node
                .variants
                .edges
                .into_iter()
                .map(|e| ProductVariant {
                    id: e.node.id,
                    title: e.node.title,
                    sku: e.node.sku,
                    available_for_sale: e.node.available_for_sale,
                })
                .collect(),
            images,
            featured_image,
            published_at: node.published_at,
        }
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Project a raw `{ products { edges { node } } }` result.
///
/// The output has one summary per edge, in edge order.
///
/// # Errors
///
/// Returns `ProjectionError::MalformedResponse` if `products.edges` is
/// missing or not a list, or if any node does not match the schema.
pub fn project(raw: &serde_json::Value) -> Result<Vec<ProductSummary>, ProjectionError> {
    let data = ProductsData::deserialize(raw)?;

    Ok(data
        .products
        .edges
        .into_iter()
        .map(|edge| ProductSummary::from(edge.node))
        .collect())
}

/// Project a single raw product node (the `node` of one edge).
///
/// # Errors
///
/// Returns `ProjectionError::MalformedResponse` if the node does not match
/// the schema.
pub fn project_node(raw: &serde_json::Value) -> Result<ProductSummary, ProjectionError> {
    let node = ProductNode::deserialize(raw)?;
    Ok(node.into())
}
