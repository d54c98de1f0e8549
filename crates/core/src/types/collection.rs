//! Curated product collections.
//!
//! A collection is a named, ordered selection of products created in a single
//! save action. Collections are append-only: once stored they are listed but
//! never edited.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CollectionId, ProductGid};
use super::product::ProductSummary;

/// A stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    /// User-supplied title. Not unique, may be empty.
    pub title: String,
    /// Items in display order.
    pub items: Vec<CollectionItem>,
    pub created_at: DateTime<Utc>,
}

impl Collection {
    /// Product identifiers in display order.
    pub fn product_ids(&self) -> impl Iterator<Item = &ProductGid> {
        self.items.iter().map(CollectionItem::product_id)
    }
}

/// One entry in a collection.
///
/// Clients may submit either a bare identifier or a full product snapshot.
/// Serialized untagged, so a bare identifier is stored as a JSON string and a
/// snapshot as an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionItem {
    /// Snapshot of the product at selection time.
    Product(Box<ProductSummary>),
    /// Product referenced by identifier only.
    Id(ProductGid),
}

impl CollectionItem {
    /// The identifier of the product this item refers to.
    #[must_use]
    pub fn product_id(&self) -> &ProductGid {
        match self {
            Self::Product(product) => &product.id,
            Self::Id(id) => id,
        }
    }
}

impl From<ProductGid> for CollectionItem {
    fn from(id: ProductGid) -> Self {
        Self::Id(id)
    }
}

impl From<ProductSummary> for CollectionItem {
    fn from(product: ProductSummary) -> Self {
        Self::Product(Box::new(product))
    }
}

/// Drop items whose product identifier was already seen.
///
/// The first occurrence wins and relative order is preserved.
#[must_use]
pub fn dedup_items(items: impl IntoIterator<Item = CollectionItem>) -> Vec<CollectionItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.product_id().clone()))
        .collect()
}
