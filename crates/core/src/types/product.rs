//! Product summary types.
//!
//! A [`ProductSummary`] is the flat, read-only view of a Shopify product that
//! the selection flow works with. It is rebuilt from the remote catalog on
//! every read and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductGid;

/// A product as listed for selection.
///
/// Field names serialize in Shopify's camelCase so that summaries round-trip
/// through the browser unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductGid,
    pub title: String,
    pub handle: String,
    /// Merchant-authored HTML. Untrusted: never render without sanitizing.
    pub description_html: String,
    /// Tags exactly as Shopify returned them.
    pub tags: Vec<String>,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<ProductImage>,
    /// First image, used as the list thumbnail.
    pub featured_image: Option<ImageRef>,
    /// `None` means the product is an unpublished draft.
    pub published_at: Option<DateTime<Utc>>,
}

impl ProductSummary {
    /// Whether the product is published to the online store.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Whether any variant can currently be bought.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.variants.iter().any(|v| v.available_for_sale)
    }
}

/// A product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub available_for_sale: bool,
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: String,
    pub url: String,
    pub alt_text: Option<String>,
}

/// Reference to an image for display (thumbnail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    pub alt_text: Option<String>,
}

impl From<&ProductImage> for ImageRef {
    fn from(image: &ProductImage) -> Self {
        Self {
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
        }
    }
}
