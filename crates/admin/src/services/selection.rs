//! Product selection: fetch products to choose from, save the choice.
//!
//! # Read path
//!
//! [`load_products`] makes exactly one catalog call and projects the result.
//! A failed call never reaches the projection.
//!
//! # Write path
//!
//! [`parse_form`] / [`parse_json`] turn a request body into a
//! [`Submission`]; [`save_selection`] de-duplicates the items and makes
//! exactly one store call. A body that cannot be parsed is rejected before
//! the store is touched.
//!
//! Accepted `products` elements:
//!
//! - a product identifier string (`"gid://shopify/Product/1"`)
//! - a raw GraphQL edge (`{"node": {...}}`), projected like the read path
//! - a flat `ProductSummary` object

use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use product_curator_core::{Collection, CollectionItem, ProductGid, ProductSummary, dedup_items};

use crate::db::CollectionStore;
use crate::error::AppError;
use crate::models::ShopifySession;
use crate::shopify::{CatalogSource, project, project_node};

/// Where the browser goes after a successful save.
pub const COLLECTIONS_LOCATION: &str = "/collections";

/// A parsed save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub title: String,
    /// Items in submission order, duplicates not yet removed.
    pub items: Vec<CollectionItem>,
}

// =============================================================================
// Read path
// =============================================================================

/// Fetch the first `first` products and project them into summaries.
///
/// # Errors
///
/// Returns `AppError::Remote` if the catalog call fails and
/// `AppError::MalformedResponse` if the result does not match the schema.
#[instrument(skip(catalog, session), fields(shop = %session.shop))]
pub async fn load_products(
    catalog: &dyn CatalogSource,
    session: &ShopifySession,
    first: i64,
) -> Result<Vec<ProductSummary>, AppError> {
    let raw = catalog.fetch_products(session, first).await?;
    let products = project(&raw)?;

    tracing::debug!(count = products.len(), "Loaded products");
    Ok(products)
}

/// Fetch one product through the REST Admin API.
///
/// `id` may be a numeric ID or a product GID.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if `id` has no numeric tail, or
/// `AppError::Remote` if the lookup fails (including not found).
#[instrument(skip(catalog, session), fields(shop = %session.shop))]
pub async fn load_product(
    catalog: &dyn CatalogSource,
    session: &ShopifySession,
    id: &str,
) -> Result<Value, AppError> {
    let legacy_id = ProductGid::parse(id)
        .ok()
        .and_then(|gid| gid.legacy_id())
        .ok_or_else(|| AppError::InvalidInput(format!("'{id}' is not a product ID")))?;

    Ok(catalog.fetch_product(session, legacy_id).await?)
}

// =============================================================================
// Write path
// =============================================================================

/// Parse an `application/x-www-form-urlencoded` body.
///
/// Fields: `title` (default empty), `products` (a JSON array, default `[]`,
/// at most once), and any number of `product_id` fields appended after the
/// array.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if `products` is repeated or is not a
/// JSON array of accepted elements, or a `product_id` is empty.
pub fn parse_form(body: &[u8]) -> Result<Submission, AppError> {
    let mut title: Option<String> = None;
    let mut products: Option<String> = None;
    let mut product_ids = Vec::new();

    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "title" if title.is_none() => title = Some(value.into_owned()),
            "products" if products.is_some() => {
                return Err(AppError::InvalidInput(
                    "products may only be given once".to_string(),
                ));
            }
            "products" => products = Some(value.into_owned()),
            "product_id" => product_ids.push(value.into_owned()),
            _ => {}
        }
    }

    let mut items = parse_products_str(products.as_deref().unwrap_or("[]"))?;
    for id in product_ids {
        let gid = ProductGid::parse(id)
            .map_err(|e| AppError::InvalidInput(format!("product_id: {e}")))?;
        items.push(gid.into());
    }

    Ok(Submission {
        title: title.unwrap_or_default(),
        items,
    })
}

#[derive(Debug, Deserialize)]
struct JsonSubmission {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    products: Option<Value>,
}

/// Parse an `application/json` body: `{"title"?, "products"?}`.
///
/// `products` may be an array or a string holding a serialized array.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if the body is not a JSON object of that
/// shape or `products` holds an unrecognized element.
pub fn parse_json(body: &[u8]) -> Result<Submission, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("body is not valid JSON: {e}")))?;
    // A derived struct also deserializes from a sequence.
    if !value.is_object() {
        return Err(AppError::InvalidInput(
            "body must be a JSON object".to_string(),
        ));
    }
    let submission: JsonSubmission = serde_json::from_value(value)
        .map_err(|e| AppError::InvalidInput(format!("body has the wrong shape: {e}")))?;

    let items = match submission.products {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => parse_products_str(&s)?,
        Some(Value::Array(values)) => parse_items(values)?,
        Some(_) => {
            return Err(AppError::InvalidInput(
                "products must be an array".to_string(),
            ));
        }
    };

    Ok(Submission {
        title: submission.title.unwrap_or_default(),
        items,
    })
}

fn parse_products_str(products: &str) -> Result<Vec<CollectionItem>, AppError> {
    let value: Value = serde_json::from_str(products)
        .map_err(|e| AppError::InvalidInput(format!("products is not valid JSON: {e}")))?;

    match value {
        Value::Array(values) => parse_items(values),
        _ => Err(AppError::InvalidInput(
            "products must be a JSON array".to_string(),
        )),
    }
}

fn parse_items(values: Vec<Value>) -> Result<Vec<CollectionItem>, AppError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            parse_item(value)
                .map_err(|reason| AppError::InvalidInput(format!("products[{index}]: {reason}")))
        })
        .collect()
}

fn parse_item(value: Value) -> Result<CollectionItem, String> {
    match value {
        Value::String(id) => ProductGid::parse(id)
            .map(CollectionItem::from)
            .map_err(|e| e.to_string()),
        Value::Object(ref object) if object.contains_key("node") => {
            let node = object.get("node").unwrap_or(&Value::Null);
            project_node(node)
                .map(CollectionItem::from)
                .map_err(|e| e.to_string())
        }
        Value::Object(_) => serde_json::from_value::<ProductSummary>(value)
            .map(CollectionItem::from)
            .map_err(|e| format!("not a product: {e}")),
        other => Err(format!("expected a product ID or object, got {other}")),
    }
}

/// Persist a submission as a new collection.
///
/// Duplicate product IDs are dropped (first occurrence wins) before the
/// store is called.
///
/// # Errors
///
/// Returns `AppError::Storage` if the store rejects the write.
#[instrument(skip(store, submission), fields(title = %submission.title, submitted = submission.items.len()))]
pub async fn save_selection(
    store: &dyn CollectionStore,
    submission: Submission,
) -> Result<Collection, AppError> {
    let items = dedup_items(submission.items);
    let collection = store.create(&submission.title, &items).await?;

    tracing::info!(
        collection_id = %collection.id,
        items = collection.items.len(),
        "Saved collection"
    );
    Ok(collection)
}
