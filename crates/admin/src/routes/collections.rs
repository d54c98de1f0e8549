//! Collection routes: save a selection, list saved collections.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::Redirect,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use product_curator_core::{Collection, CollectionId, CollectionItem};

use crate::{
    error::AppError,
    middleware::RequireShopifySession,
    services::selection::{self, COLLECTIONS_LOCATION, Submission},
    state::AppState,
};

/// Collections shown on the listing page by default.
const DEFAULT_LIST_LIMIT: i64 = 50;

/// Upper bound for `?limit=`.
const MAX_LIST_LIMIT: i64 = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(COLLECTIONS_LOCATION, get(index).post(create))
        .route("/api/collections/{id}", get(api_show))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

impl ListQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

// =============================================================================
// View Models
// =============================================================================

/// Collection view for templates.
#[derive(Debug, Clone)]
pub struct CollectionView {
    pub id: i32,
    pub title: String,
    pub created_at: String,
    pub items: Vec<ItemView>,
}

/// One collection item for templates.
///
/// Items saved by ID only have no title or image.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub id: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

impl From<&CollectionItem> for ItemView {
    fn from(item: &CollectionItem) -> Self {
        match item {
            CollectionItem::Product(product) => Self {
                id: product.id.to_string(),
                title: Some(product.title.clone()),
                image_url: product.featured_image.as_ref().map(|img| img.url.clone()),
            },
            CollectionItem::Id(id) => Self {
                id: id.to_string(),
                title: None,
                image_url: None,
            },
        }
    }
}

impl From<&Collection> for CollectionView {
    fn from(collection: &Collection) -> Self {
        let title = if collection.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            collection.title.clone()
        };

        Self {
            id: collection.id.as_i32(),
            title,
            created_at: collection
                .created_at
                .format("%b %-d, %Y %H:%M UTC")
                .to_string(),
            items: collection.items.iter().map(ItemView::from).collect(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Saved collections page.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub current_path: String,
    pub shop: String,
    pub collections: Vec<CollectionView>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /collections - Save the submitted selection.
///
/// Accepts a form post or a JSON body. Redirects to the listing on success.
#[instrument(skip_all, fields(shop = %shopify.shop))]
async fn create(
    RequireShopifySession(shopify): RequireShopifySession,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Redirect, AppError> {
    let submission = parse_body(&headers, &body)?;
    selection::save_selection(state.collections(), submission).await?;

    Ok(Redirect::to(COLLECTIONS_LOCATION))
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Submission, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/x-www-form-urlencoded");
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/json" => selection::parse_json(body),
        "application/x-www-form-urlencoded" => selection::parse_form(body),
        other => Err(AppError::InvalidInput(format!(
            "unsupported content type '{other}'"
        ))),
    }
}

/// GET /collections - Saved collections, newest first.
#[instrument(skip(state, shopify), fields(shop = %shopify.shop))]
async fn index(
    RequireShopifySession(shopify): RequireShopifySession,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<CollectionsIndexTemplate, AppError> {
    let collections = state.collections().list(query.limit()).await?;

    Ok(CollectionsIndexTemplate {
        current_path: COLLECTIONS_LOCATION.to_string(),
        shop: shopify.shop,
        collections: collections.iter().map(CollectionView::from).collect(),
    })
}

/// GET /api/collections/{id} - One saved collection as JSON.
#[instrument(skip(state, _shopify))]
async fn api_show(
    RequireShopifySession(_shopify): RequireShopifySession,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Collection>, AppError> {
    state
        .collections()
        .get(CollectionId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("collection {id}")))
}
