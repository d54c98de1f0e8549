//! Product selection routes.
//!
//! The HTML page and the JSON endpoint share the read path in
//! [`crate::services::selection`]. When Shopify rejects the stored token,
//! the session's Shopify capability is dropped so the next page load
//! reinstalls.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use product_curator_core::ProductSummary;

use crate::{
    error::AppError,
    filters,
    middleware::{RequireShopifySession, forget_revoked_session},
    services::selection,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/api/products", get(api_index))
        .route("/api/products/{id}", get(api_show))
}

// =============================================================================
// Templates
// =============================================================================

/// Product selection page.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_path: String,
    pub shop: String,
    pub products: Vec<ProductSummary>,
}

/// `GET /api/products` response body.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductSummary>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /products - Product selection page.
#[instrument(skip(state, shopify, session), fields(shop = %shopify.shop))]
async fn index(
    RequireShopifySession(shopify): RequireShopifySession,
    State(state): State<AppState>,
    session: Session,
) -> Result<ProductsIndexTemplate, AppError> {
    let products = match selection::load_products(
        state.catalog(),
        &shopify,
        state.config().products_page_size,
    )
    .await
    {
        Ok(products) => products,
        Err(err) => return Err(forget_revoked_session(&session, err).await),
    };

    Ok(ProductsIndexTemplate {
        current_path: "/products".to_string(),
        shop: shopify.shop,
        products,
    })
}

/// GET /api/products - First page of products as JSON.
#[instrument(skip(state, shopify, session), fields(shop = %shopify.shop))]
async fn api_index(
    RequireShopifySession(shopify): RequireShopifySession,
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ProductsResponse>, AppError> {
    let products = match selection::load_products(
        state.catalog(),
        &shopify,
        state.config().products_page_size,
    )
    .await
    {
        Ok(products) => products,
        Err(err) => return Err(forget_revoked_session(&session, err).await),
    };

    Ok(Json(ProductsResponse { products }))
}

/// GET /api/products/{id} - One product from the REST Admin API.
#[instrument(skip(state, shopify, session), fields(shop = %shopify.shop))]
async fn api_show(
    RequireShopifySession(shopify): RequireShopifySession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    match selection::load_product(state.catalog(), &shopify, &id).await {
        Ok(product) => Ok(Json(product)),
        Err(err) => Err(forget_revoked_session(&session, err).await),
    }
}
