//! End-to-end tests for the product selection flow.
//!
//! Drives the real router in-process; Shopify and `PostgreSQL` are faked.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use product_curator_core::{CollectionItem, ProductGid};
use product_curator_integration_tests::{
    CatalogReply, FakeCatalog, RecordingStore, TestApp, body_json, body_text, get, location,
    post_form, post_json, raw_product, raw_products,
};

fn gid(id: &str) -> CollectionItem {
    CollectionItem::Id(ProductGid::parse(id).unwrap())
}

fn app_with_products(count: u32) -> TestApp {
    TestApp::with_catalog(CatalogReply::Products(raw_products(
        (1..=count).map(raw_product),
    )))
}

// ============================================================================
// Authorization boundary
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_api_read_is_rejected_before_catalog() {
    let app = app_with_products(2);

    let response = app.send(get("/api/products", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(app.catalog.calls(), 0);
}

#[tokio::test]
async fn test_unauthenticated_page_redirects_to_install() {
    let app = app_with_products(2);

    let response = app.send(get("/products", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/shopify"));
    assert_eq!(app.catalog.calls(), 0);
}

#[tokio::test]
async fn test_unauthenticated_write_is_rejected_before_store() {
    let app = app_with_products(0);

    let response = app
        .send(post_form(
            "/collections",
            &[("title", "Summer"), ("products", r#"["gid://1"]"#)],
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_unknown_session_cookie_is_unauthenticated() {
    let app = app_with_products(1);

    let response = app
        .send(get("/api/products", Some("curator_session=bogus")))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.catalog.calls(), 0);
}

#[tokio::test]
async fn test_session_without_shopify_capability_is_unauthenticated() {
    let app = app_with_products(1);
    let cookie = app
        .seed_session([("shopify_oauth_state", json!("nonce"))])
        .await;

    let response = app.send(get("/api/products", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.catalog.calls(), 0);
}

// ============================================================================
// Read path
// ============================================================================

#[tokio::test]
async fn test_api_products_returns_projected_products_in_order() {
    let app = app_with_products(3);
    let cookie = app.authorized_cookie().await;

    let response = app.send(get("/api/products", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["id"], "gid://shopify/Product/1");
    assert_eq!(products[2]["id"], "gid://shopify/Product/3");
    assert_eq!(
        products[0]["featuredImage"]["url"],
        "https://cdn.shopify.com/1.jpg"
    );
    assert_eq!(products[0]["tags"], json!(["summer", "Sale"]));
    assert_eq!(app.catalog.calls(), 1);
}

#[tokio::test]
async fn test_api_products_remote_failure_is_500() {
    let app = TestApp::with_catalog(CatalogReply::Unauthorized);
    let cookie = app.authorized_cookie().await;

    let response = app.send(get("/api/products", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert!(!body.to_string().contains("access token"));
}

#[tokio::test]
async fn test_revoked_token_sends_merchant_back_to_install() {
    let app = TestApp::with_catalog(CatalogReply::Unauthorized);
    let cookie = app.authorized_cookie().await;

    let first = app.send(get("/products", Some(&cookie))).await;
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let second = app.send(get("/products", Some(&cookie))).await;
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&second), Some("/auth/shopify"));

    let api = app.send(get("/api/products", Some(&cookie))).await;
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.catalog.calls(), 1);
}

#[tokio::test]
async fn test_api_products_malformed_result_is_500() {
    let app = TestApp::with_catalog(CatalogReply::Products(json!({"products": {}})));
    let cookie = app.authorized_cookie().await;

    let response = app.send(get("/api/products", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Failed to fetch products"})
    );
}

#[tokio::test]
async fn test_api_product_lookup() {
    let catalog = FakeCatalog::new(CatalogReply::Products(raw_products([])))
        .with_rest_product(8_579_949_920_468, json!({"id": 8_579_949_920_468_u64, "title": "Hat"}));
    let app = TestApp::new(catalog, RecordingStore::default());
    let cookie = app.authorized_cookie().await;

    let found = app
        .send(get("/api/products/8579949920468", Some(&cookie)))
        .await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(body_json(found).await["title"], "Hat");

    let missing = app.send(get("/api/products/1", Some(&cookie))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let invalid = app.send(get("/api/products/hat", Some(&cookie))).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_products_page_renders_plain_text_descriptions() {
    let app = app_with_products(2);
    let cookie = app.authorized_cookie().await;

    let response = app.send(get("/products", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Product 1"));
    assert!(html.contains("Product 2"));
    assert!(html.contains("Hello world"));
    assert!(!html.contains("<script>"));
    assert!(!html.contains("alert("));
    assert!(html.contains(r#"name="product_id""#));
    assert!(html.contains(r#"action="/collections""#));
}

// ============================================================================
// Write path
// ============================================================================

#[tokio::test]
async fn test_form_write_persists_and_redirects() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_form(
            "/collections",
            &[("title", "Summer"), ("products", r#"["gid://1","gid://2"]"#)],
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/collections"));
    assert_eq!(app.store.create_calls(), 1);

    let saved = app.store.saved();
    assert_eq!(saved[0].title, "Summer");
    assert_eq!(saved[0].items, vec![gid("gid://1"), gid("gid://2")]);
}

#[tokio::test]
async fn test_form_write_with_invalid_products_is_400() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_form(
            "/collections",
            &[("title", "Summer"), ("products", "not-json")],
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_form_write_defaults_to_empty_collection() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_form("/collections", &[], Some(&cookie)))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let saved = app.store.saved();
    assert_eq!(saved[0].title, "");
    assert!(saved[0].items.is_empty());
}

#[tokio::test]
async fn test_checkbox_write_drops_duplicates() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_form(
            "/collections",
            &[
                ("title", "Picks"),
                ("product_id", "gid://shopify/Product/2"),
                ("product_id", "gid://shopify/Product/1"),
                ("product_id", "gid://shopify/Product/2"),
            ],
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        app.store.saved()[0].items,
        vec![
            gid("gid://shopify/Product/2"),
            gid("gid://shopify/Product/1")
        ]
    );
}

#[tokio::test]
async fn test_json_write_accepts_raw_edges() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_json(
            "/collections",
            &json!({
                "title": "Snapshots",
                "products": [{"node": raw_product(4)}, "gid://shopify/Product/5"]
            }),
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let items = &app.store.saved()[0].items;
    assert_eq!(items.len(), 2);
    let CollectionItem::Product(product) = &items[0] else {
        panic!("expected a snapshot, got {:?}", items[0]);
    };
    assert_eq!(product.handle, "product-4");
    assert_eq!(items[1], gid("gid://shopify/Product/5"));
}

#[tokio::test]
async fn test_json_write_with_bad_body_is_400() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_json(
            "/collections",
            &json!({"title": "x", "products": {"not": "a list"}}),
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_json_write_with_top_level_array_is_400() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    for body in [
        json!(["gid://shopify/Product/1"]),
        json!(["Summer", ["gid://shopify/Product/1"]]),
    ] {
        let response = app
            .send(post_json("/collections", &body, Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    assert_eq!(app.store.create_calls(), 0);
}

#[tokio::test]
async fn test_write_storage_failure_is_500() {
    let app = TestApp::new(
        FakeCatalog::new(CatalogReply::Products(raw_products([]))),
        RecordingStore::failing(),
    );
    let cookie = app.authorized_cookie().await;

    let response = app
        .send(post_form(
            "/collections",
            &[("title", "Summer"), ("products", r#"["gid://1"]"#)],
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Failed to save data"})
    );
    assert_eq!(app.store.create_calls(), 1);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_collections_page_lists_newest_first() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    for title in ["First <b>pick</b>", "Second pick"] {
        let response = app
            .send(post_form(
                "/collections",
                &[("title", title), ("product_id", "gid://shopify/Product/1")],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let response = app.send(get("/collections", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let second = html.find("Second pick").unwrap();
    let first = html.find("First &#60;b&#62;pick").unwrap();
    assert!(second < first);
    assert!(!html.contains("<b>pick"));
}

#[tokio::test]
async fn test_session_for_another_shop_sees_no_collections() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;
    let saved = app
        .send(post_form(
            "/collections",
            &[("title", "Shop A picks"), ("product_id", "gid://shopify/Product/1")],
            Some(&cookie),
        ))
        .await;
    assert_eq!(saved.status(), StatusCode::SEE_OTHER);

    let other = app.cookie_for_shop("other-store.myshopify.com").await;

    let page = app.send(get("/collections", Some(&other))).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&page), Some("/auth/shopify"));

    let api = app.send(get("/api/collections/1", Some(&other))).await;
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);

    let write = app
        .send(post_form("/collections", &[("title", "B")], Some(&other)))
        .await;
    assert_eq!(write.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.create_calls(), 1);
}

#[tokio::test]
async fn test_api_collection_lookup() {
    let app = app_with_products(0);
    let cookie = app.authorized_cookie().await;

    let missing = app.send(get("/api/collections/1", Some(&cookie))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let saved = app
        .send(post_form(
            "/collections",
            &[("title", "Summer"), ("product_id", "gid://shopify/Product/1")],
            Some(&cookie),
        ))
        .await;
    assert_eq!(saved.status(), StatusCode::SEE_OTHER);

    let found = app.send(get("/api/collections/1", Some(&cookie))).await;
    assert_eq!(found.status(), StatusCode::OK);
    let body = body_json(found).await;
    assert_eq!(body["title"], "Summer");
    assert_eq!(body["items"], json!(["gid://shopify/Product/1"]));
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = app_with_products(0);

    let live = app.send(get("/health", None)).await;
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(body_text(live).await, "ok");

    let ready = app.send(get("/health/ready", None)).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_when_store_unreachable() {
    let app = TestApp::new(
        FakeCatalog::new(CatalogReply::Products(raw_products([]))),
        RecordingStore::unreachable(),
    );

    let response = app.send(get("/health/ready", None)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
