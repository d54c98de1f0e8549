//! Integration tests for Product Curator.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests (no external services)
//! cargo test -p product-curator-integration-tests
//!
//! # Including the PostgreSQL store tests
//! CURATOR_TEST_DATABASE_URL=postgres://... cargo test -p product-curator-integration-tests -- --ignored
//! ```
//!
//! The router tests drive the real axum app with `tower::ServiceExt::oneshot`.
//! Shopify and `PostgreSQL` are replaced by [`FakeCatalog`] and
//! [`RecordingStore`]; sessions live in a `MemoryStore` that tests seed
//! directly with [`TestApp::authorized_cookie`].

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;
use tower_sessions::{
    MemoryStore, SessionStore,
    session::{Id, Record},
};

use product_curator_admin::{
    config::{AdminConfig, ShopifyAdminConfig},
    db::{CollectionStore, RepositoryError},
    middleware::{SESSION_COOKIE_NAME, session_layer},
    models::{ShopifySession, session_keys},
    routes,
    shopify::{AdminClient, AdminShopifyError, CatalogSource},
    state::AppState,
};
use product_curator_core::{Collection, CollectionId, CollectionItem};

/// Shop used by every test session.
pub const TEST_SHOP: &str = "test.myshopify.com";

/// Client secret used to sign OAuth callbacks in tests.
pub const TEST_CLIENT_SECRET: &str = "k3v9-Qx7p2Lm8Zr4Tb6Wn1Yc5";

/// Configuration pointing at nothing real.
#[must_use]
pub fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        products_page_size: 5,
        shopify: ShopifyAdminConfig {
            store: TEST_SHOP.to_string(),
            api_version: "2026-01".to_string(),
            client_id: "test-client-id".to_string(),
            client_secret: SecretString::from(TEST_CLIENT_SECRET),
            scopes: vec!["read_products".to_string()],
            timeout: Duration::from_secs(5),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

// =============================================================================
// Fakes
// =============================================================================

/// What [`FakeCatalog::fetch_products`] answers with.
#[derive(Debug, Clone)]
pub enum CatalogReply {
    /// Return this raw GraphQL `data` object.
    Products(Value),
    /// Fail as if Shopify rejected the access token.
    Unauthorized,
}

/// In-memory catalog that counts calls.
#[derive(Debug)]
pub struct FakeCatalog {
    reply: CatalogReply,
    products_by_id: HashMap<u64, Value>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    #[must_use]
    pub fn new(reply: CatalogReply) -> Self {
        Self {
            reply,
            products_by_id: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve `product` from the REST lookup for `legacy_id`.
    #[must_use]
    pub fn with_rest_product(mut self, legacy_id: u64, product: Value) -> Self {
        self.products_by_id.insert(legacy_id, product);
        self
    }

    /// Number of catalog calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_products(
        &self,
        session: &ShopifySession,
        _first: i64,
    ) -> Result<Value, AdminShopifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(session.shop, TEST_SHOP, "catalog called with a foreign session");

        match &self.reply {
            CatalogReply::Products(raw) => Ok(raw.clone()),
            CatalogReply::Unauthorized => Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            )),
        }
    }

    async fn fetch_product(
        &self,
        _session: &ShopifySession,
        legacy_id: u64,
    ) -> Result<Value, AdminShopifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.products_by_id
            .get(&legacy_id)
            .cloned()
            .ok_or_else(|| AdminShopifyError::NotFound(format!("product {legacy_id}")))
    }
}

/// In-memory collection store that records every `create`.
#[derive(Debug, Default)]
pub struct RecordingStore {
    collections: Mutex<Vec<Collection>>,
    create_calls: AtomicUsize,
    fail_writes: bool,
    unreachable: bool,
}

impl RecordingStore {
    /// A store whose writes fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// A store whose health check fails.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Number of `create` calls made so far (including failed ones).
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Collections stored so far, oldest first.
    pub fn saved(&self) -> Vec<Collection> {
        self.collections
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CollectionStore for RecordingStore {
    async fn create(
        &self,
        title: &str,
        items: &[CollectionItem],
    ) -> Result<Collection, RepositoryError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(RepositoryError::DataCorruption(
                "write rejected".to_string(),
            ));
        }

        let mut collections = self
            .collections
            .lock()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let id = i32::try_from(collections.len() + 1)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let collection = Collection {
            id: CollectionId::new(id),
            title: title.to_string(),
            items: items.to_vec(),
            created_at: Utc::now(),
        };
        collections.push(collection.clone());
        Ok(collection)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Collection>, RepositoryError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.saved().into_iter().rev().take(limit).collect())
    }

    async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        Ok(self.saved().into_iter().find(|c| c.id == id))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.unreachable {
            return Err(RepositoryError::DataCorruption("unreachable".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Test application
// =============================================================================

/// The router wired to fakes.
pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<FakeCatalog>,
    pub store: Arc<RecordingStore>,
    pub sessions: MemoryStore,
}

impl TestApp {
    /// Build the app around `catalog` and `store`.
    ///
    /// # Panics
    ///
    /// Panics if the Shopify client cannot be built.
    #[must_use]
    pub fn new(catalog: FakeCatalog, store: RecordingStore) -> Self {
        let config = test_config();
        let catalog = Arc::new(catalog);
        let store = Arc::new(store);
        let sessions = MemoryStore::default();

        let shopify = AdminClient::new(&config.shopify).expect("client builds without network");
        let state = AppState::with_backends(
            config.clone(),
            shopify,
            Arc::clone(&catalog) as Arc<dyn CatalogSource>,
            Arc::clone(&store) as Arc<dyn CollectionStore>,
        );
        let router = routes::app(state, session_layer(sessions.clone(), &config));

        Self {
            router,
            catalog,
            store,
            sessions,
        }
    }

    /// App with a catalog answering `reply` and an empty store.
    #[must_use]
    pub fn with_catalog(reply: CatalogReply) -> Self {
        Self::new(FakeCatalog::new(reply), RecordingStore::default())
    }

    /// Seed a session holding a Shopify capability and return its cookie.
    ///
    /// # Panics
    ///
    /// Panics if the memory store rejects the record.
    pub async fn authorized_cookie(&self) -> String {
        self.cookie_for_shop(TEST_SHOP).await
    }

    /// Seed a session holding a Shopify capability for `shop`.
    ///
    /// # Panics
    ///
    /// Panics if the memory store rejects the record.
    pub async fn cookie_for_shop(&self, shop: &str) -> String {
        let shopify = ShopifySession {
            shop: shop.to_string(),
            access_token: "shpat_test".to_string(),
            scope: "read_products".to_string(),
            obtained_at: Utc::now().timestamp(),
        };
        self.seed_session([(
            session_keys::SHOPIFY_SESSION,
            serde_json::to_value(shopify).expect("session serializes"),
        )])
        .await
    }

    /// Seed a session with arbitrary values and return its cookie.
    ///
    /// # Panics
    ///
    /// Panics if the memory store rejects the record.
    pub async fn seed_session<'a>(
        &self,
        values: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> String {
        let mut record = Record {
            id: Id::default(),
            data: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            expiry_date: OffsetDateTime::now_utc() + time::Duration::hours(1),
        };
        self.sessions
            .create(&mut record)
            .await
            .expect("memory store accepts records");

        format!("{SESSION_COOKIE_NAME}={}", record.id)
    }

    /// Send one request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails (it is infallible).
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

// =============================================================================
// Request / response helpers
// =============================================================================

/// `GET path`, optionally with a session cookie.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("valid request")
}

/// Form `POST path` with the given fields.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn post_form(path: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("valid request")
}

/// JSON `POST path`.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn post_json(path: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Read a response body as text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("body is JSON")
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

// =============================================================================
// Raw GraphQL fixtures
// =============================================================================

/// One raw product node as returned by the product query.
#[must_use]
pub fn raw_product(n: u32) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{n}"),
        "title": format!("Product {n}"),
        "handle": format!("product-{n}"),
        "descriptionHtml": "<p>Hello <script>alert('x')</script><b>world</b></p>",
        "tags": ["summer", "Sale"],
        "variants": {"edges": [
            {"node": {
                "id": format!("gid://shopify/ProductVariant/{n}"),
                "title": "Default Title",
                "sku": format!("SKU-{n}"),
                "availableForSale": true
            }}
        ]},
        "images": {"edges": [
            {"node": {
                "id": format!("gid://shopify/ProductImage/{n}"),
                "url": format!("https://cdn.shopify.com/{n}.jpg"),
                "altText": null
            }}
        ]},
        "publishedAt": "2024-05-01T12:00:00Z"
    })
}

/// A raw `data` object with one edge per node.
#[must_use]
pub fn raw_products(nodes: impl IntoIterator<Item = Value>) -> Value {
    let edges: Vec<Value> = nodes.into_iter().map(|node| json!({"node": node})).collect();
    json!({"products": {"edges": edges}})
}
