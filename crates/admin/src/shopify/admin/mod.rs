//! Shopify Admin API client.
//!
//! GraphQL for listing products, REST for single-product lookups, and the
//! OAuth authorization-code exchange. Every API call is authorized by the
//! caller's [`ShopifySession`].

use std::sync::Arc;

use async_trait::async_trait;
use graphql_client::GraphQLQuery;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyAdminConfig;
use crate::models::ShopifySession;

use super::{AdminShopifyError, CatalogSource, GraphQLError};

pub mod queries;

use queries::{SelectionProducts, selection_products};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Seconds to wait when Shopify rate limits without a `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// OAuth token returned by the code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The access token for API calls
    pub access_token: String,
    /// Granted scopes
    pub scope: String,
    /// Unix timestamp when token was obtained
    pub obtained_at: i64,
    /// Associated shop domain
    pub shop: String,
}

impl From<OAuthToken> for ShopifySession {
    fn from(token: OAuthToken) -> Self {
        Self {
            shop: token.shop,
            access_token: token.access_token,
            scope: token.scope,
            obtained_at: token.obtained_at,
        }
    }
}

/// Shopify Admin API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    api_version: String,
    client_id: String,
    client_secret: SecretString,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

/// OAuth token response from Shopify.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    scope: String,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyAdminConfig) -> Result<Self, AdminShopifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                api_version: config.api_version.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            }),
        })
    }

    /// Get the client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Get the client secret (for HMAC verification).
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.inner.client_secret
    }

    fn graphql_endpoint(&self, shop: &str) -> String {
        format!(
            "https://{shop}/admin/api/{}/graphql.json",
            self.inner.api_version
        )
    }

    fn product_endpoint(&self, shop: &str, legacy_id: u64) -> String {
        format!(
            "https://{shop}/admin/api/{}/products/{legacy_id}.json",
            self.inner.api_version
        )
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Generate the OAuth authorization URL for `shop`.
    ///
    /// Redirect the merchant to this URL to begin the install flow.
    #[must_use]
    pub fn authorization_url(
        &self,
        shop: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scope = scopes.join(",");
        format!(
            "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::OAuth` if Shopify rejects the exchange.
    /// Returns `AdminShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        shop: &str,
        code: &str,
    ) -> Result<OAuthToken, AdminShopifyError> {
        let url = format!("https://{shop}/admin/oauth/access_token");

        let params = [
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdminShopifyError::OAuth(format!(
                "token exchange failed ({status}): {text}"
            )));
        }

        let token_response: OAuthTokenResponse = response.json().await?;

        Ok(OAuthToken {
            access_token: token_response.access_token,
            scope: token_response.scope,
            obtained_at: chrono::Utc::now().timestamp(),
            shop: shop.to_string(),
        })
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL query for the session's shop.
    async fn execute<Q: GraphQLQuery>(
        &self,
        session: &ShopifySession,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.graphql_endpoint(&session.shop))
            .header(ACCESS_TOKEN_HEADER, &session.access_token)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response)?;
        let graphql_response: GraphQLResponse<Q::ResponseData> = response.json().await?;

        into_data(graphql_response)
    }

    // =========================================================================
    // Product methods
    // =========================================================================

    /// Get the first `first` products as a raw GraphQL `data` object.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, session), fields(shop = %session.shop))]
    pub async fn get_products(
        &self,
        session: &ShopifySession,
        first: i64,
    ) -> Result<serde_json::Value, AdminShopifyError> {
        self.execute::<SelectionProducts>(session, selection_products::Variables::first(first))
            .await
    }

    /// Get a single product through the REST Admin API.
    ///
    /// Returns the `product` object of the response.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::NotFound` if the product does not exist,
    /// or another error if the request fails.
    #[instrument(skip(self, session), fields(shop = %session.shop))]
    pub async fn get_product_rest(
        &self,
        session: &ShopifySession,
        legacy_id: u64,
    ) -> Result<serde_json::Value, AdminShopifyError> {
        let response = self
            .inner
            .client
            .get(self.product_endpoint(&session.shop, legacy_id))
            .header(ACCESS_TOKEN_HEADER, &session.access_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdminShopifyError::NotFound(format!("product {legacy_id}")));
        }

        let mut body: serde_json::Value = check_status(response)?.json().await?;
        body.get_mut("product")
            .map(serde_json::Value::take)
            .ok_or_else(|| AdminShopifyError::NotFound(format!("product {legacy_id}")))
    }
}

#[async_trait]
impl CatalogSource for AdminClient {
    async fn fetch_products(
        &self,
        session: &ShopifySession,
        first: i64,
    ) -> Result<serde_json::Value, AdminShopifyError> {
        self.get_products(session, first).await
    }

    async fn fetch_product(
        &self,
        session: &ShopifySession,
        legacy_id: u64,
    ) -> Result<serde_json::Value, AdminShopifyError> {
        self.get_product_rest(session, legacy_id).await
    }
}

/// Map rate limiting, rejected tokens, and other failures to errors.
fn check_status(response: Response) -> Result<Response, AdminShopifyError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(AdminShopifyError::RateLimited(retry_after));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AdminShopifyError::Unauthorized(
            "Invalid or expired access token".to_string(),
        ));
    }

    if !status.is_success() {
        return Err(AdminShopifyError::Status(status.as_u16()));
    }

    Ok(response)
}

/// Shopify sends `Retry-After` as fractional seconds (e.g. "2.0").
fn parse_retry_after(value: &str) -> Option<u64> {
    let secs = value.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // checked non-negative above
    Some(secs.ceil() as u64)
}

/// Unwrap a GraphQL response, failing on errors or a missing `data` object.
fn into_data<T>(response: GraphQLResponse<T>) -> Result<T, AdminShopifyError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let converted_errors: Vec<GraphQLError> = errors
            .into_iter()
            .map(|e| GraphQLError {
                message: e.message,
                path: e.path,
            })
            .collect();
        return Err(AdminShopifyError::GraphQL(converted_errors));
    }

    response.data.ok_or_else(|| {
        AdminShopifyError::GraphQL(vec![GraphQLError {
            message: "No data in response".to_string(),
            path: vec![],
        }])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;

    fn client() -> AdminClient {
        AdminClient::new(&ShopifyAdminConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            client_id: "client id".to_string(),
            client_secret: SecretString::from("s3cr3t"),
            scopes: vec!["read_products".to_string()],
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_admin_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<AdminClient>();
    }

    #[test]
    fn test_endpoints_use_session_shop_and_version() {
        let client = client();
        assert_eq!(
            client.graphql_endpoint("a.myshopify.com"),
            "https://a.myshopify.com/admin/api/2026-01/graphql.json"
        );
        assert_eq!(
            client.product_endpoint("a.myshopify.com", 8_579_949_920_468),
            "https://a.myshopify.com/admin/api/2026-01/products/8579949920468.json"
        );
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let url = client().authorization_url(
            "a.myshopify.com",
            "https://curator.example.com/auth/shopify/callback",
            &["read_products".to_string(), "write_products".to_string()],
            "nonce",
        );

        assert!(url.starts_with("https://a.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("scope=read_products%2Cwrite_products"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fcurator.example.com%2Fauth%2Fshopify%2Fcallback"
        ));
        assert!(url.ends_with("state=nonce"));
    }

    #[test]
    fn test_into_data_returns_data() {
        let response: GraphQLResponse<Value> =
            serde_json::from_value(json!({"data": {"products": {"edges": []}}})).unwrap();
        let data = into_data(response).unwrap();
        assert_eq!(data, json!({"products": {"edges": []}}));
    }

    #[test]
    fn test_into_data_surfaces_graphql_errors() {
        let response: GraphQLResponse<Value> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "Throttled", "extensions": {"code": "THROTTLED"}}]
        }))
        .unwrap();

        let err = into_data(response).unwrap_err();
        assert!(matches!(&err, AdminShopifyError::GraphQL(errors) if errors[0].message == "Throttled"));
    }

    #[test]
    fn test_into_data_rejects_empty_payload() {
        let response: GraphQLResponse<Value> = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            into_data(response),
            Err(AdminShopifyError::GraphQL(_))
        ));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("2.0"), Some(2));
        assert_eq!(parse_retry_after("0.5"), Some(1));
        assert_eq!(parse_retry_after("later"), None);
        assert_eq!(parse_retry_after("-1"), None);
    }

    #[test]
    fn test_session_from_oauth_token() {
        let session = ShopifySession::from(OAuthToken {
            access_token: "token".to_string(),
            scope: "read_products".to_string(),
            obtained_at: 1_700_000_000,
            shop: "a.myshopify.com".to_string(),
        });
        assert_eq!(session.shop, "a.myshopify.com");
        assert_eq!(session.access_token, "token");
    }
}
