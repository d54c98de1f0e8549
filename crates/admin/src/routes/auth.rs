//! Shopify OAuth install flow.
//!
//! `GET /auth/shopify` starts the authorization-code flow for a shop;
//! `GET /auth/shopify/callback` verifies Shopify's signature and the state
//! nonce, exchanges the code and stores the resulting [`ShopifySession`] in
//! the server-side session.

use std::collections::BTreeMap;

use axum::{
    Router,
    extract::{Query, RawQuery, State},
    response::Redirect,
    routing::get,
};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::set_shopify_session;
use crate::models::{ShopifySession, session_keys};
use crate::state::AppState;

/// Where the merchant lands after a successful install.
const AFTER_INSTALL_PATH: &str = "/products";

/// Scope every handler relies on.
const REQUIRED_SCOPE: &str = "read_products";

/// Build the OAuth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/shopify", get(install))
        .route("/auth/shopify/callback", get(callback))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InstallParams {
    pub shop: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

type HmacSha256 = Hmac<Sha256>;

/// Whether `shop` is a bare `*.myshopify.com` domain.
fn is_valid_shop_domain(shop: &str) -> bool {
    let Some(name) = shop.strip_suffix(".myshopify.com") else {
        return false;
    };
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Verify the `hmac` parameter of a Shopify redirect.
///
/// The signed message is every other parameter (except `signature`),
/// sorted by key and joined as `k=v&k=v`. Comparison is constant time.
fn verify_shopify_hmac(params: &BTreeMap<String, String>, client_secret: &str) -> bool {
    let Some(provided) = params.get("hmac").and_then(|h| hex::decode(h).ok()) else {
        return false;
    };

    let message = params
        .iter()
        .filter(|(k, _)| k.as_str() != "hmac" && k.as_str() != "signature")
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = HmacSha256::new_from_slice(client_secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

fn parse_query(raw: Option<&str>) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /auth/shopify - Start OAuth flow.
///
/// `?shop=` is optional and must name the configured store; collections are
/// not partitioned by shop, so no other store may install.
#[instrument(skip(state, session))]
async fn install(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<InstallParams>,
) -> Result<Redirect, AppError> {
    let shop = params
        .shop
        .unwrap_or_else(|| state.config().shopify.store.clone());

    if !is_valid_shop_domain(&shop) {
        return Err(AppError::InvalidInput(format!(
            "'{shop}' is not a myshopify.com domain"
        )));
    }
    if shop != state.config().shopify.store {
        tracing::warn!(shop = %shop, "Install attempted for another shop");
        return Err(AppError::InvalidInput(format!(
            "'{shop}' is not served by this app"
        )));
    }

    let oauth_state = uuid::Uuid::new_v4().to_string();
    session.insert(session_keys::OAUTH_STATE, &oauth_state).await?;

    let auth_url = state.shopify().authorization_url(
        &shop,
        &state.config().oauth_redirect_uri(),
        &state.config().shopify.scopes,
        &oauth_state,
    );

    tracing::info!(shop = %shop, "Redirecting to Shopify OAuth");
    Ok(Redirect::to(&auth_url))
}

/// GET /auth/shopify/callback - Handle OAuth callback.
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> Result<Redirect, AppError> {
    let params = parse_query(raw.as_deref());

    if !verify_shopify_hmac(&params, state.shopify().client_secret().expose_secret()) {
        tracing::warn!("Invalid HMAC signature in OAuth callback");
        return Err(AppError::Unauthorized("invalid signature".to_string()));
    }

    let stored_state: Option<String> = session.remove(session_keys::OAUTH_STATE).await?;
    if stored_state.is_none() || stored_state.as_ref() != params.get("state") {
        tracing::warn!("OAuth state mismatch");
        return Err(AppError::Unauthorized("invalid state".to_string()));
    }

    let shop = params
        .get("shop")
        .filter(|shop| is_valid_shop_domain(shop) && **shop == state.config().shopify.store)
        .ok_or_else(|| AppError::InvalidInput("missing or invalid shop".to_string()))?;
    let code = params
        .get("code")
        .ok_or_else(|| AppError::InvalidInput("missing authorization code".to_string()))?;

    let token = state.shopify().exchange_code(shop, code).await?;
    let shopify = ShopifySession::from(token);

    if !shopify.has_scope(REQUIRED_SCOPE) {
        tracing::warn!(scope = %shopify.scope, "Install is missing a required scope");
        return Err(AppError::Unauthorized(format!(
            "{REQUIRED_SCOPE} scope was not granted"
        )));
    }

    // New session id on privilege change.
    session.cycle_id().await?;
    set_shopify_session(&session, &shopify).await?;

    tracing::info!(shop = %shopify.shop, "Shopify store connected");
    Ok(Redirect::to(AFTER_INSTALL_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
        let message = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn callback_params() -> BTreeMap<String, String> {
        [
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
            ("shop", "some-shop.myshopify.com"),
            ("state", "nonce"),
            ("timestamp", "1337178173"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_shop_domain_validation() {
        assert!(is_valid_shop_domain("some-shop.myshopify.com"));
        assert!(is_valid_shop_domain("shop123.myshopify.com"));
        assert!(!is_valid_shop_domain("myshopify.com"));
        assert!(!is_valid_shop_domain(".myshopify.com"));
        assert!(!is_valid_shop_domain("-shop.myshopify.com"));
        assert!(!is_valid_shop_domain("evil.com"));
        assert!(!is_valid_shop_domain("evil.com/.myshopify.com"));
        assert!(!is_valid_shop_domain("a.b.myshopify.com"));
    }

    #[test]
    fn test_hmac_accepts_valid_signature() {
        let mut params = callback_params();
        let hmac = sign(&params, "hush");
        params.insert("hmac".to_string(), hmac);

        assert!(verify_shopify_hmac(&params, "hush"));
    }

    #[test]
    fn test_hmac_rejects_tampering() {
        let mut params = callback_params();
        let hmac = sign(&params, "hush");
        params.insert("hmac".to_string(), hmac);

        assert!(!verify_shopify_hmac(&params, "other secret"));

        params.insert("shop".to_string(), "evil.myshopify.com".to_string());
        assert!(!verify_shopify_hmac(&params, "hush"));
    }

    #[test]
    fn test_hmac_rejects_missing_or_garbled() {
        let mut params = callback_params();
        assert!(!verify_shopify_hmac(&params, "hush"));

        params.insert("hmac".to_string(), "not hex".to_string());
        assert!(!verify_shopify_hmac(&params, "hush"));
    }

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query(Some("shop=a.myshopify.com&state=a%20b"));
        assert_eq!(params["shop"], "a.myshopify.com");
        assert_eq!(params["state"], "a b");
        assert!(parse_query(None).is_empty());
    }
}
