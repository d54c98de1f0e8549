//! Session-stored authorization for Shopify.
//!
//! A [`ShopifySession`] is the capability every product and collection
//! handler must hold. It is created by the OAuth callback, kept in the
//! server-side session, and handed explicitly to the catalog client.

use serde::{Deserialize, Serialize};

/// Authorized access to one shop's Admin API.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifySession {
    /// Shop domain (e.g., your-store.myshopify.com).
    pub shop: String,
    /// OAuth access token for the Admin API.
    pub access_token: String,
    /// Comma-separated scopes granted at install.
    pub scope: String,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl ShopifySession {
    /// Whether the granted scopes include `scope`.
    ///
    /// Shopify implies `read_x` when `write_x` is granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        let implied = scope
            .strip_prefix("read_")
            .map(|rest| format!("write_{rest}"));
        self.scope
            .split(',')
            .map(str::trim)
            .any(|granted| granted == scope || implied.as_deref() == Some(granted))
    }
}

impl std::fmt::Debug for ShopifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifySession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Session keys for Shopify authorization data.
pub mod keys {
    /// Key for the authorized [`super::ShopifySession`].
    pub const SHOPIFY_SESSION: &str = "shopify_session";

    /// Key for the OAuth `state` nonce issued at install time.
    pub const OAUTH_STATE: &str = "shopify_oauth_state";
}
