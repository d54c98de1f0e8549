//! Authorization extractor for Shopify-backed routes.
//!
//! Every product and collection handler takes [`RequireShopifySession`] as
//! its first extractor, so a request without a session is rejected before
//! the handler body (and any catalog or store call) runs.
//!
//! The app serves a single store. A session for any other shop is treated
//! as no session at all.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{ShopifySession, session_keys};
use crate::shopify::AdminShopifyError;

/// Where HTML requests without a session are sent.
pub const INSTALL_PATH: &str = "/auth/shopify";

/// Extractor that requires an authorized Shopify session.
///
/// Without one, HTML page loads are redirected to the install flow; API
/// calls and form posts get a 401 JSON error.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     RequireShopifySession(session): RequireShopifySession,
/// ) -> impl IntoResponse {
///     format!("Connected to {}", session.shop)
/// }
/// ```
pub struct RequireShopifySession(pub ShopifySession);

/// The one shop domain this deployment serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedShop(pub String);

/// Rejection for [`RequireShopifySession`].
#[derive(Debug)]
pub enum ShopifyAuthRejection {
    /// Redirect to the install flow (HTML page loads).
    RedirectToInstall,
    /// 401 JSON error (API calls, form posts).
    Unauthorized,
}

impl IntoResponse for ShopifyAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToInstall => Redirect::to(INSTALL_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Shopify session required" })),
            )
                .into_response(),
        }
    }
}

impl ShopifyAuthRejection {
    fn for_request(parts: &Parts) -> Self {
        let is_api = parts.uri.path().starts_with("/api/");
        if is_api || parts.method != Method::GET {
            Self::Unauthorized
        } else {
            Self::RedirectToInstall
        }
    }
}

impl<S> FromRequestParts<S> for RequireShopifySession
where
    S: Send + Sync,
    AllowedShop: FromRef<S>,
{
    type Rejection = ShopifyAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(ShopifyAuthRejection::for_request(parts));
        };

        let shopify: Option<ShopifySession> = session
            .get(session_keys::SHOPIFY_SESSION)
            .await
            .ok()
            .flatten();

        let AllowedShop(allowed) = AllowedShop::from_ref(state);
        match shopify {
            Some(shopify) if shopify.shop == allowed => Ok(Self(shopify)),
            Some(shopify) => {
                tracing::warn!(shop = %shopify.shop, "Session belongs to another shop");
                Err(ShopifyAuthRejection::for_request(parts))
            }
            None => Err(ShopifyAuthRejection::for_request(parts)),
        }
    }
}

/// Store the Shopify session after a successful install.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_shopify_session(
    session: &Session,
    shopify: &ShopifySession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::SHOPIFY_SESSION, shopify).await
}

/// Drop the stored Shopify session if `err` says Shopify rejected its token.
///
/// The request still fails with `err`; the next page load goes back through
/// the install flow. The session layer skips saving on 5xx responses, so
/// the removal is saved here.
pub async fn forget_revoked_session(session: &Session, err: AppError) -> AppError {
    if matches!(err, AppError::Remote(AdminShopifyError::Unauthorized(_))) {
        tracing::warn!("Shopify rejected the stored access token, clearing session");
        let cleared = async {
            session
                .remove::<ShopifySession>(session_keys::SHOPIFY_SESSION)
                .await?;
            session.save().await
        };
        if let Err(e) = cleared.await {
            tracing::error!(error = %e, "Failed to clear revoked Shopify session");
        }
    }
    err
}
