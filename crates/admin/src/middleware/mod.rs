//! HTTP middleware for the curator.
//!
//! # Middleware Order (outermost first, see `main.rs`)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authorization is not a layer: handlers take [`RequireShopifySession`].

pub mod auth;
pub mod session;

pub use auth::{
    AllowedShop, RequireShopifySession, ShopifyAuthRejection, forget_revoked_session,
    set_shopify_session,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
