//! Domain models for admin.
//!
//! Product and collection types live in `product-curator-core`; this module
//! holds the types that only make sense inside the web app.

pub mod session;

pub use session::{ShopifySession, keys as session_keys};
