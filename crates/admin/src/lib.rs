//! Product Curator library.
//!
//! A Shopify admin add-on: list the store's products, let the merchant pick
//! some, and save the pick as a named collection.
//!
//! Exposed as a library so the binary, the CLI and the integration tests
//! share one router and one set of backends.
//!
//! # Security
//!
//! Product and collection routes require a Shopify session obtained through
//! the OAuth install flow. The session's access token never leaves the
//! server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
