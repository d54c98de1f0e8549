//! Product Curator Core - Shared types library.
//!
//! This crate provides the domain types used across all Product Curator components:
//! - `admin` - Merchant-facing selection UI and JSON endpoints
//! - `cli` - Command-line tools for migrations and inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product summaries, collections, and type-safe identifiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
