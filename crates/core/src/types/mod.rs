//! Core types for Product Curator.
//!
//! This module provides type-safe wrappers for the product selection domain.

pub mod collection;
pub mod id;
pub mod product;

pub use collection::{Collection, CollectionItem, dedup_items};
pub use id::*;
pub use product::{ImageRef, ProductImage, ProductSummary, ProductVariant};
