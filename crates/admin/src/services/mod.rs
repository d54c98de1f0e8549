//! Business logic services.
//!
//! # Services
//!
//! - `selection` - Product read path and collection write path

pub mod selection;

pub use selection::{Submission, load_product, load_products, save_selection};
