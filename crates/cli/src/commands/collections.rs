//! Saved collection commands.
//!
//! # Usage
//!
//! ```bash
//! # Newest 20 collections
//! curator-cli collections list --limit 20
//! ```

use product_curator_admin::db::{CollectionStore, PgCollectionStore};
use product_curator_core::Collection;

use super::{CommandError, connect};

/// Log the newest `limit` collections.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the query fails.
pub async fn list(limit: i64) -> Result<(), CommandError> {
    let store = PgCollectionStore::new(connect().await?);
    let collections = store.list(limit).await?;

    if collections.is_empty() {
        tracing::info!("No collections saved yet");
        return Ok(());
    }

    for collection in &collections {
        tracing::info!(
            id = %collection.id,
            created_at = %collection.created_at,
            items = collection.items.len(),
            "{}",
            summary_line(collection)
        );
    }
    tracing::info!(count = collections.len(), "Listed collections");
    Ok(())
}

/// `"Summer" (3 products): gid://.., gid://..`
fn summary_line(collection: &Collection) -> String {
    let ids = collection
        .product_ids()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let noun = if collection.items.len() == 1 {
        "product"
    } else {
        "products"
    };
    format!(
        "{:?} ({} {noun}): {ids}",
        collection.title,
        collection.items.len()
    )
}
