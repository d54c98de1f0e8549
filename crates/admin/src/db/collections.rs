//! Collection storage.
//!
//! [`CollectionStore`] is the persistence boundary for saved selections;
//! [`PgCollectionStore`] implements it on `curator.product_collection`.
//! Collections are append-only: there is no update or delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use product_curator_core::{Collection, CollectionId, CollectionItem};

use super::RepositoryError;

/// Persistence boundary for collections.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Persist a new collection and return the stored record.
    ///
    /// The store assigns the ID and `created_at`.
    async fn create(
        &self,
        title: &str,
        items: &[CollectionItem],
    ) -> Result<Collection, RepositoryError>;

    /// List collections, newest first.
    async fn list(&self, limit: i64) -> Result<Vec<Collection>, RepositoryError>;

    /// Get a collection by ID.
    async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` collection queries.
#[derive(Debug, sqlx::FromRow)]
struct CollectionRow {
    id: i32,
    title: String,
    items: Json<Vec<CollectionItem>>,
    created_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: CollectionId::new(row.id),
            title: row.title,
            items: row.items.0,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed collection store.
#[derive(Clone)]
pub struct PgCollectionStore {
    pool: PgPool,
}

impl PgCollectionStore {
    /// Create a new collection store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionStore for PgCollectionStore {
    async fn create(
        &self,
        title: &str,
        items: &[CollectionItem],
    ) -> Result<Collection, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            INSERT INTO curator.product_collection (title, items)
            VALUES ($1, $2)
            RETURNING id, title, items, created_at
            ",
        )
        .bind(title)
        .bind(Json(items))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Collection>, RepositoryError> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            r"
            SELECT id, title, items, created_at
            FROM curator.product_collection
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            SELECT id, title, items, created_at
            FROM curator.product_collection
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        if one != 1 {
            return Err(RepositoryError::DataCorruption(format!(
                "SELECT 1 returned {one}"
            )));
        }
        Ok(())
    }
}
