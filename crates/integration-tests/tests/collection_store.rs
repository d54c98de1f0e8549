//! `PgCollectionStore` against a real database.
//!
//! Ignored by default. Run with a scratch database:
//!
//! ```bash
//! CURATOR_TEST_DATABASE_URL=postgres://localhost/curator_test \
//!     cargo test -p product-curator-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sqlx::PgPool;

use product_curator_admin::db::{CollectionStore, PgCollectionStore};
use product_curator_core::{CollectionItem, ProductGid};

async fn store() -> PgCollectionStore {
    let url = std::env::var("CURATOR_TEST_DATABASE_URL")
        .expect("CURATOR_TEST_DATABASE_URL must be set for ignored tests");
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("../admin/migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    PgCollectionStore::new(pool)
}

fn gid(n: u32) -> CollectionItem {
    ProductGid::parse(format!("gid://shopify/Product/{n}"))
        .unwrap()
        .into()
}

#[tokio::test]
#[ignore = "requires CURATOR_TEST_DATABASE_URL"]
async fn test_create_then_get_keeps_items_in_order() {
    let store = store().await;
    let items = vec![gid(3), gid(1), gid(2)];

    let created = store.create("Ordered", &items).await.unwrap();
    let fetched = store.get(created.id).await.unwrap().unwrap();

    assert_eq!(fetched.title, "Ordered");
    assert_eq!(fetched.items, items);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
#[ignore = "requires CURATOR_TEST_DATABASE_URL"]
async fn test_list_is_newest_first() {
    let store = store().await;

    let older = store.create("Older", &[gid(1)]).await.unwrap();
    let newer = store.create("Newer", &[]).await.unwrap();

    let ids: Vec<_> = store
        .list(1000)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    let older_at = ids.iter().position(|id| *id == older.id).unwrap();
    let newer_at = ids.iter().position(|id| *id == newer.id).unwrap();
    assert!(newer_at < older_at);
}

#[tokio::test]
#[ignore = "requires CURATOR_TEST_DATABASE_URL"]
async fn test_get_missing_and_ping() {
    let store = store().await;

    assert!(store.get(i32::MAX.into()).await.unwrap().is_none());
    store.ping().await.unwrap();
}
