//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! curator-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CURATOR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/admin/migrations/`, embedded at compile time.

use super::{CommandError, connect};

/// Run the curator migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running curator migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Curator migrations complete!");
    Ok(())
}
