//! CLI subcommands.

pub mod collections;
pub mod migrate;

use product_curator_admin::db::RepositoryError;
use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

const DATABASE_URL_VAR: &str = "CURATOR_DATABASE_URL";
const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Database URL from `CURATOR_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();
    resolve_database_url(
        std::env::var(DATABASE_URL_VAR).ok(),
        std::env::var(FALLBACK_DATABASE_URL_VAR).ok(),
    )
}

fn resolve_database_url(
    primary: Option<String>,
    fallback: Option<String>,
) -> Result<SecretString, CommandError> {
    primary
        .filter(|url| !url.is_empty())
        .or_else(|| fallback.filter(|url| !url.is_empty()))
        .map(SecretString::from)
        .ok_or(CommandError::MissingEnvVar(DATABASE_URL_VAR))
}

/// Connect using the configured database URL.
async fn connect() -> Result<sqlx::PgPool, CommandError> {
    let database_url = database_url()?;
    tracing::info!("Connecting to curator database...");
    Ok(product_curator_admin::db::create_pool(&database_url).await?)
}
