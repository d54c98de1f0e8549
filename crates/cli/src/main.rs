//! Product Curator CLI - Database migrations and collection tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! curator-cli migrate
//!
//! # List saved collections
//! curator-cli collections list --limit 20
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `collections list` - Show saved collections, newest first

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "curator-cli")]
#[command(author, version, about = "Product Curator CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect saved collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },
}

#[derive(Subcommand)]
enum CollectionsAction {
    /// List saved collections, newest first
    List {
        /// Maximum number of collections to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Collections { action } => match action {
            CollectionsAction::List { limit } => {
                commands::collections::list(limit.max(1)).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_collections_list() {
        let cli = Cli::try_parse_from(["curator-cli", "collections", "list", "--limit", "5"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Collections {
                action: CollectionsAction::List { limit: 5 }
            }
        ));
    }
}
