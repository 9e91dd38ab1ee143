//! Oussaili CLI - Operator tools that run with service credentials.
//!
//! # Usage
//!
//! ```bash
//! # List user profiles and their roles
//! oussaili-cli users list
//!
//! # Promote a user (they must have signed in once)
//! oussaili-cli users grant-admin -e owner@example.com
//!
//! # Demote an administrator
//! oussaili-cli users revoke-admin -e former@example.com
//!
//! # Seed the catalogue from YAML
//! oussaili-cli products seed -f crates/cli/seed/products.yaml --skip-existing
//! ```
//!
//! # Commands
//!
//! - `users` - Inspect profiles and change roles (the only path for the first admin)
//! - `products` - List and seed the catalogue
//!
//! # Environment Variables
//!
//! - `FIREBASE_PROJECT_ID`, `FIREBASE_API_KEY` - Hosted project
//! - `FIRESTORE_ACCESS_TOKEN` - Service bearer token (needed for role writes)
//! - `FIRESTORE_ENDPOINT`, `FIRESTORE_DATABASE` - Emulator / database overrides

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use oussaili_storefront::config::FirebaseConfig;
use oussaili_storefront::documents::FirestoreClient;

mod commands;

#[derive(Parser)]
#[command(name = "oussaili-cli")]
#[command(author, version, about = "Oussaili operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user profiles and roles
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Manage the product catalogue
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List every profile
    List,
    /// Give a user the administrator role
    GrantAdmin {
        /// Email address of the profile
        #[arg(short, long)]
        email: String,
    },
    /// Return an administrator to the customer role
    RevokeAdmin {
        /// Email address of the profile
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List every product
    List,
    /// Create products from a YAML file
    Seed {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,

        /// Skip products whose name already exists
        #[arg(long)]
        skip_existing: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = FirebaseConfig::from_env()?;
    if config.access_token.is_none() {
        tracing::warn!("FIRESTORE_ACCESS_TOKEN not set; writes may be rejected by security rules");
    }
    let store = FirestoreClient::new(&config);

    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::List => {
                commands::users::list(&store).await?;
            }
            UsersAction::GrantAdmin { email } => {
                commands::users::grant_admin(&store, &email).await?;
            }
            UsersAction::RevokeAdmin { email } => {
                commands::users::revoke_admin(&store, &email).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List => {
                commands::products::list(&store).await?;
            }
            ProductsAction::Seed {
                file,
                skip_existing,
            } => {
                let summary = commands::products::seed_from_file(&store, &file, skip_existing).await?;
                tracing::info!(
                    created = summary.created,
                    skipped = summary.skipped,
                    "Seeding complete"
                );
            }
        },
    }
    Ok(())
}
