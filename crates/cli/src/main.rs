//! Booklist CLI - Database migrations, seeding and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bl-cli migrate
//!
//! # Seed an empty database with the default outlets, users and catalogue
//! bl-cli seed
//! bl-cli seed --file seed.yaml
//!
//! # Create a user
//! bl-cli user create -u counter2 -n "Counter Two" -r staff -o OUT-001 --password s3cret-pass
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKLIST_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bl-cli")]
#[command(author, version, about = "Booklist back-office CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed an empty database with default data
    Seed {
        /// YAML file overriding sections of the default seed data
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin` or `staff`)
        #[arg(short, long, default_value = "staff")]
        role: String,

        /// Code of the outlet the user works at (e.g. `OUT-001`)
        #[arg(short, long)]
        outlet: Option<String>,

        /// Initial password
        #[arg(long)]
        password: String,
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
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                name,
                role,
                outlet,
                password,
            } => {
                commands::user::create_user(&username, &name, &role, outlet.as_deref(), &password)
                    .await?;
            }
        },
    }
    Ok(())
}
