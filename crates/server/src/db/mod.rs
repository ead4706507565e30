//! Database operations for the booklist back-office.
//!
//! # Schema: `booklist`
//!
//! ## Tables
//!
//! - `outlet` - Retail outlets, which double as stock locations
//! - `app_user` - Admin and staff accounts (Argon2 password hashes)
//! - `school`, `booklist`, `booklist_item`, `option_item` - Catalogue
//! - `redemption` - Voucher redemptions taken at the counter
//! - `voucher_stock` - Stock ledger, unique per (grade, location, date)
//! - `day_end_report` - Daily reconciliation with JSONB stock snapshots
//! - `stock_discrepancy` - Counted differences, cascade-deleted with their report
//! - `session` - tower-sessions storage
//!
//! Rows are read into private `*Row` structs and converted to the camelCase
//! domain types here, so no other layer sees a snake_case column.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p booklist-cli -- migrate
//! ```

pub mod booklists;
pub mod day_end;
pub mod export;
pub mod option_items;
pub mod outlets;
pub mod redemptions;
pub mod schools;
pub mod stock;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use booklists::BooklistRepository;
pub use day_end::DayEndRepository;
pub use option_items::OptionItemRepository;
pub use outlets::OutletRepository;
pub use redemptions::RedemptionRepository;
pub use schools::SchoolRepository;
pub use stock::StockRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn on_unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
