//! User management commands.

use thiserror::Error;

use booklist_core::UserRole;
use booklist_server::db::{self, OutletRepository, RepositoryError, UserRepository};
use booklist_server::models::NewUser;
use booklist_server::services::AuthError;
use booklist_server::services::auth::{hash_password, validate_password};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error (including duplicate usernames).
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, staff")]
    InvalidRole(String),

    /// Unknown outlet code.
    #[error("No outlet with code {0}")]
    UnknownOutlet(String),

    /// Password rejected or hashing failed.
    #[error("{0}")]
    Password(#[from] AuthError),
}

/// Create a user.
///
/// # Errors
///
/// Returns `UserError` if the role, outlet or password is invalid, the
/// username is taken, or the database is unreachable.
pub async fn create_user(
    username: &str,
    name: &str,
    role: &str,
    outlet_code: Option<&str>,
    password: &str,
) -> Result<(), UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    validate_password(password)?;

    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("BOOKLIST_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let outlet_id = match outlet_code {
        Some(code) => Some(
            OutletRepository::new(&pool)
                .get_by_code(code)
                .await?
                .ok_or_else(|| UserError::UnknownOutlet(code.to_owned()))?
                .id,
        ),
        None => None,
    };

    let hash = hash_password(password)?;
    let user = UserRepository::new(&pool)
        .create(
            &NewUser {
                username: username.to_owned(),
                password: String::new(),
                name: name.to_owned(),
                role,
                outlet_id,
                active: true,
            },
            &hash,
        )
        .await?;

    tracing::info!(user_id = %user.id, "Created {} user {}", user.role, user.username);
    Ok(())
}
