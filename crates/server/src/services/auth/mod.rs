//! Authentication service.
//!
//! Username and password login with Argon2id hashes. Staff pick the outlet
//! they are working at as part of logging in; admins are not tied to one.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use sqlx::PgPool;

use booklist_core::{OutletId, UserRole};

use crate::db::{OutletRepository, UserRepository};
use crate::models::{CurrentUser, Outlet, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user: User,
    /// The outlet chosen at login (staff only).
    pub outlet: Option<Outlet>,
}

impl LoginOutcome {
    /// Identity to keep in the session.
    #[must_use]
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.user.id,
            username: self.user.username.clone(),
            name: self.user.name.clone(),
            role: self.user.role,
            outlet_id: self.outlet.as_ref().map(|o| o.id),
            outlet_name: self.outlet.as_ref().map(|o| o.name.clone()),
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    outlets: OutletRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            outlets: OutletRepository::new(pool),
        }
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` for a blank username or password.
    /// Returns `AuthError::InvalidCredentials` if the user is unknown, inactive,
    /// or the password is wrong.
    /// Returns `AuthError::OutletRequired` or `AuthError::InvalidOutlet` when a
    /// staff user does not pick an active outlet.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        outlet_id: Option<OutletId>,
    ) -> Result<LoginOutcome, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let (user, password_hash) = self
            .users
            .get_credentials(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let outlet = match user.role {
            UserRole::Admin => None,
            UserRole::Staff => {
                let outlet_id = outlet_id.ok_or(AuthError::OutletRequired)?;
                let outlet = self
                    .outlets
                    .get_active(outlet_id)
                    .await?
                    .ok_or(AuthError::InvalidOutlet)?;
                Some(outlet)
            }
        };

        Ok(LoginOutcome { user, outlet })
    }
}

/// Check password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("staff123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("staff123", &hash).is_ok());
        assert!(matches!(
            verify_password("staff124", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("x", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("admin123").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }
}
