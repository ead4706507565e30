//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use booklist_core::{OutletId, UserId, UserRole};

use super::RepositoryError;
use crate::models::{NewUser, User, UserUpdate};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for user queries (outlet name joined in).
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    name: String,
    role: UserRole,
    outlet_id: Option<OutletId>,
    outlet_name: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            name: row.name,
            role: row.role,
            outlet_id: row.outlet_id,
            outlet_name: row.outlet_name,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// User columns with the outlet name joined in, read from `source`.
fn select_users(source: &str) -> String {
    format!(
        r"
        SELECT u.id, u.username, u.name, u.role, u.outlet_id,
               o.name AS outlet_name, u.active, u.created_at
        FROM {source} u
        LEFT JOIN booklist.outlet o ON o.id = u.outlet_id
        "
    )
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} ORDER BY u.created_at DESC",
            select_users("booklist.app_user")
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List active staff users with their outlet name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_staff(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE u.role = 'staff' AND u.active ORDER BY u.name",
            select_users("booklist.app_user")
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE u.id = $1",
            select_users("booklist.app_user")
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an active user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT u.id, u.username, u.name, u.role, u.outlet_id,
                   o.name AS outlet_name, u.active, u.created_at, u.password_hash
            FROM booklist.app_user u
            LEFT JOIN booklist.outlet o ON o.id = u.outlet_id
            WHERE u.username = $1 AND u.active
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    /// Number of users in the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM booklist.app_user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Create a new user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            WITH inserted AS (
                INSERT INTO booklist.app_user
                    (id, username, password_hash, name, role, outlet_id, active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            {}
            ",
            select_users("inserted")
        ))
        .bind(UserId::generate())
        .bind(user.username.trim())
        .bind(password_hash)
        .bind(user.name.trim())
        .bind(user.role)
        .bind(user.outlet_id)
        .bind(user.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "username already exists"))?;

        Ok(row.into())
    }

    /// Apply a partial update. `password_hash` replaces the stored hash when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the new username is taken.
    pub async fn update(
        &self,
        id: UserId,
        update: &UserUpdate,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            WITH updated AS (
                UPDATE booklist.app_user SET
                    username = COALESCE($2, username),
                    password_hash = COALESCE($3, password_hash),
                    name = COALESCE($4, name),
                    role = COALESCE($5, role),
                    outlet_id = COALESCE($6, outlet_id),
                    active = COALESCE($7, active)
                WHERE id = $1
                RETURNING *
            )
            {}
            ",
            select_users("updated")
        ))
        .bind(id)
        .bind(update.username.as_deref().map(str::trim))
        .bind(password_hash)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.role)
        .bind(update.outlet_id)
        .bind(update.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "username already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if redemptions or reports reference the user.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM booklist.app_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "user has recorded redemptions or reports; deactivate instead".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
