//! Outlet repository. Active outlets are the stock locations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use booklist_core::OutletId;

use super::RepositoryError;
use crate::models::{Location, NewOutlet, Outlet, OutletUpdate};

const OUTLET_CODE_PREFIX: &str = "OUT-";

#[derive(Debug, sqlx::FromRow)]
struct OutletRow {
    id: OutletId,
    name: String,
    code: String,
    address: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<OutletRow> for Outlet {
    fn from(row: OutletRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            address: row.address,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

/// Next code in the `OUT-NNN` sequence, after the highest numbered existing code.
fn next_outlet_code<'c>(existing: impl IntoIterator<Item = &'c str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(OUTLET_CODE_PREFIX))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{OUTLET_CODE_PREFIX}{:03}", highest + 1)
}

/// Repository for outlet database operations.
pub struct OutletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OutletRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all outlets by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Outlet>, RepositoryError> {
        let rows = sqlx::query_as::<_, OutletRow>(
            "SELECT id, name, code, address, active, created_at FROM booklist.outlet ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List active outlets as locations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_locations(&self) -> Result<Vec<Location>, RepositoryError> {
        let rows: Vec<(OutletId, String)> =
            sqlx::query_as("SELECT id, name FROM booklist.outlet WHERE active ORDER BY name")
                .fetch_all(self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Location { id, name })
            .collect())
    }

    /// Get an active outlet by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: OutletId) -> Result<Option<Outlet>, RepositoryError> {
        let row = sqlx::query_as::<_, OutletRow>(
            r"
            SELECT id, name, code, address, active, created_at
            FROM booklist.outlet
            WHERE id = $1 AND active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an outlet by its unique code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Outlet>, RepositoryError> {
        let row = sqlx::query_as::<_, OutletRow>(
            "SELECT id, name, code, address, active, created_at FROM booklist.outlet WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create an outlet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, outlet: &NewOutlet) -> Result<Outlet, RepositoryError> {
        let row = sqlx::query_as::<_, OutletRow>(
            r"
            INSERT INTO booklist.outlet (id, name, code, address, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, code, address, active, created_at
            ",
        )
        .bind(OutletId::generate())
        .bind(outlet.name.trim())
        .bind(outlet.code.trim())
        .bind(outlet.address.as_deref())
        .bind(outlet.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "outlet code already exists"))?;

        Ok(row.into())
    }

    /// Create an active outlet from just a name, assigning the next `OUT-NNN` code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a concurrent insert took the code.
    pub async fn create_location(&self, name: &str) -> Result<Location, RepositoryError> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT code FROM booklist.outlet WHERE code LIKE 'OUT-%'",
        )
        .fetch_all(self.pool)
        .await?;
        let code = next_outlet_code(codes.iter().map(String::as_str));

        let outlet = self
            .create(&NewOutlet {
                name: name.to_owned(),
                code,
                address: None,
                active: true,
            })
            .await?;

        Ok(Location {
            id: outlet.id,
            name: outlet.name,
        })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the outlet does not exist.
    /// Returns `RepositoryError::Conflict` if the new code is taken.
    pub async fn update(&self, id: OutletId, update: &OutletUpdate) -> Result<Outlet, RepositoryError> {
        let row = sqlx::query_as::<_, OutletRow>(
            r"
            UPDATE booklist.outlet SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                address = COALESCE($4, address),
                active = COALESCE($5, active)
            WHERE id = $1
            RETURNING id, name, code, address, active, created_at
            ",
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.code.as_deref().map(str::trim))
        .bind(update.address.as_deref())
        .bind(update.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, "outlet code already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete an outlet. Users assigned to it are detached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the outlet does not exist.
    pub async fn delete(&self, id: OutletId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM booklist.outlet WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_outlet_code() {
        assert_eq!(next_outlet_code([]), "OUT-001");
    }

    #[test]
    fn test_next_code_follows_highest() {
        assert_eq!(
            next_outlet_code(["OUT-001", "OUT-003", "OUT-002", "HQ"]),
            "OUT-004"
        );
    }

    #[test]
    fn test_non_numeric_suffixes_ignored() {
        assert_eq!(next_outlet_code(["OUT-ABC", "OUT-009"]), "OUT-010");
    }
}
