//! School repository.

use sqlx::PgPool;

use booklist_core::SchoolId;

use super::RepositoryError;
use crate::models::School;

#[derive(Debug, sqlx::FromRow)]
struct SchoolRow {
    id: SchoolId,
    name: String,
}

impl From<SchoolRow> for School {
    fn from(row: SchoolRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Repository for school database operations.
pub struct SchoolRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SchoolRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List schools by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<School>, RepositoryError> {
        let rows = sqlx::query_as::<_, SchoolRow>(
            "SELECT id, name FROM booklist.school ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a school.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, name: &str) -> Result<School, RepositoryError> {
        let row = sqlx::query_as::<_, SchoolRow>(
            "INSERT INTO booklist.school (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(SchoolId::generate())
        .bind(name.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
