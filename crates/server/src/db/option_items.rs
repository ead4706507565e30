//! Option item repository (toggles on the redemption form).

use sqlx::PgPool;

use booklist_core::OptionItemId;

use super::RepositoryError;
use crate::models::{OptionItem, OptionItemUpdate};

#[derive(Debug, sqlx::FromRow)]
struct OptionItemRow {
    id: OptionItemId,
    name: String,
    key: String,
    enabled: bool,
    default_checked: bool,
}

impl From<OptionItemRow> for OptionItem {
    fn from(row: OptionItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            key: row.key,
            enabled: row.enabled,
            default_checked: row.default_checked,
        }
    }
}

/// Parameters for creating an option item.
#[derive(Debug, Clone)]
pub struct CreateOptionItem<'n> {
    pub name: &'n str,
    pub key: &'n str,
    pub enabled: bool,
    pub default_checked: bool,
}

/// Repository for option item database operations.
pub struct OptionItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OptionItemRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List option items by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<OptionItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OptionItemRow>(
            r"
            SELECT id, name, key, enabled, default_checked
            FROM booklist.option_item
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create an option item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, item: CreateOptionItem<'_>) -> Result<OptionItem, RepositoryError> {
        let row = sqlx::query_as::<_, OptionItemRow>(
            r"
            INSERT INTO booklist.option_item (id, name, key, enabled, default_checked)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, key, enabled, default_checked
            ",
        )
        .bind(OptionItemId::generate())
        .bind(item.name.trim())
        .bind(item.key.trim())
        .bind(item.enabled)
        .bind(item.default_checked)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update; absent fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn update(
        &self,
        id: OptionItemId,
        update: &OptionItemUpdate,
    ) -> Result<OptionItem, RepositoryError> {
        let row = sqlx::query_as::<_, OptionItemRow>(
            r"
            UPDATE booklist.option_item SET
                name = COALESCE($2, name),
                key = COALESCE($3, key),
                enabled = COALESCE($4, enabled),
                default_checked = COALESCE($5, default_checked)
            WHERE id = $1
            RETURNING id, name, key, enabled, default_checked
            ",
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.key.as_deref().map(str::trim))
        .bind(update.enabled)
        .bind(update.default_checked)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete an option item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn delete(&self, id: OptionItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM booklist.option_item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
