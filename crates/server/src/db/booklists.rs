//! Booklist repository. Booklists and their items are written together.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use booklist_core::{Amount, BooklistId, BooklistItemId};

use super::RepositoryError;
use crate::models::{Booklist, BooklistItem, NewBooklist, NewBooklistItem};

#[derive(Debug, sqlx::FromRow)]
struct BooklistRow {
    id: BooklistId,
    code: String,
    name: String,
    grade: String,
    total_amount: Amount,
}

#[derive(Debug, sqlx::FromRow)]
struct BooklistItemRow {
    id: BooklistItemId,
    booklist_id: BooklistId,
    name: String,
    quantity: i32,
    rate: Amount,
    amount: Amount,
}

impl From<BooklistItemRow> for BooklistItem {
    fn from(row: BooklistItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            rate: row.rate,
            amount: row.amount,
        }
    }
}

/// Repository for booklist database operations.
pub struct BooklistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BooklistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List booklists by grade, each with its items in entry order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Booklist>, RepositoryError> {
        let rows = sqlx::query_as::<_, BooklistRow>(
            "SELECT id, code, name, grade, total_amount FROM booklist.booklist ORDER BY grade, code",
        )
        .fetch_all(self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, BooklistItemRow>(
            r"
            SELECT id, booklist_id, name, quantity, rate, amount
            FROM booklist.booklist_item
            ORDER BY booklist_id, position
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut items: HashMap<BooklistId, Vec<BooklistItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.booklist_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Booklist {
                items: items.remove(&row.id).unwrap_or_default(),
                id: row.id,
                code: row.code,
                name: row.name,
                grade: row.grade,
                total_amount: row.total_amount,
            })
            .collect())
    }

    /// Whether a booklist exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: BooklistId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM booklist.booklist WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a booklist and its items in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is written then.
    pub async fn create(&self, booklist: &NewBooklist) -> Result<Booklist, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id = BooklistId::generate();
        let total_amount = booklist.resolved_total();

        sqlx::query(
            r"
            INSERT INTO booklist.booklist (id, code, name, grade, total_amount)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(booklist.code.trim())
        .bind(booklist.name.trim())
        .bind(booklist.grade.trim())
        .bind(total_amount)
        .execute(&mut *tx)
        .await?;

        let items = insert_items(&mut *tx, id, &booklist.items).await?;
        tx.commit().await?;

        Ok(assemble(id, booklist, total_amount, items))
    }

    /// Replace a booklist's fields and its whole item list in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booklist does not exist.
    pub async fn update(
        &self,
        id: BooklistId,
        booklist: &NewBooklist,
    ) -> Result<Booklist, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let total_amount = booklist.resolved_total();

        let result = sqlx::query(
            r"
            UPDATE booklist.booklist
            SET code = $2, name = $3, grade = $4, total_amount = $5
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(booklist.code.trim())
        .bind(booklist.name.trim())
        .bind(booklist.grade.trim())
        .bind(total_amount)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM booklist.booklist_item WHERE booklist_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let items = insert_items(&mut *tx, id, &booklist.items).await?;
        tx.commit().await?;

        Ok(assemble(id, booklist, total_amount, items))
    }

    /// Delete a booklist and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booklist does not exist, or
    /// `RepositoryError::Conflict` if redemptions still reference it.
    pub async fn delete(&self, id: BooklistId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM booklist.booklist WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "booklist has recorded redemptions".to_owned(),
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

async fn insert_items(
    conn: &mut PgConnection,
    booklist_id: BooklistId,
    items: &[NewBooklistItem],
) -> Result<Vec<BooklistItem>, RepositoryError> {
    let mut inserted = Vec::with_capacity(items.len());
    for (position, item) in (0_i32..).zip(items) {
        let item_id = BooklistItemId::generate();
        let amount = item.line_amount();

        sqlx::query(
            r"
            INSERT INTO booklist.booklist_item
                (id, booklist_id, position, name, quantity, rate, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(item_id)
        .bind(booklist_id)
        .bind(position)
        .bind(item.name.trim())
        .bind(item.quantity)
        .bind(item.rate)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

        inserted.push(BooklistItem {
            id: item_id,
            name: item.name.trim().to_owned(),
            quantity: item.quantity,
            rate: item.rate,
            amount,
        });
    }
    Ok(inserted)
}

fn assemble(
    id: BooklistId,
    booklist: &NewBooklist,
    total_amount: Amount,
    items: Vec<BooklistItem>,
) -> Booklist {
    Booklist {
        id,
        code: booklist.code.trim().to_owned(),
        name: booklist.name.trim().to_owned(),
        grade: booklist.grade.trim().to_owned(),
        total_amount,
        items,
    }
}
