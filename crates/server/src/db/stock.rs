//! Voucher stock ledger repository.
//!
//! Lookups mirror `booklist_core::LedgerView`: "current" is the latest entry
//! dated on or before a day, "previous closing" the latest strictly before it,
//! ties broken by insertion time.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};

use booklist_core::{Grade, StockEntry, StockEntryId, StockMovement};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: StockEntryId,
    voucher_id: String,
    grade: String,
    location: String,
    date: NaiveDate,
    opening_stock: i32,
    received: i32,
    redeemed: i32,
    closing_stock: i32,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StockRow> for StockEntry {
    type Error = RepositoryError;

    fn try_from(row: StockRow) -> Result<Self, Self::Error> {
        let grade = Grade::parse(&row.grade).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("blank grade on stock entry {}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            voucher_id: row.voucher_id,
            grade,
            location: row.location,
            date: row.date,
            opening_stock: row.opening_stock,
            received: row.received,
            redeemed: row.redeemed,
            closing_stock: row.closing_stock,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

const STOCK_COLUMNS: &str = r"
    id, voucher_id, grade, location, date, opening_stock,
    received, redeemed, closing_stock, notes, created_at
";

const DUPLICATE_MOVEMENT: &str =
    "a stock movement already exists for this grade, location and date; correct it by id instead";

/// Optional filters for listing the ledger.
#[derive(Debug, Clone, Default)]
pub struct StockFilter<'f> {
    pub location: Option<&'f str>,
    pub date: Option<NaiveDate>,
    pub grade: Option<&'f str>,
}

/// All entries for `location` dated on or before `through`.
///
/// Takes any executor so the day-end service can read inside its transaction.
pub(crate) async fn entries_through<'e, E>(
    executor: E,
    location: &str,
    through: NaiveDate,
) -> Result<Vec<StockEntry>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, StockRow>(&format!(
        r"
        SELECT {STOCK_COLUMNS}
        FROM booklist.voucher_stock
        WHERE location = $1 AND date <= $2
        ORDER BY date, created_at
        "
    ))
    .bind(location)
    .bind(through)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Repository for stock ledger database operations.
pub struct StockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List entries, newest date first, then by grade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored grade is blank.
    pub async fn list(&self, filter: &StockFilter<'_>) -> Result<Vec<StockEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r"
            SELECT {STOCK_COLUMNS}
            FROM booklist.voucher_stock
            WHERE ($1::text IS NULL OR location = $1)
              AND ($2::date IS NULL OR date = $2)
              AND ($3::text IS NULL OR grade = $3)
            ORDER BY date DESC, grade
            "
        ))
        .bind(filter.location)
        .bind(filter.date)
        .bind(filter.grade)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StockEntryId) -> Result<Option<StockEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {STOCK_COLUMNS} FROM booklist.voucher_stock WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Closing stock of the latest entry dated on or before `as_of`, or 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn current_stock(
        &self,
        grade: &Grade,
        location: &str,
        as_of: NaiveDate,
    ) -> Result<i32, RepositoryError> {
        let closing: Option<i32> = sqlx::query_scalar(
            r"
            SELECT closing_stock
            FROM booklist.voucher_stock
            WHERE grade = $1 AND location = $2 AND date <= $3
            ORDER BY date DESC, created_at DESC
            LIMIT 1
            ",
        )
        .bind(grade.as_str())
        .bind(location)
        .bind(as_of)
        .fetch_optional(self.pool)
        .await?;

        Ok(closing.unwrap_or(0))
    }

    /// Closing stock of the latest entry dated strictly before `before`, or 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn previous_closing(
        &self,
        grade: &Grade,
        location: &str,
        before: NaiveDate,
    ) -> Result<i32, RepositoryError> {
        let closing: Option<i32> = sqlx::query_scalar(
            r"
            SELECT closing_stock
            FROM booklist.voucher_stock
            WHERE grade = $1 AND location = $2 AND date < $3
            ORDER BY date DESC, created_at DESC
            LIMIT 1
            ",
        )
        .bind(grade.as_str())
        .bind(location)
        .bind(before)
        .fetch_optional(self.pool)
        .await?;

        Ok(closing.unwrap_or(0))
    }

    /// Opening stock for `date`: that day's entry if present, else the previous closing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn opening_for(
        &self,
        grade: &Grade,
        location: &str,
        date: NaiveDate,
    ) -> Result<i32, RepositoryError> {
        let same_day: Option<i32> = sqlx::query_scalar(
            r"
            SELECT opening_stock
            FROM booklist.voucher_stock
            WHERE grade = $1 AND location = $2 AND date = $3
            ",
        )
        .bind(grade.as_str())
        .bind(location)
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        match same_day {
            Some(opening) => Ok(opening),
            None => self.previous_closing(grade, location, date).await,
        }
    }

    /// Write a validated movement as a new ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an entry already exists for the
    /// movement's (grade, location, date).
    pub async fn record(&self, movement: &StockMovement) -> Result<StockEntry, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            r"
            INSERT INTO booklist.voucher_stock (
                id, voucher_id, grade, location, date,
                opening_stock, received, redeemed, closing_stock, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {STOCK_COLUMNS}
            "
        ))
        .bind(StockEntryId::generate())
        .bind(movement.voucher_id())
        .bind(movement.grade().as_str())
        .bind(movement.location())
        .bind(movement.date())
        .bind(movement.opening_stock())
        .bind(movement.received())
        .bind(movement.redeemed())
        .bind(movement.closing_stock())
        .bind(movement.notes())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_MOVEMENT))?;

        row.try_into()
    }

    /// Replace the quantities, voucher id and notes of an existing entry.
    ///
    /// The movement's grade, location and date are written too, so a
    /// correction may also move the entry to another key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry does not exist.
    /// Returns `RepositoryError::Conflict` if the new key is already taken.
    pub async fn correct(
        &self,
        id: StockEntryId,
        movement: &StockMovement,
    ) -> Result<StockEntry, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            r"
            UPDATE booklist.voucher_stock SET
                voucher_id = $2,
                grade = $3,
                location = $4,
                date = $5,
                opening_stock = $6,
                received = $7,
                redeemed = $8,
                closing_stock = $9,
                notes = $10
            WHERE id = $1
            RETURNING {STOCK_COLUMNS}
            "
        ))
        .bind(id)
        .bind(movement.voucher_id())
        .bind(movement.grade().as_str())
        .bind(movement.location())
        .bind(movement.date())
        .bind(movement.opening_stock())
        .bind(movement.received())
        .bind(movement.redeemed())
        .bind(movement.closing_stock())
        .bind(movement.notes())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_unique_violation(e, DUPLICATE_MOVEMENT))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
