//! Day-end report persistence.
//!
//! Opening and closing snapshots are stored as JSONB on the report row so a
//! report keeps its own copy of the ledger. Discrepancies get their own table
//! and are deleted with the report.
//!
//! The write paths take a `&mut PgConnection` so the day-end service can run
//! them inside one transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use booklist_core::{
    Amount, DayEndDraft, DayEndReport, DayEndReportId, Grade, StockDiscrepancy, StockSnapshot,
    UserId,
};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: DayEndReportId,
    date: NaiveDate,
    location: String,
    staff_id: UserId,
    opening_stock: Json<Vec<StockSnapshot>>,
    closing_stock: Json<Vec<StockSnapshot>>,
    total_redemptions: i64,
    total_value: Amount,
    stock_counted: bool,
    stock_counted_by: Option<UserId>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ReportRow {
    fn into_report(self, discrepancies: Vec<StockDiscrepancy>) -> DayEndReport {
        DayEndReport {
            id: self.id,
            date: self.date,
            location: self.location,
            staff_id: self.staff_id,
            opening_stock: self.opening_stock.0,
            closing_stock: self.closing_stock.0,
            total_redemptions: self.total_redemptions,
            total_value: self.total_value,
            stock_counted: self.stock_counted,
            stock_counted_by: self.stock_counted_by,
            discrepancies,
            notes: self.notes,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscrepancyRow {
    report_id: DayEndReportId,
    voucher_id: String,
    grade: String,
    expected_stock: i32,
    actual_stock: i32,
    difference: i32,
    notes: Option<String>,
}

impl TryFrom<DiscrepancyRow> for StockDiscrepancy {
    type Error = RepositoryError;

    fn try_from(row: DiscrepancyRow) -> Result<Self, Self::Error> {
        let grade = Grade::parse(&row.grade).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "blank grade on discrepancy for report {}",
                row.report_id
            ))
        })?;

        Ok(Self {
            voucher_id: row.voucher_id,
            grade,
            expected_stock: row.expected_stock,
            actual_stock: row.actual_stock,
            difference: row.difference,
            notes: row.notes,
        })
    }
}

const REPORT_COLUMNS: &str = r"
    id, date, location, staff_id, opening_stock, closing_stock,
    total_redemptions, total_value, stock_counted, stock_counted_by,
    notes, created_at, completed_at
";

const DISCREPANCY_COLUMNS: &str = r"
    report_id, voucher_id, grade, expected_stock, actual_stock, difference, notes
";

/// Group discrepancy rows by report, keeping row order.
fn group_discrepancies(
    rows: Vec<DiscrepancyRow>,
) -> Result<HashMap<DayEndReportId, Vec<StockDiscrepancy>>, RepositoryError> {
    let mut grouped: HashMap<DayEndReportId, Vec<StockDiscrepancy>> = HashMap::new();
    for row in rows {
        let report_id = row.report_id;
        grouped.entry(report_id).or_default().push(row.try_into()?);
    }
    Ok(grouped)
}

/// Number and total booklist value of the redemptions for (date, location).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn day_totals(
    conn: &mut PgConnection,
    date: NaiveDate,
    location: &str,
) -> Result<(i64, Amount), RepositoryError> {
    let totals: (i64, Amount) = sqlx::query_as(
        r"
        SELECT COUNT(r.id), COALESCE(SUM(b.total_amount), 0)
        FROM booklist.redemption r
        LEFT JOIN booklist.booklist b ON b.id = r.booklist_id
        WHERE r.date = $1 AND r.location = $2
        ",
    )
    .bind(date)
    .bind(location)
    .fetch_one(conn)
    .await?;

    Ok(totals)
}

/// Whether a report already exists for (date, location).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn exists_for(
    conn: &mut PgConnection,
    date: NaiveDate,
    location: &str,
) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM booklist.day_end_report WHERE date = $1 AND location = $2)",
    )
    .bind(date)
    .bind(location)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

/// Insert a pending report.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a report exists for (date, location).
pub async fn insert_report(
    conn: &mut PgConnection,
    draft: &DayEndDraft,
) -> Result<DayEndReport, RepositoryError> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        r"
        INSERT INTO booklist.day_end_report (
            id, date, location, staff_id, opening_stock, closing_stock,
            total_redemptions, total_value, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {REPORT_COLUMNS}
        "
    ))
    .bind(DayEndReportId::generate())
    .bind(draft.date)
    .bind(&draft.location)
    .bind(draft.staff_id)
    .bind(Json(&draft.opening_stock))
    .bind(Json(&draft.closing_stock))
    .bind(draft.total_redemptions)
    .bind(draft.total_value)
    .bind(draft.notes.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        RepositoryError::on_unique_violation(
            e,
            "a day-end report already exists for this date and location",
        )
    })?;

    Ok(row.into_report(Vec::new()))
}

/// Load a report and lock its row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn lock_report(
    conn: &mut PgConnection,
    id: DayEndReportId,
) -> Result<Option<DayEndReport>, RepositoryError> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM booklist.day_end_report WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let discrepancies = load_discrepancies(conn, id).await?;
    Ok(Some(row.into_report(discrepancies)))
}

async fn load_discrepancies(
    conn: &mut PgConnection,
    id: DayEndReportId,
) -> Result<Vec<StockDiscrepancy>, RepositoryError> {
    let rows = sqlx::query_as::<_, DiscrepancyRow>(&format!(
        r"
        SELECT {DISCREPANCY_COLUMNS}
        FROM booklist.stock_discrepancy
        WHERE report_id = $1
        ORDER BY position
        "
    ))
    .bind(id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Persist a completed stock count: closing snapshot, counter, timestamps and
/// discrepancy rows.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the report vanished, or
/// `RepositoryError::Conflict` if it was already counted.
pub async fn save_count(
    conn: &mut PgConnection,
    report: &DayEndReport,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE booklist.day_end_report SET
            closing_stock = $2,
            stock_counted = TRUE,
            stock_counted_by = $3,
            completed_at = $4
        WHERE id = $1 AND NOT stock_counted
        ",
    )
    .bind(report.id)
    .bind(Json(&report.closing_stock))
    .bind(report.stock_counted_by)
    .bind(report.completed_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(
            "stock count already completed for this report".to_owned(),
        ));
    }

    for (position, d) in (0_i32..).zip(&report.discrepancies) {
        sqlx::query(
            r"
            INSERT INTO booklist.stock_discrepancy (
                id, report_id, position, voucher_id, grade,
                expected_stock, actual_stock, difference, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(Uuid::new_v4())
        .bind(report.id)
        .bind(position)
        .bind(&d.voucher_id)
        .bind(d.grade.as_str())
        .bind(d.expected_stock)
        .bind(d.actual_stock)
        .bind(d.difference)
        .bind(d.notes.as_deref())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Read-side repository for day-end reports.
pub struct DayEndRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DayEndRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a report with its discrepancies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(
        &self,
        id: DayEndReportId,
    ) -> Result<Option<DayEndReport>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM booklist.day_end_report WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let discrepancies = load_discrepancies(&mut conn, id).await?;
        Ok(Some(row.into_report(discrepancies)))
    }

    /// List reports, newest date first, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        location: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DayEndReport>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            r"
            SELECT {REPORT_COLUMNS}
            FROM booklist.day_end_report
            WHERE ($1::text IS NULL OR location = $1)
              AND ($2::date IS NULL OR date = $2)
            ORDER BY date DESC, location
            "
        ))
        .bind(location)
        .bind(date)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id.as_uuid()).collect();
        let discrepancy_rows = sqlx::query_as::<_, DiscrepancyRow>(&format!(
            r"
            SELECT {DISCREPANCY_COLUMNS}
            FROM booklist.stock_discrepancy
            WHERE report_id = ANY($1)
            ORDER BY report_id, position
            "
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut discrepancies = group_discrepancies(discrepancy_rows)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let found = discrepancies.remove(&row.id).unwrap_or_default();
                row.into_report(found)
            })
            .collect())
    }
}
