//! Redemption repository, including the dashboard and day-end aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use booklist_core::{
    Amount, BooklistId, Customization, DeliveryStatus, RedemptionId, UserId,
};

use super::RepositoryError;
use crate::models::{NewRedemption, Redemption};

#[derive(Debug, sqlx::FromRow)]
struct RedemptionRow {
    id: RedemptionId,
    voucher_id: String,
    staff_id: UserId,
    date: NaiveDate,
    location: String,
    parent_name: String,
    contact_no: String,
    student_name: String,
    school: String,
    student_class: Option<String>,
    booklist_id: BooklistId,
    single_ruled: i32,
    double_ruled: i32,
    square_ruled: i32,
    additional_items: String,
    has_textbooks: bool,
    has_stationary: bool,
    lens: bool,
    no_name: bool,
    cellophane: bool,
    customization: Customization,
    comments: String,
    delivery_date: Option<NaiveDate>,
    collection_date: Option<NaiveDate>,
    delivery_status: DeliveryStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RedemptionRow> for Redemption {
    fn from(row: RedemptionRow) -> Self {
        Self {
            id: row.id,
            voucher_id: row.voucher_id,
            staff_id: row.staff_id,
            date: row.date,
            location: row.location,
            parent_name: row.parent_name,
            contact_no: row.contact_no,
            student_name: row.student_name,
            school: row.school,
            student_class: row.student_class,
            booklist_id: row.booklist_id,
            single_ruled: row.single_ruled,
            double_ruled: row.double_ruled,
            square_ruled: row.square_ruled,
            additional_items: row.additional_items,
            has_textbooks: row.has_textbooks,
            has_stationary: row.has_stationary,
            lens: row.lens,
            no_name: row.no_name,
            cellophane: row.cellophane,
            customization: row.customization,
            comments: row.comments,
            delivery_date: row.delivery_date,
            collection_date: row.collection_date,
            delivery_status: row.delivery_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const REDEMPTION_COLUMNS: &str = r"
    id, voucher_id, staff_id, date, location, parent_name, contact_no,
    student_name, school, student_class, booklist_id, single_ruled,
    double_ruled, square_ruled, additional_items, has_textbooks,
    has_stationary, lens, no_name, cellophane, customization, comments,
    delivery_date, collection_date, delivery_status, created_at, updated_at
";

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionStats {
    pub total_redemptions: i64,
    /// Redemptions still `pending` or `wrapping`.
    pub pending_deliveries: i64,
    /// Redemptions delivered with today's delivery date.
    pub delivered_today: i64,
    /// Sum of the redeemed booklists' totals.
    pub total_value: Amount,
}

/// Repository for redemption database operations.
pub struct RedemptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RedemptionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List redemptions, newest first, optionally filtered by location and date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        location: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Redemption>, RepositoryError> {
        let rows = sqlx::query_as::<_, RedemptionRow>(&format!(
            r"
            SELECT {REDEMPTION_COLUMNS}
            FROM booklist.redemption
            WHERE ($1::text IS NULL OR location = $1)
              AND ($2::date IS NULL OR date = $2)
            ORDER BY created_at DESC
            "
        ))
        .bind(location)
        .bind(date)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record a redemption.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, r: &NewRedemption) -> Result<Redemption, RepositoryError> {
        let row = sqlx::query_as::<_, RedemptionRow>(&format!(
            r"
            INSERT INTO booklist.redemption (
                id, voucher_id, staff_id, date, location, parent_name, contact_no,
                student_name, school, student_class, booklist_id, single_ruled,
                double_ruled, square_ruled, additional_items, has_textbooks,
                has_stationary, lens, no_name, cellophane, customization, comments,
                delivery_date, collection_date, delivery_status
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            RETURNING {REDEMPTION_COLUMNS}
            "
        ))
        .bind(RedemptionId::generate())
        .bind(r.voucher_id.trim())
        .bind(r.staff_id)
        .bind(r.date)
        .bind(r.location.trim())
        .bind(r.parent_name.trim())
        .bind(r.contact_no.trim())
        .bind(r.student_name.trim())
        .bind(r.school.trim())
        .bind(r.student_class.as_deref())
        .bind(r.booklist_id)
        .bind(r.single_ruled)
        .bind(r.double_ruled)
        .bind(r.square_ruled)
        .bind(&r.additional_items)
        .bind(r.has_textbooks)
        .bind(r.has_stationary)
        .bind(r.lens)
        .bind(r.no_name)
        .bind(r.cellophane)
        .bind(r.customization)
        .bind(&r.comments)
        .bind(r.delivery_date)
        .bind(r.collection_date)
        .bind(r.delivery_status)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace every editable field of a redemption.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the redemption does not exist.
    pub async fn update(
        &self,
        id: RedemptionId,
        r: &NewRedemption,
    ) -> Result<Redemption, RepositoryError> {
        let row = sqlx::query_as::<_, RedemptionRow>(&format!(
            r"
            UPDATE booklist.redemption SET
                voucher_id = $2, staff_id = $3, date = $4, location = $5,
                parent_name = $6, contact_no = $7, student_name = $8, school = $9,
                student_class = $10, booklist_id = $11, single_ruled = $12,
                double_ruled = $13, square_ruled = $14, additional_items = $15,
                has_textbooks = $16, has_stationary = $17, lens = $18, no_name = $19,
                cellophane = $20, customization = $21, comments = $22,
                delivery_date = $23, collection_date = $24, delivery_status = $25,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REDEMPTION_COLUMNS}
            "
        ))
        .bind(id)
        .bind(r.voucher_id.trim())
        .bind(r.staff_id)
        .bind(r.date)
        .bind(r.location.trim())
        .bind(r.parent_name.trim())
        .bind(r.contact_no.trim())
        .bind(r.student_name.trim())
        .bind(r.school.trim())
        .bind(r.student_class.as_deref())
        .bind(r.booklist_id)
        .bind(r.single_ruled)
        .bind(r.double_ruled)
        .bind(r.square_ruled)
        .bind(&r.additional_items)
        .bind(r.has_textbooks)
        .bind(r.has_stationary)
        .bind(r.lens)
        .bind(r.no_name)
        .bind(r.cellophane)
        .bind(r.customization)
        .bind(&r.comments)
        .bind(r.delivery_date)
        .bind(r.collection_date)
        .bind(r.delivery_status)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Move a redemption to a new delivery status.
    ///
    /// Delivering or collecting stamps `today` unless a date is already set.
    /// Callers pass the same `today` they give [`Self::stats`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the redemption does not exist.
    pub async fn update_status(
        &self,
        id: RedemptionId,
        status: DeliveryStatus,
        today: NaiveDate,
    ) -> Result<Redemption, RepositoryError> {
        let row = sqlx::query_as::<_, RedemptionRow>(&format!(
            r"
            UPDATE booklist.redemption SET
                delivery_status = $2,
                delivery_date = CASE WHEN $2 = 'delivered'::booklist.delivery_status
                                     THEN COALESCE(delivery_date, $3)
                                     ELSE delivery_date END,
                collection_date = CASE WHEN $2 = 'collected'::booklist.delivery_status
                                       THEN COALESCE(collection_date, $3)
                                       ELSE collection_date END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REDEMPTION_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(today)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a redemption.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the redemption does not exist.
    pub async fn delete(&self, id: RedemptionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM booklist.redemption WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Dashboard counters, optionally for one location.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(
        &self,
        location: Option<&str>,
        today: NaiveDate,
    ) -> Result<RedemptionStats, RepositoryError> {
        let (total_redemptions, pending_deliveries, delivered_today, total_value): (
            i64,
            i64,
            i64,
            Amount,
        ) = sqlx::query_as(
            r"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE r.delivery_status IN ('pending', 'wrapping')),
                COUNT(*) FILTER (WHERE r.delivery_status = 'delivered' AND r.delivery_date = $2),
                COALESCE(SUM(b.total_amount), 0)
            FROM booklist.redemption r
            LEFT JOIN booklist.booklist b ON b.id = r.booklist_id
            WHERE ($1::text IS NULL OR r.location = $1)
            ",
        )
        .bind(location)
        .bind(today)
        .fetch_one(self.pool)
        .await?;

        Ok(RedemptionStats {
            total_redemptions,
            pending_deliveries,
            delivered_today,
            total_value,
        })
    }
}
