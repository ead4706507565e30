//! Day-end report workflow.
//!
//! Creating a report and completing its stock count each run in a single
//! transaction. The unique `(date, location)` constraint and the
//! `WHERE NOT stock_counted` guard catch requests that race past the checks.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

use booklist_core::{
    DayEndDraft, DayEndReport, DayEndReportId, Grade, LedgerView, UserId, ValidationError,
};

use crate::db::{RepositoryError, UserRepository, day_end, stock};
use crate::error::AppError;

/// Day-end report service.
pub struct DayEndService<'a> {
    pool: &'a PgPool,
}

impl<'a> DayEndService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot the ledger for (`date`, `location`) and store a pending report.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank location or empty grade list,
    /// `AppError::NotFound` if `staff_id` is not a known user, and
    /// `AppError::Conflict` if a report already exists for the day.
    #[instrument(skip(self, grades), fields(grades = grades.len()))]
    pub async fn create_report(
        &self,
        grades: &[Grade],
        date: NaiveDate,
        location: &str,
        staff_id: UserId,
    ) -> Result<DayEndReport, AppError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ValidationError::MissingField("location").into());
        }
        if grades.is_empty() {
            return Err(ValidationError::Invalid {
                field: "grades",
                reason: "at least one grade must be tracked".to_owned(),
            }
            .into());
        }
        self.require_user(staff_id, "staff user").await?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        if day_end::exists_for(&mut *tx, date, location).await? {
            return Err(AppError::Conflict(
                "a day-end report already exists for this date and location".to_owned(),
            ));
        }

        let entries = stock::entries_through(&mut *tx, location, date).await?;
        let ledger = LedgerView::new(&entries);
        let (total_redemptions, total_value) = day_end::day_totals(&mut *tx, date, location).await?;

        let draft = DayEndDraft::prepare(
            &ledger,
            grades,
            location,
            date,
            staff_id,
            total_redemptions,
            total_value,
        );
        let report = day_end::insert_report(&mut *tx, &draft).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(report_id = %report.id, total_redemptions, "Day-end report created");
        Ok(report)
    }

    /// Apply a physical stock count to a pending report.
    ///
    /// Count keys are grade labels; surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown report or counting user,
    /// `AppError::Conflict` if the report was already counted, and
    /// `AppError::Validation` if the counts do not match the tracked grades.
    #[instrument(skip(self, counts), fields(grades = counts.len()))]
    pub async fn complete_stock_count(
        &self,
        id: DayEndReportId,
        counts: &BTreeMap<String, i32>,
        counted_by: UserId,
    ) -> Result<DayEndReport, AppError> {
        let actual = parse_counts(counts)?;
        self.require_user(counted_by, "counting user").await?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut report = day_end::lock_report(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("day-end report not found".to_owned()))?;

        let discrepancies = report.complete_count(&actual, counted_by, Utc::now())?.len();
        day_end::save_count(&mut *tx, &report).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(report_id = %id, discrepancies, "Stock count completed");
        Ok(report)
    }

    async fn require_user(&self, id: UserId, what: &str) -> Result<(), AppError> {
        UserRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("{what} not found")))
    }
}

/// Turn label-keyed counts into grade-keyed ones.
fn parse_counts(counts: &BTreeMap<String, i32>) -> Result<BTreeMap<Grade, i32>, AppError> {
    let mut actual = BTreeMap::new();
    for (label, &count) in counts {
        let grade = Grade::parse(label).ok_or(ValidationError::MissingField("grade"))?;
        if actual.insert(grade.clone(), count).is_some() {
            return Err(ValidationError::Invalid {
                field: "actualCounts",
                reason: format!("grade {grade} is counted twice"),
            }
            .into());
        }
    }
    Ok(actual)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counts_trims_labels() {
        let counts = BTreeMap::from([(" 5 ".to_owned(), 7), ("9 SCI01".to_owned(), 3)]);
        let actual = parse_counts(&counts).unwrap();
        assert_eq!(actual.get(&Grade::parse("5").unwrap()), Some(&7));
        assert_eq!(actual.get(&Grade::parse("9 SCI01").unwrap()), Some(&3));
    }

    #[test]
    fn test_parse_counts_rejects_duplicates_after_trim() {
        let counts = BTreeMap::from([("5".to_owned(), 7), ("5 ".to_owned(), 8)]);
        assert!(matches!(parse_counts(&counts), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_counts_rejects_blank_label() {
        let counts = BTreeMap::from([("  ".to_owned(), 1)]);
        assert!(matches!(parse_counts(&counts), Err(AppError::Validation(_))));
    }
}
