//! Day-end reports and physical stock-count reconciliation.
//!
//! A report moves through `NoReport -> Pending -> Counted`:
//!
//! 1. [`DayEndDraft::prepare`] snapshots every tracked grade's ledger state
//!    for the date and outlet. The closing snapshot starts as a copy of the
//!    opening one until the count is done.
//! 2. [`DayEndReport::complete_count`] compares the physical count against
//!    the opening snapshot, records a [`StockDiscrepancy`] for every grade
//!    that is off, and marks the report counted. Counting twice is refused.
//!
//! Reports hold copies of ledger rows, not references, so editing the ledger
//! afterwards never changes a closed report.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerView;
use crate::types::{Amount, DayEndReportId, Grade, UserId};

/// Errors from the stock-count step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The report has already been counted.
    #[error("stock count already completed for this report")]
    AlreadyCounted,

    /// No count was supplied for a tracked grade.
    #[error("missing stock count for grade {0}")]
    MissingCount(Grade),

    /// A count was supplied for a grade the report does not track.
    #[error("grade {0} is not tracked by this report")]
    UnknownGrade(Grade),

    /// A counted quantity was below zero.
    #[error("stock count for grade {grade} cannot be negative (got {value})")]
    NegativeCount {
        /// Grade with the bad count.
        grade: Grade,
        /// The rejected value.
        value: i32,
    },
}

/// A copy of one grade's ledger state, held inside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub voucher_id: String,
    pub grade: Grade,
    pub opening_stock: i32,
    pub received: i32,
    pub redeemed: i32,
    pub closing_stock: i32,
    pub date: NaiveDate,
    pub location: String,
}

impl StockSnapshot {
    /// Snapshot `grade` at `location` on `date`.
    ///
    /// Uses the day's own ledger entry when there is one; otherwise the
    /// previous closing stock becomes the opening stock with no movement.
    #[must_use]
    pub fn capture(ledger: &LedgerView<'_>, grade: &Grade, location: &str, date: NaiveDate) -> Self {
        match ledger.entry_on(grade, location, date) {
            Some(entry) => Self {
                voucher_id: entry.voucher_id.clone(),
                grade: grade.clone(),
                opening_stock: entry.opening_stock,
                received: entry.received,
                redeemed: entry.redeemed,
                closing_stock: entry.closing_stock,
                date,
                location: location.to_owned(),
            },
            None => {
                let opening = ledger.previous_closing(grade, location, date);
                Self {
                    voucher_id: grade.voucher_id(),
                    grade: grade.clone(),
                    opening_stock: opening,
                    received: 0,
                    redeemed: 0,
                    closing_stock: opening,
                    date,
                    location: location.to_owned(),
                }
            }
        }
    }
}

/// Signed difference between expected and counted stock for one grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDiscrepancy {
    pub voucher_id: String,
    pub grade: Grade,
    pub expected_stock: i32,
    pub actual_stock: i32,
    /// `actual_stock - expected_stock`.
    pub difference: i32,
    pub notes: Option<String>,
}

/// Where a report is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Created, waiting for the physical count.
    Pending,
    /// Physical count done. Terminal.
    Counted,
}

/// Result of comparing a physical count against an opening snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCount {
    /// Opening snapshot rows with `closing_stock` set to the counted value.
    pub closing_stock: Vec<StockSnapshot>,
    /// One entry per grade whose count differs from the expectation.
    pub discrepancies: Vec<StockDiscrepancy>,
}

impl StockCount {
    /// Reconcile `actual` counts against the `opening` snapshot.
    ///
    /// Every grade in `opening` must have a count, and `actual` may not name
    /// grades outside `opening`.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::MissingCount`, `ReconcileError::UnknownGrade`
    /// or `ReconcileError::NegativeCount` when the counts do not line up with
    /// the snapshot.
    pub fn reconcile(
        opening: &[StockSnapshot],
        actual: &BTreeMap<Grade, i32>,
    ) -> Result<Self, ReconcileError> {
        if let Some(unknown) = actual
            .keys()
            .find(|grade| !opening.iter().any(|s| &s.grade == *grade))
        {
            return Err(ReconcileError::UnknownGrade(unknown.clone()));
        }

        let mut closing_stock = Vec::with_capacity(opening.len());
        let mut discrepancies = Vec::new();

        for snapshot in opening {
            let counted = *actual
                .get(&snapshot.grade)
                .ok_or_else(|| ReconcileError::MissingCount(snapshot.grade.clone()))?;
            if counted < 0 {
                return Err(ReconcileError::NegativeCount {
                    grade: snapshot.grade.clone(),
                    value: counted,
                });
            }

            let expected = snapshot.opening_stock;
            let difference = counted - expected;
            if difference != 0 {
                discrepancies.push(StockDiscrepancy {
                    voucher_id: snapshot.voucher_id.clone(),
                    grade: snapshot.grade.clone(),
                    expected_stock: expected,
                    actual_stock: counted,
                    difference,
                    notes: None,
                });
            }

            closing_stock.push(StockSnapshot {
                closing_stock: counted,
                ..snapshot.clone()
            });
        }

        Ok(Self {
            closing_stock,
            discrepancies,
        })
    }
}

/// A report about to be created, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEndDraft {
    pub date: NaiveDate,
    pub location: String,
    pub staff_id: UserId,
    pub opening_stock: Vec<StockSnapshot>,
    pub closing_stock: Vec<StockSnapshot>,
    pub total_redemptions: i64,
    pub total_value: Amount,
    pub notes: Option<String>,
}

impl DayEndDraft {
    /// Snapshot every grade in `grades` and build a pending report.
    ///
    /// `ledger` must contain the entries for `location` up to and including
    /// `date`; entries for other outlets are ignored.
    #[must_use]
    pub fn prepare(
        ledger: &LedgerView<'_>,
        grades: &[Grade],
        location: &str,
        date: NaiveDate,
        staff_id: UserId,
        total_redemptions: i64,
        total_value: Amount,
    ) -> Self {
        let opening_stock: Vec<StockSnapshot> = grades
            .iter()
            .map(|grade| StockSnapshot::capture(ledger, grade, location, date))
            .collect();

        // Placeholder until the physical count replaces it.
        let closing_stock = opening_stock
            .iter()
            .map(|s| StockSnapshot {
                closing_stock: s.opening_stock,
                ..s.clone()
            })
            .collect();

        Self {
            date,
            location: location.to_owned(),
            staff_id,
            opening_stock,
            closing_stock,
            total_redemptions,
            total_value,
            notes: None,
        }
    }
}

/// The daily reconciliation artifact for one outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEndReport {
    pub id: DayEndReportId,
    pub date: NaiveDate,
    pub location: String,
    pub staff_id: UserId,
    pub opening_stock: Vec<StockSnapshot>,
    pub closing_stock: Vec<StockSnapshot>,
    pub total_redemptions: i64,
    pub total_value: Amount,
    pub stock_counted: bool,
    pub stock_counted_by: Option<UserId>,
    pub discrepancies: Vec<StockDiscrepancy>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DayEndReport {
    #[must_use]
    pub const fn status(&self) -> ReportStatus {
        if self.stock_counted {
            ReportStatus::Counted
        } else {
            ReportStatus::Pending
        }
    }

    /// Apply a physical stock count and move the report to `Counted`.
    ///
    /// The report is left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::AlreadyCounted` if the report was counted
    /// before, or any error from [`StockCount::reconcile`].
    pub fn complete_count(
        &mut self,
        actual: &BTreeMap<Grade, i32>,
        counted_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<&[StockDiscrepancy], ReconcileError> {
        if self.stock_counted {
            return Err(ReconcileError::AlreadyCounted);
        }

        let count = StockCount::reconcile(&self.opening_stock, actual)?;

        self.closing_stock = count.closing_stock;
        self.discrepancies = count.discrepancies;
        self.stock_counted = true;
        self.stock_counted_by = Some(counted_by);
        self.completed_at = Some(at);

        Ok(&self.discrepancies)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::ledger::{StockEntry, StockMovement};
    use crate::types::{GradeCatalogue, StockEntryId};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn grade(label: &str) -> Grade {
        Grade::parse(label).unwrap()
    }

    fn entry(g: &str, loc: &str, date: &str, opening: i32, recv: i32, red: i32) -> StockEntry {
        let m = StockMovement::new(g, loc, day(date), opening, recv, red).unwrap();
        StockEntry {
            id: StockEntryId::generate(),
            voucher_id: m.voucher_id().to_owned(),
            grade: m.grade().clone(),
            location: m.location().to_owned(),
            date: m.date(),
            opening_stock: m.opening_stock(),
            received: m.received(),
            redeemed: m.redeemed(),
            closing_stock: m.closing_stock(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn pending_report(grades: &[Grade], opening_each: i32) -> DayEndReport {
        let entries: Vec<StockEntry> = grades
            .iter()
            .map(|g| entry(g.as_str(), "A", "2024-01-01", opening_each, 0, 0))
            .collect();
        let ledger = LedgerView::new(&entries);
        let draft = DayEndDraft::prepare(
            &ledger,
            grades,
            "A",
            day("2024-01-02"),
            UserId::generate(),
            0,
            Amount::ZERO,
        );
        DayEndReport {
            id: DayEndReportId::generate(),
            date: draft.date,
            location: draft.location,
            staff_id: draft.staff_id,
            opening_stock: draft.opening_stock,
            closing_stock: draft.closing_stock,
            total_redemptions: draft.total_redemptions,
            total_value: draft.total_value,
            stock_counted: false,
            stock_counted_by: None,
            discrepancies: Vec::new(),
            notes: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn counts(grades: &[Grade], value: i32) -> BTreeMap<Grade, i32> {
        grades.iter().map(|g| (g.clone(), value)).collect()
    }

    #[test]
    fn test_snapshot_uses_same_day_entry() {
        let entries = vec![
            entry("1", "A", "2024-01-01", 50, 10, 5),
            entry("1", "A", "2024-01-02", 55, 20, 3),
        ];
        let ledger = LedgerView::new(&entries);
        let snap = StockSnapshot::capture(&ledger, &grade("1"), "A", day("2024-01-02"));
        assert_eq!(snap.opening_stock, 55);
        assert_eq!(snap.received, 20);
        assert_eq!(snap.redeemed, 3);
        assert_eq!(snap.closing_stock, 72);
    }

    #[test]
    fn test_snapshot_falls_back_to_previous_closing() {
        let entries = vec![entry("1", "A", "2024-01-01", 50, 10, 5)];
        let ledger = LedgerView::new(&entries);
        let snap = StockSnapshot::capture(&ledger, &grade("1"), "A", day("2024-01-02"));
        assert_eq!(snap.opening_stock, 55);
        assert_eq!(snap.received, 0);
        assert_eq!(snap.closing_stock, 55);
        assert_eq!(snap.voucher_id, "VCH-1");
    }

    #[test]
    fn test_draft_covers_every_grade_with_placeholder_closing() {
        let catalogue = GradeCatalogue::default();
        let entries = vec![entry("5", "A", "2024-01-01", 10, 0, 0)];
        let ledger = LedgerView::new(&entries);
        let draft = DayEndDraft::prepare(
            &ledger,
            catalogue.grades(),
            "A",
            day("2024-01-02"),
            UserId::generate(),
            3,
            Amount::from_minor(150_000),
        );
        assert_eq!(draft.opening_stock.len(), 14);
        assert_eq!(draft.closing_stock, draft.opening_stock);
        let five = draft.opening_stock.iter().find(|s| s.grade.as_str() == "5").unwrap();
        assert_eq!(five.opening_stock, 10);
        let six = draft.opening_stock.iter().find(|s| s.grade.as_str() == "6").unwrap();
        assert_eq!(six.opening_stock, 0);
    }

    #[test]
    fn test_matching_count_has_no_discrepancies() {
        let grades = GradeCatalogue::default().grades().to_vec();
        let mut report = pending_report(&grades, 10);
        let counter = UserId::generate();

        let discrepancies = report
            .complete_count(&counts(&grades, 10), counter, Utc::now())
            .unwrap();
        assert!(discrepancies.is_empty());
        assert!(report.stock_counted);
        assert_eq!(report.status(), ReportStatus::Counted);
        assert_eq!(report.stock_counted_by, Some(counter));
        assert!(report.completed_at.is_some());
    }

    #[test]
    fn test_short_count_records_negative_difference() {
        let grades = GradeCatalogue::default().grades().to_vec();
        let mut report = pending_report(&grades, 10);
        let mut actual = counts(&grades, 10);
        actual.insert(grade("5"), 7);

        report
            .complete_count(&actual, UserId::generate(), Utc::now())
            .unwrap();

        assert_eq!(report.discrepancies.len(), 1);
        let d = &report.discrepancies[0];
        assert_eq!(d.grade.as_str(), "5");
        assert_eq!(d.expected_stock, 10);
        assert_eq!(d.actual_stock, 7);
        assert_eq!(d.difference, -3);

        let closing_five = report
            .closing_stock
            .iter()
            .find(|s| s.grade.as_str() == "5")
            .unwrap();
        assert_eq!(closing_five.closing_stock, 7);
    }

    #[test]
    fn test_second_count_is_refused() {
        let grades = vec![grade("1")];
        let mut report = pending_report(&grades, 4);
        report
            .complete_count(&counts(&grades, 4), UserId::generate(), Utc::now())
            .unwrap();
        let before = report.clone();

        let err = report
            .complete_count(&counts(&grades, 1), UserId::generate(), Utc::now())
            .unwrap_err();
        assert_eq!(err, ReconcileError::AlreadyCounted);
        assert_eq!(report, before);
    }

    #[test]
    fn test_missing_and_unknown_grades_are_rejected() {
        let grades = vec![grade("1"), grade("2")];
        let mut report = pending_report(&grades, 4);

        let mut partial = BTreeMap::new();
        partial.insert(grade("1"), 4);
        assert_eq!(
            report.complete_count(&partial, UserId::generate(), Utc::now()),
            Err(ReconcileError::MissingCount(grade("2")))
        );

        let mut extra = counts(&grades, 4);
        extra.insert(grade("11"), 1);
        assert_eq!(
            report.complete_count(&extra, UserId::generate(), Utc::now()),
            Err(ReconcileError::UnknownGrade(grade("11")))
        );
        assert_eq!(report.status(), ReportStatus::Pending);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let grades = vec![grade("1")];
        let mut report = pending_report(&grades, 4);
        assert_eq!(
            report.complete_count(&counts(&grades, -1), UserId::generate(), Utc::now()),
            Err(ReconcileError::NegativeCount {
                grade: grade("1"),
                value: -1
            })
        );
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let grades = vec![grade("1")];
        let report = pending_report(&grades, 4);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stockCounted"], false);
        assert_eq!(json["openingStock"][0]["openingStock"], 4);
        assert_eq!(json["date"], "2024-01-02");
    }
}
