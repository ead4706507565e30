//! Voucher stock ledger rules.
//!
//! The ledger holds one [`StockEntry`] per (grade, location, date). Each entry
//! closes at `opening + received - redeemed`, and the latest earlier entry's
//! closing stock seeds the next day's opening stock. That chaining is always
//! recomputed from the entries; no entry stores a link to its predecessor.
//!
//! [`StockMovement`] validates input before it reaches storage, and
//! [`LedgerView`] answers the "what was the stock on day X" questions over a
//! set of entries already loaded from the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Grade, StockEntryId};

/// Input that failed a domain rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A stock quantity was below zero.
    #[error("{field} cannot be negative (got {value})")]
    NegativeQuantity {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i32,
    },

    /// More vouchers redeemed than were available that day. Closing stock
    /// never goes below zero.
    #[error("redeemed ({redeemed}) exceeds available stock ({available})")]
    Oversold {
        /// Requested redemptions.
        redeemed: i32,
        /// Opening plus received.
        available: i32,
    },

    /// The caller supplied a closing stock that disagrees with the movement.
    #[error(
        "closing stock {supplied} does not match opening + received - redeemed ({computed})"
    )]
    ClosingMismatch {
        /// Closing stock sent by the caller.
        supplied: i32,
        /// Closing stock implied by the movement.
        computed: i32,
    },

    /// A field had a value outside its allowed set.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// One grade's stock state for one outlet on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub id: StockEntryId,
    pub voucher_id: String,
    pub grade: Grade,
    pub location: String,
    pub date: NaiveDate,
    pub opening_stock: i32,
    pub received: i32,
    pub redeemed: i32,
    pub closing_stock: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated stock movement, ready to be written to the ledger.
///
/// The closing stock is never stored on the movement; it is always derived
/// by [`StockMovement::closing_stock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    voucher_id: String,
    grade: Grade,
    location: String,
    date: NaiveDate,
    opening_stock: i32,
    received: i32,
    redeemed: i32,
    notes: Option<String>,
}

impl StockMovement {
    /// Validate a movement.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank grade or location,
    /// `ValidationError::NegativeQuantity` for any negative quantity,
    /// `ValidationError::Invalid` when `opening + received` overflows `i32`, and
    /// `ValidationError::Oversold` when `redeemed > opening + received`.
    pub fn new(
        grade: &str,
        location: &str,
        date: NaiveDate,
        opening_stock: i32,
        received: i32,
        redeemed: i32,
    ) -> Result<Self, ValidationError> {
        let grade = Grade::parse(grade).ok_or(ValidationError::MissingField("grade"))?;
        let location = location.trim();
        if location.is_empty() {
            return Err(ValidationError::MissingField("location"));
        }

        for (field, value) in [
            ("openingStock", opening_stock),
            ("received", received),
            ("redeemed", redeemed),
        ] {
            if value < 0 {
                return Err(ValidationError::NegativeQuantity { field, value });
            }
        }

        let available = opening_stock
            .checked_add(received)
            .ok_or_else(|| ValidationError::Invalid {
                field: "received",
                reason: "stock total exceeds the supported range".to_owned(),
            })?;
        if redeemed > available {
            return Err(ValidationError::Oversold {
                redeemed,
                available,
            });
        }

        Ok(Self {
            voucher_id: grade.voucher_id(),
            grade,
            location: location.to_owned(),
            date,
            opening_stock,
            received,
            redeemed,
            notes: None,
        })
    }

    /// Attach free-text notes. Blank notes are dropped.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Override the voucher id label (defaults to `VCH-<grade>`).
    #[must_use]
    pub fn with_voucher_id(mut self, voucher_id: Option<String>) -> Self {
        if let Some(id) = voucher_id.filter(|v| !v.trim().is_empty()) {
            self.voucher_id = id;
        }
        self
    }

    /// Check a caller-supplied closing stock against the movement.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ClosingMismatch` if `supplied` is present and
    /// differs from [`Self::closing_stock`].
    pub fn check_closing(&self, supplied: Option<i32>) -> Result<(), ValidationError> {
        match supplied {
            Some(supplied) if supplied != self.closing_stock() => {
                Err(ValidationError::ClosingMismatch {
                    supplied,
                    computed: self.closing_stock(),
                })
            }
            _ => Ok(()),
        }
    }

    /// `opening + received - redeemed`.
    #[must_use]
    pub const fn closing_stock(&self) -> i32 {
        self.opening_stock + self.received - self.redeemed
    }

    #[must_use]
    pub fn voucher_id(&self) -> &str {
        &self.voucher_id
    }

    #[must_use]
    pub const fn grade(&self) -> &Grade {
        &self.grade
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub const fn opening_stock(&self) -> i32 {
        self.opening_stock
    }

    #[must_use]
    pub const fn received(&self) -> i32 {
        self.received
    }

    #[must_use]
    pub const fn redeemed(&self) -> i32 {
        self.redeemed
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Read-only lookups over a set of ledger entries.
///
/// The entries may cover any mix of grades, locations and dates; every lookup
/// filters by grade and location itself.
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    entries: &'a [StockEntry],
}

impl<'a> LedgerView<'a> {
    #[must_use]
    pub const fn new(entries: &'a [StockEntry]) -> Self {
        Self { entries }
    }

    fn for_key<'s>(
        &'s self,
        grade: &'s Grade,
        location: &'s str,
    ) -> impl Iterator<Item = &'a StockEntry> + 's {
        let entries: &'a [StockEntry] = self.entries;
        entries
            .iter()
            .filter(move |e| &e.grade == grade && e.location == location)
    }

    /// The entry recorded for exactly `date`, if any.
    #[must_use]
    pub fn entry_on(&self, grade: &Grade, location: &str, date: NaiveDate) -> Option<&'a StockEntry> {
        self.for_key(grade, location).find(|e| e.date == date)
    }

    /// Closing stock of the latest entry dated on or before `as_of`, or 0.
    #[must_use]
    pub fn current_stock(&self, grade: &Grade, location: &str, as_of: NaiveDate) -> i32 {
        self.for_key(grade, location)
            .filter(|e| e.date <= as_of)
            .max_by_key(|e| (e.date, e.created_at))
            .map_or(0, |e| e.closing_stock)
    }

    /// Closing stock of the latest entry dated strictly before `before`, or 0.
    #[must_use]
    pub fn previous_closing(&self, grade: &Grade, location: &str, before: NaiveDate) -> i32 {
        self.for_key(grade, location)
            .filter(|e| e.date < before)
            .max_by_key(|e| (e.date, e.created_at))
            .map_or(0, |e| e.closing_stock)
    }

    /// Opening stock for `date`: the day's own entry if one exists, otherwise
    /// the previous closing stock.
    #[must_use]
    pub fn opening_for(&self, grade: &Grade, location: &str, date: NaiveDate) -> i32 {
        self.entry_on(grade, location, date).map_or_else(
            || self.previous_closing(grade, location, date),
            |e| e.opening_stock,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(grade: &str, location: &str, date: &str, opening: i32, recv: i32, red: i32) -> StockEntry {
        let movement = StockMovement::new(grade, location, day(date), opening, recv, red).unwrap();
        StockEntry {
            id: StockEntryId::generate(),
            voucher_id: movement.voucher_id().to_owned(),
            grade: movement.grade().clone(),
            location: movement.location().to_owned(),
            date: movement.date(),
            opening_stock: movement.opening_stock(),
            received: movement.received(),
            redeemed: movement.redeemed(),
            closing_stock: movement.closing_stock(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_closing_is_opening_plus_received_minus_redeemed() {
        let m = StockMovement::new("1", "A", day("2024-01-01"), 50, 10, 5).unwrap();
        assert_eq!(m.closing_stock(), 55);
        assert_eq!(m.voucher_id(), "VCH-1");
    }

    #[test]
    fn test_rejects_blank_grade_and_location() {
        assert_eq!(
            StockMovement::new(" ", "A", day("2024-01-01"), 1, 0, 0),
            Err(ValidationError::MissingField("grade"))
        );
        assert_eq!(
            StockMovement::new("1", "", day("2024-01-01"), 1, 0, 0),
            Err(ValidationError::MissingField("location"))
        );
    }

    #[test]
    fn test_rejects_negative_quantities() {
        let err = StockMovement::new("1", "A", day("2024-01-01"), 5, -1, 0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeQuantity {
                field: "received",
                value: -1
            }
        );
    }

    #[test]
    fn test_rejects_oversold_day() {
        let err = StockMovement::new("1", "A", day("2024-01-01"), 3, 1, 5).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Oversold {
                redeemed: 5,
                available: 4
            }
        );
    }

    #[test]
    fn test_rejects_totals_beyond_i32() {
        let err = StockMovement::new("1", "A", day("2024-01-01"), i32::MAX, 1, 0).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "received", .. }));

        let m = StockMovement::new("1", "A", day("2024-01-01"), i32::MAX - 1, 1, 0).unwrap();
        assert_eq!(m.closing_stock(), i32::MAX);
    }

    #[test]
    fn test_check_closing() {
        let m = StockMovement::new("1", "A", day("2024-01-01"), 50, 10, 5).unwrap();
        assert!(m.check_closing(None).is_ok());
        assert!(m.check_closing(Some(55)).is_ok());
        assert_eq!(
            m.check_closing(Some(60)),
            Err(ValidationError::ClosingMismatch {
                supplied: 60,
                computed: 55
            })
        );
    }

    #[test]
    fn test_blank_notes_and_voucher_id_are_ignored() {
        let m = StockMovement::new("2", "A", day("2024-01-01"), 1, 0, 0)
            .unwrap()
            .with_notes(Some("  ".to_owned()))
            .with_voucher_id(Some(String::new()));
        assert_eq!(m.notes(), None);
        assert_eq!(m.voucher_id(), "VCH-2");
    }

    #[test]
    fn test_previous_closing_seeds_next_day() {
        let entries = vec![entry("1", "A", "2024-01-01", 50, 10, 5)];
        let ledger = LedgerView::new(&entries);
        let grade = Grade::parse("1").unwrap();
        assert_eq!(ledger.previous_closing(&grade, "A", day("2024-01-02")), 55);
        assert_eq!(ledger.previous_closing(&grade, "A", day("2024-01-01")), 0);
    }

    #[test]
    fn test_current_stock_uses_latest_on_or_before() {
        let entries = vec![
            entry("1", "A", "2024-01-01", 50, 0, 5),
            entry("1", "A", "2024-01-03", 45, 0, 10),
            entry("1", "A", "2024-01-09", 35, 0, 1),
            entry("1", "B", "2024-01-04", 99, 0, 0),
            entry("2", "A", "2024-01-04", 7, 0, 0),
        ];
        let ledger = LedgerView::new(&entries);
        let grade = Grade::parse("1").unwrap();
        assert_eq!(ledger.current_stock(&grade, "A", day("2024-01-03")), 35);
        assert_eq!(ledger.current_stock(&grade, "A", day("2024-01-08")), 35);
        assert_eq!(ledger.current_stock(&grade, "A", day("2023-12-31")), 0);
        assert_eq!(ledger.current_stock(&grade, "C", day("2024-01-08")), 0);
    }

    #[test]
    fn test_date_ordering_is_calendar_not_lexicographic() {
        let entries = vec![
            entry("3", "A", "2024-09-30", 10, 0, 0),
            entry("3", "A", "2024-10-01", 20, 0, 0),
        ];
        let ledger = LedgerView::new(&entries);
        let grade = Grade::parse("3").unwrap();
        assert_eq!(ledger.previous_closing(&grade, "A", day("2024-10-02")), 20);
    }

    #[test]
    fn test_opening_prefers_same_day_entry() {
        let entries = vec![
            entry("4", "A", "2024-01-01", 10, 0, 2),
            entry("4", "A", "2024-01-02", 12, 3, 0),
        ];
        let ledger = LedgerView::new(&entries);
        let grade = Grade::parse("4").unwrap();
        assert_eq!(ledger.opening_for(&grade, "A", day("2024-01-02")), 12);
        assert_eq!(ledger.opening_for(&grade, "A", day("2024-01-05")), 15);
    }
}
