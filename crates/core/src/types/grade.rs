//! Grade labels and the catalogue of tracked grades.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A grade label such as `"5"` or `"9 SCI01"`.
///
/// Labels are opaque: `"10 BUS01"` and `"10 SCI01"` are distinct tracks of
/// grade 10, each with its own voucher stock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(String);

impl Grade {
    /// Parse a grade label, trimming surrounding whitespace.
    ///
    /// Returns `None` for a blank label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default voucher id label for this grade, e.g. `VCH-5`.
    #[must_use]
    pub fn voucher_id(&self) -> String {
        format!("VCH-{}", self.0)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Grade {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The ordered set of grades whose stock is tracked and counted.
///
/// This is deployment configuration, not something derived from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GradeCatalogue(Vec<Grade>);

impl GradeCatalogue {
    /// Grade labels used when no catalogue is configured.
    pub const DEFAULT_LABELS: [&'static str; 14] = [
        "1",
        "2",
        "3",
        "4",
        "5",
        "6",
        "7",
        "8",
        "9 BUS01",
        "9 SCI01",
        "9 Voc 101",
        "10 BUS01",
        "10 SCI01",
        "10 Voc 01",
    ];

    /// Build a catalogue from labels, dropping blanks and duplicates while
    /// preserving first-seen order.
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grades: Vec<Grade> = Vec::new();
        for grade in labels.into_iter().filter_map(|l| Grade::parse(l.as_ref())) {
            if !grades.contains(&grade) {
                grades.push(grade);
            }
        }
        Self(grades)
    }

    /// Parse a comma-separated list such as `"1,2,9 SCI01"`.
    #[must_use]
    pub fn parse_list(list: &str) -> Self {
        Self::from_labels(list.split(','))
    }

    /// The grades, in catalogue order.
    #[must_use]
    pub fn grades(&self) -> &[Grade] {
        &self.0
    }

    /// Whether the catalogue tracks no grades at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tracked grades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether `grade` is part of the catalogue.
    #[must_use]
    pub fn contains(&self, grade: &Grade) -> bool {
        self.0.contains(grade)
    }
}

impl Default for GradeCatalogue {
    fn default() -> Self {
        Self::from_labels(Self::DEFAULT_LABELS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(Grade::parse("  9 SCI01 ").unwrap().as_str(), "9 SCI01");
        assert!(Grade::parse("   ").is_none());
    }

    #[test]
    fn test_default_catalogue_has_fourteen_grades() {
        let catalogue = GradeCatalogue::default();
        assert_eq!(catalogue.len(), 14);
        assert_eq!(catalogue.grades().first().unwrap().as_str(), "1");
        assert_eq!(catalogue.grades().last().unwrap().as_str(), "10 Voc 01");
    }

    #[test]
    fn test_parse_list_dedups_and_skips_blanks() {
        let catalogue = GradeCatalogue::parse_list("1, 2,,1 , 9 BUS01");
        let labels: Vec<&str> = catalogue.grades().iter().map(Grade::as_str).collect();
        assert_eq!(labels, ["1", "2", "9 BUS01"]);
    }

    #[test]
    fn test_voucher_id_label() {
        assert_eq!(Grade::parse("5").unwrap().voucher_id(), "VCH-5");
    }
}
