//! Schools, booklists and redemption option items.

use serde::{Deserialize, Serialize};

use booklist_core::{
    Amount, BooklistId, BooklistItemId, OptionItemId, SchoolId, ValidationError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: SchoolId,
    pub name: String,
}

/// A named, graded bundle of stationery with a fixed total price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booklist {
    pub id: BooklistId,
    pub code: String,
    pub name: String,
    pub grade: String,
    pub total_amount: Amount,
    pub items: Vec<BooklistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooklistItem {
    pub id: BooklistItemId,
    pub name: String,
    pub quantity: i32,
    pub rate: Amount,
    pub amount: Amount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooklist {
    pub code: String,
    pub name: String,
    pub grade: String,
    /// Defaults to the sum of the item amounts.
    #[serde(default)]
    pub total_amount: Option<Amount>,
    #[serde(default)]
    pub items: Vec<NewBooklistItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooklistItem {
    pub name: String,
    pub quantity: i32,
    pub rate: Amount,
    /// Defaults to `rate * quantity`.
    #[serde(default)]
    pub amount: Option<Amount>,
}

impl NewBooklistItem {
    #[must_use]
    pub fn line_amount(&self) -> Amount {
        self.amount.unwrap_or(self.rate * self.quantity)
    }
}

impl NewBooklist {
    #[must_use]
    pub fn resolved_total(&self) -> Amount {
        self.total_amount
            .unwrap_or_else(|| self.items.iter().map(NewBooklistItem::line_amount).sum())
    }

    /// Check the required text fields and item quantities.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank code, name, grade
    /// or item name, and `ValidationError::NegativeQuantity` for a negative
    /// item quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("code", &self.code),
            ("name", &self.name),
            ("grade", &self.grade),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(ValidationError::MissingField("items.name"));
            }
            if item.quantity < 0 {
                return Err(ValidationError::NegativeQuantity {
                    field: "items.quantity",
                    value: item.quantity,
                });
            }
        }

        Ok(())
    }
}

/// A toggle offered on the redemption form (e.g. "Has Textbooks").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionItem {
    pub id: OptionItemId,
    pub name: String,
    pub key: String,
    pub enabled: bool,
    pub default_checked: bool,
}

/// Partial update of an option item. Absent fields keep their stored value;
/// sending only `enabled` toggles the item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionItemUpdate {
    pub name: Option<String>,
    pub key: Option<String>,
    pub enabled: Option<bool>,
    pub default_checked: Option<bool>,
}

impl OptionItemUpdate {
    /// Reject a name or key sent blank.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a present but blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("name", &self.name), ("key", &self.key)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_booklist_total_defaults_to_item_sum() {
        let booklist: NewBooklist = serde_json::from_value(serde_json::json!({
            "code": "VCH-GR1-ALL",
            "name": "Stationary List for Grade 1",
            "grade": "1",
            "items": [
                {"name": "Single ruled book", "quantity": 4, "rate": "12.50"},
                {"name": "Pencil box", "quantity": 1, "rate": "35.00", "amount": "30.00"}
            ]
        }))
        .unwrap();
        assert_eq!(booklist.resolved_total(), Amount::from_minor(8_000));
    }

    #[test]
    fn test_explicit_total_wins() {
        let booklist: NewBooklist = serde_json::from_value(serde_json::json!({
            "code": "B", "name": "B", "grade": "2", "totalAmount": "99.00", "items": []
        }))
        .unwrap();
        assert_eq!(booklist.resolved_total(), Amount::from_minor(9_900));
    }

    #[test]
    fn test_booklist_validation() {
        let mut booklist: NewBooklist = serde_json::from_value(serde_json::json!({
            "code": "VCH-GR2", "name": "Grade 2", "grade": "2",
            "items": [{"name": "Eraser", "quantity": 2, "rate": "5.00"}]
        }))
        .unwrap();
        assert!(booklist.validate().is_ok());

        booklist.items.first_mut().unwrap().quantity = -1;
        assert!(matches!(
            booklist.validate(),
            Err(ValidationError::NegativeQuantity { field: "items.quantity", value: -1 })
        ));

        booklist.items.first_mut().unwrap().quantity = 1;
        booklist.grade = " ".to_owned();
        assert_eq!(booklist.validate(), Err(ValidationError::MissingField("grade")));
    }

    #[test]
    fn test_option_item_toggle_only() {
        let update: OptionItemUpdate =
            serde_json::from_value(serde_json::json!({"enabled": false})).unwrap();
        assert_eq!(update.enabled, Some(false));
        assert!(update.name.is_none());
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_option_item_blank_key_rejected() {
        let update: OptionItemUpdate =
            serde_json::from_value(serde_json::json!({"key": "  "})).unwrap();
        assert_eq!(update.validate(), Err(ValidationError::MissingField("key")));
    }
}
