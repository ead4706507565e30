//! Voucher redemptions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use booklist_core::{
    BooklistId, Customization, DeliveryStatus, RedemptionId, UserId, ValidationError,
};

/// A customer exchanging a voucher for a booklist bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: RedemptionId,
    pub voucher_id: String,
    pub staff_id: UserId,
    pub date: NaiveDate,
    pub location: String,
    pub parent_name: String,
    pub contact_no: String,
    pub student_name: String,
    pub school: String,
    pub student_class: Option<String>,
    pub booklist_id: BooklistId,
    pub single_ruled: i32,
    pub double_ruled: i32,
    pub square_ruled: i32,
    pub additional_items: String,
    pub has_textbooks: bool,
    pub has_stationary: bool,
    pub lens: bool,
    pub no_name: bool,
    pub cellophane: bool,
    pub customization: Customization,
    pub comments: String,
    pub delivery_date: Option<NaiveDate>,
    pub collection_date: Option<NaiveDate>,
    pub delivery_status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for recording a redemption.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRedemption {
    pub voucher_id: String,
    pub staff_id: UserId,
    pub date: NaiveDate,
    pub location: String,
    pub parent_name: String,
    pub contact_no: String,
    pub student_name: String,
    pub school: String,
    #[serde(default)]
    pub student_class: Option<String>,
    pub booklist_id: BooklistId,
    #[serde(default)]
    pub single_ruled: i32,
    #[serde(default)]
    pub double_ruled: i32,
    #[serde(default)]
    pub square_ruled: i32,
    #[serde(default)]
    pub additional_items: String,
    #[serde(default)]
    pub has_textbooks: bool,
    #[serde(default)]
    pub has_stationary: bool,
    #[serde(default)]
    pub lens: bool,
    #[serde(default)]
    pub no_name: bool,
    #[serde(default)]
    pub cellophane: bool,
    #[serde(default)]
    pub customization: Customization,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub collection_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_status: DeliveryStatus,
}

impl NewRedemption {
    /// Check required text fields and extra-book counts.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank required field and
    /// `ValidationError::NegativeQuantity` for a negative book count.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("voucherId", &self.voucher_id),
            ("location", &self.location),
            ("parentName", &self.parent_name),
            ("contactNo", &self.contact_no),
            ("studentName", &self.student_name),
            ("school", &self.school),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        for (field, value) in [
            ("singleRuled", self.single_ruled),
            ("doubleRuled", self.double_ruled),
            ("squareRuled", self.square_ruled),
        ] {
            if value < 0 {
                return Err(ValidationError::NegativeQuantity { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn body() -> serde_json::Value {
        serde_json::json!({
            "voucherId": "VCH-1",
            "staffId": UserId::generate(),
            "date": "2024-06-01",
            "location": "Hithadhoo",
            "parentName": "Aminath",
            "contactNo": "7771234",
            "studentName": "Ahmed",
            "school": "Nooraanee School",
            "booklistId": BooklistId::generate(),
        })
    }

    #[test]
    fn test_defaults_applied() {
        let r: NewRedemption = serde_json::from_value(body()).unwrap();
        assert_eq!(r.delivery_status, DeliveryStatus::Pending);
        assert_eq!(r.customization, Customization::Standard);
        assert_eq!(r.single_ruled, 0);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_blank_parent_name_rejected() {
        let mut json = body();
        json["parentName"] = serde_json::json!("  ");
        let r: NewRedemption = serde_json::from_value(json).unwrap();
        assert_eq!(r.validate(), Err(ValidationError::MissingField("parentName")));
    }

    #[test]
    fn test_negative_book_count_rejected() {
        let mut json = body();
        json["squareRuled"] = serde_json::json!(-2);
        let r: NewRedemption = serde_json::from_value(json).unwrap();
        assert!(matches!(
            r.validate(),
            Err(ValidationError::NegativeQuantity { field: "squareRuled", .. })
        ));
    }
}
