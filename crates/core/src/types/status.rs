//! Status and role enums.
//!
//! Each enum maps to a `PostgreSQL` enum type in the `booklist` schema when the
//! `postgres` feature is enabled.

use serde::{Deserialize, Serialize};

/// Back-office user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "booklist.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Manages users, outlets, booklists and settings. Not tied to an outlet.
    Admin,
    /// Counter staff. Must pick an outlet when logging in.
    Staff,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Delivery progress of a redeemed booklist bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "booklist.delivery_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Wrapping,
    Delivered,
    Collected,
}

impl DeliveryStatus {
    /// Whether the bundle still has to leave the outlet.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Wrapping)
    }
}

/// How a redeemed bundle is to be prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "booklist.customization", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Customization {
    #[default]
    Standard,
    CustomizedDesign,
    CellophaneOnly,
    TextBook,
    CustomizedDesignTextBook,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_parse_and_display() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("staff".parse::<UserRole>().unwrap(), UserRole::Staff);
        assert!("manager".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Staff.to_string(), "staff");
    }

    #[test]
    fn test_outstanding_deliveries() {
        assert!(DeliveryStatus::Pending.is_outstanding());
        assert!(DeliveryStatus::Wrapping.is_outstanding());
        assert!(!DeliveryStatus::Delivered.is_outstanding());
        assert!(!DeliveryStatus::Collected.is_outstanding());
    }

    #[test]
    fn test_customization_wire_names() {
        let json = serde_json::to_string(&Customization::CustomizedDesignTextBook).unwrap();
        assert_eq!(json, "\"customized_design_text_book\"");
    }
}
