//! Back-office user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booklist_core::{OutletId, UserId, UserRole};

/// A user as returned by the API. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub outlet_id: Option<OutletId>,
    /// Joined from the outlet table for listings.
    pub outlet_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub outlet_id: Option<OutletId>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Partial update of a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub outlet_id: Option<OutletId>,
    pub active: Option<bool>,
}

const fn default_active() -> bool {
    true
}
