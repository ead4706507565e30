//! Session-related types for authentication.

use serde::{Deserialize, Serialize};

use booklist_core::{OutletId, UserId, UserRole};

/// Session-stored identity of the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    /// Outlet chosen at login. Always set for staff.
    pub outlet_id: Option<OutletId>,
    pub outlet_name: Option<String>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
