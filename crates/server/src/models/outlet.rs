//! Outlets and the locations derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booklist_core::OutletId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlet {
    pub id: OutletId,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// An active outlet, as offered in location pickers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: OutletId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOutlet {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
}

const fn default_active() -> bool {
    true
}
