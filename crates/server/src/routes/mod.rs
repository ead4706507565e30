//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/login                      - Login (staff pick an outlet)
//! POST   /api/auth/logout                     - Logout
//! GET    /api/auth/me                         - Current session user
//!
//! # Back-office
//! GET    /api/users                POST       - Users
//! PUT    /api/users/{id}           DELETE     - Update / delete a user
//! GET    /api/outlets              POST       - Outlets
//! PUT    /api/outlets/{id}         DELETE     - Update / delete an outlet
//! GET    /api/locations            POST       - Active outlets as locations
//! GET    /api/staff                           - Active staff users
//! GET    /api/schools              POST       - Schools
//! GET    /api/option-items         POST       - Redemption form toggles
//! PUT    /api/option-items/{id}    DELETE     - Edit or toggle / delete a toggle
//! GET    /api/booklists            POST       - Booklists with items
//! PUT    /api/booklists/{id}       DELETE     - Replace with items / delete
//!
//! # Redemptions
//! GET    /api/redemptions          POST       - List (?location=&date=) / record
//! PUT    /api/redemptions/{id}     DELETE     - Replace / delete a redemption
//! PATCH  /api/redemptions/{id}/status         - Move delivery status
//! GET    /api/stats                           - Dashboard counters
//!
//! # Stock ledger
//! GET    /api/stock                POST       - List (?location=&date=&grade=) / record
//! PUT    /api/stock/{id}                      - Correct an entry
//! GET    /api/stock/current                   - Current stock
//! GET    /api/stock/previous-closing          - Previous closing stock
//! GET    /api/stock/opening                   - Opening stock for a day
//! GET    /api/grades                          - Tracked grades
//!
//! # Day-end
//! GET    /api/day-end-reports      POST       - List / create
//! GET    /api/day-end-reports/{id}            - Report with discrepancies
//! POST   /api/day-end-reports/{id}/stock-count - Complete the physical count
//!
//! # Export
//! GET    /api/export                          - JSON backup download
//! ```
//!
//! Every route except login requires a session user.

pub mod auth;
pub mod catalogue;
pub mod day_end;
pub mod export;
pub mod outlets;
pub mod redemptions;
pub mod stock;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(outlets::router())
        .merge(catalogue::router())
        .merge(redemptions::router())
        .merge(stock::router())
        .merge(day_end::router())
        .merge(export::router())
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn required<'s>(
    field: &'static str,
    value: &'s str,
) -> Result<&'s str, booklist_core::ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(booklist_core::ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use booklist_core::ValidationError;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("name", "  Hiriya "), Ok("Hiriya"));
    }

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(
            required("name", "   "),
            Err(ValidationError::MissingField("name"))
        );
    }
}
