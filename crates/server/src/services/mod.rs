//! Business logic that spans more than one repository.
//!
//! - [`auth`] - Password hashing and login
//! - [`day_end`] - Day-end report creation and stock counting

pub mod auth;
pub mod day_end;

pub use auth::{AuthError, AuthService};
pub use day_end::DayEndService;
