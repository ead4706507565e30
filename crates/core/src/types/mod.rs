//! Core types for the booklist back-office.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod grade;
pub mod id;
pub mod money;
pub mod status;

pub use grade::{Grade, GradeCatalogue};
pub use id::*;
pub use money::Amount;
pub use status::*;
