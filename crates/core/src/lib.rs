//! Booklist Core - Shared domain library.
//!
//! This crate provides the types and rules used across the booklist voucher
//! back-office:
//! - `server` - JSON API over `PostgreSQL`
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The stock ledger arithmetic and the day-end
//! reconciliation rules live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, grades, money amounts and status enums
//! - [`ledger`] - Stock movement validation and closing-stock chaining
//! - [`day_end`] - Day-end report snapshots and physical-count reconciliation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod day_end;
pub mod ledger;
pub mod types;

pub use day_end::{
    DayEndDraft, DayEndReport, ReconcileError, ReportStatus, StockCount, StockDiscrepancy,
    StockSnapshot,
};
pub use ledger::{LedgerView, StockEntry, StockMovement, ValidationError};
pub use types::*;
