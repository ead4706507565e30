//! Full data export (backup). Password hashes are never included.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use booklist_core::{DayEndReport, StockEntry};

use super::RepositoryError;
use super::stock::StockFilter;
use super::{
    BooklistRepository, DayEndRepository, OptionItemRepository, OutletRepository,
    RedemptionRepository, SchoolRepository, StockRepository, UserRepository,
};
use crate::models::{Booklist, OptionItem, Outlet, Redemption, School, User};

/// Snapshot of every table, as served by `GET /api/export`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub exported_at: DateTime<Utc>,
    pub outlets: Vec<Outlet>,
    pub users: Vec<User>,
    pub schools: Vec<School>,
    pub option_items: Vec<OptionItem>,
    pub booklists: Vec<Booklist>,
    pub redemptions: Vec<Redemption>,
    pub voucher_stock: Vec<StockEntry>,
    pub day_end_reports: Vec<DayEndReport>,
}

/// Read every table.
///
/// # Errors
///
/// Returns the first `RepositoryError` any read produces.
pub async fn export_all(pool: &PgPool) -> Result<Export, RepositoryError> {
    Ok(Export {
        exported_at: Utc::now(),
        outlets: OutletRepository::new(pool).list_all().await?,
        users: UserRepository::new(pool).list_all().await?,
        schools: SchoolRepository::new(pool).list_all().await?,
        option_items: OptionItemRepository::new(pool).list_all().await?,
        booklists: BooklistRepository::new(pool).list_all().await?,
        redemptions: RedemptionRepository::new(pool).list(None, None).await?,
        voucher_stock: StockRepository::new(pool)
            .list(&StockFilter::default())
            .await?,
        day_end_reports: DayEndRepository::new(pool).list(None, None).await?,
    })
}

/// Attachment file name for an export taken at `at`.
#[must_use]
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("booklist-backup-{}.json", at.format("%Y-%m-%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_backup_file_name_uses_export_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 15, 0).unwrap();
        assert_eq!(backup_file_name(at), "booklist-backup-2024-03-09.json");
    }
}
