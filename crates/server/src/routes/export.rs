//! Full JSON backup download.

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{info, instrument};

use crate::db::export::{backup_file_name, export_all};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Build the export router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/export", get(export))
}

#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn export(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let export = export_all(state.pool()).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        backup_file_name(export.exported_at)
    );

    info!(
        redemptions = export.redemptions.len(),
        stock_entries = export.voucher_stock.len(),
        "Data exported"
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(export)).into_response())
}
