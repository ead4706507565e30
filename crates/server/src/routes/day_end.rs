//! Day-end report endpoints.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use booklist_core::{DayEndReport, DayEndReportId, UserId};

use crate::db::DayEndRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::services::DayEndService;
use crate::state::AppState;

/// Build the day-end router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/day-end-reports", get(list).post(create))
        .route("/api/day-end-reports/{id}", get(show))
        .route("/api/day-end-reports/{id}/stock-count", post(stock_count))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
}

#[instrument(skip(_auth, state))]
pub async fn list(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Json<Vec<DayEndReport>>, AppError> {
    let reports = DayEndRepository::new(state.pool())
        .list(query.location.as_deref(), query.date)
        .await?;
    Ok(Json(reports))
}

#[instrument(skip(_auth, state))]
pub async fn show(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DayEndReportId>,
) -> Result<Json<DayEndReport>, AppError> {
    DayEndRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("day-end report not found".to_owned()))
}

/// Body of `POST /api/day-end-reports`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub date: NaiveDate,
    pub location: String,
    /// Defaults to the logged-in user.
    #[serde(default)]
    pub staff_id: Option<UserId>,
}

#[instrument(skip(user, state))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateReport>,
) -> Result<(StatusCode, Json<DayEndReport>), AppError> {
    let report = DayEndService::new(state.pool())
        .create_report(
            state.grades().grades(),
            body.date,
            &body.location,
            body.staff_id.unwrap_or(user.id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Body of `POST /api/day-end-reports/{id}/stock-count`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCountRequest {
    pub actual_counts: BTreeMap<String, i32>,
    /// Defaults to the logged-in user.
    #[serde(default)]
    pub counted_by: Option<UserId>,
}

#[instrument(skip(user, state))]
pub async fn stock_count(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DayEndReportId>,
    ApiJson(body): ApiJson<StockCountRequest>,
) -> Result<Json<DayEndReport>, AppError> {
    let report = DayEndService::new(state.pool())
        .complete_stock_count(id, &body.actual_counts, body.counted_by.unwrap_or(user.id))
        .await?;
    Ok(Json(report))
}
