//! Redemptions and the dashboard counters.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, put},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{info, instrument};

use booklist_core::{DeliveryStatus, RedemptionId};

use crate::db::redemptions::RedemptionStats;
use crate::db::{BooklistRepository, RedemptionRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::{NewRedemption, Redemption};
use crate::state::AppState;

/// Build the redemptions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/redemptions", get(list).post(create))
        .route("/api/redemptions/{id}", put(update).delete(delete))
        .route("/api/redemptions/{id}/status", patch(update_status))
        .route("/api/stats", get(stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct RedemptionQuery {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
}

#[instrument(skip(_auth, state))]
pub async fn list(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RedemptionQuery>,
) -> Result<Json<Vec<Redemption>>, AppError> {
    let redemptions = RedemptionRepository::new(state.pool())
        .list(query.location.as_deref(), query.date)
        .await?;
    Ok(Json(redemptions))
}

#[instrument(skip(_auth, state, body), fields(voucher_id = %body.voucher_id))]
pub async fn create(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewRedemption>,
) -> Result<(StatusCode, Json<Redemption>), AppError> {
    check_redemption(&state, &body).await?;

    let redemption = RedemptionRepository::new(state.pool()).create(&body).await?;

    info!(redemption_id = %redemption.id, location = %redemption.location, "Redemption recorded");
    Ok((StatusCode::CREATED, Json(redemption)))
}

async fn check_redemption(state: &AppState, body: &NewRedemption) -> Result<(), AppError> {
    body.validate()?;
    if !BooklistRepository::new(state.pool())
        .exists(body.booklist_id)
        .await?
    {
        return Err(AppError::Validation("unknown booklist".to_owned()));
    }
    Ok(())
}

/// Replace a redemption's details.
#[instrument(skip(_auth, state, body))]
pub async fn update(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RedemptionId>,
    ApiJson(body): ApiJson<NewRedemption>,
) -> Result<Json<Redemption>, AppError> {
    check_redemption(&state, &body).await?;

    let redemption = RedemptionRepository::new(state.pool())
        .update(id, &body)
        .await?;

    info!(redemption_id = %redemption.id, "Redemption updated");
    Ok(Json(redemption))
}

#[instrument(skip(_auth, state))]
pub async fn delete(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RedemptionId>,
) -> Result<StatusCode, AppError> {
    RedemptionRepository::new(state.pool()).delete(id).await?;

    info!(redemption_id = %id, "Redemption deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub delivery_status: DeliveryStatus,
}

#[instrument(skip(_auth, state))]
pub async fn update_status(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RedemptionId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Redemption>, AppError> {
    let redemption = RedemptionRepository::new(state.pool())
        .update_status(id, body.delivery_status, Local::now().date_naive())
        .await?;
    Ok(Json(redemption))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub location: Option<String>,
}

#[instrument(skip(_auth, state))]
pub async fn stats(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<RedemptionStats>, AppError> {
    let today = Local::now().date_naive();
    let stats = RedemptionRepository::new(state.pool())
        .stats(query.location.as_deref(), today)
        .await?;
    Ok(Json(stats))
}
