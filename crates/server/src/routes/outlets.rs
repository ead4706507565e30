//! Outlets, the locations derived from them, and staff listings.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::{info, instrument};

use booklist_core::OutletId;

use super::required;
use crate::db::{OutletRepository, UserRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{Location, NewOutlet, Outlet, OutletUpdate, User};
use crate::state::AppState;

/// Build the outlets router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/outlets", get(list).post(create))
        .route("/api/outlets/{id}", put(update).delete(delete))
        .route("/api/locations", get(list_locations).post(create_location))
        .route("/api/staff", get(list_staff))
}

#[instrument(skip(_auth, state))]
pub async fn list(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Outlet>>, AppError> {
    Ok(Json(OutletRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(_auth, state, body))]
pub async fn create(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewOutlet>,
) -> Result<(StatusCode, Json<Outlet>), AppError> {
    required("name", &body.name)?;
    required("code", &body.code)?;

    let outlet = OutletRepository::new(state.pool()).create(&body).await?;

    info!(outlet_id = %outlet.id, code = %outlet.code, "Outlet created");
    Ok((StatusCode::CREATED, Json(outlet)))
}

#[instrument(skip(_auth, state, body))]
pub async fn update(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OutletId>,
    ApiJson(body): ApiJson<OutletUpdate>,
) -> Result<Json<Outlet>, AppError> {
    if let Some(name) = &body.name {
        required("name", name)?;
    }
    if let Some(code) = &body.code {
        required("code", code)?;
    }
    Ok(Json(OutletRepository::new(state.pool()).update(id, &body).await?))
}

#[instrument(skip(_auth, state))]
pub async fn delete(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OutletId>,
) -> Result<StatusCode, AppError> {
    OutletRepository::new(state.pool()).delete(id).await?;

    info!(outlet_id = %id, "Outlet deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(_auth, state))]
pub async fn list_locations(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(OutletRepository::new(state.pool()).list_locations().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewLocation {
    pub name: String,
}

#[instrument(skip(_auth, state))]
pub async fn create_location(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewLocation>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let name = required("name", &body.name)?;
    let location = OutletRepository::new(state.pool())
        .create_location(name)
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[instrument(skip(_auth, state))]
pub async fn list_staff(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(UserRepository::new(state.pool()).list_staff().await?))
}
