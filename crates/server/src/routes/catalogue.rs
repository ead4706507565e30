//! Schools, option items and booklists.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::{info, instrument};

use booklist_core::{BooklistId, OptionItemId};

use super::required;
use crate::db::option_items::CreateOptionItem;
use crate::db::{BooklistRepository, OptionItemRepository, SchoolRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{Booklist, NewBooklist, OptionItem, OptionItemUpdate, School};
use crate::state::AppState;

/// Build the catalogue router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/schools", get(list_schools).post(create_school))
        .route("/api/option-items", get(list_option_items).post(create_option_item))
        .route(
            "/api/option-items/{id}",
            put(update_option_item).delete(delete_option_item),
        )
        .route("/api/booklists", get(list_booklists).post(create_booklist))
        .route(
            "/api/booklists/{id}",
            put(update_booklist).delete(delete_booklist),
        )
}

#[instrument(skip(_auth, state))]
pub async fn list_schools(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<School>>, AppError> {
    Ok(Json(SchoolRepository::new(state.pool()).list_all().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewSchool {
    pub name: String,
}

#[instrument(skip(_auth, state))]
pub async fn create_school(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewSchool>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let name = required("name", &body.name)?;
    let school = SchoolRepository::new(state.pool()).create(name).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[instrument(skip(_auth, state))]
pub async fn list_option_items(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<OptionItem>>, AppError> {
    Ok(Json(OptionItemRepository::new(state.pool()).list_all().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOptionItem {
    pub name: String,
    pub key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub default_checked: bool,
}

const fn default_enabled() -> bool {
    true
}

#[instrument(skip(_auth, state))]
pub async fn create_option_item(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewOptionItem>,
) -> Result<(StatusCode, Json<OptionItem>), AppError> {
    let item = OptionItemRepository::new(state.pool())
        .create(CreateOptionItem {
            name: required("name", &body.name)?,
            key: required("key", &body.key)?,
            enabled: body.enabled,
            default_checked: body.default_checked,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Edit an option item. `{"enabled": false}` alone toggles it off.
#[instrument(skip(_auth, state))]
pub async fn update_option_item(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OptionItemId>,
    ApiJson(body): ApiJson<OptionItemUpdate>,
) -> Result<Json<OptionItem>, AppError> {
    body.validate()?;
    let item = OptionItemRepository::new(state.pool())
        .update(id, &body)
        .await?;
    Ok(Json(item))
}

#[instrument(skip(_auth, state))]
pub async fn delete_option_item(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OptionItemId>,
) -> Result<StatusCode, AppError> {
    OptionItemRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(_auth, state))]
pub async fn list_booklists(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Booklist>>, AppError> {
    Ok(Json(BooklistRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(_auth, state, body), fields(code = %body.code))]
pub async fn create_booklist(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewBooklist>,
) -> Result<(StatusCode, Json<Booklist>), AppError> {
    body.validate()?;
    let booklist = BooklistRepository::new(state.pool()).create(&body).await?;

    info!(booklist_id = %booklist.id, items = booklist.items.len(), "Booklist created");
    Ok((StatusCode::CREATED, Json(booklist)))
}

/// Replace a booklist and its items.
#[instrument(skip(_auth, state, body), fields(code = %body.code))]
pub async fn update_booklist(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BooklistId>,
    ApiJson(body): ApiJson<NewBooklist>,
) -> Result<Json<Booklist>, AppError> {
    body.validate()?;
    let booklist = BooklistRepository::new(state.pool())
        .update(id, &body)
        .await?;

    info!(booklist_id = %booklist.id, items = booklist.items.len(), "Booklist updated");
    Ok(Json(booklist))
}

#[instrument(skip(_auth, state))]
pub async fn delete_booklist(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BooklistId>,
) -> Result<StatusCode, AppError> {
    BooklistRepository::new(state.pool()).delete(id).await?;

    info!(booklist_id = %id, "Booklist deleted");
    Ok(StatusCode::NO_CONTENT)
}
