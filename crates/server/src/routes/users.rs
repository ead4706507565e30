//! User account management.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use tracing::{info, instrument};

use booklist_core::UserId;

use super::required;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{NewUser, User, UserUpdate};
use crate::services::auth::{hash_password, validate_password};
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}", put(update).delete(delete))
}

#[instrument(skip(_auth, state))]
pub async fn list(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(UserRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(_auth, state, body), fields(username = %body.username))]
pub async fn create(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    required("username", &body.username)?;
    required("name", &body.name)?;
    validate_password(&body.password)?;
    let hash = hash_password(&body.password)?;

    let user = UserRepository::new(state.pool()).create(&body, &hash).await?;

    info!(user_id = %user.id, role = %user.role, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(_auth, state, body))]
pub async fn update(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<Json<User>, AppError> {
    if let Some(username) = &body.username {
        required("username", username)?;
    }
    if let Some(name) = &body.name {
        required("name", name)?;
    }
    let hash = match body.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = UserRepository::new(state.pool())
        .update(id, &body, hash.as_deref())
        .await?;
    Ok(Json(user))
}

#[instrument(skip(auth, state))]
pub async fn delete(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<StatusCode, AppError> {
    if auth.id == id {
        return Err(AppError::Conflict("cannot delete the logged-in user".to_owned()));
    }
    UserRepository::new(state.pool()).delete(id).await?;

    info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
