//! Login, logout and session identity.

use axum::{Json, Router, extract::State, routing::{get, post}};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use booklist_core::OutletId;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::services::auth::LoginOutcome;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub outlet_id: Option<OutletId>,
}

/// Check credentials and start a session.
#[instrument(skip(state, session, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginOutcome>, AppError> {
    let outcome = AuthService::new(state.pool())
        .login(&body.username, &body.password, body.outlet_id)
        .await
        .inspect_err(|e| warn!(error = %e, "Login rejected"))?;

    let current = outcome.current_user();
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;
    set_sentry_user(current.id, &current.username);

    info!(user_id = %current.id, outlet = ?current.outlet_name, "User logged in");
    Ok(Json(outcome))
}

/// End the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    clear_sentry_user();

    Ok(Json(json!({ "success": true })))
}

/// The logged-in user, or 401.
pub async fn me(OptionalAuth(user): OptionalAuth) -> Result<Json<CurrentUser>, AppError> {
    user.map(Json)
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_owned()))
}
