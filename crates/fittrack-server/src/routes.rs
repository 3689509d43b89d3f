use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use fittrack_auth::{IdentityVerifier, VerifiedIdentity};
use fittrack_core::config::ServerConfig;

use crate::auth::AuthUser;
use crate::rate_limit::{self, RateLimiter};
use crate::storage::{DatabaseError, ServerDatabase};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub db: ServerDatabase,
    pub limiter: Arc<RateLimiter>,
}

/// Assemble the HTTP router.
///
/// Everything under `/api` is rate limited; handlers that take an
/// [`AuthUser`] additionally require a verified credential.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/me", get(me))
        .route("/check-user", get(check_user))
        .route("/sync-user", post(sync_user))
        .route("/user/delete", delete(delete_user))
        .fallback(api_not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.limiter),
            rate_limit::limit_requests,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A storage failure surfaced as `500`.
#[derive(Debug)]
pub struct ApiError(DatabaseError);

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /api/me`: the caller's verified identity.
pub async fn me(AuthUser(identity): AuthUser) -> Json<VerifiedIdentity> {
    Json(identity)
}

/// `GET /api/check-user`: whether the caller has completed onboarding.
pub async fn check_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let onboarded = state.db.user_exists(identity.id).await?;
    Ok(Json(json!({ "isOnboarded": onboarded })))
}

/// `POST /api/sync-user`: store the caller's profile.
///
/// The row is keyed by the verified id only; nothing in the request body can
/// choose which user is written.
pub async fn sync_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>, ApiError> {
    if state.db.upsert_user(&identity).await? {
        info!(user_id = identity.id, "User onboarded");
    }
    Ok(Json(json!({ "success": true })))
}

/// `DELETE /api/user/delete`: remove the caller's profile.
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Value>, ApiError> {
    if state.db.delete_user(identity.id).await? {
        info!(user_id = identity.id, "User deleted");
    }
    Ok(Json(json!({ "success": true })))
}

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "API route not found" })),
    )
}
