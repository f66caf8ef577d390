//! REST endpoints for the login flow.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::account::model::{JoinType, Surface};
use crate::dashboard::Dashboard;
use crate::error::{ConflictError, Error, SessionError, StoreError};

use super::service::AuthService;

/// Shared state for auth routes.
#[derive(Clone)]
pub struct AuthRouteState {
    pub service: Arc<AuthService>,
}

/// Error wrapper mapping the taxonomy onto HTTP statuses. Only validation
/// and conflict messages reach the client verbatim.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Error::Conflict(ConflictError::AdminLoginRequired) => {
                (StatusCode::FORBIDDEN, self.0.to_string())
            }
            Error::Conflict(e) => (StatusCode::CONFLICT, e.to_string()),
            Error::Session(SessionError::Verification(_)) => (
                StatusCode::UNAUTHORIZED,
                "Session token rejected".to_string(),
            ),
            Error::Store(StoreError::Transient(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporarily unavailable, retry".to_string(),
            ),
            _ => {
                tracing::error!(error = %self.0, "Unhandled error in auth route");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeRequest {
    phone_number: String,
    surface: Surface,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    phone_number: String,
    code: String,
    surface: Surface,
    #[serde(default)]
    join_type: Option<JoinType>,
    #[serde(default)]
    notification_address: Option<String>,
    #[serde(default)]
    requested_dashboard: Option<Dashboard>,
}

/// POST /api/auth/challenge
async fn request_challenge(
    State(state): State<AuthRouteState>,
    Json(req): Json<ChallengeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .service
        .request_challenge(&req.phone_number, req.surface)
        .await?;
    Ok(Json(response))
}

/// POST /api/auth/verify
async fn verify_challenge(
    State(state): State<AuthRouteState>,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .service
        .verify_challenge(
            &req.phone_number,
            &req.code,
            req.surface,
            req.join_type,
            req.notification_address,
            req.requested_dashboard,
        )
        .await?;
    Ok(Json(response))
}

/// GET /api/auth/session
///
/// Echoes the claim of a valid bearer token, 401 otherwise.
async fn get_session(
    State(state): State<AuthRouteState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            Error::from(SessionError::Verification(
                "missing bearer token".to_string(),
            ))
        })?;
    let claim = state.service.verify_session(token)?;
    Ok(Json(claim))
}

/// Build the auth REST routes.
pub fn auth_routes(state: AuthRouteState) -> Router {
    Router::new()
        .route("/api/auth/challenge", post(request_challenge))
        .route("/api/auth/verify", post(verify_challenge))
        .route("/api/auth/session", get(get_session))
        .with_state(state)
}
