// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account_service::{self, LoginRequest, LoginResponse};

/// POST /api/auth/login - Authenticate and receive a JWT
///
/// Input: `{"userId": "...", "password": "..."}`
/// Output: `{"message", "token", "user": {"username", "userId"}}`
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let response = account_service::login(state.store.as_ref(), &state.config.security, request).await?;
    Ok(ApiResponse::success(response))
}
