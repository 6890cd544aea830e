// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account_service::{self, AccountSummary, RegisterRequest};

/// POST /api/auth/register - Create an account
///
/// Input: `{"username": "...", "userId": "...", "password": "..."}`.
/// A taken userId answers 409.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    let account = account_service::register(state.store.as_ref(), &state.config.security, request).await?;
    Ok(ApiResponse::created(json!({
        "message": "User registered successfully",
        "user": AccountSummary::from(&account),
    })))
}
