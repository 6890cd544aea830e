use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::Account;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::account_service;

/// GET /api/auth/whoami - Account behind the bearer token
pub async fn whoami_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Account> {
    let account = account_service::whoami(state.store.as_ref(), user.owner_id).await?;
    Ok(ApiResponse::success(account))
}
