use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Class;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::lifecycle;
use crate::types::{parse_id, require_name};

#[derive(Debug, Deserialize)]
pub struct ClassBody {
    pub name: Option<String>,
}

/// GET /api/classes
pub async fn class_list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Class>> {
    let classes = user.scope(&state).list_classes().await?;
    Ok(ApiResponse::success(classes))
}

/// POST /api/classes - `{name}`
pub async fn class_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ClassBody>, JsonRejection>,
) -> ApiResult<Class> {
    let Json(body) = payload?;
    let name = require_name("name", body.name.as_deref())?;
    let class = user.scope(&state).create_class(&name).await?;
    Ok(ApiResponse::created(class))
}

/// GET /api/classes/:id
pub async fn class_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Class> {
    let id = parse_id("id", Some(&id))?;
    let class = user
        .scope(&state)
        .find_class(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Class not found"))?;
    Ok(ApiResponse::success(class))
}

/// PUT /api/classes/:id - rename, carrying the new name into subjects
pub async fn class_rename(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<ClassBody>, JsonRejection>,
) -> ApiResult<Class> {
    let id = parse_id("id", Some(&id))?;
    let Json(body) = payload?;
    let name = require_name("name", body.name.as_deref())?;
    let class = lifecycle::rename_class(&user.scope(&state), id, name).await?;
    Ok(ApiResponse::success(class))
}

/// DELETE /api/classes/:id - cascades to sessions and students
pub async fn class_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id("id", Some(&id))?;
    let report = lifecycle::delete_class(&user.scope(&state), id).await?;
    Ok(ApiResponse::success(json!({
        "message": "Class deleted",
        "sessionsDeleted": report.sessions_deleted,
        "sessionsUpdated": report.sessions_updated,
        "studentsDeleted": report.students_deleted,
    })))
}
