use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Subject;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::lifecycle::{self, SubjectChanges};
use crate::types::{parse_id, require_name};

#[derive(Debug, Deserialize)]
pub struct SubjectBody {
    pub name: Option<String>,
}

/// GET /api/subjects
pub async fn subject_list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Subject>> {
    let subjects = user.scope(&state).list_subjects().await?;
    Ok(ApiResponse::success(subjects))
}

/// POST /api/subjects - `{name}`
pub async fn subject_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<SubjectBody>, JsonRejection>,
) -> ApiResult<Subject> {
    let Json(body) = payload?;
    let name = require_name("name", body.name.as_deref())?;
    let subject = user.scope(&state).create_subject(&name).await?;
    Ok(ApiResponse::created(subject))
}

/// GET /api/subjects/:id
pub async fn subject_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Subject> {
    let id = parse_id("id", Some(&id))?;
    let subject = user
        .scope(&state)
        .find_subject(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Subject not found"))?;
    Ok(ApiResponse::success(subject))
}

/// PUT /api/subjects/:id - `{name?, assignedClasses?, excludedStudents?}`
pub async fn subject_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<SubjectChanges>, JsonRejection>,
) -> ApiResult<Subject> {
    let id = parse_id("id", Some(&id))?;
    let Json(changes) = payload?;
    let subject = lifecycle::update_subject(&user.scope(&state), id, changes).await?;
    Ok(ApiResponse::success(subject))
}

/// DELETE /api/subjects/:id - sessions of the subject are kept
pub async fn subject_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id("id", Some(&id))?;
    if !user.scope(&state).delete_subject(id).await? {
        return Err(ApiError::not_found("Subject not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Subject deleted" })))
}
