use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Student;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{eligibility, lifecycle};
use crate::types::{optional_id, parse_id, require_name};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBody {
    pub name: Option<String>,
    pub class_id: Option<String>,
}

/// GET /api/students?classId=&subjectId= - attendance-eligible students
pub async fn student_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StudentQuery>,
) -> ApiResult<Vec<Student>> {
    let class_id = parse_id("classId", query.class_id.as_deref())?;
    let subject_id = optional_id("subjectId", query.subject_id.as_deref())?;
    let students = eligibility::eligible_students(&user.scope(&state), class_id, subject_id).await?;
    Ok(ApiResponse::success(students))
}

/// POST /api/students - `{name, classId}`
pub async fn student_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<StudentBody>, JsonRejection>,
) -> ApiResult<Student> {
    let Json(body) = payload?;
    let name = require_name("name", body.name.as_deref())?;
    let class_id = parse_id("classId", body.class_id.as_deref())?;

    let scope = user.scope(&state);
    if scope.find_class(class_id).await?.is_none() {
        return Err(ApiError::not_found("Class not found"));
    }
    let student = scope.create_student(class_id, &name).await?;
    Ok(ApiResponse::created(student))
}

/// DELETE /api/students/:id[?subjectId=&classId=]
///
/// Without parameters the student is removed everywhere. With both
/// parameters only that class/subject pairing loses the student's records.
pub async fn student_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<StudentQuery>,
) -> ApiResult<Value> {
    let id = parse_id("id", Some(&id))?;
    let class_id = optional_id("classId", query.class_id.as_deref())?;
    let subject_id = optional_id("subjectId", query.subject_id.as_deref())?;
    let scope = user.scope(&state);

    let (message, report) = match (class_id, subject_id) {
        (None, None) => ("Student deleted", lifecycle::delete_student(&scope, id).await?),
        (Some(class_id), Some(subject_id)) => (
            "Student removed from subject",
            lifecycle::remove_student_from_pair(&scope, id, class_id, subject_id).await?,
        ),
        _ => {
            return Err(ApiError::bad_request(
                "classId and subjectId must be given together to remove a student from one subject",
            ))
        }
    };

    Ok(ApiResponse::success(json!({
        "message": message,
        "sessionsDeleted": report.sessions_deleted,
        "sessionsUpdated": report.sessions_updated,
    })))
}
