use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::AttendanceSession;
use crate::error::ApiError;
use crate::filter::SessionFilter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::aggregation::{self, ClassAttendance, Overview, SubjectAttendance};
use crate::services::attendance::{self, RecordInput, SessionInput};
use crate::types::{optional_id, parse_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
}

impl StatsQuery {
    fn to_filter(&self) -> Result<SessionFilter, ApiError> {
        Ok(SessionFilter {
            class_id: optional_id("classId", self.class_id.as_deref())?,
            subject_id: optional_id("subjectId", self.subject_id.as_deref())?,
            ..SessionFilter::default()
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordsBody {
    pub records: Option<Vec<RecordInput>>,
}

/// POST /api/attendance - `{classId, subjectId, date?, records: [{studentId, status}]}`
pub async fn attendance_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<SessionInput>, JsonRejection>,
) -> ApiResult<AttendanceSession> {
    let Json(input) = payload?;
    let session = attendance::record_session(&user.scope(&state), input).await?;
    Ok(ApiResponse::created(session))
}

/// GET /api/attendance - resolved sessions plus per-class statistics
pub async fn attendance_overview(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Overview> {
    let view = aggregation::overview(&user.scope(&state)).await?;
    Ok(ApiResponse::success(view))
}

/// GET /api/attendance/student-records?classId=&subjectId=
pub async fn student_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Vec<ClassAttendance>> {
    let filter = query.to_filter()?;
    let stats = aggregation::student_records(&user.scope(&state), &filter).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/attendance/subject-records?classId=&subjectId=
pub async fn subject_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Vec<SubjectAttendance>> {
    let filter = query.to_filter()?;
    let stats = aggregation::subject_records(&user.scope(&state), &filter).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/attendance/:id
pub async fn attendance_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<AttendanceSession> {
    let id = parse_id("id", Some(&id))?;
    let session = user
        .scope(&state)
        .find_session(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Attendance session not found"))?;
    Ok(ApiResponse::success(session))
}

/// PUT /api/attendance/:id - `{records}` replaces the roll-call
pub async fn attendance_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<RecordsBody>, JsonRejection>,
) -> ApiResult<AttendanceSession> {
    let id = parse_id("id", Some(&id))?;
    let Json(body) = payload?;
    let session = attendance::replace_records(&user.scope(&state), id, body.records).await?;
    Ok(ApiResponse::success(session))
}

/// DELETE /api/attendance/:id
pub async fn attendance_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id("id", Some(&id))?;
    if !user.scope(&state).delete_session(id).await? {
        return Err(ApiError::not_found("Attendance session not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Attendance session deleted" })))
}
