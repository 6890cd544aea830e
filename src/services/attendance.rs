use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{AttendanceRecord, AttendanceSession, AttendanceStatus};
use crate::database::OwnerScope;
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::parse_id;

/// One roll-call line as sent by clients. Kept loose so that missing or
/// malformed values surface as field errors instead of body rejections.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    pub student_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub records: Option<Vec<RecordInput>>,
}

fn parse_status(raw: Option<&str>) -> ServiceResult<AttendanceStatus> {
    match raw.map(str::trim) {
        Some("present") => Ok(AttendanceStatus::Present),
        Some("absent") => Ok(AttendanceStatus::Absent),
        _ => Err(ServiceError::invalid_field("records", "status must be 'present' or 'absent'")),
    }
}

pub fn parse_records(records: Option<Vec<RecordInput>>) -> ServiceResult<Vec<AttendanceRecord>> {
    let records = records.ok_or_else(|| ServiceError::invalid_field("records", "records array is required"))?;
    records
        .into_iter()
        .map(|r| {
            let student_id = parse_id("studentId", r.student_id.as_deref())?;
            let status = parse_status(r.status.as_deref())?;
            Ok(AttendanceRecord { student_id, status })
        })
        .collect()
}

/// Save a new roll-call. Class and subject must belong to the caller.
pub async fn record_session(scope: &OwnerScope, input: SessionInput) -> ServiceResult<AttendanceSession> {
    let class_id = parse_id("classId", input.class_id.as_deref())?;
    let subject_id = parse_id("subjectId", input.subject_id.as_deref())?;
    let records = parse_records(input.records)?;

    let (class, subject) = futures::try_join!(scope.find_class(class_id), scope.find_subject(subject_id))?;
    if class.is_none() {
        return Err(ServiceError::not_found("Class not found"));
    }
    if subject.is_none() {
        return Err(ServiceError::not_found("Subject not found"));
    }

    let date = input.date.unwrap_or_else(Utc::now);
    let mut session = AttendanceSession::new(scope.owner_id(), class_id, subject_id, date, records)
        .map_err(crate::database::DatabaseError::from)?;
    scope.save_session(&mut session).await?;
    Ok(session)
}

/// Replace the records of an existing session
pub async fn replace_records(
    scope: &OwnerScope,
    session_id: Uuid,
    records: Option<Vec<RecordInput>>,
) -> ServiceResult<AttendanceSession> {
    let records = parse_records(records)?;
    let mut session = scope
        .find_session(session_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attendance session not found"))?;

    session
        .replace_records(records)
        .map_err(crate::database::DatabaseError::from)?;
    scope.save_session(&mut session).await?;
    Ok(session)
}
