//! Multi-step maintenance: cascades, scoped removals, renames.
//!
//! Each operation is a sequence of idempotent storage steps. A failure stops
//! the sequence and is returned; running the same operation again resumes
//! from whatever state was left behind. The addressed entity is always the
//! last thing removed so a retry still finds it.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::models::subject::{dedup_names, normalize_exclusions};
use crate::database::models::{Class, ExclusionEntry, Subject};
use crate::database::OwnerScope;
use crate::filter::SessionFilter;
use crate::services::error::{ServiceError, ServiceResult};

/// What a delete touched, returned to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalReport {
    pub sessions_deleted: u64,
    pub sessions_updated: u64,
    pub students_deleted: u64,
}

/// Remove every record of `student_id` from the sessions matched by `filter`.
/// Sessions left without records are deleted, the rest are saved.
async fn strip_student(
    scope: &OwnerScope,
    filter: SessionFilter,
    student_id: Uuid,
    report: &mut RemovalReport,
) -> ServiceResult<()> {
    let sessions = scope.find_sessions(&filter.with_student(student_id)).await?;
    for mut session in sessions {
        if session.strip_student(student_id) == 0 {
            continue;
        }
        if session.is_empty() {
            scope.delete_session(session.id).await?;
            report.sessions_deleted += 1;
        } else {
            scope.save_session(&mut session).await?;
            report.sessions_updated += 1;
        }
    }
    Ok(())
}

/// Delete a class with its sessions, its students and their records elsewhere.
pub async fn delete_class(scope: &OwnerScope, class_id: Uuid) -> ServiceResult<RemovalReport> {
    if scope.find_class(class_id).await?.is_none() {
        return Err(ServiceError::not_found("Class not found"));
    }

    let mut report = RemovalReport {
        sessions_deleted: scope.delete_sessions(&SessionFilter::for_class(class_id)).await?,
        ..RemovalReport::default()
    };

    for student in scope.list_students(Some(class_id)).await? {
        strip_student(scope, SessionFilter::all(), student.id, &mut report).await?;
    }
    report.students_deleted = scope.delete_students_in_class(class_id).await?;

    scope.delete_class(class_id).await?;
    info!(
        "Deleted class {} for owner {}: {} sessions deleted, {} updated, {} students",
        class_id,
        scope.owner_id(),
        report.sessions_deleted,
        report.sessions_updated,
        report.students_deleted
    );
    Ok(report)
}

/// Strip a student from every session, then delete the student.
pub async fn delete_student(scope: &OwnerScope, student_id: Uuid) -> ServiceResult<RemovalReport> {
    if scope.find_student(student_id).await?.is_none() {
        return Err(ServiceError::not_found("Student not found"));
    }

    let mut report = RemovalReport::default();
    strip_student(scope, SessionFilter::all(), student_id, &mut report).await?;
    if scope.delete_student(student_id).await? {
        report.students_deleted = 1;
    }
    info!("Deleted student {} for owner {}", student_id, scope.owner_id());
    Ok(report)
}

/// Strip a student from the sessions of one `(class, subject)` pair only.
/// The student and every other session stay intact.
pub async fn remove_student_from_pair(
    scope: &OwnerScope,
    student_id: Uuid,
    class_id: Uuid,
    subject_id: Uuid,
) -> ServiceResult<RemovalReport> {
    if scope.find_student(student_id).await?.is_none() {
        return Err(ServiceError::not_found("Student not found"));
    }

    let mut report = RemovalReport::default();
    strip_student(scope, SessionFilter::for_pair(class_id, subject_id), student_id, &mut report).await?;
    info!(
        "Removed student {} from class {} subject {}: {} sessions deleted, {} updated",
        student_id, class_id, subject_id, report.sessions_deleted, report.sessions_updated
    );
    Ok(report)
}

/// Rename a class. Subjects referencing the old name are rewritten first so
/// the name-based linkage follows the class. While another class of the
/// owner still carries the old name, references are copied instead of moved
/// so that class keeps its assignment and exclusions.
pub async fn rename_class(scope: &OwnerScope, class_id: Uuid, name: String) -> ServiceResult<Class> {
    let mut class = scope
        .find_class(class_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Class not found"))?;

    if class.name != name {
        let shared = scope
            .list_classes()
            .await?
            .iter()
            .any(|other| other.id != class.id && other.name == class.name);

        for mut subject in scope.list_subjects().await? {
            let changed = if shared {
                subject.copy_class(&class.name, &name)
            } else {
                subject.rename_class(&class.name, &name)
            };
            if changed {
                scope.update_subject(&subject).await?;
            }
        }
    }

    class.name = name;
    if !scope.update_class(&class).await? {
        return Err(ServiceError::not_found("Class not found"));
    }
    Ok(class)
}

/// Partial subject update; absent fields are left unchanged.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectChanges {
    pub name: Option<String>,
    pub assigned_classes: Option<Vec<String>>,
    pub excluded_students: Option<Vec<ExclusionEntry>>,
}

pub async fn update_subject(scope: &OwnerScope, subject_id: Uuid, changes: SubjectChanges) -> ServiceResult<Subject> {
    let mut subject = scope
        .find_subject(subject_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Subject not found"))?;

    if let Some(name) = changes.name {
        subject.name = crate::types::require_name("name", Some(&name))?;
    }
    if let Some(assigned) = changes.assigned_classes {
        let assigned: Vec<String> = assigned.into_iter().map(|n| n.trim().to_string()).collect();
        if assigned.iter().any(String::is_empty) {
            return Err(ServiceError::invalid_field("assignedClasses", "class names must not be empty"));
        }
        subject.assigned_classes = dedup_names(assigned);
    }
    if let Some(entries) = changes.excluded_students {
        let entries: Vec<ExclusionEntry> = entries
            .into_iter()
            .map(|e| ExclusionEntry { class_name: e.class_name.trim().to_string(), student_ids: e.student_ids })
            .collect();
        if entries.iter().any(|e| e.class_name.is_empty()) {
            return Err(ServiceError::invalid_field("excludedStudents", "className must not be empty"));
        }
        subject.excluded_students = normalize_exclusions(entries);
    }

    if !scope.update_subject(&subject).await? {
        return Err(ServiceError::not_found("Subject not found"));
    }
    Ok(subject)
}
