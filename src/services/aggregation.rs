//! Attendance roll-ups.
//!
//! Every view is a staged pipeline over a snapshot of sessions: pass 1 counts
//! records by a composite key, later passes fold the counts upward and attach
//! display names. Groups are emitted in first-seen order, with sessions
//! scanned in `(date, id)` order and records in stored order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{AttendanceSession, AttendanceStatus, Class, Student, Subject};
use crate::database::OwnerScope;
use crate::filter::SessionFilter;
use crate::services::error::{ServiceError, ServiceResult};

/// Present/absent counters for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub present: u32,
    pub absent: u32,
}

impl Counts {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present = self.present.saturating_add(1),
            AttendanceStatus::Absent => self.absent = self.absent.saturating_add(1),
        }
    }

    fn merge(&mut self, other: Counts) {
        self.present = self.present.saturating_add(other.present);
        self.absent = self.absent.saturating_add(other.absent);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTally {
    pub student_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub present_count: u32,
    pub absent_count: u32,
}

/// View (a): one entry per class, students in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttendance {
    pub class_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub students: Vec<StudentTally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTotals {
    pub class_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub total_presents: u32,
    pub total_absences: u32,
    pub students: Vec<StudentTally>,
}

/// View (b): one entry per subject, broken down by class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttendance {
    pub subject_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub classes: Vec<ClassTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecord {
    pub student_id: Uuid,
    pub student: Option<Student>,
    pub status: AttendanceStatus,
}

/// A session with its references replaced by the current entities
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSession {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub class_id: Uuid,
    pub class: Option<Class>,
    pub subject_id: Uuid,
    pub subject: Option<Subject>,
    pub records: Vec<ResolvedRecord>,
    pub present_count: u32,
    pub absent_count: u32,
}

/// View (c)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub records: Vec<ResolvedSession>,
    pub aggregated_stats: Vec<ClassAttendance>,
}

/// Current entities of one owner, keyed by id
#[derive(Debug, Default)]
pub struct Lookup {
    classes: HashMap<Uuid, Class>,
    subjects: HashMap<Uuid, Subject>,
    students: HashMap<Uuid, Student>,
}

impl Lookup {
    pub fn new(classes: Vec<Class>, subjects: Vec<Subject>, students: Vec<Student>) -> Self {
        Self {
            classes: classes.into_iter().map(|c| (c.id, c)).collect(),
            subjects: subjects.into_iter().map(|s| (s.id, s)).collect(),
            students: students.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    pub async fn load(scope: &OwnerScope) -> ServiceResult<Self> {
        let (classes, subjects, students) = futures::try_join!(
            scope.list_classes(),
            scope.list_subjects(),
            scope.list_students(None),
        )?;
        Ok(Self::new(classes, subjects, students))
    }

    fn class_name(&self, id: Uuid) -> Option<String> {
        self.classes.get(&id).map(|c| c.name.clone())
    }

    fn subject_name(&self, id: Uuid) -> Option<String> {
        self.subjects.get(&id).map(|s| s.name.clone())
    }

    fn student_name(&self, id: Uuid) -> Option<String> {
        self.students.get(&id).map(|s| s.name.clone())
    }
}

// Pass 1

/// Count records by `(classId, studentId)`
pub fn count_by_class_student(sessions: &[AttendanceSession]) -> Vec<((Uuid, Uuid), Counts)> {
    let mut groups = IndexMap::new();
    for session in sessions {
        for record in session.records() {
            groups
                .entry((session.class_id, record.student_id))
                .or_insert_with(Counts::default)
                .add(record.status);
        }
    }
    groups.into_iter().collect()
}

/// Count records by `(subjectId, classId, studentId)`
pub fn count_by_subject_class_student(sessions: &[AttendanceSession]) -> Vec<((Uuid, Uuid, Uuid), Counts)> {
    let mut groups = IndexMap::new();
    for session in sessions {
        for record in session.records() {
            groups
                .entry((session.subject_id, session.class_id, record.student_id))
                .or_insert_with(Counts::default)
                .add(record.status);
        }
    }
    groups.into_iter().collect()
}

// Fold passes

fn tally(lookup: &Lookup, student_id: Uuid, counts: Counts) -> StudentTally {
    StudentTally {
        student_id,
        student_name: lookup.student_name(student_id),
        present_count: counts.present,
        absent_count: counts.absent,
    }
}

/// Fold `(class, student)` counts into one entry per class
pub fn fold_classes(counts: Vec<((Uuid, Uuid), Counts)>, lookup: &Lookup) -> Vec<ClassAttendance> {
    let mut classes: IndexMap<Uuid, Vec<StudentTally>> = IndexMap::new();
    for ((class_id, student_id), c) in counts {
        classes
            .entry(class_id)
            .or_default()
            .push(tally(lookup, student_id, c));
    }
    classes
        .into_iter()
        .map(|(class_id, students)| ClassAttendance {
            class_id,
            class_name: lookup.class_name(class_id),
            students,
        })
        .collect()
}

/// Fold `(subject, class, student)` counts into `(subject, class)` totals
pub fn fold_subject_classes(
    counts: Vec<((Uuid, Uuid, Uuid), Counts)>,
    lookup: &Lookup,
) -> Vec<((Uuid, Uuid), ClassTotals)> {
    let mut pairs: IndexMap<(Uuid, Uuid), (Counts, Vec<StudentTally>)> = IndexMap::new();
    for ((subject_id, class_id, student_id), c) in counts {
        let (totals, students) = pairs.entry((subject_id, class_id)).or_default();
        totals.merge(c);
        students.push(tally(lookup, student_id, c));
    }
    pairs
        .into_iter()
        .map(|((subject_id, class_id), (totals, students))| {
            let class = ClassTotals {
                class_id,
                class_name: lookup.class_name(class_id),
                total_presents: totals.present,
                total_absences: totals.absent,
                students,
            };
            ((subject_id, class_id), class)
        })
        .collect()
}

/// Fold `(subject, class)` totals into one entry per subject
pub fn fold_subjects(pairs: Vec<((Uuid, Uuid), ClassTotals)>, lookup: &Lookup) -> Vec<SubjectAttendance> {
    let mut subjects: IndexMap<Uuid, Vec<ClassTotals>> = IndexMap::new();
    for ((subject_id, _), class) in pairs {
        subjects.entry(subject_id).or_default().push(class);
    }
    subjects
        .into_iter()
        .map(|(subject_id, classes)| SubjectAttendance {
            subject_id,
            subject_name: lookup.subject_name(subject_id),
            classes,
        })
        .collect()
}

pub fn resolve_sessions(sessions: &[AttendanceSession], lookup: &Lookup) -> Vec<ResolvedSession> {
    sessions
        .iter()
        .map(|session| ResolvedSession {
            id: session.id,
            date: session.date,
            class_id: session.class_id,
            class: lookup.classes.get(&session.class_id).cloned(),
            subject_id: session.subject_id,
            subject: lookup.subjects.get(&session.subject_id).cloned(),
            records: session
                .records()
                .iter()
                .map(|r| ResolvedRecord {
                    student_id: r.student_id,
                    student: lookup.students.get(&r.student_id).cloned(),
                    status: r.status,
                })
                .collect(),
            present_count: session.present_count(),
            absent_count: session.absent_count(),
        })
        .collect()
}

// Whole views over a snapshot

pub fn aggregate_by_class(sessions: &[AttendanceSession], lookup: &Lookup) -> Vec<ClassAttendance> {
    fold_classes(count_by_class_student(sessions), lookup)
}

pub fn aggregate_by_subject(sessions: &[AttendanceSession], lookup: &Lookup) -> Vec<SubjectAttendance> {
    fold_subjects(fold_subject_classes(count_by_subject_class_student(sessions), lookup), lookup)
}

/// Only the class and subject narrowing of a filter applies to statistics
fn stats_filter(filter: &SessionFilter) -> SessionFilter {
    SessionFilter {
        class_id: filter.class_id,
        subject_id: filter.subject_id,
        ..SessionFilter::default()
    }
}

async fn snapshot(scope: &OwnerScope, filter: &SessionFilter) -> ServiceResult<(Vec<AttendanceSession>, Lookup)> {
    let filter = stats_filter(filter);
    let (sessions, lookup) = futures::try_join!(
        async { scope.find_sessions(&filter).await.map_err(ServiceError::from) },
        Lookup::load(scope),
    )?;
    debug!("aggregating {} sessions for owner {}", sessions.len(), scope.owner_id());
    Ok((sessions, lookup))
}

pub async fn student_records(scope: &OwnerScope, filter: &SessionFilter) -> ServiceResult<Vec<ClassAttendance>> {
    let (sessions, lookup) = snapshot(scope, filter).await?;
    Ok(aggregate_by_class(&sessions, &lookup))
}

pub async fn subject_records(scope: &OwnerScope, filter: &SessionFilter) -> ServiceResult<Vec<SubjectAttendance>> {
    let (sessions, lookup) = snapshot(scope, filter).await?;
    Ok(aggregate_by_subject(&sessions, &lookup))
}

pub async fn overview(scope: &OwnerScope) -> ServiceResult<Overview> {
    let (sessions, lookup) = snapshot(scope, &SessionFilter::all()).await?;
    Ok(Overview {
        records: resolve_sessions(&sessions, &lookup),
        aggregated_stats: aggregate_by_class(&sessions, &lookup),
    })
}
