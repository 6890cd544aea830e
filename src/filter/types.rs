use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::AttendanceSession;

/// Narrowing applied to an owner's attendance sessions. Every field that is
/// set must match; an empty filter matches every session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    /// Only sessions whose records mention this student
    pub student_id: Option<Uuid>,
    #[serde(default)]
    pub require_non_empty_records: bool,
}

impl SessionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_class(class_id: Uuid) -> Self {
        Self { class_id: Some(class_id), ..Self::default() }
    }

    pub fn for_pair(class_id: Uuid, subject_id: Uuid) -> Self {
        Self {
            class_id: Some(class_id),
            subject_id: Some(subject_id),
            ..Self::default()
        }
    }

    pub fn with_student(mut self, student_id: Uuid) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.require_non_empty_records = true;
        self
    }

    pub fn matches(&self, session: &AttendanceSession) -> bool {
        if let Some(class_id) = self.class_id {
            if session.class_id != class_id {
                return false;
            }
        }
        if let Some(subject_id) = self.subject_id {
            if session.subject_id != subject_id {
                return false;
            }
        }
        if let Some(student_id) = self.student_id {
            if !session.contains_student(student_id) {
                return false;
            }
        }
        if self.require_non_empty_records && session.is_empty() {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AttendanceRecord;
    use chrono::Utc;

    #[test]
    fn matches_every_set_field() {
        let (owner, class, subject, student) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let session = AttendanceSession::new(owner, class, subject, Utc::now(), vec![AttendanceRecord::present(student)]).unwrap();
        let empty = AttendanceSession::new(owner, class, subject, Utc::now(), vec![]).unwrap();

        assert!(SessionFilter::all().matches(&session));
        assert!(SessionFilter::for_pair(class, subject).non_empty().matches(&session));
        assert!(!SessionFilter::for_pair(class, subject).non_empty().matches(&empty));
        assert!(!SessionFilter::for_class(Uuid::new_v4()).matches(&session));
        assert!(SessionFilter::all().with_student(student).matches(&session));
        assert!(!SessionFilter::all().with_student(Uuid::new_v4()).matches(&session));
    }
}
