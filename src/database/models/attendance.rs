use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn present(student_id: Uuid) -> Self {
        Self { student_id, status: AttendanceStatus::Present }
    }

    pub fn absent(student_id: Uuid) -> Self {
        Self { student_id, status: AttendanceStatus::Absent }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("attendance session has {0} records, more than the counters can hold")]
pub struct CountOverflow(pub usize);

/// One roll-call for a class + subject + date.
///
/// `present_count` / `absent_count` are derived from `records`. They are
/// private and recomputed by every constructor and every records mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    pub id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub date: DateTime<Utc>,
    pub owner_id: Uuid,
    records: Vec<AttendanceRecord>,
    present_count: u32,
    absent_count: u32,
}

impl AttendanceSession {
    pub fn new(
        owner_id: Uuid,
        class_id: Uuid,
        subject_id: Uuid,
        date: DateTime<Utc>,
        records: Vec<AttendanceRecord>,
    ) -> Result<Self, CountOverflow> {
        Self::from_parts(Uuid::new_v4(), owner_id, class_id, subject_id, date, records)
    }

    /// Rebuild a stored session. Counts are always re-derived, never trusted.
    pub fn from_parts(
        id: Uuid,
        owner_id: Uuid,
        class_id: Uuid,
        subject_id: Uuid,
        date: DateTime<Utc>,
        records: Vec<AttendanceRecord>,
    ) -> Result<Self, CountOverflow> {
        let mut session = Self {
            id,
            class_id,
            subject_id,
            date,
            owner_id,
            records,
            present_count: 0,
            absent_count: 0,
        };
        session.recompute_counts()?;
        Ok(session)
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn present_count(&self) -> u32 {
        self.present_count
    }

    pub fn absent_count(&self) -> u32 {
        self.absent_count
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_student(&self, student_id: Uuid) -> bool {
        self.records.iter().any(|r| r.student_id == student_id)
    }

    /// Replace the roll-call. On overflow the session is left untouched.
    pub fn replace_records(&mut self, records: Vec<AttendanceRecord>) -> Result<(), CountOverflow> {
        let (present, absent) = tally(&records)?;
        self.records = records;
        self.present_count = present;
        self.absent_count = absent;
        Ok(())
    }

    /// Remove every record of `student_id`. Returns the number removed.
    pub fn strip_student(&mut self, student_id: Uuid) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.student_id != student_id);
        let removed = before - self.records.len();
        if removed > 0 {
            // Shrinking can never overflow a count that already fit
            let (present, absent) = tally(&self.records).unwrap_or((0, 0));
            self.present_count = present;
            self.absent_count = absent;
        }
        removed
    }

    pub fn recompute_counts(&mut self) -> Result<(), CountOverflow> {
        let (present, absent) = tally(&self.records)?;
        self.present_count = present;
        self.absent_count = absent;
        Ok(())
    }
}

fn tally(records: &[AttendanceRecord]) -> Result<(u32, u32), CountOverflow> {
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    let absent = records.len() - present;

    let present = u32::try_from(present).map_err(|_| CountOverflow(records.len()))?;
    let absent = u32::try_from(absent).map_err(|_| CountOverflow(records.len()))?;
    Ok((present, absent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(records: Vec<AttendanceRecord>) -> AttendanceSession {
        AttendanceSession::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Utc::now(), records).unwrap()
    }

    #[test]
    fn counts_follow_records_on_construction() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let s = session(vec![
            AttendanceRecord::present(a),
            AttendanceRecord::absent(b),
            AttendanceRecord::present(c),
        ]);
        assert_eq!(s.present_count(), 2);
        assert_eq!(s.absent_count(), 1);
    }

    #[test]
    fn empty_session_counts_zero() {
        let s = session(vec![]);
        assert!(s.is_empty());
        assert_eq!((s.present_count(), s.absent_count()), (0, 0));
    }

    #[test]
    fn strip_student_recomputes_counts() {
        let (alice, carol) = (Uuid::new_v4(), Uuid::new_v4());
        let mut s = session(vec![AttendanceRecord::present(alice), AttendanceRecord::absent(carol)]);

        assert_eq!(s.strip_student(carol), 1);
        assert_eq!(s.records(), &[AttendanceRecord::present(alice)]);
        assert_eq!((s.present_count(), s.absent_count()), (1, 0));

        assert_eq!(s.strip_student(carol), 0);
        assert_eq!(s.strip_student(alice), 1);
        assert!(s.is_empty());
        assert_eq!((s.present_count(), s.absent_count()), (0, 0));
    }

    #[test]
    fn replace_records_recomputes_counts() {
        let a = Uuid::new_v4();
        let mut s = session(vec![AttendanceRecord::present(a)]);
        s.replace_records(vec![AttendanceRecord::absent(a), AttendanceRecord::absent(a)]).unwrap();
        assert_eq!((s.present_count(), s.absent_count()), (0, 2));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let a = Uuid::new_v4();
        let s = session(vec![AttendanceRecord::present(a)]);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["presentCount"], 1);
        assert_eq!(v["absentCount"], 0);
        assert_eq!(v["records"][0]["status"], "present");
        assert_eq!(v["records"][0]["studentId"], a.to_string());
        assert!(v.get("classId").is_some());
    }
}
