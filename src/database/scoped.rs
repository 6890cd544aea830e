use std::sync::Arc;

use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AttendanceSession, Class, Student, Subject};
use crate::database::store::Store;
use crate::filter::SessionFilter;

/// A `Store` bound to one owner. The owner id is supplied once, at
/// construction, and every read, write and aggregation query goes through it.
#[derive(Clone)]
pub struct OwnerScope {
    store: Arc<dyn Store>,
    owner_id: Uuid,
}

impl OwnerScope {
    pub fn new(store: Arc<dyn Store>, owner_id: Uuid) -> Self {
        Self { store, owner_id }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn check_owner(&self, owner_id: Uuid) -> Result<(), DatabaseError> {
        if owner_id != self.owner_id {
            return Err(DatabaseError::OwnerMismatch);
        }
        Ok(())
    }

    // Classes

    pub async fn create_class(&self, name: &str) -> Result<Class, DatabaseError> {
        let class = Class::new(self.owner_id, name);
        self.store.insert_class(&class).await?;
        Ok(class)
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, DatabaseError> {
        self.store.list_classes(self.owner_id).await
    }

    pub async fn find_class(&self, id: Uuid) -> Result<Option<Class>, DatabaseError> {
        self.store.find_class(self.owner_id, id).await
    }

    pub async fn update_class(&self, class: &Class) -> Result<bool, DatabaseError> {
        self.check_owner(class.owner_id)?;
        self.store.update_class(class).await
    }

    pub async fn delete_class(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.store.delete_class(self.owner_id, id).await
    }

    // Students

    pub async fn create_student(&self, class_id: Uuid, name: &str) -> Result<Student, DatabaseError> {
        let student = Student::new(self.owner_id, class_id, name);
        self.store.insert_student(&student).await?;
        Ok(student)
    }

    pub async fn list_students(&self, class_id: Option<Uuid>) -> Result<Vec<Student>, DatabaseError> {
        self.store.list_students(self.owner_id, class_id).await
    }

    pub async fn find_student(&self, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        self.store.find_student(self.owner_id, id).await
    }

    pub async fn delete_student(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.store.delete_student(self.owner_id, id).await
    }

    pub async fn delete_students_in_class(&self, class_id: Uuid) -> Result<u64, DatabaseError> {
        self.store.delete_students_in_class(self.owner_id, class_id).await
    }

    // Subjects

    pub async fn create_subject(&self, name: &str) -> Result<Subject, DatabaseError> {
        let subject = Subject::new(self.owner_id, name);
        self.store.insert_subject(&subject).await?;
        Ok(subject)
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>, DatabaseError> {
        self.store.list_subjects(self.owner_id).await
    }

    pub async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, DatabaseError> {
        self.store.find_subject(self.owner_id, id).await
    }

    pub async fn update_subject(&self, subject: &Subject) -> Result<bool, DatabaseError> {
        self.check_owner(subject.owner_id)?;
        self.store.update_subject(subject).await
    }

    pub async fn delete_subject(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.store.delete_subject(self.owner_id, id).await
    }

    // Attendance sessions

    pub async fn find_sessions(&self, filter: &SessionFilter) -> Result<Vec<AttendanceSession>, DatabaseError> {
        self.store.find_sessions(self.owner_id, filter).await
    }

    pub async fn find_session(&self, id: Uuid) -> Result<Option<AttendanceSession>, DatabaseError> {
        self.store.find_session(self.owner_id, id).await
    }

    /// Counts are re-derived from records before the write.
    pub async fn save_session(&self, session: &mut AttendanceSession) -> Result<(), DatabaseError> {
        self.check_owner(session.owner_id)?;
        session.recompute_counts()?;
        self.store.save_session(session).await
    }

    pub async fn delete_session(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.store.delete_session(self.owner_id, id).await
    }

    pub async fn delete_sessions(&self, filter: &SessionFilter) -> Result<u64, DatabaseError> {
        self.store.delete_sessions(self.owner_id, filter).await
    }
}
