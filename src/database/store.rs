use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, AttendanceSession, Class, Student, Subject};
use crate::filter::SessionFilter;

/// Persistence collaborator. Every entity method takes the owner explicitly;
/// handlers and services never call it directly but go through `OwnerScope`.
///
/// List methods return rows in creation order; `find_sessions` orders by
/// `(date, id)`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Accounts are global: logins are unique across the system
    async fn insert_account(&self, account: &Account) -> Result<(), DatabaseError>;
    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;
    async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>, DatabaseError>;

    async fn insert_class(&self, class: &Class) -> Result<(), DatabaseError>;
    async fn list_classes(&self, owner_id: Uuid) -> Result<Vec<Class>, DatabaseError>;
    async fn find_class(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Class>, DatabaseError>;
    async fn update_class(&self, class: &Class) -> Result<bool, DatabaseError>;
    async fn delete_class(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;

    async fn insert_student(&self, student: &Student) -> Result<(), DatabaseError>;
    async fn list_students(&self, owner_id: Uuid, class_id: Option<Uuid>) -> Result<Vec<Student>, DatabaseError>;
    async fn find_student(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Student>, DatabaseError>;
    async fn delete_student(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
    async fn delete_students_in_class(&self, owner_id: Uuid, class_id: Uuid) -> Result<u64, DatabaseError>;

    async fn insert_subject(&self, subject: &Subject) -> Result<(), DatabaseError>;
    async fn list_subjects(&self, owner_id: Uuid) -> Result<Vec<Subject>, DatabaseError>;
    async fn find_subject(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Subject>, DatabaseError>;
    async fn update_subject(&self, subject: &Subject) -> Result<bool, DatabaseError>;
    async fn delete_subject(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;

    async fn find_sessions(&self, owner_id: Uuid, filter: &SessionFilter) -> Result<Vec<AttendanceSession>, DatabaseError>;
    async fn find_session(&self, owner_id: Uuid, id: Uuid) -> Result<Option<AttendanceSession>, DatabaseError>;
    /// Insert or replace the whole session document
    async fn save_session(&self, session: &AttendanceSession) -> Result<(), DatabaseError>;
    async fn delete_session(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
    async fn delete_sessions(&self, owner_id: Uuid, filter: &SessionFilter) -> Result<u64, DatabaseError>;
}
