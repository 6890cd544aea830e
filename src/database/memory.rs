use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, AttendanceSession, Class, Student, Subject};
use crate::database::store::Store;
use crate::filter::SessionFilter;

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    classes: Vec<Class>,
    students: Vec<Student>,
    subjects: Vec<Subject>,
    sessions: Vec<AttendanceSession>,
}

/// In-process store. Each method holds the lock for its whole body, which
/// gives the per-document atomicity the services rely on.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace<T, F>(rows: &mut [T], row: &T, same: F) -> bool
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    match rows.iter_mut().find(|r| same(r)) {
        Some(slot) => {
            *slot = row.clone();
            true
        }
        None => false,
    }
}

fn remove<T, F>(rows: &mut Vec<T>, matches: F) -> u64
where
    F: Fn(&T) -> bool,
{
    let before = rows.len();
    rows.retain(|r| !matches(r));
    (before - rows.len()) as u64
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.iter().any(|a| a.login == account.login) {
            return Err(DatabaseError::Conflict(format!("login '{}' already exists", account.login)));
        }
        tables.accounts.push(account.clone());
        Ok(())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.login == login).cloned())
    }

    async fn insert_class(&self, class: &Class) -> Result<(), DatabaseError> {
        self.tables.write().await.classes.push(class.clone());
        Ok(())
    }

    async fn list_classes(&self, owner_id: Uuid) -> Result<Vec<Class>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.classes.iter().filter(|c| c.owner_id == owner_id).cloned().collect())
    }

    async fn find_class(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Class>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.classes.iter().find(|c| c.owner_id == owner_id && c.id == id).cloned())
    }

    async fn update_class(&self, class: &Class) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(replace(&mut tables.classes, class, |c| c.id == class.id && c.owner_id == class.owner_id))
    }

    async fn delete_class(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.classes, |c| c.owner_id == owner_id && c.id == id) > 0)
    }

    async fn insert_student(&self, student: &Student) -> Result<(), DatabaseError> {
        self.tables.write().await.students.push(student.clone());
        Ok(())
    }

    async fn list_students(&self, owner_id: Uuid, class_id: Option<Uuid>) -> Result<Vec<Student>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .iter()
            .filter(|s| s.owner_id == owner_id && class_id.map_or(true, |c| s.class_id == c))
            .cloned()
            .collect())
    }

    async fn find_student(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.students.iter().find(|s| s.owner_id == owner_id && s.id == id).cloned())
    }

    async fn delete_student(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.students, |s| s.owner_id == owner_id && s.id == id) > 0)
    }

    async fn delete_students_in_class(&self, owner_id: Uuid, class_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.students, |s| s.owner_id == owner_id && s.class_id == class_id))
    }

    async fn insert_subject(&self, subject: &Subject) -> Result<(), DatabaseError> {
        self.tables.write().await.subjects.push(subject.clone());
        Ok(())
    }

    async fn list_subjects(&self, owner_id: Uuid) -> Result<Vec<Subject>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.subjects.iter().filter(|s| s.owner_id == owner_id).cloned().collect())
    }

    async fn find_subject(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Subject>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.subjects.iter().find(|s| s.owner_id == owner_id && s.id == id).cloned())
    }

    async fn update_subject(&self, subject: &Subject) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(replace(&mut tables.subjects, subject, |s| s.id == subject.id && s.owner_id == subject.owner_id))
    }

    async fn delete_subject(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.subjects, |s| s.owner_id == owner_id && s.id == id) > 0)
    }

    async fn find_sessions(&self, owner_id: Uuid, filter: &SessionFilter) -> Result<Vec<AttendanceSession>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<AttendanceSession> = tables
            .sessions
            .iter()
            .filter(|s| s.owner_id == owner_id && filter.matches(s))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }

    async fn find_session(&self, owner_id: Uuid, id: Uuid) -> Result<Option<AttendanceSession>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.iter().find(|s| s.owner_id == owner_id && s.id == id).cloned())
    }

    async fn save_session(&self, session: &AttendanceSession) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.sessions.iter().find(|s| s.id == session.id) {
            if existing.owner_id != session.owner_id {
                return Err(DatabaseError::OwnerMismatch);
            }
        }
        if !replace(&mut tables.sessions, session, |s| s.id == session.id) {
            tables.sessions.push(session.clone());
        }
        Ok(())
    }

    async fn delete_session(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.sessions, |s| s.owner_id == owner_id && s.id == id) > 0)
    }

    async fn delete_sessions(&self, owner_id: Uuid, filter: &SessionFilter) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.sessions, |s| s.owner_id == owner_id && filter.matches(s)))
    }
}
