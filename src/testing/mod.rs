use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::database::models::{AttendanceRecord, AttendanceSession, Class, ExclusionEntry, Student, Subject};
use crate::database::{MemoryStore, OwnerScope, Store};

/// One owner's fixture over a fresh memory store: class "10A" with Alice,
/// Bob and Carol, and subject "Math" assigned to "10A" excluding Bob.
pub struct TestContext {
    pub store: Arc<dyn Store>,
    pub scope: OwnerScope,
    pub class: Class,
    pub subject: Subject,
    pub alice: Student,
    pub bob: Student,
    pub carol: Student,
    recorded: std::sync::atomic::AtomicI64,
}

impl TestContext {
    pub async fn seeded() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Self::seeded_in(store).await
    }

    /// Seed a new owner into an existing store
    pub async fn seeded_in(store: Arc<dyn Store>) -> Self {
        let scope = OwnerScope::new(store.clone(), Uuid::new_v4());

        let class = scope.create_class("10A").await.expect("class");
        let alice = scope.create_student(class.id, "Alice").await.expect("alice");
        let bob = scope.create_student(class.id, "Bob").await.expect("bob");
        let carol = scope.create_student(class.id, "Carol").await.expect("carol");

        let mut subject = scope.create_subject("Math").await.expect("subject");
        subject.assigned_classes = vec![class.name.clone()];
        subject.excluded_students = vec![ExclusionEntry {
            class_name: class.name.clone(),
            student_ids: vec![bob.id],
        }];
        scope.update_subject(&subject).await.expect("update subject");

        Self {
            store,
            scope,
            class,
            subject,
            alice,
            bob,
            carol,
            recorded: std::sync::atomic::AtomicI64::new(0),
        }
    }

    /// Save a session for (10A, Math). Each call is dated one minute after the
    /// previous so scan order follows call order.
    pub async fn record(&self, records: Vec<AttendanceRecord>) -> AttendanceSession {
        self.record_for(self.class.id, self.subject.id, records).await
    }

    pub async fn record_for(&self, class_id: Uuid, subject_id: Uuid, records: Vec<AttendanceRecord>) -> AttendanceSession {
        let step = self.recorded.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let date = Utc::now() + Duration::minutes(step);
        let mut session = AttendanceSession::new(self.scope.owner_id(), class_id, subject_id, date, records)
            .expect("session");
        self.scope.save_session(&mut session).await.expect("save session");
        session
    }

    /// Scope for a different owner over the same store
    pub fn stranger(&self) -> OwnerScope {
        OwnerScope::new(self.store.clone(), Uuid::new_v4())
    }
}
