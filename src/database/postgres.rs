use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgArguments, types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Account, AttendanceRecord, AttendanceSession, Class, ExclusionEntry, Student, Subject,
};
use crate::database::repository::Repository;
use crate::database::store::Store;
use crate::filter::{FilterWhere, SessionFilter, SqlParam};

#[derive(Debug, FromRow)]
struct SubjectRow {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    assigned_classes: Vec<String>,
    excluded_students: Json<Vec<ExclusionEntry>>,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            created_at: row.created_at,
            assigned_classes: row.assigned_classes,
            excluded_students: row.excluded_students.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    class_id: Uuid,
    subject_id: Uuid,
    date: DateTime<Utc>,
    owner_id: Uuid,
    records: Json<Vec<AttendanceRecord>>,
}

impl TryFrom<SessionRow> for AttendanceSession {
    type Error = DatabaseError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        // Stored counts are not read back; they are re-derived from records
        Ok(AttendanceSession::from_parts(
            row.id,
            row.owner_id,
            row.class_id,
            row.subject_id,
            row.date,
            row.records.0,
        )?)
    }
}

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
    classes: Repository<Class>,
    students: Repository<Student>,
    subjects: Repository<SubjectRow>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Result<Self, DatabaseError> {
        Ok(Self {
            classes: Repository::new("classes", pool.clone())?,
            students: Repository::new("students", pool.clone())?,
            subjects: Repository::new("subjects", pool.clone())?,
            pool,
        })
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match p {
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Json(v) => q.bind(v),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match p {
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Json(v) => q.bind(v),
    }
}

fn count_column(value: u32) -> Result<i32, DatabaseError> {
    i32::try_from(value).map_err(|_| DatabaseError::Integrity(format!("count {} exceeds INTEGER", value)))
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn insert_account(&self, account: &Account) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO accounts (id, username, login, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.login)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DatabaseError::Conflict(format!("login '{}' already exists", account.login)))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn insert_class(&self, class: &Class) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO classes (id, name, owner_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(class.id)
            .bind(&class.name)
            .bind(class.owner_id)
            .bind(class.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_classes(&self, owner_id: Uuid) -> Result<Vec<Class>, DatabaseError> {
        self.classes.select_owned(owner_id).await
    }

    async fn find_class(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Class>, DatabaseError> {
        self.classes.select_one(owner_id, id).await
    }

    async fn update_class(&self, class: &Class) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE classes SET name = $3 WHERE owner_id = $1 AND id = $2")
            .bind(class.owner_id)
            .bind(class.id)
            .bind(&class.name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_class(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        self.classes.delete_one(owner_id, id).await
    }

    async fn insert_student(&self, student: &Student) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO students (id, name, class_id, owner_id, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(student.id)
        .bind(&student.name)
        .bind(student.class_id)
        .bind(student.owner_id)
        .bind(student.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_students(&self, owner_id: Uuid, class_id: Option<Uuid>) -> Result<Vec<Student>, DatabaseError> {
        match class_id {
            None => self.students.select_owned(owner_id).await,
            Some(class_id) => {
                let rows = sqlx::query_as::<_, Student>(
                    "SELECT * FROM students WHERE owner_id = $1 AND class_id = $2 ORDER BY created_at, id",
                )
                .bind(owner_id)
                .bind(class_id)
                .fetch_all(&self.pool)
                .await?;
                Ok(rows)
            }
        }
    }

    async fn find_student(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        self.students.select_one(owner_id, id).await
    }

    async fn delete_student(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        self.students.delete_one(owner_id, id).await
    }

    async fn delete_students_in_class(&self, owner_id: Uuid, class_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM students WHERE owner_id = $1 AND class_id = $2")
            .bind(owner_id)
            .bind(class_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_subject(&self, subject: &Subject) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO subjects (id, name, owner_id, created_at, assigned_classes, excluded_students)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(subject.id)
        .bind(&subject.name)
        .bind(subject.owner_id)
        .bind(subject.created_at)
        .bind(&subject.assigned_classes)
        .bind(Json(&subject.excluded_students))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_subjects(&self, owner_id: Uuid) -> Result<Vec<Subject>, DatabaseError> {
        let rows = self.subjects.select_owned(owner_id).await?;
        Ok(rows.into_iter().map(Subject::from).collect())
    }

    async fn find_subject(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Subject>, DatabaseError> {
        Ok(self.subjects.select_one(owner_id, id).await?.map(Subject::from))
    }

    async fn update_subject(&self, subject: &Subject) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE subjects SET name = $3, assigned_classes = $4, excluded_students = $5
             WHERE owner_id = $1 AND id = $2",
        )
        .bind(subject.owner_id)
        .bind(subject.id)
        .bind(&subject.name)
        .bind(&subject.assigned_classes)
        .bind(Json(&subject.excluded_students))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_subject(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        self.subjects.delete_one(owner_id, id).await
    }

    async fn find_sessions(&self, owner_id: Uuid, filter: &SessionFilter) -> Result<Vec<AttendanceSession>, DatabaseError> {
        let (where_clause, params) = FilterWhere::generate(filter, 1);
        let sql = format!(
            "SELECT id, class_id, subject_id, date, owner_id, records FROM attendance_sessions
             WHERE owner_id = $1 AND {} ORDER BY date, id",
            where_clause
        );

        let mut q = sqlx::query_as::<_, SessionRow>(&sql).bind(owner_id);
        for p in params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        tracing::debug!("find_sessions matched {} rows", rows.len());

        rows.into_iter().map(AttendanceSession::try_from).collect()
    }

    async fn find_session(&self, owner_id: Uuid, id: Uuid) -> Result<Option<AttendanceSession>, DatabaseError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, class_id, subject_id, date, owner_id, records FROM attendance_sessions
             WHERE owner_id = $1 AND id = $2",
        )
        .bind(owner_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AttendanceSession::try_from).transpose()
    }

    async fn save_session(&self, session: &AttendanceSession) -> Result<(), DatabaseError> {
        let present = count_column(session.present_count())?;
        let absent = count_column(session.absent_count())?;

        // One statement: the row and its derived counts become visible together
        let result = sqlx::query(
            "INSERT INTO attendance_sessions
                (id, class_id, subject_id, date, owner_id, records, present_count, absent_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                class_id = EXCLUDED.class_id,
                subject_id = EXCLUDED.subject_id,
                date = EXCLUDED.date,
                records = EXCLUDED.records,
                present_count = EXCLUDED.present_count,
                absent_count = EXCLUDED.absent_count
             WHERE attendance_sessions.owner_id = EXCLUDED.owner_id",
        )
        .bind(session.id)
        .bind(session.class_id)
        .bind(session.subject_id)
        .bind(session.date)
        .bind(session.owner_id)
        .bind(Json(session.records()))
        .bind(present)
        .bind(absent)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::OwnerMismatch);
        }
        Ok(())
    }

    async fn delete_session(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM attendance_sessions WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_sessions(&self, owner_id: Uuid, filter: &SessionFilter) -> Result<u64, DatabaseError> {
        let (where_clause, params) = FilterWhere::generate(filter, 1);
        let sql = format!(
            "DELETE FROM attendance_sessions WHERE owner_id = $1 AND {}",
            where_clause
        );

        let mut q = sqlx::query(&sql).bind(owner_id);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
