use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Owner-scoped reads and deletes shared by every Postgres table. Each table
/// carries `id`, `owner_id` and `created_at` columns.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Result<Self, DatabaseError> {
        if table_name.is_empty() || !table_name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
            return Err(DatabaseError::QueryError(format!("Invalid table name: {}", table_name)));
        }
        Ok(Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        })
    }

    pub async fn select_owned(&self, owner_id: Uuid) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE owner_id = $1 ORDER BY created_at, id",
            self.table_name
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_one(&self, owner_id: Uuid, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE owner_id = $1 AND id = $2",
            self.table_name
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_one(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!(
            "DELETE FROM \"{}\" WHERE owner_id = $1 AND id = $2",
            self.table_name
        );
        let result = sqlx::query(&sql)
            .bind(owner_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
