//! Postgres-backed task store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use taskmanager_core::{TaskId, UserId};
use taskmanager_tasks::{Priority, Status, Task, TaskError, TaskResult, TaskStore};

const SELECT_COLUMNS: &str =
    "id, owner_id, title, description, priority, status, tags, due_date, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: Arc<PgPool>,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    #[instrument(skip(self, task), fields(task_id = %task.id), err)]
    async fn insert(&self, task: &Task) -> TaskResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks
                (id, owner_id, title, description, priority, status, tags, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(task.owner.as_uuid())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(&task.tags)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list_by_owner(&self, owner: UserId) -> TaskResult<Vec<Task>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_by_owner", e))?;

        rows.iter().map(task_from_row).collect()
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn get(&self, id: TaskId) -> TaskResult<Task> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?
            .ok_or(TaskError::NotFound)?;
        task_from_row(&row)
    }
}

fn task_from_row(row: &PgRow) -> TaskResult<Task> {
    let decode = |e| map_sqlx_error("decode task row", e);

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let owner: uuid::Uuid = row.try_get("owner_id").map_err(decode)?;
    let priority: String = row.try_get("priority").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let due_date: Option<DateTime<Utc>> = row.try_get("due_date").map_err(decode)?;

    Ok(Task {
        id: TaskId::from_uuid(id),
        owner: UserId::from_uuid(owner),
        title: row.try_get("title").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        priority: priority.parse::<Priority>()?,
        status: status.parse::<Status>()?,
        tags: row.try_get("tags").map_err(decode)?,
        due_date,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> TaskError {
    match err {
        sqlx::Error::RowNotFound => TaskError::NotFound,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            TaskError::validation(format!("{operation}: {}", db_err.message()))
        }
        other => {
            tracing::error!(operation, error = %other, "task store query failed");
            TaskError::unavailable(other)
        }
    }
}
