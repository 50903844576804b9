use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};

use taskboard_domain::entities::{
    GroupField, Task, TaskFilter, TaskPatch, TaskUpdate, TimestampField,
};
use taskboard_domain::repositories::{
    DailyStatusCount, GroupedCount, TaskMutationGateway, TaskRepository, TaskStore,
};
use taskboard_errors::TaskboardResult;

use crate::error_handling::{RepositoryErrorHelpers, RepositoryOperation};
use crate::task_context;

const TASK_COLUMNS: &str =
    "id, text, completed, label, status, priority, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(pool: &PgPool) -> TaskboardResult<()> {
        debug!("Running PostgreSQL database migrations");
        let context = task_context!(RepositoryOperation::Migrate);

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id BIGSERIAL PRIMARY KEY,
                text TEXT NOT NULL,
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                label TEXT NOT NULL DEFAULT 'feature'
                    CHECK (label IN ('bug', 'feature', 'documentation')),
                status TEXT NOT NULL DEFAULT 'todo'
                    CHECK (status IN ('backlog', 'todo', 'in progress', 'done', 'canceled')),
                priority TEXT NOT NULL DEFAULT 'medium'
                    CHECK (priority IN ('low', 'medium', 'high')),
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_todos_status ON todos(status)",
            "CREATE INDEX IF NOT EXISTS idx_todos_priority ON todos(priority)",
            "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_todos_updated_at ON todos(updated_at)",
        ];
        for sql in statements {
            sqlx::query(sql)
                .execute(pool)
                .await
                .map_err(|e| RepositoryErrorHelpers::task_database_error(context.clone(), e))?;
        }

        debug!("Successfully completed PostgreSQL database migrations");
        Ok(())
    }

    fn row_to_task(row: &PgRow) -> TaskboardResult<Task> {
        Ok(Task {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            completed: row.try_get("completed")?,
            label: row.try_get("label")?,
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_grouped_count(row: &PgRow) -> TaskboardResult<GroupedCount> {
        Ok(GroupedCount {
            key: row.try_get("group_key")?,
            count: row.try_get("count")?,
        })
    }

    fn row_to_daily_count(row: &PgRow) -> TaskboardResult<DailyStatusCount> {
        Ok(DailyStatusCount {
            date: row.try_get("stamped_at")?,
            status: row.try_get("status")?,
            count: row.try_get("count")?,
        })
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
        builder.push(" WHERE TRUE");
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ").push_bind(priority);
        }
        if let Some(label) = filter.label {
            builder.push(" AND label = ").push_bind(label);
        }
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    #[instrument(skip(self))]
    async fn count(&self, filter: &TaskFilter) -> TaskboardResult<i64> {
        let context = task_context!(RepositoryOperation::Query)
            .with_additional_info(format!("过滤器: {filter:?}"));

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM todos");
        Self::push_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))
    }

    #[instrument(skip(self))]
    async fn count_grouped_by(
        &self,
        field: GroupField,
        filter: &TaskFilter,
    ) -> TaskboardResult<Vec<GroupedCount>> {
        let context = task_context!(RepositoryOperation::Query)
            .with_additional_info(format!("按 {} 分组", field.column()));

        let column = field.column();
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {column} AS group_key, COUNT(*) AS count FROM todos"
        ));
        Self::push_filter(&mut builder, filter);
        builder.push(format!(" GROUP BY {column}"));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        rows.iter().map(Self::row_to_grouped_count).collect()
    }

    #[instrument(skip(self))]
    async fn count_by_day_and_status(
        &self,
        field: TimestampField,
        since: DateTime<Utc>,
    ) -> TaskboardResult<Vec<DailyStatusCount>> {
        let context = task_context!(RepositoryOperation::Query)
            .with_additional_info(format!("{} >= {}", field.column(), since));

        let column = field.column();
        let sql = format!(
            "SELECT {column} AS stamped_at, status, COUNT(*) AS count FROM todos \
             WHERE {column} >= $1 GROUP BY {column}, status"
        );

        let rows = sqlx::query(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        rows.iter().map(Self::row_to_daily_count).collect()
    }
}

#[async_trait]
impl TaskMutationGateway for PostgresTaskStore {
    #[instrument(skip(self, ids, patch), fields(ids = ids.len()))]
    async fn update_where(
        &self,
        ids: &[i64],
        patch: &TaskPatch,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let context = task_context!(RepositoryOperation::BatchUpdate, task_count = ids.len());

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE todos SET updated_at = ");
        builder.push_bind(stamped_at);
        if let Some(label) = patch.label {
            builder.push(", label = ").push_bind(label);
        }
        if let Some(status) = patch.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(priority) = patch.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Some(completed) = patch.completed {
            builder.push(", completed = ").push_bind(completed);
        }
        builder
            .push(" WHERE id = ANY(")
            .push_bind(ids.to_vec())
            .push(")");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context.clone(), e))?;

        RepositoryErrorHelpers::log_operation_success(
            context,
            Some(&format!("影响 {} 行", result.rows_affected())),
        );
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn delete_where(&self, ids: &[i64]) -> TaskboardResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let context = task_context!(RepositoryOperation::BatchDelete, task_count = ids.len());

        let result = sqlx::query("DELETE FROM todos WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context.clone(), e))?;

        RepositoryErrorHelpers::log_operation_success(
            context,
            Some(&format!("影响 {} 行", result.rows_affected())),
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskStore {
    async fn find_all(&self) -> TaskboardResult<Vec<Task>> {
        let context = task_context!(RepositoryOperation::Read);
        let rows = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM todos ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        rows.iter().map(Self::row_to_task).collect()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn find_by_id(&self, id: i64) -> TaskboardResult<Option<Task>> {
        let context = task_context!(RepositoryOperation::Read, task_id = id);
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    #[instrument(skip(self, task))]
    async fn create(&self, task: &Task) -> TaskboardResult<Task> {
        let context = task_context!(RepositoryOperation::Create);
        let row = sqlx::query(&format!(
            "INSERT INTO todos (text, completed, label, status, priority, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.text)
        .bind(task.completed)
        .bind(task.label)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::task_database_error(context.clone(), e))?;

        let created = Self::row_to_task(&row)?;
        RepositoryErrorHelpers::log_operation_success(
            context.with_task_id(created.id),
            Some(&created.entity_description()),
        );
        Ok(created)
    }

    #[instrument(skip(self, update), fields(task_id = %id))]
    async fn update(
        &self,
        id: i64,
        update: &TaskUpdate,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<Option<Task>> {
        let context = task_context!(RepositoryOperation::Update, task_id = id);
        let row = sqlx::query(&format!(
            "UPDATE todos SET text = $2, label = $3, status = $4, priority = $5, updated_at = $6 \
             WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.text)
        .bind(update.label)
        .bind(update.status)
        .bind(update.priority)
        .bind(stamped_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn set_completed(
        &self,
        id: i64,
        completed: bool,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<bool> {
        let context = task_context!(RepositoryOperation::Update, task_id = id);
        let result = sqlx::query("UPDATE todos SET completed = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(completed)
            .bind(stamped_at)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: i64) -> TaskboardResult<bool> {
        let context = task_context!(RepositoryOperation::Delete, task_id = id);
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        Ok(result.rows_affected() > 0)
    }
}
