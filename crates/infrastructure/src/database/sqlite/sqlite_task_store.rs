use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
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

/// SQLite 任务存储，同时实现统计查询、批量变更与单任务仓储
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 单连接内存数据库，连接不回收以免丢失数据
    pub async fn in_memory() -> TaskboardResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(pool: &SqlitePool) -> TaskboardResult<()> {
        debug!("Running SQLite database migrations");
        let context = task_context!(RepositoryOperation::Migrate);

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                completed BOOLEAN NOT NULL DEFAULT 0,
                label TEXT NOT NULL DEFAULT 'feature'
                    CHECK (label IN ('bug', 'feature', 'documentation')),
                status TEXT NOT NULL DEFAULT 'todo'
                    CHECK (status IN ('backlog', 'todo', 'in progress', 'done', 'canceled')),
                priority TEXT NOT NULL DEFAULT 'medium'
                    CHECK (priority IN ('low', 'medium', 'high')),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::task_database_error(context.clone(), e))?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_todos_status ON todos(status)",
            "CREATE INDEX IF NOT EXISTS idx_todos_priority ON todos(priority)",
            "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_todos_updated_at ON todos(updated_at)",
        ];
        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| RepositoryErrorHelpers::task_database_error(context.clone(), e))?;
        }

        debug!("Successfully completed SQLite database migrations");
        Ok(())
    }

    fn row_to_task(row: &SqliteRow) -> TaskboardResult<Task> {
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

    fn row_to_grouped_count(row: &SqliteRow) -> TaskboardResult<GroupedCount> {
        Ok(GroupedCount {
            key: row.try_get("group_key")?,
            count: row.try_get("count")?,
        })
    }

    fn row_to_daily_count(row: &SqliteRow) -> TaskboardResult<DailyStatusCount> {
        Ok(DailyStatusCount {
            date: row.try_get("stamped_at")?,
            status: row.try_get("status")?,
            count: row.try_get("count")?,
        })
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TaskFilter) {
        builder.push(" WHERE 1=1");
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

    /// id 集合整体作为一个 JSON 数组绑定，不受 SQLite 变量个数上限约束
    fn push_id_set(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) -> TaskboardResult<()> {
        builder
            .push(" WHERE id IN (SELECT value FROM json_each(")
            .push_bind(serde_json::to_string(ids)?)
            .push("))");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    #[instrument(skip(self))]
    async fn count(&self, filter: &TaskFilter) -> TaskboardResult<i64> {
        let context = task_context!(RepositoryOperation::Query)
            .with_additional_info(format!("过滤器: {filter:?}"));

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM todos");
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
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
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
             WHERE {column} >= ? GROUP BY {column}, status"
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
impl TaskMutationGateway for SqliteTaskStore {
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

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE todos SET updated_at = ");
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
        Self::push_id_set(&mut builder, ids)?;

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

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM todos");
        Self::push_id_set(&mut builder, ids)?;

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
}

#[async_trait]
impl TaskRepository for SqliteTaskStore {
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
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_task(&row)?)),
            None => {
                debug!("查询任务不存在: ID {}", id);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, task))]
    async fn create(&self, task: &Task) -> TaskboardResult<Task> {
        let context = task_context!(RepositoryOperation::Create);
        let row = sqlx::query(&format!(
            "INSERT INTO todos (text, completed, label, status, priority, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {TASK_COLUMNS}"
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
            "UPDATE todos SET text = ?, label = ?, status = ?, priority = ?, updated_at = ? \
             WHERE id = ? RETURNING {TASK_COLUMNS}"
        ))
        .bind(&update.text)
        .bind(update.label)
        .bind(update.status)
        .bind(update.priority)
        .bind(stamped_at)
        .bind(id)
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
        let result = sqlx::query("UPDATE todos SET completed = ?, updated_at = ? WHERE id = ?")
            .bind(completed)
            .bind(stamped_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: i64) -> TaskboardResult<bool> {
        let context = task_context!(RepositoryOperation::Delete, task_id = id);
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::task_database_error(context, e))?;

        Ok(result.rows_affected() > 0)
    }
}
