use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use taskboard_domain::repositories::{
    StoreHealth, TaskMutationGateway, TaskRepository, TaskStore,
};
use taskboard_errors::TaskboardResult;

use super::postgres::PostgresTaskStore;
use super::sqlite::SqliteTaskStore;

/// 根据 URL 判断数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// 连接池参数
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[derive(Clone)]
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    pub async fn new(url: &str, settings: &PoolSettings) -> TaskboardResult<Self> {
        match DatabaseType::from_url(url) {
            DatabaseType::PostgreSQL => {
                let pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .min_connections(settings.min_connections)
                    .acquire_timeout(settings.acquire_timeout)
                    .idle_timeout(settings.idle_timeout)
                    .connect(url)
                    .await?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
                // 内存库的每个连接都是独立数据库，只能保留一个且不能回收
                let pool_options = if is_in_memory_sqlite(url) {
                    SqlitePoolOptions::new()
                        .max_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None)
                } else {
                    SqlitePoolOptions::new()
                        .max_connections(settings.max_connections)
                        .min_connections(settings.min_connections)
                        .idle_timeout(settings.idle_timeout)
                };
                let pool = pool_options
                    .acquire_timeout(settings.acquire_timeout)
                    .connect_with(options)
                    .await?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

#[async_trait]
impl StoreHealth for DatabasePool {
    async fn ping(&self) -> TaskboardResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }
}

/// 统一的数据库管理器：建池、迁移、按数据库类型构造存储
pub struct DatabaseManager {
    pool: DatabasePool,
}

impl DatabaseManager {
    pub async fn new(url: &str, settings: &PoolSettings) -> TaskboardResult<Self> {
        let pool = DatabasePool::new(url, settings).await?;
        info!("数据库连接池已创建: {:?}", pool.database_type());
        Ok(Self { pool })
    }

    pub fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    pub async fn migrate(&self) -> TaskboardResult<()> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => PostgresTaskStore::run_migrations(pool).await,
            DatabasePool::SQLite(pool) => SqliteTaskStore::run_migrations(pool).await,
        }
    }

    /// `/health` 使用的连通性探测
    pub fn store_health(&self) -> Arc<dyn StoreHealth> {
        Arc::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await
    }

    pub fn task_store(&self) -> Arc<dyn TaskStore> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresTaskStore::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteTaskStore::new(pool.clone())),
        }
    }

    pub fn mutation_gateway(&self) -> Arc<dyn TaskMutationGateway> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresTaskStore::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteTaskStore::new(pool.clone())),
        }
    }

    pub fn task_repository(&self) -> Arc<dyn TaskRepository> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresTaskStore::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteTaskStore::new(pool.clone())),
        }
    }
}
