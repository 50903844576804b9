pub mod manager;
pub mod postgres;
pub mod sqlite;

pub use manager::{DatabaseManager, DatabasePool, DatabaseType, PoolSettings};
pub use postgres::PostgresTaskStore;
pub use sqlite::SqliteTaskStore;
