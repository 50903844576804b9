pub mod calendar;
pub mod entities;
pub mod repositories;
pub mod value_objects;

// SQLx 实现（仅在启用 sqlx-support feature 时编译）
#[cfg(feature = "sqlx-support")]
pub mod sqlx_impls;

pub use calendar::*;
pub use entities::*;
pub use repositories::*;
pub use taskboard_errors::{TaskboardError, TaskboardResult};
pub use value_objects::*;
