//! # Taskboard Testing Utils
//!
//! 工作区共享的测试工具：实现全部存储 trait 的内存存储、按需失败的存储，
//! 以及任务测试数据构建器。
//!
//! ```toml
//! [dev-dependencies]
//! taskboard-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

// 重新导出常用项
pub use builders::*;
pub use helpers::*;
pub use mocks::*;
