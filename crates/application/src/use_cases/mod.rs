pub mod activity_rollup;
pub mod bulk_mutation;
pub mod dashboard_service;
pub mod summary_aggregator;
pub mod todo_service;

pub use activity_rollup::*;
pub use bulk_mutation::*;
pub use dashboard_service::*;
pub use summary_aggregator::*;
pub use todo_service::*;
