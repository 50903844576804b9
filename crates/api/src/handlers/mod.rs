pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod todos;
