pub mod admin;
pub mod agent_tasks;
pub mod auth;
pub mod dashboard;
pub mod ingest;
pub mod insights;
pub mod tasks;
pub mod vault;
