pub mod agent_pipeline;
pub mod agent_service;
pub mod auth;
pub mod classifier;
pub mod csv_worker;
pub mod dashboard_service;
pub mod ingest_service;
pub mod task_service;
pub mod tenancy_service;
pub mod vault_service;
pub mod workers;
