pub mod agents;
pub mod auth;
pub mod dashboard;
pub mod electoral;
pub mod insights;
pub mod tasks;
pub mod tenancy;
pub mod vault;
