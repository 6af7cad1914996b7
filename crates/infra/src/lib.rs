//! Infrastructure layer: configuration and Postgres adapters.

pub mod config;
pub mod db;
pub mod identity_store;
pub mod shutdown;
pub mod task_store;

pub use config::{AppConfig, ConfigError, Environment, StorageBackend};
pub use identity_store::PostgresIdentityStore;
pub use task_store::PostgresTaskStore;
