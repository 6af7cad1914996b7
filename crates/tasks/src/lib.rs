//! `taskmanager-tasks`: per-user task records.
//!
//! Storage-agnostic: the gateway wires a [`TaskStore`] implementation from
//! `taskmanager-infra` (Postgres) or the in-memory one here.

pub mod error;
pub mod service;
pub mod store;
pub mod task;

pub use error::{TaskError, TaskResult};
pub use service::TaskService;
pub use store::{InMemoryTaskStore, TaskStore};
pub use task::{NewTask, Priority, Status, Task};
