//! `taskmanager-core`: shared domain primitives.
//!
//! Pure types only: identifiers and their parse error. No IO.

pub mod error;
pub mod id;

pub use error::InvalidId;
pub use id::{TaskId, UserId};
