//! Errors raised by the shared primitives.

use thiserror::Error;

/// A string did not parse as one of the typed identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {source}")]
pub struct InvalidId {
    /// Name of the identifier type, e.g. `UserId`.
    pub kind: &'static str,
    #[source]
    pub source: uuid::Error,
}
