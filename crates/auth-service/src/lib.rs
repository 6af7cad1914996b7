//! `taskmanager-auth-service`: network boundary of the Credential Service.
//!
//! Owns the signing secret and the credential store; everything else in the
//! system only ever sees tokens.

pub mod app;
pub mod service;

pub use service::AuthService;
