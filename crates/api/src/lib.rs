//! API Gateway: edge authorization, auth proxy and task routes.

pub mod app;
pub mod auth_client;
pub mod context;
pub mod guard;
pub mod middleware;
