use std::sync::Arc;

use anyhow::Context;

use taskmanager_api::app::{self, AppServices};
use taskmanager_api::auth_client::HttpAuthClient;
use taskmanager_api::guard::{EdgeGuard, PublicRoutes};
use taskmanager_auth::TokenVerifier;
use taskmanager_infra::{AppConfig, PostgresTaskStore, StorageBackend, db, shutdown};
use taskmanager_observability::{LogFormat, MetricsRegistry};
use taskmanager_tasks::{InMemoryTaskStore, TaskService, TaskStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    taskmanager_observability::init(LogFormat::for_environment(config.is_production()));

    if config.jwt.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let task_store: Arc<dyn TaskStore> = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::bootstrap(&config.db)
                .await
                .context("failed to initialise postgres")?;
            Arc::new(PostgresTaskStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory task store; tasks are lost on restart");
            Arc::new(InMemoryTaskStore::new())
        }
    };

    let verifier = TokenVerifier::new(&config.jwt.token_config()).context("invalid JWT settings")?;
    let guard = EdgeGuard::new(PublicRoutes::default(), verifier);

    let auth_client = HttpAuthClient::new(config.auth_service_url.clone(), config.request_timeout)
        .context("failed to build auth service client")?;
    let metrics = MetricsRegistry::new().context("failed to register metrics")?;

    let services = AppServices::new(Arc::new(auth_client), TaskService::new(task_store), metrics);
    let app = app::build_app(services, guard);

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        auth_service = %config.auth_service_url,
        "api gateway listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("api gateway terminated")?;

    Ok(())
}
