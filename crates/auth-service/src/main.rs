use std::sync::Arc;

use anyhow::Context;

use taskmanager_auth::{CredentialService, IdentityStore, InMemoryIdentityStore, PasswordHasher, TokenIssuer};
use taskmanager_auth_service::AuthService;
use taskmanager_infra::{AppConfig, PostgresIdentityStore, StorageBackend, db, shutdown};
use taskmanager_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    taskmanager_observability::init(LogFormat::for_environment(config.is_production()));

    if config.jwt.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let store: Arc<dyn IdentityStore> = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::bootstrap(&config.db)
                .await
                .context("failed to initialise postgres")?;
            Arc::new(PostgresIdentityStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory credential store; identities are lost on restart");
            InMemoryIdentityStore::arc()
        }
    };

    let hasher = PasswordHasher::new(config.bcrypt_cost).context("invalid BCRYPT_COST")?;
    let issuer = TokenIssuer::new(&config.jwt.token_config()).context("invalid JWT settings")?;
    let service = Arc::new(AuthService::new(
        CredentialService::new(store, hasher),
        issuer,
        config.request_timeout,
    ));

    let app = taskmanager_auth_service::app::build_app(service);

    let address = config.auth.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("auth service listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("auth service terminated")?;

    Ok(())
}
