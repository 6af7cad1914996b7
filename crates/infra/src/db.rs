//! Postgres connection pool and schema bootstrap.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::DbConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        display_name  TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'user',
        active        BOOLEAN NOT NULL DEFAULT TRUE,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL,
        title       TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        priority    TEXT NOT NULL,
        status      TEXT NOT NULL,
        tags        TEXT[] NOT NULL DEFAULT '{}',
        due_date    TIMESTAMPTZ,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS tasks_owner_created_idx ON tasks (owner_id, created_at DESC)",
];

/// Open a bounded pool. Connections are established lazily up to
/// `min_connections` in the background.
pub async fn connect(cfg: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(cfg.password.expose_secret())
        .database(&cfg.name);

    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .max_lifetime(cfg.max_lifetime)
        .idle_timeout(cfg.idle_timeout)
        .connect_with(options)
        .await?;

    tracing::info!(
        host = %cfg.host,
        port = cfg.port,
        database = %cfg.name,
        max_connections = cfg.max_connections,
        "connected to postgres"
    );
    Ok(pool)
}

pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("database schema ensured");
    Ok(())
}

/// `connect` + `ensure_schema` + `ping`: everything a service needs before
/// it starts accepting requests.
pub async fn bootstrap(cfg: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let pool = connect(cfg).await?;
    ensure_schema(&pool).await?;
    ping(&pool).await?;
    Ok(pool)
}
