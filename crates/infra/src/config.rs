//! Process configuration.
//!
//! Built once in `main` from the environment (after an optional `.env` is
//! loaded) and handed to components by value or reference. Nothing here is
//! global.

use core::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use taskmanager_auth::{Algorithm, TokenConfig};

const DEV_JWT_SECRET: &str = "dev-only-insecure-jwt-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration key {key}")]
    Missing { key: &'static str },

    #[error("invalid value '{value}' for configuration key {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(()),
        }
    }
}

/// Where identities and tasks are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl ListenConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct JwtConfig {
    pub secret: SecretString,
    pub algorithm: Algorithm,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
    pub issuer: String,
}

impl core::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// True when no secret was configured and the development fallback is
    /// in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.secret.expose_secret() == DEV_JWT_SECRET
    }

    /// Signing/verification settings for `taskmanager-auth`.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(SecretString::from(self.secret.expose_secret().to_owned()))
            .with_algorithm(self.algorithm)
            .with_ttls(self.access_ttl, self.refresh_ttl)
            .with_issuer(self.issuer.clone())
    }
}

pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl core::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("max_lifetime", &self.max_lifetime)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub environment: Environment,
    /// Gateway listen address.
    pub server: ListenConfig,
    /// Auth Service listen address.
    pub auth: ListenConfig,
    /// Base URL the gateway uses to reach the Auth Service.
    pub auth_service_url: String,
    pub jwt: JwtConfig,
    pub db: DbConfig,
    pub storage: StorageBackend,
    pub bcrypt_cost: u32,
    /// Deadline applied to each Credential Service call.
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            tracing::debug!("no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let environment = vars.parse_or("APP_ENV", Environment::Development)?;

        let server = ListenConfig {
            host: vars.string_or("SERVER_HOST", "localhost"),
            port: vars.number_or("SERVER_PORT", 8000)?,
        };
        let auth = ListenConfig {
            host: vars.string_or("AUTH_HTTP_HOST", "localhost"),
            port: vars.number_or("AUTH_HTTP_PORT", 50051)?,
        };
        let auth_service_url = vars
            .get("AUTH_SERVICE_URL")
            .unwrap_or_else(|| format!("http://{}", auth.address()));

        let secret = match vars.get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == Environment::Production => {
                return Err(ConfigError::Missing { key: "JWT_SECRET" });
            }
            None => DEV_JWT_SECRET.to_string(),
        };
        let algorithm = match vars.get("JWT_ALGORITHM") {
            None => Algorithm::HS256,
            Some(raw) => match raw.to_ascii_uppercase().as_str() {
                "HS256" => Algorithm::HS256,
                "HS384" => Algorithm::HS384,
                "HS512" => Algorithm::HS512,
                _ => return Err(ConfigError::Invalid { key: "JWT_ALGORITHM", value: raw }),
            },
        };
        let access_minutes: i64 = vars.positive_or("JWT_ACCESS_TTL", 15)?;
        let refresh_hours: i64 = vars.positive_or("JWT_REFRESH_TTL", 720)?;
        let jwt = JwtConfig {
            secret: SecretString::from(secret),
            algorithm,
            access_ttl: token_lifetime(
                "JWT_ACCESS_TTL",
                access_minutes,
                chrono::Duration::try_minutes(access_minutes),
            )?,
            refresh_ttl: token_lifetime(
                "JWT_REFRESH_TTL",
                refresh_hours,
                chrono::Duration::try_hours(refresh_hours),
            )?,
            issuer: vars.string_or("JWT_ISSUER", taskmanager_auth::token::DEFAULT_ISSUER),
        };

        let db = DbConfig {
            host: vars.string_or("DB_HOST", "localhost"),
            port: vars.number_or("DB_PORT", 5432)?,
            user: vars.string_or("DB_USER", "postgres"),
            password: SecretString::from(vars.string_or("DB_PASSWORD", "password")),
            name: vars.string_or("DB_NAME", "taskmanager"),
            max_connections: vars.positive_or("DB_MAX_CONNECTIONS", 25)?,
            min_connections: vars.number_or("DB_MIN_CONNECTIONS", 5)?,
            max_lifetime: Duration::from_secs(vars.positive_or("DB_MAX_LIFETIME_SECS", 300)?),
            idle_timeout: Duration::from_secs(vars.positive_or("DB_IDLE_TIMEOUT_SECS", 60)?),
        };
        if db.min_connections > db.max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS",
                value: db.min_connections.to_string(),
            });
        }

        Ok(Self {
            environment,
            server,
            auth,
            auth_service_url,
            jwt,
            db,
            storage: vars.parse_or("STORAGE_BACKEND", StorageBackend::Postgres)?,
            bcrypt_cost: vars.number_or("BCRYPT_COST", taskmanager_auth::password::DEFAULT_COST)?,
            request_timeout: Duration::from_secs(vars.positive_or("REQUEST_TIMEOUT_SECS", 10)?),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// A lifetime is usable only if a token issued now can still carry its expiry.
fn token_lifetime(
    key: &'static str,
    raw: i64,
    lifetime: Option<chrono::Duration>,
) -> Result<chrono::Duration, ConfigError> {
    lifetime
        .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| ConfigError::Invalid { key, value: raw.to_string() })
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: raw }),
        }
    }

    fn number_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        self.parse_or(key, default)
    }

    fn positive_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default + ToString,
    {
        let value = self.number_or(key, default)?;
        if value <= T::default() {
            return Err(ConfigError::Invalid {
                key,
                value: value.to_string(),
            });
        }
        Ok(value)
    }
}
