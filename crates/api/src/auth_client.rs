//! Client for the Auth Service, used by the public auth routes.
//!
//! Request authorization never goes through here; see `guard.rs`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use taskmanager_auth::protocol::{
    ErrorBody, IdentityView, LoginRequest, RefreshRequest, RegisterRequest, SessionResponse,
};
use taskmanager_core::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthClientError {
    /// The Auth Service answered with an error body; it is forwarded as is.
    #[error("auth service error ({status}): {}", .body.error)]
    Api { status: u16, body: ErrorBody },
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("unexpected response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn register(&self, req: &RegisterRequest) -> Result<SessionResponse, AuthClientError>;
    async fn login(&self, req: &LoginRequest) -> Result<SessionResponse, AuthClientError>;
    async fn refresh(&self, req: &RefreshRequest) -> Result<SessionResponse, AuthClientError>;
    async fn profile(&self, id: UserId) -> Result<IdentityView, AuthClientError>;
}

/// JSON-over-HTTP client for `taskmanager-auth-service`.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AuthClientError::Network)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AuthClientError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(AuthClientError::Network)?;
        decode(resp).await
    }
}

async fn decode<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, AuthClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json()
            .await
            .map_err(|e| AuthClientError::Parse(e.to_string()));
    }

    let text = resp.text().await.map_err(AuthClientError::Network)?;
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(AuthClientError::Api {
            status: status.as_u16(),
            body,
        }),
        Err(_) => Err(AuthClientError::Parse(format!("status {status} with body {text:?}"))),
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn register(&self, req: &RegisterRequest) -> Result<SessionResponse, AuthClientError> {
        self.post("/v1/register", req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<SessionResponse, AuthClientError> {
        self.post("/v1/login", req).await
    }

    async fn refresh(&self, req: &RefreshRequest) -> Result<SessionResponse, AuthClientError> {
        self.post("/v1/refresh", req).await
    }

    async fn profile(&self, id: UserId) -> Result<IdentityView, AuthClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/users/{id}")))
            .send()
            .await
            .map_err(AuthClientError::Network)?;
        decode(resp).await
    }
}
