use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::{Value, json};

use taskmanager_auth::{CredentialService, InMemoryIdentityStore, PasswordHasher, TokenConfig, TokenIssuer};
use taskmanager_auth_service::AuthService;

const SECRET: &str = "auth-service-test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = TokenConfig::new(SecretString::from(SECRET.to_string()));
        let service = AuthService::new(
            CredentialService::new(InMemoryIdentityStore::arc(), PasswordHasher::new(4).unwrap()),
            TokenIssuer::new(&config).unwrap(),
            Duration::from_secs(5),
        );
        let app = taskmanager_auth_service::app::build_app(Arc::new(service));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(client: &reqwest::Client, srv: &TestServer, email: &str) -> Value {
    let res = client
        .post(srv.url("/v1/register"))
        .json(&json!({
            "email": email,
            "password": "password1",
            "display_name": "Alice",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_duplicate_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let session = register(&client, &srv, "Alice@Example.com").await;
    assert_eq!(session["token_type"], "Bearer");
    assert_eq!(session["user"]["email"], "alice@example.com");
    assert_eq!(session["user"]["role"], "user");
    assert!(session["user"].get("password_hash").is_none());

    let res = client
        .post(srv.url("/v1/register"))
        .json(&json!({
            "email": "alice@example.com",
            "password": "other-password",
            "display_name": "Bob",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(srv.url("/v1/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "alice@example.com").await;

    let mut bodies = Vec::new();
    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "password1"),
    ] {
        let res = client
            .post(srv.url("/v1/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        bodies.push(res.json::<Value>().await.unwrap());
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0]["error"], "INVALID_CREDENTIALS");

    let res = client
        .post(srv.url("/v1/login"))
        .json(&json!({ "email": "alice@example.com", "password": "password1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_only_accepts_refresh_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = register(&client, &srv, "alice@example.com").await;

    let res = client
        .post(srv.url("/v1/refresh"))
        .json(&json!({ "refresh_token": session["access_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "INVALID_TOKEN");

    let res = client
        .post(srv.url("/v1/refresh"))
        .json(&json!({ "refresh_token": session["refresh_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed: Value = res.json().await.unwrap();
    assert_eq!(refreshed["user"]["id"], session["user"]["id"]);
}

#[tokio::test]
async fn validate_always_answers_ok() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = register(&client, &srv, "alice@example.com").await;

    let res = client
        .post(srv.url("/v1/validate"))
        .json(&json!({ "token": session["access_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["subject_id"], session["user"]["id"]);
    assert_eq!(body["email"], "alice@example.com");

    let now = Utc::now().timestamp();
    let foreign = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "subject": session["user"]["id"],
            "email": "alice@example.com",
            "role": "admin",
            "tokenKind": "access",
            "issuedAt": now,
            "notBefore": now,
            "expiresAt": now + 600,
            "tokenId": uuid::Uuid::now_v7(),
            "issuer": "taskmanager-auth",
        }),
        &EncodingKey::from_secret(b"someone-elses-secret"),
    )
    .unwrap();

    for token in [foreign.as_str(), "garbage", ""] {
        let res = client
            .post(srv.url("/v1/validate"))
            .json(&json!({ "token": token }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "valid": false }));
    }
}

#[tokio::test]
async fn profile_lookup_by_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = register(&client, &srv, "alice@example.com").await;
    let id = session["user"]["id"].as_str().unwrap();

    let res = client.get(srv.url(&format!("/v1/users/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, session["user"]);

    for missing in ["not-a-uuid".to_string(), uuid::Uuid::now_v7().to_string()] {
        let res = client
            .get(srv.url(&format!("/v1/users/{missing}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
