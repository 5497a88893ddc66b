#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use std::time::Duration;
use tallybook::{ServerConfig, create_app, db::Database};
use tower::ServiceExt;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789";

/// Router plus a handle on its database for direct inspection.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

pub async fn setup() -> TestApp {
    TestSetup::new().build().await
}

/// Builder for test apps with non-default options.
pub struct TestSetup {
    token_ttl: Duration,
    rate_limit: bool,
    ip_header: Option<String>,
    secure_cookies: bool,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            token_ttl: Duration::from_secs(1440 * 60),
            rate_limit: false,
            ip_header: None,
            secure_cookies: false,
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_secure_cookies(mut self) -> Self {
        self.secure_cookies = true;
        self
    }

    pub fn with_rate_limit(mut self, ip_header: Option<&str>) -> Self {
        self.rate_limit = true;
        self.ip_header = ip_header.map(str::to_string);
        self
    }

    pub async fn build(self) -> TestApp {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let config = ServerConfig {
            db: db.clone(),
            jwt_secret: TEST_SECRET.to_vec(),
            token_ttl: self.token_ttl,
            bcrypt_cost: 4,
            secure_cookies: self.secure_cookies,
            rate_limit: self.rate_limit,
            ip_header: self.ip_header,
        };
        let router = create_app(&config).expect("Failed to create app");
        TestApp { router, db }
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Register through the JSON API and return a bearer token for the user.
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        let response = self.send(register_request(username, password)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self.send(token_request(username, password)).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn register_request(username: &str, password: &str) -> Request<Body> {
    json_request(
        "POST",
        "/auth/",
        None,
        serde_json::json!({ "username": username, "password": password }),
    )
}

pub fn token_request(username: &str, password: &str) -> Request<Body> {
    form_request("/auth/token", username, password)
}

pub fn form_request(uri: &str, username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            encode(username),
            encode(password)
        )))
        .unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Percent-encode a form value (enough for test credentials).
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
