mod common;

use axum::{
    extract::connect_info::MockConnectInfo,
    http::{StatusCode, header},
};
use common::{TestSetup, body_json, form_request, register_request, token_request};
use std::net::SocketAddr;
use tower::ServiceExt;

fn with_ip<B>(mut request: axum::http::Request<B>, ip: &str) -> axum::http::Request<B> {
    request
        .headers_mut()
        .insert("x-forwarded-for", ip.parse().unwrap());
    request
}

#[tokio::test]
async fn test_token_endpoint_burst_limit() {
    let app = TestSetup::new()
        .with_rate_limit(Some("x-forwarded-for"))
        .build()
        .await;
    let response = app.send(with_ip(register_request("alice", "pw"), "198.51.100.1")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    for _ in 0..5 {
        let response = app
            .send(with_ip(token_request("alice", "wrong"), "198.51.100.1"))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Form login shares the same bucket
    let response = app
        .send(with_ip(form_request("/auth/login", "alice", "pw"), "198.51.100.1"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body_json(response).await["error"],
        "Too many authentication attempts. Please wait before trying again."
    );

    // Another client is unaffected
    let response = app
        .send(with_ip(token_request("alice", "pw"), "198.51.100.2"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["token_type"], "bearer");
}

#[tokio::test]
async fn test_registration_limit() {
    let app = TestSetup::new()
        .with_rate_limit(Some("x-forwarded-for"))
        .build()
        .await;

    for name in ["a1", "a2", "a3"] {
        let response = app
            .send(with_ip(register_request(name, "pw"), "198.51.100.1"))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .send(with_ip(form_request("/auth/register", "a4", "pw"), "198.51.100.1"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        body_json(response).await["error"],
        "Too many signup attempts. Please wait before trying again."
    );
}

#[tokio::test]
async fn test_missing_ip_header_is_forbidden() {
    let app = TestSetup::new()
        .with_rate_limit(Some("x-forwarded-for"))
        .build()
        .await;

    let response = app.send(register_request("alice", "pw")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "Unable to determine client IP."
    );
}

#[tokio::test]
async fn test_socket_address_used_without_ip_header() {
    let app = TestSetup::new().with_rate_limit(None).build().await;
    let router = app
        .router
        .clone()
        .layer(MockConnectInfo(SocketAddr::from(([192, 0, 2, 10], 5000))));

    let response = router
        .clone()
        .oneshot(register_request("alice", "pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Without connection info the client cannot be identified
    let response = app.send(register_request("bob", "pw")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_routes_are_not_limited() {
    let app = TestSetup::new()
        .with_rate_limit(Some("x-forwarded-for"))
        .build()
        .await;

    for _ in 0..10 {
        let response = app
            .send(
                axum::http::Request::builder()
                    .uri("/auth/logout")
                    .header(header::COOKIE, "access_token_cookie=x")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
