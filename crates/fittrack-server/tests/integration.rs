#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use fittrack_auth::{CREDENTIAL_TTL_SECS, sign_init_data};
use fittrack_core::Environment;
use fittrack_core::config::{RateLimitConfig, ServerConfig};
use fittrack_core::db::unix_timestamp;
use fittrack_server::auth::build_verifier;
use fittrack_server::rate_limit::RateLimiter;
use fittrack_server::routes::{AppState, build_router};
use fittrack_server::storage::ServerDatabase;

const BOT_TOKEN: &str = "123456:TEST-TOKEN";
const ANN: &str = r#"{"id":42,"first_name":"Ann","username":"ann_k","language_code":"en"}"#;

async fn app_with_limit(rate_limit: RateLimitConfig, trust_proxy: bool) -> axum::Router {
    let state = AppState {
        verifier: build_verifier(BOT_TOKEN, Environment::Production).unwrap(),
        db: ServerDatabase::open_in_memory().await.unwrap(),
        limiter: Arc::new(RateLimiter::new(&rate_limit, trust_proxy)),
    };
    build_router(state, &ServerConfig::default())
}

async fn app() -> axum::Router {
    app_with_limit(RateLimitConfig::default(), false).await
}

fn tma_header(user: &str, auth_date: i64) -> String {
    let auth_date = auth_date.to_string();
    let signed = sign_init_data(
        BOT_TOKEN,
        &[
            ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
            ("user", user),
            ("auth_date", auth_date.as_str()),
        ],
    );
    format!("tma {signed}")
}

/// Send a request through `app` and return (status, parsed JSON body or `Null`).
async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for &(name, value) in headers {
        builder = builder.header(name, value);
    }
    let resp = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_needs_no_credential() {
    let app = app().await;
    let (status, _) = send(&app, Method::GET, "/health", &[]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn me_returns_verified_identity() {
    let app = app().await;
    let auth = tma_header(ANN, unix_timestamp());
    let headers = [("authorization", auth.as_str())];
    let (status, body) = send(&app, Method::GET, "/api/me", &headers).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 42);
    assert_eq!(body["first_name"], "Ann");
    assert_eq!(body["username"], "ann_k");
    assert_eq!(body["language_code"], "en");
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/me", &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: No TMA header");
}

#[tokio::test]
async fn bearer_scheme_is_unauthorized() {
    let app = app().await;
    let headers = [("authorization", "Bearer abc.def.ghi")];
    let (status, body) = send(&app, Method::GET, "/api/me", &headers).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: No TMA header");
}

#[tokio::test]
async fn test_header_is_rejected_in_production() {
    let app = app().await;
    let headers = [("authorization", "test-42")];
    let (status, _) = send(&app, Method::GET, "/api/me", &headers).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_credential_is_forbidden() {
    let app = app().await;
    let auth = tma_header(ANN, unix_timestamp()).replace("Ann", "Bob");
    let headers = [("authorization", auth.as_str())];
    let (status, body) = send(&app, Method::GET, "/api/me", &headers).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden: Hash mismatch");
}

#[tokio::test]
async fn expired_credential_is_unauthorized() {
    let app = app().await;
    let auth = tma_header(ANN, unix_timestamp() - CREDENTIAL_TTL_SECS - 60);
    let headers = [("authorization", auth.as_str())];
    let (status, body) = send(&app, Method::GET, "/api/me", &headers).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: Session expired");
}

#[tokio::test]
async fn credential_without_hash_is_unauthorized() {
    let app = app().await;
    let headers = [("authorization", "tma auth_date=1&user=%7B%7D")];
    let (status, body) = send(&app, Method::GET, "/api/me", &headers).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: Invalid initData");
}

#[tokio::test]
async fn onboarding_lifecycle() {
    let app = app().await;
    let auth = tma_header(ANN, unix_timestamp());
    let headers = [("authorization", auth.as_str())];

    let (status, body) = send(&app, Method::GET, "/api/check-user", &headers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isOnboarded"], false);

    let (status, body) = send(&app, Method::POST, "/api/sync-user", &headers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, Method::GET, "/api/check-user", &headers).await;
    assert_eq!(body["isOnboarded"], true);

    let (status, _) = send(&app, Method::DELETE, "/api/user/delete", &headers).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/check-user", &headers).await;
    assert_eq!(body["isOnboarded"], false);
}

#[tokio::test]
async fn users_only_see_their_own_onboarding() {
    let app = app().await;
    let ann = tma_header(ANN, unix_timestamp());
    let bob = tma_header(r#"{"id":7,"first_name":"Bob"}"#, unix_timestamp());

    let ann_headers = [("authorization", ann.as_str())];
    send(&app, Method::POST, "/api/sync-user", &ann_headers).await;

    let bob_headers = [("authorization", bob.as_str())];
    let (_, body) = send(&app, Method::GET, "/api/check-user", &bob_headers).await;
    assert_eq!(body["isOnboarded"], false);
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/nope", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "API route not found");
}

#[tokio::test]
async fn api_requests_over_limit_get_429() {
    let app = app_with_limit(
        RateLimitConfig {
            window_secs: 900,
            max_requests: 2,
        },
        false,
    )
    .await;

    for _ in 0..2 {
        let (status, _) = send(&app, Method::GET, "/api/me", &[]).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = send(&app, Method::GET, "/api/me", &[]).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests, please try again later.");

    // Health is outside the limiter.
    let (status, _) = send(&app, Method::GET, "/health", &[]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn trusted_proxy_limits_per_forwarded_client() {
    let app = app_with_limit(
        RateLimitConfig {
            window_secs: 900,
            max_requests: 1,
        },
        true,
    )
    .await;

    let first = [("x-forwarded-for", "203.0.113.1")];
    let second = [("x-forwarded-for", "203.0.113.2")];

    let (status, _) = send(&app, Method::GET, "/api/me", &first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/me", &second).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/me", &first).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn rotating_client_supplied_hops_do_not_reset_the_limit() {
    let app = app_with_limit(
        RateLimitConfig {
            window_secs: 900,
            max_requests: 1,
        },
        true,
    )
    .await;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let forwarded = format!("10.9.9.{i}, 198.51.100.7");
        let headers = [("x-forwarded-for", forwarded.as_str())];
        statuses.push(send(&app, Method::GET, "/api/me", &headers).await.0);
    }

    assert_eq!(statuses[0], StatusCode::UNAUTHORIZED);
    assert!(
        statuses[1..]
            .iter()
            .all(|s| *s == StatusCode::TOO_MANY_REQUESTS),
        "statuses {statuses:?}"
    );
}
