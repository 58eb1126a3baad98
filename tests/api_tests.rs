//! API 集成测试
//!
//! 测试 HTTP API 端点。这里的用例都在访问数据库之前返回，
//! 使用惰性连接池即可运行。

mod common;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{create_test_app_state, create_test_app_state_with, lazy_pool, token_for};
use http_body_util::BodyExt;
use service_catalog::{
    auth::AuthContext,
    error::AppError,
    routes::create_router,
    services::{Action, AuthorizationOracle, ResourceType},
};
use std::sync::Arc;
use tower::ServiceExt;

struct DenyAll;

#[async_trait]
impl AuthorizationOracle for DenyAll {
    async fn check(
        &self,
        _principal: &AuthContext,
        _app_id: i64,
        _resource: ResourceType,
        _action: Action,
    ) -> Result<bool, AppError> {
        Ok(false)
    }
}

fn app() -> Router {
    create_router(create_test_app_state(lazy_pool()))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_unavailable_database() {
    let response = app()
        .oneshot(request(Method::GET, "/ready", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["ready"], false);
    assert_eq!(body["checks"][0]["name"], "database");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = app()
        .oneshot(request(Method::GET, "/api/v1/apps/7/services", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], 401);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let response = app()
        .oneshot(request(
            Method::GET,
            "/api/v1/apps/7/services/tpls",
            Some("not-a-jwt"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let mut req = request(Method::GET, "/health", None, None);
    req.headers_mut()
        .insert("x-trace-id", "trace-abc".parse().unwrap());

    let response = app().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-trace-id"], "trace-abc");
}

#[tokio::test]
async fn test_denied_caller_is_forbidden() {
    let router = create_router(create_test_app_state_with(lazy_pool(), Arc::new(DenyAll)));
    let token = token_for(42, "bob", false);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/apps/7/services",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "Access denied");
}

#[tokio::test]
async fn test_empty_reorder_batch_is_rejected() {
    let token = token_for(1, "root", true);

    let response = app()
        .oneshot(request(
            Method::PUT,
            "/api/v1/apps/7/services/updateorders",
            Some(&token),
            Some("[]"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_reorder_ids_are_rejected() {
    let token = token_for(1, "root", true);

    let response = app()
        .oneshot(request(
            Method::PUT,
            "/api/v1/apps/7/services/updateorders",
            Some(&token),
            Some(r#"[{"id":1,"orderId":5},{"id":1,"orderId":9}]"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("more than once"));
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let token = token_for(1, "root", true);

    let response = app()
        .oneshot(request(
            Method::GET,
            "/api/v1/apps/7/services/abc",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let token = token_for(1, "root", true);

    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/v1/apps/7/services",
            Some(&token),
            Some("{not json"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn test_invalid_service_name_is_rejected() {
    let token = token_for(1, "root", true);

    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/v1/apps/7/services",
            Some(&token),
            Some(r#"{"name":"Not_A_Label","appId":7}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_template_payload_is_rejected() {
    let token = token_for(1, "root", true);

    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/v1/apps/7/services/tpls",
            Some(&token),
            Some(r#"{"name":"v1","serviceId":3,"template":"kind: Service"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("service template format error"));
}
