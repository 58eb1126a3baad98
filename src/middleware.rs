//! HTTP 中间件
//! 共享状态与请求追踪

use axum::{extract::Request, http::HeaderMap, http::HeaderValue, middleware::Next, response::Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::JwtService,
    config::AppConfig,
    error::AppError,
    query::FilterBuilder,
    repository::{ReorderCoordinator, ServiceRepository, TemplateRepository},
    services::{AuthorizationOracle, PermissionService},
};

/// 应用状态
///
/// 仓储与授权实现在启动时构造一次，通过 Arc 在请求间共享。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: sqlx::PgPool,
    pub services: Arc<ServiceRepository>,
    pub templates: Arc<TemplateRepository>,
    pub reorder: Arc<ReorderCoordinator>,
    pub oracle: Arc<dyn AuthorizationOracle>,
    pub jwt_service: Arc<JwtService>,
    pub filter_builder: FilterBuilder,
}

impl AppState {
    pub fn new(config: AppConfig, db: sqlx::PgPool) -> Result<Self, AppError> {
        let oracle = Arc::new(PermissionService::new(db.clone()));
        Self::with_oracle(config, db, oracle)
    }

    /// 使用指定的授权实现构造状态
    pub fn with_oracle(
        config: AppConfig,
        db: sqlx::PgPool,
        oracle: Arc<dyn AuthorizationOracle>,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let filter_builder = FilterBuilder::new(&config.pagination);

        Ok(Self {
            services: Arc::new(ServiceRepository::new(db.clone())),
            templates: Arc::new(TemplateRepository::new(db.clone())),
            reorder: Arc::new(ReorderCoordinator::new(db.clone())),
            oracle,
            jwt_service,
            filter_builder,
            config,
            db,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签只使用静态字符串
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            _ => "OTHER",
        };
        let status_class = match status {
            200..=299 => "2xx",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        let trace_id = extract_or_generate_trace_id(&headers);
        assert_eq!(trace_id, "test-trace-123");

        let headers = HeaderMap::new();
        let trace_id = extract_or_generate_trace_id(&headers);
        assert!(!trace_id.is_empty());
        assert_ne!(trace_id, "test-trace-123");
    }

    #[test]
    fn test_empty_trace_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "".parse().unwrap());

        assert!(!extract_or_generate_trace_id(&headers).is_empty());
    }
}
