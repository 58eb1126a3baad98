//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

use crate::{auth::jwt_auth_middleware, handlers, middleware::AppState};

const SERVICES: &str = "/api/v1/apps/{app_id}/services";

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 服务与模版（需要认证）
    let service_routes = Router::new()
        .route(
            &format!("{SERVICES}/names"),
            get(handlers::service::list_names),
        )
        .route(
            SERVICES,
            get(handlers::service::list).post(handlers::service::create),
        )
        .route(
            &format!("{SERVICES}/updateorders"),
            put(handlers::service::update_orders),
        )
        .route(
            &format!("{SERVICES}/{{id}}"),
            get(handlers::service::get)
                .put(handlers::service::update)
                .delete(handlers::service::delete),
        )
        .route(
            &format!("{SERVICES}/{{id}}/restore"),
            put(handlers::service::restore),
        )
        .route(
            &format!("{SERVICES}/tpls"),
            get(handlers::service_template::list).post(handlers::service_template::create),
        )
        .route(
            &format!("{SERVICES}/tpls/{{id}}"),
            get(handlers::service_template::get)
                .put(handlers::service_template::update)
                .delete(handlers::service_template::delete),
        )
        .route(
            &format!("{SERVICES}/tpls/{{id}}/restore"),
            put(handlers::service_template::restore),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(service_routes)
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
