//! 服务管理的 HTTP 处理器

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::{authorize, ok, DeleteQuery};
use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::service::{OrderUpdate, ServiceRequest},
    query::{ListQuery, NamesQuery, VisibilityScope},
    repository::validate_batch,
    services::{Action, ResourceType},
};

/// 列出服务名称（默认只含未删除的服务）
pub async fn list_names(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(app_id): Path<i64>,
    Query(query): Query<NamesQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Read).await?;

    let param = state.filter_builder.build_names(&query, app_id);
    let param = VisibilityScope::apply(
        param,
        app_id,
        state.oracle.visibility(&auth, ResourceType::Service),
    );

    let names = state
        .services
        .list_names(&param)
        .await
        .inspect_err(|e| tracing::error!(app_id, error = %e, "Failed to list service names"))?;

    Ok(ok(names))
}

/// 分页列出服务
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(app_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Read).await?;

    let param = state.filter_builder.build_services(&query, app_id);
    let param = VisibilityScope::apply(
        param,
        app_id,
        state.oracle.visibility(&auth, ResourceType::Service),
    );

    let (total, services) = state
        .services
        .list(&param)
        .await
        .inspect_err(|e| tracing::error!(app_id, error = %e, "Failed to list services"))?;

    Ok(ok(param.page(total, services)))
}

/// 创建服务
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(app_id): Path<i64>,
    body: Result<Json<ServiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    req.validate()?;

    authorize(&state, &auth, &[app_id, req.app_id], Action::Create).await?;

    let service = state
        .services
        .add(&req, &auth.username)
        .await
        .inspect_err(|e| tracing::error!(name = %req.name, error = %e, "Failed to create service"))?;

    tracing::info!(
        service_id = service.id,
        name = %service.name,
        app_id = service.app_id,
        user = %auth.username,
        "Service created"
    );

    Ok((StatusCode::CREATED, ok(service)))
}

/// 获取服务详情
pub async fn get(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Read).await?;

    let service = state
        .services
        .get_by_id(id)
        .await
        .inspect_err(|e| tracing::error!(service_id = id, error = %e, "Failed to get service"))?;

    authorize(&state, &auth, &[service.app_id], Action::Read).await?;

    Ok(ok(service))
}

/// 更新服务
///
/// 需要同时拥有原应用与目标应用的更新权限。
pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
    body: Result<Json<ServiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    req.validate()?;

    authorize(&state, &auth, &[app_id, req.app_id], Action::Update).await?;

    let existing = state.services.get_by_id(id).await?;
    authorize(&state, &auth, &[existing.app_id], Action::Update).await?;

    let service = state
        .services
        .update_by_id(id, &req)
        .await
        .inspect_err(|e| tracing::error!(service_id = id, error = %e, "Failed to update service"))?;

    tracing::info!(service_id = id, user = %auth.username, "Service updated");

    Ok(ok(service))
}

/// 恢复软删除的服务
pub async fn restore(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Update).await?;

    let existing = state.services.get_by_id(id).await?;
    authorize(&state, &auth, &[existing.app_id], Action::Update).await?;

    let service = state
        .services
        .restore_by_id(id)
        .await
        .inspect_err(|e| tracing::error!(service_id = id, error = %e, "Failed to restore service"))?;

    tracing::info!(service_id = id, user = %auth.username, "Service restored");

    Ok(ok(service))
}

/// 批量更新服务排序
pub async fn update_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(app_id): Path<i64>,
    body: Result<Json<Vec<OrderUpdate>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(orders) = body?;
    // 空批次或超限批次在任何数据库访问之前拒绝
    validate_batch(&orders)?;

    authorize(&state, &auth, &[app_id], Action::Update).await?;

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let app_ids = state.services.app_ids(&ids).await?;
    authorize(&state, &auth, &app_ids, Action::Update).await?;

    let updated = state
        .reorder
        .update_orders(&orders)
        .await
        .inspect_err(|e| tracing::error!(count = orders.len(), error = %e, "Failed to update service orders"))?;

    Ok(ok(json!({ "updated": updated })))
}

/// 删除服务（默认逻辑删除）
pub async fn delete(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Delete).await?;

    let existing = state.services.get_by_id(id).await?;
    authorize(&state, &auth, &[existing.app_id], Action::Delete).await?;

    let logical = query.logical();
    state
        .services
        .delete_by_id(id, logical)
        .await
        .inspect_err(|e| tracing::error!(service_id = id, logical, error = %e, "Failed to delete service"))?;

    tracing::info!(service_id = id, logical, user = %auth.username, "Service deleted");

    Ok(ok("ok!"))
}
