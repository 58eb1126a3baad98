//! 服务模版的 HTTP 处理器
//!
//! 模版本身不记录应用，权限按所属服务的应用检查。

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{authorize, ok, DeleteQuery};
use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::template::TemplateRequest,
    query::{ListQuery, VisibilityScope},
    repository::TemplateRepository,
    services::{Action, ResourceType},
};

/// 解析模版归属的应用；服务已被物理删除的模版只有管理员可以操作
async fn template_apps(state: &AppState, auth: &AuthContext, id: i64) -> Result<Vec<i64>, AppError> {
    match state.templates.template_app(id).await? {
        Some(app_id) => Ok(vec![app_id]),
        None if auth.admin => Ok(Vec::new()),
        None => Err(AppError::NotFound(format!("service template {}", id))),
    }
}

/// 请求体中服务所属的应用
async fn service_app(state: &AppState, service_id: i64) -> Result<i64, AppError> {
    state
        .templates
        .owning_app(service_id)
        .await?
        .ok_or_else(|| AppError::bad_request("service not found"))
}

/// 分页列出模版
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(app_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Read).await?;

    let param = state.filter_builder.build_templates(&query, app_id);
    let param = VisibilityScope::apply(
        param,
        app_id,
        state.oracle.visibility(&auth, ResourceType::Service),
    );

    let (total, templates) = state
        .templates
        .list(&param)
        .await
        .inspect_err(|e| tracing::error!(app_id, error = %e, "Failed to list service templates"))?;

    Ok(ok(param.page(total, templates)))
}

/// 创建模版
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(app_id): Path<i64>,
    body: Result<Json<TemplateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    TemplateRepository::check_request(&req)
        .inspect_err(|e| tracing::warn!(name = %req.name, error = %e, "Rejected service template"))?;

    authorize(&state, &auth, &[app_id], Action::Create).await?;
    let owner = service_app(&state, req.service_id).await?;
    authorize(&state, &auth, &[owner], Action::Create).await?;

    let template = state
        .templates
        .add(&req, &auth.username)
        .await
        .inspect_err(|e| tracing::error!(name = %req.name, error = %e, "Failed to create service template"))?;

    tracing::info!(
        template_id = template.id,
        service_id = template.service_id,
        user = %auth.username,
        "Service template created"
    );

    Ok((StatusCode::CREATED, ok(template)))
}

/// 获取模版详情
pub async fn get(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Read).await?;

    let template = state
        .templates
        .get_by_id(id)
        .await
        .inspect_err(|e| tracing::error!(template_id = id, error = %e, "Failed to get service template"))?;

    let owner = service_app(&state, template.service_id).await?;
    authorize(&state, &auth, &[owner], Action::Read).await?;

    Ok(ok(template))
}

/// 更新模版
pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
    body: Result<Json<TemplateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    TemplateRepository::check_request(&req)
        .inspect_err(|e| tracing::warn!(template_id = id, error = %e, "Rejected service template"))?;

    authorize(&state, &auth, &[app_id], Action::Update).await?;
    let mut apps = template_apps(&state, &auth, id).await?;
    apps.push(service_app(&state, req.service_id).await?);
    authorize(&state, &auth, &apps, Action::Update).await?;

    let template = state
        .templates
        .update_by_id(id, &req)
        .await
        .inspect_err(|e| tracing::error!(template_id = id, error = %e, "Failed to update service template"))?;

    tracing::info!(template_id = id, user = %auth.username, "Service template updated");

    Ok(ok(template))
}

/// 恢复软删除的模版
pub async fn restore(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Update).await?;
    let apps = template_apps(&state, &auth, id).await?;
    authorize(&state, &auth, &apps, Action::Update).await?;

    let template = state
        .templates
        .restore_by_id(id)
        .await
        .inspect_err(|e| tracing::error!(template_id = id, error = %e, "Failed to restore service template"))?;

    tracing::info!(template_id = id, user = %auth.username, "Service template restored");

    Ok(ok(template))
}

/// 删除模版（默认逻辑删除）
pub async fn delete(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path((app_id, id)): Path<(i64, i64)>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &auth, &[app_id], Action::Delete).await?;
    let apps = template_apps(&state, &auth, id).await?;
    authorize(&state, &auth, &apps, Action::Delete).await?;

    let logical = query.logical();
    state
        .templates
        .delete_by_id(id, logical)
        .await
        .inspect_err(|e| tracing::error!(template_id = id, logical, error = %e, "Failed to delete service template"))?;

    tracing::info!(template_id = id, logical, user = %auth.username, "Service template deleted");

    Ok(ok("ok!"))
}
