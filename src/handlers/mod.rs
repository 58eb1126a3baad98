//! HTTP 处理器模块

pub mod health;
pub mod service;
pub mod service_template;

use std::collections::BTreeSet;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    services::{Action, ResourceType},
};

/// 成功响应包装：`{"data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { data })
}

/// 删除参数，默认逻辑删除
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub logical: Option<bool>,
}

impl DeleteQuery {
    pub fn logical(&self) -> bool {
        self.logical.unwrap_or(true)
    }
}

/// 对涉及的每个应用检查一次权限
pub(crate) async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    app_ids: &[i64],
    action: Action,
) -> Result<(), AppError> {
    let app_ids: BTreeSet<i64> = app_ids.iter().copied().collect();
    for app_id in app_ids {
        state
            .oracle
            .require(auth, app_id, ResourceType::Service, action)
            .await?;
    }
    Ok(())
}
