//! Service domain models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DNS-1035 label：服务名最终会成为集群内的服务名
pub static SERVICE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").expect("valid service name regex"));

/// Service record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub meta_data: String,
    pub app_id: i64,
    pub description: Option<String>,
    pub order_id: i64,
    #[sqlx(rename = "creator")]
    pub user: String,
    pub deleted: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Create / update service request
///
/// id、user、createTime、updateTime 不在请求体中接收，由服务端维护。
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[validate(
        length(min = 1, max = 63),
        regex(path = *SERVICE_NAME_RE, message = "name must be a DNS-1035 label")
    )]
    pub name: String,
    #[serde(default)]
    pub meta_data: String,
    #[validate(range(min = 1, message = "appId is required"))]
    pub app_id: i64,
    #[validate(length(max = 512))]
    pub description: Option<String>,
    #[serde(default)]
    pub order_id: i64,
    /// 仅更新时生效，用于通过常规更新恢复软删除记录
    #[serde(default)]
    pub deleted: bool,
}

/// Id/name projection used by selection lists
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceName {
    pub id: i64,
    pub name: String,
}

/// One entry of a batch reorder request
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub id: i64,
    pub order_id: i64,
}
