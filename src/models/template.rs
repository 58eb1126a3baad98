//! Service template models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Service template record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTemplate {
    pub id: i64,
    pub name: String,
    /// 结构化的服务描述（JSON 文本），仅做格式校验
    pub template: String,
    pub service_id: i64,
    pub description: Option<String>,
    #[sqlx(rename = "creator")]
    pub user: String,
    pub deleted: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    /// 是否已有发布记录；仅列表与详情查询会计算
    #[sqlx(default)]
    pub is_online: bool,
}

/// Create / update template request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[serde(default)]
    pub template: String,
    #[validate(range(min = 1, message = "serviceId is required"))]
    pub service_id: i64,
    #[validate(length(max = 512))]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_request_defaults() {
        let req: TemplateRequest =
            serde_json::from_str(r#"{"name":"v1","serviceId":3}"#).unwrap();

        assert_eq!(req.service_id, 3);
        assert!(req.template.is_empty());
        assert!(!req.deleted);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_template_request_requires_service() {
        let req: TemplateRequest =
            serde_json::from_str(r#"{"name":"v1","serviceId":0,"template":"{}"}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
