//! Service template repository (服务模版数据访问)
//!
//! service_templates.service_id 没有外键约束，父服务是否存在在写入前显式检查。

use crate::{
    error::AppError,
    models::{
        descriptor::parse_service_descriptor,
        template::{ServiceTemplate, TemplateRequest},
    },
    query::{sql, sql::Table, QueryParam},
};
use sqlx::PgPool;
use validator::Validate;

/// 列表与详情查询的列，附带 is_online
fn template_columns() -> String {
    format!(
        "t.*, EXISTS (SELECT 1 FROM publish_status ps \
         WHERE ps.template_id = t.id AND ps.type = {}) AS is_online",
        sql::PUBLISH_TYPE_SERVICE
    )
}

pub struct TemplateRepository {
    db: PgPool,
}

impl TemplateRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 校验请求字段与模版载荷，不访问数据库
    pub fn check_request(req: &TemplateRequest) -> Result<(), AppError> {
        req.validate()?;
        parse_service_descriptor(&req.template)?;
        Ok(())
    }

    // ==================== Queries ====================

    /// 分页列出模版，返回（总数，当前页）
    pub async fn list(&self, param: &QueryParam) -> Result<(i64, Vec<ServiceTemplate>), AppError> {
        let total: i64 = sql::count(Table::ServiceTemplates, param)
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let columns = template_columns();
        let mut qb = sql::select(Table::ServiceTemplates, &columns, param);
        sql::push_order(&mut qb, Table::ServiceTemplates, param.sort);
        sql::push_page(&mut qb, param);

        let templates = qb
            .build_query_as::<ServiceTemplate>()
            .fetch_all(&self.db)
            .await?;
        Ok((total, templates))
    }

    /// 获取模版；所属服务不存在时同样视为不存在
    pub async fn get_by_id(&self, id: i64) -> Result<ServiceTemplate, AppError> {
        let template = sqlx::query_as::<_, ServiceTemplate>(&format!(
            "SELECT {} FROM service_templates t WHERE t.id = $1",
            template_columns()
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("service template {}", id)))?;

        if self.owning_app(template.service_id).await?.is_none() {
            return Err(AppError::NotFound(format!("service {}", template.service_id)));
        }

        Ok(template)
    }

    /// 服务所属的应用；服务不存在时返回 None
    pub async fn owning_app(&self, service_id: i64) -> Result<Option<i64>, AppError> {
        let app_id = sqlx::query_scalar::<_, i64>("SELECT app_id FROM services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(app_id)
    }

    /// 模版经由所属服务归属的应用
    ///
    /// 模版不存在返回 NotFound；模版存在但服务已被物理删除时返回 Ok(None)。
    pub async fn template_app(&self, id: i64) -> Result<Option<i64>, AppError> {
        let row: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            SELECT s.app_id
            FROM service_templates t
            LEFT JOIN services s ON s.id = t.service_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(|(app_id,)| app_id)
            .ok_or_else(|| AppError::NotFound(format!("service template {}", id)))
    }

    pub async fn service_exists(&self, service_id: i64) -> Result<bool, AppError> {
        Ok(self.owning_app(service_id).await?.is_some())
    }

    async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM service_templates WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        Ok(exists)
    }

    async fn require_service(&self, service_id: i64) -> Result<(), AppError> {
        if !self.service_exists(service_id).await? {
            return Err(AppError::bad_request("service not found"));
        }
        Ok(())
    }

    // ==================== Mutations ====================

    /// 创建模版：载荷与父服务均校验通过后才写入
    pub async fn add(&self, req: &TemplateRequest, user: &str) -> Result<ServiceTemplate, AppError> {
        Self::check_request(req)?;
        self.require_service(req.service_id).await?;

        let template = sqlx::query_as::<_, ServiceTemplate>(
            r#"
            INSERT INTO service_templates (name, template, service_id, description, creator, deleted)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.template)
        .bind(req.service_id)
        .bind(&req.description)
        .bind(user)
        .fetch_one(&self.db)
        .await?;

        Ok(template)
    }

    /// 更新模版
    pub async fn update_by_id(
        &self,
        id: i64,
        req: &TemplateRequest,
    ) -> Result<ServiceTemplate, AppError> {
        Self::check_request(req)?;
        if !self.exists(id).await? {
            return Err(AppError::NotFound(format!("service template {}", id)));
        }
        self.require_service(req.service_id).await?;

        let template = sqlx::query_as::<_, ServiceTemplate>(
            r#"
            UPDATE service_templates
            SET name = $1, template = $2, service_id = $3, description = $4,
                deleted = $5, update_time = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.template)
        .bind(req.service_id)
        .bind(&req.description)
        .bind(req.deleted)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        template.ok_or_else(|| AppError::NotFound(format!("service template {}", id)))
    }

    /// 删除模版：logical 为 true 时只标记 deleted
    pub async fn delete_by_id(&self, id: i64, logical: bool) -> Result<(), AppError> {
        if !self.exists(id).await? {
            return Err(AppError::NotFound(format!("service template {}", id)));
        }

        let result = if logical {
            sqlx::query(
                "UPDATE service_templates SET deleted = TRUE, update_time = NOW() WHERE id = $1",
            )
            .bind(id)
            .execute(&self.db)
            .await?
        } else {
            sqlx::query("DELETE FROM service_templates WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("service template {}", id)));
        }

        Ok(())
    }

    /// 恢复软删除的模版
    pub async fn restore_by_id(&self, id: i64) -> Result<ServiceTemplate, AppError> {
        let template = sqlx::query_as::<_, ServiceTemplate>(
            "UPDATE service_templates SET deleted = FALSE, update_time = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        template.ok_or_else(|| AppError::NotFound(format!("service template {}", id)))
    }
}
