//! Service repository (服务数据访问)

use crate::{
    error::AppError,
    models::service::{Service, ServiceName, ServiceRequest},
    query::{sql, sql::Table, QueryParam},
};
use sqlx::PgPool;

pub struct ServiceRepository {
    db: PgPool,
}

impl ServiceRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Queries ====================

    /// 列出服务的 id 与名称
    pub async fn list_names(&self, param: &QueryParam) -> Result<Vec<ServiceName>, AppError> {
        let mut qb = sql::select(Table::Services, "s.id, s.name", param);
        sql::push_order(&mut qb, Table::Services, param.sort);

        let names = qb.build_query_as::<ServiceName>().fetch_all(&self.db).await?;
        Ok(names)
    }

    /// 分页列出服务，返回（总数，当前页）
    pub async fn list(&self, param: &QueryParam) -> Result<(i64, Vec<Service>), AppError> {
        let total: i64 = sql::count(Table::Services, param)
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = sql::select(Table::Services, "s.*", param);
        sql::push_order(&mut qb, Table::Services, param.sort);
        sql::push_page(&mut qb, param);

        let services = qb.build_query_as::<Service>().fetch_all(&self.db).await?;
        Ok((total, services))
    }

    /// 获取服务
    pub async fn get_by_id(&self, id: i64) -> Result<Service, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("service {}", id)))
    }

    /// 查询一组服务所属的应用（去重）
    pub async fn app_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let app_ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT app_id FROM services WHERE id = ANY($1) ORDER BY app_id",
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(app_ids)
    }

    async fn find(&self, id: i64) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(service)
    }

    // ==================== Mutations ====================

    /// 创建服务
    ///
    /// 创建时间与更新时间由数据库生成，新记录始终为未删除状态。
    pub async fn add(&self, req: &ServiceRequest, user: &str) -> Result<Service, AppError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (name, meta_data, app_id, description, order_id, creator, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.meta_data)
        .bind(req.app_id)
        .bind(&req.description)
        .bind(req.order_id)
        .bind(user)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unknown_app(e.into()))?;

        Ok(service)
    }

    /// 更新服务
    ///
    /// 先确认记录存在；创建者保持不变，更新时间取数据库当前时间。
    pub async fn update_by_id(&self, id: i64, req: &ServiceRequest) -> Result<Service, AppError> {
        self.get_by_id(id).await?;

        let service = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET name = $1, meta_data = $2, app_id = $3, description = $4,
                order_id = $5, deleted = $6, update_time = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.meta_data)
        .bind(req.app_id)
        .bind(&req.description)
        .bind(req.order_id)
        .bind(req.deleted)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| unknown_app(e.into()))?;

        // 检查与写入之间记录可能已被物理删除
        service.ok_or_else(|| AppError::NotFound(format!("service {}", id)))
    }

    /// 删除服务：logical 为 true 时只标记 deleted，重复执行无副作用
    pub async fn delete_by_id(&self, id: i64, logical: bool) -> Result<(), AppError> {
        self.get_by_id(id).await?;

        let result = if logical {
            sqlx::query("UPDATE services SET deleted = TRUE, update_time = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?
        } else {
            sqlx::query("DELETE FROM services WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("service {}", id)));
        }

        Ok(())
    }

    /// 恢复软删除的服务
    pub async fn restore_by_id(&self, id: i64) -> Result<Service, AppError> {
        let service = sqlx::query_as::<_, Service>(
            "UPDATE services SET deleted = FALSE, update_time = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        service.ok_or_else(|| AppError::NotFound(format!("service {}", id)))
    }
}

/// appId 外键冲突视为请求错误
fn unknown_app(e: AppError) -> AppError {
    if e.is_foreign_key_violation() {
        AppError::bad_request("app not found")
    } else {
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_app_passes_other_errors_through() {
        let err = unknown_app(AppError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(err, AppError::Database(_)));

        let err = unknown_app(AppError::not_found("service 1"));
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
