//! 权限检查服务
//!
//! 权限记录由外部权限系统维护：用户通过 app_users 在某个应用下加入组，
//! 组通过 group_permissions 持有形如 `SERVICE_READ` 的权限。

use crate::{auth::AuthContext, error::AppError};
use async_trait::async_trait;
use sqlx::PgPool;

/// 受控资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Service,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Service => "SERVICE",
        }
    }
}

/// 操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "READ",
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }
}

/// 权限名，例如 `SERVICE_READ`
pub fn permission_name(resource: ResourceType, action: Action) -> String {
    format!("{}_{}", resource.as_str(), action.as_str())
}

/// 列表查询的可见范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// 不追加任何可见性约束
    Unrestricted,
    /// 只能看到用户所在组持有该权限的应用下的记录
    Granted { user_id: i64, permission: String },
}

/// 授权判定
#[async_trait]
pub trait AuthorizationOracle: Send + Sync {
    /// 判断调用者能否在应用 `app_id` 下对资源执行操作。
    /// `app_id == 0` 表示请求不限定应用。
    async fn check(
        &self,
        principal: &AuthContext,
        app_id: i64,
        resource: ResourceType,
        action: Action,
    ) -> Result<bool, AppError>;

    /// 列表查询的可见范围
    fn visibility(&self, principal: &AuthContext, resource: ResourceType) -> Visibility {
        if principal.admin {
            Visibility::Unrestricted
        } else {
            Visibility::Granted {
                user_id: principal.user_id,
                permission: permission_name(resource, Action::Read),
            }
        }
    }

    /// 检查权限，如果无权限则返回错误
    async fn require(
        &self,
        principal: &AuthContext,
        app_id: i64,
        resource: ResourceType,
        action: Action,
    ) -> Result<(), AppError> {
        if !self.check(principal, app_id, resource, action).await? {
            tracing::warn!(
                user_id = principal.user_id,
                app_id = app_id,
                resource = resource.as_str(),
                action = action.as_str(),
                "Permission denied"
            );
            return Err(AppError::Forbidden);
        }

        Ok(())
    }
}

/// 基于 PostgreSQL 权限表的授权实现
pub struct PermissionService {
    db: PgPool,
}

impl PermissionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 用户在应用下是否持有指定权限
    pub async fn has_app_permission(
        &self,
        user_id: i64,
        app_id: i64,
        permission: &str,
    ) -> Result<bool, AppError> {
        let granted: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM app_users au
                JOIN group_permissions gp ON gp.group_id = au.group_id
                JOIN permissions p ON p.id = gp.permission_id
                WHERE au.app_id = $1 AND au.user_id = $2 AND p.name = $3
            )
            "#,
        )
        .bind(app_id)
        .bind(user_id)
        .bind(permission)
        .fetch_one(&self.db)
        .await?;

        Ok(granted)
    }
}

#[async_trait]
impl AuthorizationOracle for PermissionService {
    async fn check(
        &self,
        principal: &AuthContext,
        app_id: i64,
        resource: ResourceType,
        action: Action,
    ) -> Result<bool, AppError> {
        // 管理员拥有全部权限
        if principal.admin {
            return Ok(true);
        }

        // 未限定应用时放行，读取由可见范围约束，写入会针对记录所属应用再次检查
        if app_id == 0 {
            return Ok(true);
        }

        self.has_app_permission(principal.user_id, app_id, &permission_name(resource, action))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn caller(admin: bool) -> AuthContext {
        AuthContext {
            user_id: 7,
            username: "alice".to_string(),
            admin,
        }
    }

    #[test]
    fn test_permission_name() {
        assert_eq!(permission_name(ResourceType::Service, Action::Read), "SERVICE_READ");
        assert_eq!(permission_name(ResourceType::Service, Action::Delete), "SERVICE_DELETE");
    }

    #[test]
    fn test_visibility_for_admin_is_unrestricted() {
        assert_eq!(DenyAll.visibility(&caller(true), ResourceType::Service), Visibility::Unrestricted);
    }

    #[test]
    fn test_visibility_for_member_requires_read() {
        assert_eq!(
            DenyAll.visibility(&caller(false), ResourceType::Service),
            Visibility::Granted {
                user_id: 7,
                permission: "SERVICE_READ".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_require_maps_denial_to_forbidden() {
        let result = DenyAll
            .require(&caller(false), 3, ResourceType::Service, Action::Update)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_and_unscoped_checks_skip_database() {
        // 惰性连接池：若走到查询会因连接失败而报错
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://nobody@127.0.0.1:1/none")
            .unwrap();
        let service = PermissionService::new(pool);

        assert!(service
            .check(&caller(true), 3, ResourceType::Service, Action::Delete)
            .await
            .unwrap());
        assert!(service
            .check(&caller(false), 0, ResourceType::Service, Action::Read)
            .await
            .unwrap());
    }
}
