//! 列表查询的可见性约束

use super::filter::{Filter, QueryParam};
use crate::services::Visibility;

/// 为非管理员调用者追加可见性约束
pub struct VisibilityScope;

impl VisibilityScope {
    /// `app_id != 0` 表示请求已限定到一个应用，该应用的读权限已由授权检查确认，
    /// 此时只保留 appId 相等条件。否则按权限组追加可见性约束，并以 id 去重。
    pub fn apply(mut param: QueryParam, app_id: i64, visibility: Visibility) -> QueryParam {
        if app_id != 0 {
            if !param.filters.contains(&Filter::AppId(app_id)) {
                param.filters.push(Filter::AppId(app_id));
            }
            return param;
        }

        match visibility {
            Visibility::Unrestricted => param,
            Visibility::Granted {
                user_id,
                permission,
            } => {
                param.filters.push(Filter::VisibleTo {
                    user_id,
                    permission,
                });
                if !param.group_by.contains(&"id") {
                    param.group_by.push("id");
                }
                param
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::query::filter::{FilterBuilder, ListQuery};

    fn base(app_id: i64) -> QueryParam {
        FilterBuilder::new(&PaginationConfig::default()).build_services(&ListQuery::default(), app_id)
    }

    fn member() -> Visibility {
        Visibility::Granted {
            user_id: 42,
            permission: "SERVICE_READ".to_string(),
        }
    }

    #[test]
    fn test_admin_unscoped_adds_nothing() {
        let param = VisibilityScope::apply(base(0), 0, Visibility::Unrestricted);

        assert!(param.filters.is_empty());
        assert!(param.group_by.is_empty());
    }

    #[test]
    fn test_member_unscoped_gets_visibility_predicate() {
        let param = VisibilityScope::apply(base(0), 0, member());

        assert_eq!(
            param.filters,
            vec![Filter::VisibleTo {
                user_id: 42,
                permission: "SERVICE_READ".to_string()
            }]
        );
        assert_eq!(param.group_by, vec!["id"]);
        assert!(param.visibility_scoped());
    }

    #[test]
    fn test_app_scoped_request_only_filters_app() {
        let param = VisibilityScope::apply(base(7), 7, member());

        assert_eq!(param.filters, vec![Filter::AppId(7)]);
        assert!(param.group_by.is_empty());
    }

    #[test]
    fn test_app_filter_added_when_missing() {
        let param = VisibilityScope::apply(base(0), 9, Visibility::Unrestricted);
        assert_eq!(param.filters, vec![Filter::AppId(9)]);
    }

    #[test]
    fn test_other_filters_cannot_widen_visibility() {
        let query = ListQuery {
            name: Some("svc".to_string()),
            deleted: Some(true),
            ..Default::default()
        };
        let param = FilterBuilder::new(&PaginationConfig::default()).build_services(&query, 0);
        let param = VisibilityScope::apply(param, 0, member());

        assert_eq!(param.filters.len(), 3);
        assert!(param.visibility_scoped());
    }
}
