//! 列表请求参数 → 过滤条件与分页窗口

use serde::Deserialize;

use crate::{config::PaginationConfig, models::page::Page};

/// 单个过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// 名称子串匹配（区分大小写）
    NameContains(String),
    Deleted(bool),
    AppId(i64),
    ServiceId(i64),
    /// 仅保留已有发布记录的模版
    Online,
    /// 仅保留调用者有读权限的应用下的记录
    VisibleTo { user_id: i64, permission: String },
}

/// 允许排序的列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    OrderId,
    CreateTime,
    UpdateTime,
}

impl SortColumn {
    fn parse(field: &str) -> Option<Self> {
        match field {
            "id" => Some(SortColumn::Id),
            "name" => Some(SortColumn::Name),
            "orderId" => Some(SortColumn::OrderId),
            "createTime" => Some(SortColumn::CreateTime),
            "updateTime" => Some(SortColumn::UpdateTime),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Name => "name",
            SortColumn::OrderId => "order_id",
            SortColumn::CreateTime => "create_time",
            SortColumn::UpdateTime => "update_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            descending: true,
        }
    }
}

impl Sort {
    /// 解析 `sortby`：字段名，前缀 `-` 表示倒序；未知字段回退到默认排序
    pub fn parse(sortby: Option<&str>) -> Self {
        let Some(raw) = sortby.map(str::trim).filter(|s| !s.is_empty()) else {
            return Sort::default();
        };

        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field, true),
            None => (raw, false),
        };

        match SortColumn::parse(field) {
            Some(column) => Sort { column, descending },
            None => Sort::default(),
        }
    }
}

/// 规范化后的查询描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub filters: Vec<Filter>,
    pub page_no: i64,
    pub page_size: i64,
    pub sort: Sort,
    /// 去重分组键（按权限组关联时同一记录可能出现多次）
    pub group_by: Vec<&'static str>,
}

impl QueryParam {
    pub fn offset(&self) -> i64 {
        (self.page_no - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn visibility_scoped(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::VisibleTo { .. }))
    }

    pub fn page<T>(&self, total: i64, list: Vec<T>) -> Page<T> {
        Page::new(self.page_no, self.page_size, total, list)
    }
}

/// 列表查询参数（服务与模版共用）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page_no: Option<i64>,
    pub page_size: Option<i64>,
    pub name: Option<String>,
    pub deleted: Option<bool>,
    pub service_id: Option<i64>,
    pub is_online: Option<bool>,
    pub sortby: Option<String>,
}

/// 名称列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct NamesQuery {
    pub deleted: Option<bool>,
}

/// 过滤条件构造器
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    default_page_size: i64,
    max_page_size: i64,
}

impl FilterBuilder {
    pub fn new(config: &PaginationConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// 服务列表
    pub fn build_services(&self, query: &ListQuery, app_id: i64) -> QueryParam {
        let mut filters = self.common_filters(query);
        if app_id != 0 {
            filters.push(Filter::AppId(app_id));
        }
        self.param(query, filters)
    }

    /// 模版列表
    pub fn build_templates(&self, query: &ListQuery, app_id: i64) -> QueryParam {
        let mut filters = self.common_filters(query);
        if let Some(service_id) = query.service_id.filter(|id| *id != 0) {
            filters.push(Filter::ServiceId(service_id));
        }
        if app_id != 0 {
            filters.push(Filter::AppId(app_id));
        }
        if query.is_online == Some(true) {
            filters.push(Filter::Online);
        }
        self.param(query, filters)
    }

    /// 名称列表：未指定 deleted 时只列出未删除的记录
    pub fn build_names(&self, query: &NamesQuery, app_id: i64) -> QueryParam {
        let mut filters = vec![Filter::Deleted(query.deleted.unwrap_or(false))];
        if app_id != 0 {
            filters.push(Filter::AppId(app_id));
        }

        QueryParam {
            filters,
            page_no: 1,
            page_size: self.max_page_size,
            sort: Sort {
                column: SortColumn::OrderId,
                descending: false,
            },
            group_by: Vec::new(),
        }
    }

    fn common_filters(&self, query: &ListQuery) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
            filters.push(Filter::NameContains(name.to_string()));
        }
        // 未指定 deleted 时同时列出已删除与未删除的记录
        if let Some(deleted) = query.deleted {
            filters.push(Filter::Deleted(deleted));
        }
        filters
    }

    fn param(&self, query: &ListQuery, filters: Vec<Filter>) -> QueryParam {
        let page_size = query
            .page_size
            .filter(|n| *n > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);
        // 超出可寻址范围的页码收敛到最后一个合法页，偏移量不会溢出
        let page_no = query
            .page_no
            .filter(|n| *n > 0)
            .unwrap_or(1)
            .min(i64::MAX / page_size);

        QueryParam {
            filters,
            page_no,
            page_size,
            sort: Sort::parse(query.sortby.as_deref()),
            group_by: Vec::new(),
        }
    }
}
