//! 列表查询：请求参数规范化、可见性约束与 SQL 渲染

pub mod filter;
pub mod sql;
pub mod visibility;

pub use filter::{Filter, FilterBuilder, ListQuery, NamesQuery, QueryParam, Sort, SortColumn};
pub use visibility::VisibilityScope;
