//! 将 QueryParam 渲染为参数化 SQL
//!
//! 所有调用方输入都通过 push_bind 绑定，拼接进语句的只有固定的表名、列名。

use sqlx::{Postgres, QueryBuilder};

use super::filter::{Filter, QueryParam, Sort};

/// 服务类发布记录的 type 值
pub const PUBLISH_TYPE_SERVICE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Services,
    ServiceTemplates,
}

impl Table {
    pub fn alias(&self) -> &'static str {
        match self {
            Table::Services => "s",
            Table::ServiceTemplates => "t",
        }
    }

    fn from_clause(&self) -> &'static str {
        match self {
            Table::Services => "services s",
            Table::ServiceTemplates => "service_templates t",
        }
    }

    /// 记录所属应用的列
    fn app_column(&self) -> &'static str {
        match self {
            Table::Services => "s.app_id",
            Table::ServiceTemplates => "vs.app_id",
        }
    }
}

/// 构造 LIKE 子串匹配模式，转义通配符
pub fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// SELECT {columns} FROM ... [JOIN ...] WHERE ... [GROUP BY ...]
pub fn select<'a>(table: Table, columns: &str, param: &QueryParam) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", columns, table.from_clause()));
    push_body(&mut qb, table, param);
    qb
}

/// 与 select 条件一致的计数语句；存在分组键时按分组后的行数计数
pub fn count<'a>(table: Table, param: &QueryParam) -> QueryBuilder<'a, Postgres> {
    if param.group_by.is_empty() {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table.from_clause()));
        push_body(&mut qb, table, param);
        qb
    } else {
        let mut qb = QueryBuilder::new(format!(
            "SELECT COUNT(*) FROM (SELECT {}.id FROM {}",
            table.alias(),
            table.from_clause()
        ));
        push_body(&mut qb, table, param);
        qb.push(") grouped");
        qb
    }
}

/// ORDER BY，非 id 列追加 id 作为稳定排序
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, table: Table, sort: Sort) {
    let alias = table.alias();
    let direction = if sort.descending { "DESC" } else { "ASC" };

    qb.push(format!(" ORDER BY {}.{} {}", alias, sort.column.column(), direction));
    if sort.column.column() != "id" {
        qb.push(format!(", {}.id {}", alias, direction));
    }
}

/// LIMIT / OFFSET
pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, param: &QueryParam) {
    qb.push(" LIMIT ");
    qb.push_bind(param.limit());
    qb.push(" OFFSET ");
    qb.push_bind(param.offset());
}

fn push_body(qb: &mut QueryBuilder<'_, Postgres>, table: Table, param: &QueryParam) {
    let alias = table.alias();

    if param.visibility_scoped() {
        if table == Table::ServiceTemplates {
            qb.push(" JOIN services vs ON vs.id = t.service_id");
        }
        qb.push(format!(
            " JOIN app_users au ON au.app_id = {} \
             JOIN group_permissions gp ON gp.group_id = au.group_id \
             JOIN permissions p ON p.id = gp.permission_id",
            table.app_column()
        ));
    }

    qb.push(" WHERE 1=1");

    for filter in &param.filters {
        match filter {
            Filter::NameContains(name) => {
                qb.push(format!(" AND {}.name LIKE ", alias));
                qb.push_bind(like_pattern(name));
                qb.push(" ESCAPE '\\'");
            }
            Filter::Deleted(deleted) => {
                qb.push(format!(" AND {}.deleted = ", alias));
                qb.push_bind(*deleted);
            }
            Filter::AppId(app_id) => match table {
                Table::Services => {
                    qb.push(" AND s.app_id = ");
                    qb.push_bind(*app_id);
                }
                Table::ServiceTemplates => {
                    qb.push(
                        " AND EXISTS (SELECT 1 FROM services owner \
                         WHERE owner.id = t.service_id AND owner.app_id = ",
                    );
                    qb.push_bind(*app_id);
                    qb.push(")");
                }
            },
            Filter::ServiceId(service_id) => match table {
                Table::Services => {
                    qb.push(" AND s.id = ");
                    qb.push_bind(*service_id);
                }
                Table::ServiceTemplates => {
                    qb.push(" AND t.service_id = ");
                    qb.push_bind(*service_id);
                }
            },
            Filter::Online => {
                let column = match table {
                    Table::Services => "ps.resource_id",
                    Table::ServiceTemplates => "ps.template_id",
                };
                qb.push(format!(
                    " AND EXISTS (SELECT 1 FROM publish_status ps WHERE {} = {}.id AND ps.type = ",
                    column, alias
                ));
                qb.push_bind(PUBLISH_TYPE_SERVICE);
                qb.push(")");
            }
            Filter::VisibleTo {
                user_id,
                permission,
            } => {
                qb.push(" AND au.user_id = ");
                qb.push_bind(*user_id);
                qb.push(" AND p.name = ");
                qb.push_bind(permission.clone());
            }
        }
    }

    if !param.group_by.is_empty() {
        let keys: Vec<String> = param
            .group_by
            .iter()
            .map(|key| format!("{}.{}", alias, key))
            .collect();
        qb.push(format!(" GROUP BY {}", keys.join(", ")));
    }
}
