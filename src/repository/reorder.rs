//! 服务排序批量更新
//!
//! 一次请求只执行一条 UPDATE 语句，批次内的记录要么全部更新，要么全部不变。

use crate::{error::AppError, models::service::OrderUpdate};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;

/// 单批次上限，每对占用三个绑定参数
pub const MAX_REORDER_BATCH: usize = 1000;

/// 写入前校验批次
pub fn validate_batch(orders: &[OrderUpdate]) -> Result<(), AppError> {
    if orders.is_empty() {
        return Err(AppError::bad_request("order list must not be empty"));
    }
    if orders.len() > MAX_REORDER_BATCH {
        return Err(AppError::BadRequest(format!(
            "order list exceeds {} entries",
            MAX_REORDER_BATCH
        )));
    }

    // CASE 只取第一个匹配分支，同一 id 出现两次时后者会被静默忽略
    let mut seen = HashSet::with_capacity(orders.len());
    if let Some(dup) = orders.iter().find(|o| !seen.insert(o.id)) {
        return Err(AppError::BadRequest(format!(
            "service {} appears more than once in order list",
            dup.id
        )));
    }
    Ok(())
}

/// `UPDATE services SET order_id = CASE id WHEN $1 THEN $2 ... END WHERE id IN (...)`
pub fn build_reorder_query(orders: &[OrderUpdate]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE services SET order_id = CASE id");
    for order in orders {
        qb.push(" WHEN ");
        qb.push_bind(order.id);
        qb.push(" THEN ");
        qb.push_bind(order.order_id);
    }
    qb.push(" END WHERE id IN (");

    let mut ids = qb.separated(", ");
    for order in orders {
        ids.push_bind(order.id);
    }
    ids.push_unseparated(")");

    qb
}

pub struct ReorderCoordinator {
    db: PgPool,
}

impl ReorderCoordinator {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 批量更新排序值，返回受影响的行数
    ///
    /// 批次外的记录不受影响；允许重复的排序值，不做重新编号。
    pub async fn update_orders(&self, orders: &[OrderUpdate]) -> Result<u64, AppError> {
        validate_batch(orders)?;

        let result = build_reorder_query(orders).build().execute(&self.db).await?;

        tracing::info!(
            requested = orders.len(),
            updated = result.rows_affected(),
            "Service orders updated"
        );

        Ok(result.rows_affected())
    }
}
