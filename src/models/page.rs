//! 分页响应

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page_no: i64,
    pub page_size: i64,
    pub total_page: i64,
    pub total_count: i64,
    pub list: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(page_no: i64, page_size: i64, total_count: i64, list: Vec<T>) -> Self {
        let total_page = if page_size > 0 {
            (total_count + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            page_no,
            page_size,
            total_page,
            total_count,
            list,
        }
    }
}
