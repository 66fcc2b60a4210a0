//! 分页相关的数据结构

use serde::Serialize;

/// 1 起始页码；超出总页数时返回空列表而不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// 数据库 OFFSET 为有符号 64 位整数，超出时截断到 i64::MAX
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.per_page)
            .min(i64::MAX as u64)
    }

    /// 页码是否超出总页数
    pub fn is_past_end(&self, total: u64) -> bool {
        self.page > total_pages(total, self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: total_pages(total, request.per_page),
        }
    }
}
