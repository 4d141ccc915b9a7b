use serde::{Deserialize, Serialize};

use super::DatabaseError;
use crate::filter::error::FilterError;

/// List query parameters shared by every paged endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub fields: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl PageQuery {
    /// Resolved `(limit, page)`. Both must be at least 1; `limit` is capped at
    /// `pagination.max_limit` and the page must not run past `i64` offsets.
    pub fn window(&self) -> Result<(i64, i64), DatabaseError> {
        let pagination = &crate::config::config().pagination;
        let limit = self.limit.unwrap_or(pagination.default_limit);
        let page = self.page.unwrap_or(1);
        if limit < 1 {
            return Err(FilterError::InvalidLimit("limit must be at least 1".to_string()).into());
        }
        if page < 1 {
            return Err(FilterError::InvalidOffset("page must be at least 1".to_string()).into());
        }

        let limit = limit.min(pagination.max_limit);
        if page.checked_mul(limit).is_none() {
            return Err(FilterError::InvalidOffset(format!("page {} is out of range", page)).into());
        }
        Ok((limit, page))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pages {
    pub current: i64,
    pub prev: i64,
    pub has_prev: bool,
    pub next: i64,
    pub has_next: bool,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Items {
    pub limit: i64,
    pub begin: i64,
    pub end: i64,
    pub total: i64,
}

/// One page of documents plus the arithmetic a client needs to navigate
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub pages: Pages,
    pub items: Items,
}

impl<T> Paged<T> {
    pub fn new(data: Vec<T>, total: i64, limit: i64, page: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        let next = page.saturating_add(1);
        let prev = page - 1;

        Self {
            data,
            pages: Pages {
                current: page,
                prev,
                has_prev: prev != 0,
                next,
                has_next: next <= total_pages,
                total: total_pages,
            },
            items: Items {
                limit,
                begin: Self::offset(limit, page).saturating_add(1).min(total),
                end: page.saturating_mul(limit).min(total),
                total,
            },
        }
    }

    pub fn offset(limit: i64, page: i64) -> i64 {
        (page - 1).saturating_mul(limit)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            data: self.data.into_iter().map(f).collect(),
            pages: self.pages,
            items: self.items,
        }
    }
}
