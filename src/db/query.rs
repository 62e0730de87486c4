//! Shared pieces for listing queries: page arithmetic and the article select.
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::model::{SortColumn, SortOrder};

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// A 1-based page of `limit` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl Pagination {
    /// Strict form used by article listings: absent values take the
    /// defaults, non-positive ones are rejected.
    pub fn checked(limit: Option<i64>, page: Option<i64>) -> ModelResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let page = page.unwrap_or(DEFAULT_PAGE);
        if limit < 1 || page < 1 {
            return Err(ModelError::BAD_REQUEST);
        }
        Ok(Self { limit, page })
    }

    /// Lenient form used by comment listings: anything that is not a
    /// positive integer silently falls back to the default.
    pub fn lenient(limit: &Value, page: &Value) -> Self {
        let positive = |v: &Value| v.as_i64().filter(|n| *n >= 1);
        Self {
            limit: positive(limit).unwrap_or(DEFAULT_LIMIT),
            page: positive(page).unwrap_or(DEFAULT_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Article columns plus the aggregated comment count. `body` is added only
/// for detail views.
pub(crate) fn article_select(with_body: bool) -> String {
    let body = if with_body { "articles.body, " } else { "" };
    format!(
        "SELECT articles.article_id, articles.title, articles.topic, articles.author, {body}\
         articles.created_at, articles.votes, articles.article_img_url, \
         COUNT(comments.comment_id) AS comment_count \
         FROM articles \
         LEFT JOIN comments ON articles.article_id = comments.article_id"
    )
}

/// `ORDER BY` built only from allow-listed identifiers; ties fall back to id.
pub(crate) fn order_clause(sort: SortColumn, order: SortOrder) -> String {
    format!(
        " ORDER BY {} {}, articles.article_id ASC",
        sort.as_sql(),
        order.as_sql()
    )
}
