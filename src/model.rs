use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Full `articles` row as returned by `RETURNING *`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Article {
    pub article_id: i64,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub votes: i64,
    pub article_img_url: String,
}

/// Article with its live comment count, body included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ArticleDetail {
    pub article_id: i64,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub votes: i64,
    pub article_img_url: String,
    pub comment_count: i64,
}

/// Listing row: the article columns minus `body`, plus the live comment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ArticleSummary {
    pub article_id: i64,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub votes: i64,
    pub article_img_url: String,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleSummary>,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub comment_id: i64,
    pub article_id: i64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub votes: i64,
}

/// Projection returned after posting a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NewComment {
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub votes: i64,
    pub comment_id: i64,
}

/// Columns an article listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    ArticleId,
    Title,
    Topic,
    Author,
    #[default]
    CreatedAt,
    Votes,
    ArticleImgUrl,
}

impl SortColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "article_id" => Some(SortColumn::ArticleId),
            "title" => Some(SortColumn::Title),
            "topic" => Some(SortColumn::Topic),
            "author" => Some(SortColumn::Author),
            "created_at" => Some(SortColumn::CreatedAt),
            "votes" => Some(SortColumn::Votes),
            "article_img_url" => Some(SortColumn::ArticleImgUrl),
            _ => None,
        }
    }

    /// Qualified identifier spliced into `ORDER BY`. This is the only way a
    /// sort choice reaches query text.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::ArticleId => "articles.article_id",
            SortColumn::Title => "articles.title",
            SortColumn::Topic => "articles.topic",
            SortColumn::Author => "articles.author",
            SortColumn::CreatedAt => "articles.created_at",
            SortColumn::Votes => "articles.votes",
            SortColumn::ArticleImgUrl => "articles.article_img_url",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Raw listing parameters as a caller received them (e.g. from a query string).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArticleQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub topic: Option<String>,
    pub limit: Option<i64>,
    pub p: Option<i64>,
}

/// Body of a comment post. Fields stay untyped so a non-string value can be
/// rejected here rather than at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewCommentInput {
    pub username: Value,
    pub body: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewArticleInput {
    pub author: Value,
    pub title: Value,
    pub body: Value,
    pub topic: Value,
    pub article_img_url: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewTopicInput {
    pub slug: Value,
    pub description: Value,
}

/// Borrow a JSON value as text, or reject the request.
pub(crate) fn require_text(value: &Value) -> Result<&str, ModelError> {
    value.as_str().ok_or(ModelError::BAD_REQUEST)
}

/// Like [`require_text`], but an empty string is rejected too.
pub(crate) fn require_non_empty_text(value: &Value) -> Result<&str, ModelError> {
    match value.as_str() {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ModelError::BAD_REQUEST),
    }
}

/// Vote deltas must be numbers that fit the integer `votes` column; anything
/// else is a 400.
pub(crate) fn require_vote_delta(value: &Value) -> Result<i64, ModelError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or(ModelError::BadRequest("Votes Must Be An Integer")),
        _ => Err(ModelError::BadRequest("Votes Must Be A Number")),
    }
}
