//! Fixture loading: wipes the four tables and inserts a dataset in dependency order.
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::db::Pool;

pub const DEFAULT_ARTICLE_IMG_URL: &str =
    "https://images.pexels.com/photos/97050/pexels-photo-97050.jpeg?w=700&h=700";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub topics: Vec<SeedTopic>,
    pub users: Vec<SeedUser>,
    pub articles: Vec<SeedArticle>,
    pub comments: Vec<SeedComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTopic {
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedArticle {
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub article_img_url: Option<String>,
}

/// `article_id` is the 1-based position of the article in the same fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedComment {
    pub article_id: i64,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub votes: i64,
}

impl SeedData {
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let data = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse seed file {}", path.display()))?;
        Ok(data)
    }

    #[cfg(test)]
    pub(crate) fn test_fixture() -> Self {
        serde_json::from_str(include_str!("../tests/fixtures/test_data.json"))
            .expect("valid test fixture")
    }
}

/// Same layout as the column default, so text ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[instrument(skip_all, fields(
    topics = data.topics.len(),
    users = data.users.len(),
    articles = data.articles.len(),
    comments = data.comments.len(),
))]
pub async fn seed(pool: &Pool, data: &SeedData) -> Result<()> {
    let mut tx = pool.begin().await?;

    for table in ["comments", "articles", "users", "topics"] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('articles', 'comments')")
        .execute(&mut *tx)
        .await?;

    for topic in &data.topics {
        sqlx::query("INSERT INTO topics (slug, description) VALUES (?, ?)")
            .bind(&topic.slug)
            .bind(&topic.description)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert topic {}", topic.slug))?;
    }

    for user in &data.users {
        sqlx::query("INSERT INTO users (username, name, avatar_url) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.avatar_url)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert user {}", user.username))?;
    }

    for article in &data.articles {
        sqlx::query(
            "INSERT INTO articles (title, topic, author, body, created_at, votes, article_img_url) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.title)
        .bind(&article.topic)
        .bind(&article.author)
        .bind(&article.body)
        .bind(format_timestamp(article.created_at.unwrap_or_else(Utc::now)))
        .bind(article.votes)
        .bind(
            article
                .article_img_url
                .as_deref()
                .unwrap_or(DEFAULT_ARTICLE_IMG_URL),
        )
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert article {:?}", article.title))?;
    }

    for comment in &data.comments {
        sqlx::query(
            "INSERT INTO comments (article_id, author, body, created_at, votes) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.article_id)
        .bind(&comment.author)
        .bind(&comment.body)
        .bind(format_timestamp(comment.created_at.unwrap_or_else(Utc::now)))
        .bind(comment.votes)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert comment on article {}", comment.article_id))?;
    }

    tx.commit().await.context("seed transaction failed")?;
    info!("database seeded");
    Ok(())
}
