//! Existence guards: one exact-match point lookup each, no caching.
//!
//! The `*_on` forms run on a borrowed connection so write paths can call
//! them inside their own transaction; the pool forms are for standalone use.
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, instrument};

use super::Pool;
use crate::error::{ModelError, ModelResult};

async fn row_exists<'k, K>(
    conn: &mut SqliteConnection,
    sql: &'k str,
    key: K,
) -> ModelResult<bool>
where
    K: 'k + Send + sqlx::Encode<'k, Sqlite> + sqlx::Type<Sqlite>,
{
    let found = sqlx::query_scalar::<_, i64>(sql)
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

pub async fn check_article_exists_on(
    conn: &mut SqliteConnection,
    article_id: i64,
) -> ModelResult<()> {
    if row_exists(conn, "SELECT 1 FROM articles WHERE article_id = ?", article_id).await? {
        return Ok(());
    }
    debug!(article_id, "article not found");
    Err(ModelError::NotFound("Article Not Found"))
}

pub async fn check_user_exists_on(conn: &mut SqliteConnection, username: &str) -> ModelResult<()> {
    if row_exists(conn, "SELECT 1 FROM users WHERE username = ?", username).await? {
        return Ok(());
    }
    debug!(username, "user not found");
    Err(ModelError::NotFound("User Does Not Exist"))
}

pub async fn check_comment_exists_on(
    conn: &mut SqliteConnection,
    comment_id: i64,
) -> ModelResult<()> {
    if row_exists(conn, "SELECT 1 FROM comments WHERE comment_id = ?", comment_id).await? {
        return Ok(());
    }
    debug!(comment_id, "comment not found");
    Err(ModelError::NotFound("Comment Not Found"))
}

pub async fn check_topic_exists_on(conn: &mut SqliteConnection, slug: &str) -> ModelResult<()> {
    if row_exists(conn, "SELECT 1 FROM topics WHERE slug = ?", slug).await? {
        return Ok(());
    }
    debug!(slug, "topic not found");
    Err(ModelError::NotFound("Topic Not Found"))
}

/// Inverted guard: succeeds only when no article carries `title`.
pub async fn check_article_title_available_on(
    conn: &mut SqliteConnection,
    title: &str,
) -> ModelResult<()> {
    if row_exists(conn, "SELECT 1 FROM articles WHERE title = ?", title).await? {
        debug!(title, "article title taken");
        return Err(ModelError::AlreadyExists(
            "Article With That Title Already Exists",
        ));
    }
    Ok(())
}

/// Inverted guard: succeeds only when no topic carries `slug`.
pub async fn check_topic_slug_available_on(
    conn: &mut SqliteConnection,
    slug: &str,
) -> ModelResult<()> {
    if row_exists(conn, "SELECT 1 FROM topics WHERE slug = ?", slug).await? {
        debug!(slug, "topic slug taken");
        return Err(ModelError::AlreadyExists("Topic Already Exists"));
    }
    Ok(())
}

#[instrument(skip_all, fields(article_id = article_id))]
pub async fn check_article_exists(pool: &Pool, article_id: i64) -> ModelResult<()> {
    let mut conn = pool.acquire().await?;
    check_article_exists_on(&mut conn, article_id).await
}

#[instrument(skip_all, fields(username = %username))]
pub async fn check_user_exists(pool: &Pool, username: &str) -> ModelResult<()> {
    let mut conn = pool.acquire().await?;
    check_user_exists_on(&mut conn, username).await
}

#[instrument(skip_all, fields(comment_id = comment_id))]
pub async fn check_comment_exists(pool: &Pool, comment_id: i64) -> ModelResult<()> {
    let mut conn = pool.acquire().await?;
    check_comment_exists_on(&mut conn, comment_id).await
}

#[instrument(skip_all, fields(slug = %slug))]
pub async fn check_topic_exists(pool: &Pool, slug: &str) -> ModelResult<()> {
    let mut conn = pool.acquire().await?;
    check_topic_exists_on(&mut conn, slug).await
}

#[instrument(skip_all, fields(title = %title))]
pub async fn check_article_title_available(pool: &Pool, title: &str) -> ModelResult<()> {
    let mut conn = pool.acquire().await?;
    check_article_title_available_on(&mut conn, title).await
}

#[instrument(skip_all, fields(slug = %slug))]
pub async fn check_topic_slug_available(pool: &Pool, slug: &str) -> ModelResult<()> {
    let mut conn = pool.acquire().await?;
    check_topic_slug_available_on(&mut conn, slug).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::seeded_pool;

    #[tokio::test]
    async fn present_keys_pass() {
        let pool = seeded_pool().await;
        check_article_exists(&pool, 1).await.unwrap();
        check_user_exists(&pool, "butter_bridge").await.unwrap();
        check_comment_exists(&pool, 1).await.unwrap();
        check_topic_exists(&pool, "paper").await.unwrap();
        check_article_title_available(&pool, "A brand new title").await.unwrap();
        check_topic_slug_available(&pool, "dogs").await.unwrap();
    }

    #[tokio::test]
    async fn missing_keys_are_not_found() {
        let pool = seeded_pool().await;
        let cases = [
            (check_article_exists(&pool, 999).await, "Article Not Found"),
            (check_user_exists(&pool, "nobody").await, "User Does Not Exist"),
            (check_comment_exists(&pool, 999).await, "Comment Not Found"),
            (check_topic_exists(&pool, "dogs").await, "Topic Not Found"),
        ];
        for (result, msg) in cases {
            let err = result.unwrap_err();
            assert_eq!(err.status(), 404);
            assert_eq!(err.msg(), msg);
        }
    }

    #[tokio::test]
    async fn lookups_are_exact_matches() {
        let pool = seeded_pool().await;
        assert!(check_user_exists(&pool, "butter").await.is_err());
        assert!(check_topic_exists(&pool, "MITCH").await.is_err());
        check_article_title_available(&pool, "Moustache!").await.unwrap();
    }

    #[tokio::test]
    async fn taken_keys_already_exist() {
        let pool = seeded_pool().await;
        let err = check_article_title_available(&pool, "Moustache")
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.msg(), "Article With That Title Already Exists");

        let err = check_topic_slug_available(&pool, "cats").await.unwrap_err();
        assert!(matches!(err, ModelError::AlreadyExists("Topic Already Exists")));
    }

    #[tokio::test]
    async fn guards_are_repeatable() {
        let pool = seeded_pool().await;
        for _ in 0..3 {
            check_article_exists(&pool, 2).await.unwrap();
            assert!(check_article_exists(&pool, 0).await.is_err());
        }
    }
}
