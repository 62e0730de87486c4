use serde_json::Value;
use tracing::{debug, info, instrument};

use super::guards::{check_article_exists_on, check_comment_exists_on, check_user_exists_on};
use super::query::Pagination;
use super::tx::WriteTx;
use super::Pool;
use crate::error::{ModelError, ModelResult};
use crate::model::{require_text, require_vote_delta, Comment, NewComment, NewCommentInput};

#[instrument(skip_all)]
pub async fn select_comments(pool: &Pool) -> ModelResult<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>("SELECT * FROM comments ORDER BY comment_id")
        .fetch_all(pool)
        .await?;
    Ok(comments)
}

/// One page of an article's comments in insertion order.
///
/// `limit` and `p` are taken as received: anything that is not a positive
/// integer falls back to 10 and 1. An empty page is reported as not found
/// even when the article itself exists.
#[instrument(skip_all, fields(article_id = article_id))]
pub async fn select_comments_by_article(
    pool: &Pool,
    article_id: i64,
    limit: &Value,
    p: &Value,
) -> ModelResult<Vec<Comment>> {
    let page = Pagination::lenient(limit, p);

    let mut conn = pool.acquire().await?;
    check_article_exists_on(&mut conn, article_id).await?;
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE article_id = ? ORDER BY comment_id LIMIT ? OFFSET ?",
    )
    .bind(article_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    if comments.is_empty() {
        debug!(page = page.page, "comment page empty");
        return Err(ModelError::NotFound("No Comments Found"));
    }
    Ok(comments)
}

/// Posts a comment. Both fields must be strings; the article is checked
/// before the author so a missing article wins over a missing user.
#[instrument(skip_all, fields(article_id = article_id))]
pub async fn insert_comment_by_article(
    pool: &Pool,
    article_id: i64,
    input: &NewCommentInput,
) -> ModelResult<NewComment> {
    let author = require_text(&input.username)?;
    let body = require_text(&input.body)?;

    let mut tx = WriteTx::begin(pool).await?;
    check_article_exists_on(&mut tx, article_id).await?;
    check_user_exists_on(&mut tx, author).await?;
    let comment = sqlx::query_as::<_, NewComment>(
        "INSERT INTO comments (article_id, author, body) VALUES (?, ?, ?) RETURNING author, body, created_at, votes, comment_id",
    )
    .bind(article_id)
    .bind(author)
    .bind(body)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(comment_id = comment.comment_id, "comment created");
    Ok(comment)
}

#[instrument(skip_all, fields(comment_id = comment_id))]
pub async fn update_comment_votes(
    pool: &Pool,
    comment_id: i64,
    inc_votes: &Value,
) -> ModelResult<Comment> {
    let delta = require_vote_delta(inc_votes)?;

    let mut tx = WriteTx::begin(pool).await?;
    check_comment_exists_on(&mut tx, comment_id).await?;
    let comment = sqlx::query_as::<_, Comment>(
        "UPDATE comments SET votes = votes + ? WHERE comment_id = ? RETURNING *",
    )
    .bind(delta)
    .bind(comment_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(delta, votes = comment.votes, "comment votes updated");
    Ok(comment)
}

#[instrument(skip_all, fields(comment_id = comment_id))]
pub async fn remove_comment(pool: &Pool, comment_id: i64) -> ModelResult<()> {
    let mut tx = WriteTx::begin(pool).await?;
    check_comment_exists_on(&mut tx, comment_id).await?;
    sqlx::query("DELETE FROM comments WHERE comment_id = ?")
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("comment removed");
    Ok(())
}
