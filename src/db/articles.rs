use serde_json::Value;
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument};

use super::guards::{
    check_article_exists_on, check_article_title_available_on, check_topic_exists,
    check_topic_exists_on, check_user_exists_on,
};
use super::query::{article_select, order_clause, Pagination};
use super::tx::WriteTx;
use super::Pool;
use crate::error::{ModelError, ModelResult};
use crate::model::{
    require_non_empty_text, require_vote_delta, Article, ArticleDetail, ArticlePage, ArticleQuery,
    ArticleSummary, NewArticleInput, SortColumn, SortOrder,
};

async fn fetch_article_detail(
    conn: &mut SqliteConnection,
    article_id: i64,
) -> ModelResult<Option<ArticleDetail>> {
    let sql = format!(
        "{} WHERE articles.article_id = ? GROUP BY articles.article_id",
        article_select(true)
    );
    let article = sqlx::query_as::<_, ArticleDetail>(&sql)
        .bind(article_id)
        .fetch_optional(conn)
        .await?;
    Ok(article)
}

#[instrument(skip_all, fields(article_id = article_id))]
pub async fn select_article_by_id(pool: &Pool, article_id: i64) -> ModelResult<ArticleDetail> {
    let mut conn = pool.acquire().await?;
    fetch_article_detail(&mut conn, article_id)
        .await?
        .ok_or(ModelError::NotFound("Article Not Found"))
}

/// Sorted, optionally topic-filtered page of articles plus the size of the
/// whole matching set.
///
/// Sort column, order and page bounds are validated before anything touches
/// the database. A topic filter is checked for existence first, so an unknown
/// topic is a 404 while a known topic without articles is an empty page.
#[instrument(skip_all, fields(topic = query.topic.as_deref()))]
pub async fn select_articles(pool: &Pool, query: &ArticleQuery) -> ModelResult<ArticlePage> {
    let sort = match query.sort_by.as_deref() {
        Some(raw) => SortColumn::parse(raw).ok_or(ModelError::BAD_REQUEST)?,
        None => SortColumn::default(),
    };
    let order = match query.order.as_deref() {
        Some(raw) => SortOrder::parse(raw).ok_or(ModelError::BAD_REQUEST)?,
        None => SortOrder::default(),
    };
    let page = Pagination::checked(query.limit, query.p)?;
    let topic = query.topic.as_deref().filter(|t| !t.is_empty());

    if let Some(topic) = topic {
        check_topic_exists(pool, topic).await?;
    }

    let mut list_sql = article_select(false);
    let count_sql = match topic {
        Some(_) => {
            list_sql.push_str(" WHERE articles.topic = ?");
            "SELECT COUNT(*) FROM articles WHERE articles.topic = ?"
        }
        None => "SELECT COUNT(*) FROM articles",
    };
    list_sql.push_str(" GROUP BY articles.article_id");
    list_sql.push_str(&order_clause(sort, order));
    list_sql.push_str(" LIMIT ? OFFSET ?");

    let mut list = sqlx::query_as::<_, ArticleSummary>(&list_sql);
    let mut count = sqlx::query_scalar::<_, i64>(count_sql);
    if let Some(topic) = topic {
        list = list.bind(topic);
        count = count.bind(topic);
    }
    list = list.bind(page.limit).bind(page.offset());

    let (articles, total_count) = futures::try_join!(list.fetch_all(pool), count.fetch_one(pool))?;
    debug!(rows = articles.len(), total_count, "articles page fetched");
    Ok(ArticlePage {
        articles,
        total_count,
    })
}

/// Adds `inc_votes` to the article's current votes and returns the updated row.
#[instrument(skip_all, fields(article_id = article_id))]
pub async fn update_article_votes(
    pool: &Pool,
    article_id: i64,
    inc_votes: &Value,
) -> ModelResult<Article> {
    let delta = require_vote_delta(inc_votes)?;

    let mut tx = WriteTx::begin(pool).await?;
    check_article_exists_on(&mut tx, article_id).await?;
    let article = sqlx::query_as::<_, Article>(
        "UPDATE articles SET votes = votes + ? WHERE article_id = ? RETURNING *",
    )
    .bind(delta)
    .bind(article_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(delta, votes = article.votes, "article votes updated");
    Ok(article)
}

/// Deletes an article and every comment on it as one unit.
#[instrument(skip_all, fields(article_id = article_id))]
pub async fn remove_article(pool: &Pool, article_id: i64) -> ModelResult<()> {
    let mut tx = WriteTx::begin(pool).await?;
    check_article_exists_on(&mut tx, article_id).await?;
    sqlx::query("DELETE FROM articles WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await?;
    let comments = sqlx::query("DELETE FROM comments WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    info!(comments, "article removed");
    Ok(())
}

/// Creates an article after checking, in order, that the title is free, the
/// author exists and the topic exists. Returns the stored article with its
/// (zero) comment count.
#[instrument(skip_all)]
pub async fn insert_article(pool: &Pool, input: &NewArticleInput) -> ModelResult<ArticleDetail> {
    let author = require_non_empty_text(&input.author)?;
    let title = require_non_empty_text(&input.title)?;
    let body = require_non_empty_text(&input.body)?;
    let topic = require_non_empty_text(&input.topic)?;
    let article_img_url = require_non_empty_text(&input.article_img_url)?;

    let mut tx = WriteTx::begin(pool).await?;
    check_article_title_available_on(&mut tx, title).await?;
    check_user_exists_on(&mut tx, author).await?;
    check_topic_exists_on(&mut tx, topic).await?;

    let article_id: i64 = sqlx::query_scalar(
        "INSERT INTO articles (author, title, body, topic, article_img_url) VALUES (?, ?, ?, ?, ?) RETURNING article_id",
    )
    .bind(author)
    .bind(title)
    .bind(body)
    .bind(topic)
    .bind(article_img_url)
    .fetch_one(&mut *tx)
    .await?;

    let article = fetch_article_detail(&mut tx, article_id)
        .await?
        .ok_or(ModelError::Storage(sqlx::Error::RowNotFound))?;
    tx.commit().await?;

    info!(article_id, "article created");
    Ok(article)
}
