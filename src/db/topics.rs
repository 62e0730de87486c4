use tracing::{info, instrument};

use super::guards::check_topic_slug_available_on;
use super::tx::WriteTx;
use super::Pool;
use crate::error::ModelResult;
use crate::model::{require_non_empty_text, NewTopicInput, Topic};

#[instrument(skip_all)]
pub async fn select_topics(pool: &Pool) -> ModelResult<Vec<Topic>> {
    let topics = sqlx::query_as::<_, Topic>("SELECT slug, description FROM topics")
        .fetch_all(pool)
        .await?;
    Ok(topics)
}

/// Creates a topic. A taken slug is reported as a 400 before the insert runs.
#[instrument(skip_all)]
pub async fn insert_topic(pool: &Pool, input: &NewTopicInput) -> ModelResult<Topic> {
    let slug = require_non_empty_text(&input.slug)?;
    let description = require_non_empty_text(&input.description)?;

    let mut tx = WriteTx::begin(pool).await?;
    check_topic_slug_available_on(&mut tx, slug).await?;
    let topic = sqlx::query_as::<_, Topic>(
        "INSERT INTO topics (slug, description) VALUES (?, ?) RETURNING slug, description",
    )
    .bind(slug)
    .bind(description)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(slug = %topic.slug, "topic created");
    Ok(topic)
}
