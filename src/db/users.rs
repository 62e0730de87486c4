use tracing::{debug, instrument};

use super::Pool;
use crate::error::{ModelError, ModelResult};
use crate::model::User;

/// Public projection only: username, name and avatar.
#[instrument(skip_all)]
pub async fn select_users(pool: &Pool) -> ModelResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT username, name, avatar_url FROM users")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

#[instrument(skip_all, fields(username = %username))]
pub async fn select_user_by_username(pool: &Pool, username: &str) -> ModelResult<User> {
    let user = sqlx::query_as::<_, User>(
        "SELECT username, name, avatar_url FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(user) = user else {
        debug!("no such user");
        return Err(ModelError::NotFound("No User With That Username Found"));
    };
    Ok(user)
}
