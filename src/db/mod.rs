//! Database module: pool setup, existence guards and the query layer.
//!
//! - `guards`: single-row precondition checks shared by reads and writes.
//! - `query`: pagination and `ORDER BY` helpers used to build listings.
//! - `topics`, `users`, `articles`, `comments`: per-table operations.
//! - `tx`: `BEGIN IMMEDIATE` write transactions.
//!
//! Every operation takes the pool as an explicit argument. Writes open their
//! own write transaction so guards and the mutation they protect see one
//! snapshot and concurrent writers queue instead of failing.

pub mod articles;
pub mod comments;
pub mod guards;
pub mod query;
pub mod topics;
mod tx;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::ModelResult;

pub use articles::*;
pub use comments::*;
pub use guards::*;
pub use query::Pagination;
pub use topics::*;
pub use users::*;

pub type Pool = SqlitePool;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn init_pool(database_url: &str, max_connections: u32) -> ModelResult<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    info!(url = %normalized, max_connections, "database pool ready");
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> ModelResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
