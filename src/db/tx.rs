//! Write transactions that take SQLite's write lock at `BEGIN`.
//!
//! Under WAL a deferred transaction that has already read cannot wait for the
//! write lock: SQLite answers `SQLITE_BUSY` immediately. `BEGIN IMMEDIATE`
//! acquires the lock before the first guard runs, so contending writers queue
//! on the busy timeout and each one sees the rows the previous one committed.
use std::ops::{Deref, DerefMut};

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tracing::warn;

use super::Pool;
use crate::error::ModelResult;

pub struct WriteTx {
    // `None` only once `commit` or `drop` has taken the connection.
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTx {
    pub async fn begin(pool: &Pool) -> ModelResult<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self { conn: Some(conn) })
    }

    pub async fn commit(mut self) -> ModelResult<()> {
        if let Some(conn) = self.conn.as_mut() {
            sqlx::query("COMMIT").execute(&mut **conn).await?;
        }
        self.conn = None;
        Ok(())
    }
}

impl Deref for WriteTx {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        self.conn
            .as_deref()
            .expect("write transaction used after commit")
    }
}

impl DerefMut for WriteTx {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        self.conn
            .as_deref_mut()
            .expect("write transaction used after commit")
    }
}

/// Uncommitted transactions are rolled back before the connection goes back
/// to the pool. A connection that cannot be rolled back is closed instead.
impl Drop for WriteTx {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        warn!(%err, "rollback failed, closing connection");
                        drop(conn.detach());
                    }
                });
            }
            Err(_) => drop(conn.detach()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::seeded_pool;

    async fn votes(pool: &Pool, article_id: i64) -> i64 {
        sqlx::query_scalar("SELECT votes FROM articles WHERE article_id = ?")
            .bind(article_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn commit_persists_writes() {
        let pool = seeded_pool().await;
        let mut tx = WriteTx::begin(&pool).await.unwrap();
        sqlx::query("UPDATE articles SET votes = 7 WHERE article_id = 2")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(votes(&pool, 2).await, 7);
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back_and_connection_is_reused() {
        let pool = seeded_pool().await;
        {
            let mut tx = WriteTx::begin(&pool).await.unwrap();
            sqlx::query("UPDATE articles SET votes = 7 WHERE article_id = 2")
                .execute(&mut *tx)
                .await
                .unwrap();
        }
        assert_eq!(votes(&pool, 2).await, 0);

        // The single pooled connection must be usable for a new transaction.
        let tx = WriteTx::begin(&pool).await.unwrap();
        tx.commit().await.unwrap();
    }
}
