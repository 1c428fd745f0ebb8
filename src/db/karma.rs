//! Karma scores and the reasons given for them.

use super::DbError;
use crate::intent::Direction;
use sqlx::SqlitePool;

/// Repository for karma operations.
pub struct KarmaRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> KarmaRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply one vote and return the new score.
    pub async fn adjust(
        &self,
        item: &str,
        direction: Direction,
        reason: Option<&str>,
        author: &str,
    ) -> Result<i64, DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let score: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO karma (item, score, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(item) DO UPDATE
            SET score = score + excluded.score, updated_at = excluded.updated_at
            RETURNING score
            "#,
        )
        .bind(item)
        .bind(direction.delta())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(reason) = reason {
            sqlx::query(
                r#"
                INSERT INTO karma_reasons (item, direction, reason, author, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(item)
            .bind(direction.to_string())
            .bind(reason)
            .bind(author)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(score)
    }

    /// Current score, or `None` if nobody has voted on `item`.
    pub async fn get(&self, item: &str) -> Result<Option<i64>, DbError> {
        let score = sqlx::query_scalar::<_, i64>("SELECT score FROM karma WHERE item = ?")
            .bind(item)
            .fetch_optional(self.pool)
            .await?;
        Ok(score)
    }

    /// Most recent reasons for `item`, newest first.
    pub async fn reasons(&self, item: &str, limit: i64) -> Result<Vec<(String, String)>, DbError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT direction, reason FROM karma_reasons
            WHERE item = ? ORDER BY id DESC LIMIT ?
            "#,
        )
        .bind(item)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
