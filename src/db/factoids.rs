//! Factoid storage for `!key = value` / `!key?`.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for factoid operations.
pub struct FactoidRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FactoidRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a value to `key`. Returns `false` if the exact value was
    /// already recorded.
    pub async fn add(&self, key: &str, value: &str, author: &str) -> Result<bool, DbError> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM factoids WHERE key = ? AND value = ?",
        )
        .bind(key)
        .bind(value)
        .fetch_one(self.pool)
        .await?;
        if exists > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO factoids (key, value, author, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(author)
        .bind(chrono::Utc::now().timestamp())
        .execute(self.pool)
        .await?;
        Ok(true)
    }

    /// All values of `key` in insertion order. Keys match case-insensitively.
    pub async fn get(&self, key: &str) -> Result<Vec<String>, DbError> {
        let values = sqlx::query_scalar::<_, String>(
            "SELECT value FROM factoids WHERE key = ? ORDER BY id",
        )
        .bind(key)
        .fetch_all(self.pool)
        .await?;
        Ok(values)
    }

    /// Remove every value of `key`. Returns the number removed.
    pub async fn forget(&self, key: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM factoids WHERE key = ?")
            .bind(key)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
