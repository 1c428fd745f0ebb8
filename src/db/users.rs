//! User repository for the permission gate and owner bootstrap.

use super::DbError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

/// Scope name for permissions that apply in every channel.
pub const GLOBAL_SCOPE: &str = "global";

/// Recorded permissions of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    pub global: BTreeSet<String>,
    /// Keyed by lower-cased channel name.
    pub channels: HashMap<String, BTreeSet<String>>,
}

impl Permissions {
    /// Permissions for `channel`, if any are recorded.
    pub fn for_channel(&self, channel: &str) -> Option<&BTreeSet<String>> {
        self.channels.get(&channel.to_lowercase())
    }
}

/// A user known to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub hostmask: Option<String>,
    pub is_owner: bool,
    pub is_admin: bool,
    pub permissions: Permissions,
}

/// Narrow lookup interface used by the permission gate.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_user_by_hostmask(&self, hostmask: &str) -> Result<Option<UserInfo>, DbError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserInfo>, DbError>;
}

type UserRow = (i64, String, Option<String>, bool, bool);

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_hostmask(&self, hostmask: &str) -> Result<Option<UserInfo>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, hostmask, is_owner, is_admin
            FROM users WHERE hostmask = ?
            ORDER BY id LIMIT 1
            "#,
        )
        .bind(hostmask)
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserInfo>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, hostmask, is_owner, is_admin
            FROM users WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    /// Create the user or refresh its hostmask. Returns the user id.
    pub async fn upsert(&self, username: &str, hostmask: &str) -> Result<i64, DbError> {
        let now = chrono::Utc::now().timestamp();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, hostmask, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET hostmask = excluded.hostmask
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(hostmask)
        .bind(now)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Grant `permission` globally (`scope = None`) or in one channel.
    pub async fn grant(
        &self,
        username: &str,
        scope: Option<&str>,
        permission: &str,
    ) -> Result<(), DbError> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool)
            .await?;
        let id = id.ok_or_else(|| DbError::UserNotFound(username.to_string()))?;
        let scope = scope.map_or_else(|| GLOBAL_SCOPE.to_string(), str::to_lowercase);

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_permissions (user_id, scope, permission)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(permission)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_admin(&self, username: &str, is_admin: bool) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE username = ?")
            .bind(is_admin)
            .bind(username)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::UserNotFound(username.to_string()));
        }
        Ok(())
    }

    /// Whether any user holds the owner flag.
    pub async fn has_owner(&self) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_owner = 1")
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Make `username` the owner if nobody is yet.
    ///
    /// Returns `false` without changes when an owner already exists.
    pub async fn claim_owner(&self, username: &str, hostmask: &str) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let owners: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_owner = 1")
            .fetch_one(&mut *tx)
            .await?;
        if owners > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO users (username, hostmask, is_owner, is_admin, created_at)
            VALUES (?, ?, 1, 1, ?)
            ON CONFLICT(username) DO UPDATE
            SET hostmask = excluded.hostmask, is_owner = 1, is_admin = 1
            "#,
        )
        .bind(username)
        .bind(hostmask)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn hydrate(&self, row: Option<UserRow>) -> Result<Option<UserInfo>, DbError> {
        let Some((id, username, hostmask, is_owner, is_admin)) = row else {
            return Ok(None);
        };

        let grants = sqlx::query_as::<_, (String, String)>(
            "SELECT scope, permission FROM user_permissions WHERE user_id = ?",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let mut permissions = Permissions::default();
        for (scope, permission) in grants {
            if scope == GLOBAL_SCOPE {
                permissions.global.insert(permission);
            } else {
                permissions.channels.entry(scope).or_default().insert(permission);
            }
        }

        Ok(Some(UserInfo {
            id,
            username,
            hostmask,
            is_owner,
            is_admin,
            permissions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_grant_and_lookup() {
        let db = Database::new(":memory:").await.unwrap();
        db.users().upsert("alice", "alice!a@example.net").await.unwrap();
        db.users().grant("alice", None, "factoids").await.unwrap();
        db.users().grant("alice", Some("#Rust"), "op").await.unwrap();

        let user = db
            .users()
            .find_by_hostmask("alice!a@example.net")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.permissions.global.contains("factoids"));
        assert!(user.permissions.for_channel("#rust").unwrap().contains("op"));
        assert!(!user.is_owner);

        let same = db.users().find_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(same.id, user.id);
    }

    #[tokio::test]
    async fn test_grant_unknown_user_fails() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(db.users().grant("ghost", None, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_owner_can_only_be_claimed_once() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(!db.users().has_owner().await.unwrap());
        assert!(db.users().claim_owner("alice", "alice!a@h").await.unwrap());
        assert!(!db.users().claim_owner("mallory", "mallory!m@h").await.unwrap());

        let owner = db.users().find_by_username("alice").await.unwrap().unwrap();
        assert!(owner.is_owner);
        assert!(owner.is_admin);
        assert!(db.users().find_by_username("mallory").await.unwrap().is_none());
    }
}
