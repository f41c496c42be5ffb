//! Key/value operations on the `kv_store` table.
//!
//! Values are stored as JSON text under well-known keys (see [`keys`]).

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::Row;

use super::Pool;
use crate::error::Result;

/// Logical keys of everything the client keeps on the device.
pub mod keys {
    pub const GUEST_PROFILE: &str = "guest.profile";
    pub const GUEST_KNOWLEDGE_POINTS: &str = "guest.knowledge_points";
    pub const GUEST_LEARNING_SESSIONS: &str = "guest.learning_sessions";
    pub const GUEST_NEXT_LOCAL_ID: &str = "guest.next_local_id";
    pub const SYNC_LAST_SYNC_AT: &str = "sync.last_sync_at";
    pub const CACHE_KNOWLEDGE_POINTS: &str = "cache.knowledge_points";
    pub const CACHE_ARCHIVED_KNOWLEDGE_POINTS: &str = "cache.archived_knowledge_points";
}

/// JSON key/value store over the device database.
#[derive(Debug, Clone)]
pub struct KvStore {
    pool: Pool,
}

impl KvStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Read the raw JSON text stored under `key`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(row.try_get("value")?),
            None => None,
        })
    }

    /// Insert or replace the raw JSON text stored under `key`.
    pub async fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read and decode the value stored under `key`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a value under `key`.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw).await
    }

    /// Delete `key`. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete several keys in one transaction.
    pub async fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("DELETE FROM kv_store WHERE key = ?")
                .bind(*key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, run_migrations};
    use crate::ClientError;
    use serde_json::json;

    async fn test_store() -> KvStore {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        KvStore::new(pool)
    }

    #[tokio::test]
    async fn put_and_get() {
        let kv = test_store().await;
        assert_eq!(kv.get_json::<i64>(keys::GUEST_NEXT_LOCAL_ID).await.unwrap(), None);

        kv.put_json(keys::GUEST_NEXT_LOCAL_ID, &-3i64).await.unwrap();
        assert_eq!(
            kv.get_json::<i64>(keys::GUEST_NEXT_LOCAL_ID).await.unwrap(),
            Some(-3)
        );

        // Overwrites in place.
        kv.put_json(keys::GUEST_NEXT_LOCAL_ID, &-4i64).await.unwrap();
        assert_eq!(kv.get_raw(keys::GUEST_NEXT_LOCAL_ID).await.unwrap().as_deref(), Some("-4"));
    }

    #[tokio::test]
    async fn undecodable_value_is_an_error() {
        let kv = test_store().await;
        kv.put_raw(keys::GUEST_PROFILE, "{broken").await.unwrap();

        let err = kv
            .get_json::<serde_json::Value>(keys::GUEST_PROFILE)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
    }

    #[tokio::test]
    async fn remove_keys() {
        let kv = test_store().await;
        kv.put_json(keys::GUEST_PROFILE, &json!({"a": 1})).await.unwrap();
        kv.put_json(keys::GUEST_LEARNING_SESSIONS, &json!([])).await.unwrap();
        kv.put_json(keys::GUEST_NEXT_LOCAL_ID, &-2).await.unwrap();

        assert!(kv.remove(keys::GUEST_PROFILE).await.unwrap());
        assert!(!kv.remove(keys::GUEST_PROFILE).await.unwrap());

        kv.remove_all(&[keys::GUEST_LEARNING_SESSIONS, keys::GUEST_KNOWLEDGE_POINTS])
            .await
            .unwrap();
        assert!(kv.get_raw(keys::GUEST_LEARNING_SESSIONS).await.unwrap().is_none());
        assert!(kv.get_raw(keys::GUEST_NEXT_LOCAL_ID).await.unwrap().is_some());
    }
}
