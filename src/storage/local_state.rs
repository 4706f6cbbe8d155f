use anyhow::Result;

use super::schema::Database;
use super::KeyValueStore;

impl Database {
    // ========================================================================
    // Local State Operations
    // ========================================================================

    /// Get a single value by key.
    ///
    /// # Returns
    ///
    /// The value if the key exists, or `None` if not set.
    pub async fn get_state(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM local_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a value (UPSERT), refreshing its timestamp.
    pub async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_state (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a key. Deleting a missing key succeeds.
    pub async fn remove_state(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every stored key. Backs `--reset-state`.
    pub async fn clear_state(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM local_state")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_state(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_state(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.remove_state(key).await
    }
}
