use super::KeyValueStore;
use crate::entities::{StorageEntry, storage_entry};
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, instrument};

/// Store backed by the `storage_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// Wraps an open connection. The schema must already exist
    /// (see [`crate::config::database::create_tables`]).
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_entry(&self, key: &str) -> Result<Option<storage_entry::Model>> {
        StorageEntry::find()
            .filter(storage_entry::Column::Key.eq(key))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    /// Retrieves a value from the key-value table.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.find_entry(key).await?.map(|entry| entry.value);
        debug!("Storage value for key '{}' present: {}", key, value.is_some());
        Ok(value)
    }

    /// Sets or updates a value (UPSERT behavior).
    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();

        if let Some(existing) = self.find_entry(key).await? {
            let mut entry: storage_entry::ActiveModel = existing.into();
            entry.value = Set(value.to_string());
            entry.updated_at = Set(now);
            entry.update(&self.db).await?;
        } else {
            let entry = storage_entry::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
                ..Default::default()
            };
            entry.insert(&self.db).await?;
        }

        debug!("Stored value for key '{}'", key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let result = StorageEntry::delete_many()
            .filter(storage_entry::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        debug!("Removed {} entries for key '{}'", result.rows_affected, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};

    #[tokio::test]
    async fn test_set_and_get_new_key() -> Result<()> {
        init_test_tracing();
        let store = SqliteStore::new(setup_test_db().await?);

        store.set("cart", "[]").await?;

        let retrieved_value = store.get("cart").await?;
        assert_eq!(
            retrieved_value,
            Some("[]".to_string()),
            "Retrieved value should match the set value for a new key."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_set_updates_existing_key() -> Result<()> {
        init_test_tracing();
        let store = SqliteStore::new(setup_test_db().await?);

        store.set("userPhone", "9876543210").await?;
        store.set("userPhone", "8123456789").await?;

        assert_eq!(
            store.get("userPhone").await?,
            Some("8123456789".to_string()),
            "Retrieved value should be the updated value."
        );

        let rows = StorageEntry::find().all(&store.db).await?;
        assert_eq!(rows.len(), 1, "Upsert must not duplicate the key");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_non_existent_key() -> Result<()> {
        init_test_tracing();
        let store = SqliteStore::new(setup_test_db().await?);

        assert!(store.get("this_key_does_not_exist").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_only_touches_one_key() -> Result<()> {
        init_test_tracing();
        let store = SqliteStore::new(setup_test_db().await?);

        store.set("table_3_cart", "[1]").await?;
        store.set("table_5_cart", "[2]").await?;
        store.remove("table_3_cart").await?;

        assert!(store.get("table_3_cart").await?.is_none());
        assert_eq!(store.get("table_5_cart").await?, Some("[2]".to_string()));

        // Removing a missing key succeeds
        store.remove("table_3_cart").await?;
        Ok(())
    }
}
