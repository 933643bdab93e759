use crate::errors::StoreError;
use crate::models::{ConfigurationData, CountedItem, ItemType, UserOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::error;

/// Persistent store behind every handler.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn load_config(&self) -> Result<Option<ConfigurationData>, StoreError>;

    /// Replaces the single configuration row.
    async fn save_config(&self, data: &ConfigurationData) -> Result<(), StoreError>;

    /// Item types ordered by creation time, oldest first.
    async fn list_item_types(
        &self,
        active_only: bool,
        limit: usize,
    ) -> Result<Vec<ItemType>, StoreError>;

    async fn find_active_item_type(&self, name: &str) -> Result<Option<ItemType>, StoreError>;

    async fn insert_item_type(
        &self,
        name: &str,
        created: DateTime<Utc>,
    ) -> Result<ItemType, StoreError>;

    async fn set_item_type_active(&self, id: u64, active: bool) -> Result<ItemType, StoreError>;

    /// Appends one event and returns the user's count for that type since
    /// `since` (inclusive), both under the same lock.
    async fn record_item(
        &self,
        item_type_id: u64,
        user: &str,
        created: DateTime<Utc>,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn count_items_since(
        &self,
        item_type_id: u64,
        user: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn find_user_options(&self, user: &str) -> Result<Option<UserOptions>, StoreError>;

    /// Inserts or overwrites the record keyed by `options.user`.
    async fn save_user_options(&self, options: &UserOptions) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tables {
    #[serde(default)]
    pub config: Option<ConfigurationData>,
    #[serde(default)]
    pub item_types: Vec<ItemType>,
    #[serde(default)]
    pub counted_items: Vec<CountedItem>,
    #[serde(default)]
    pub user_options: BTreeMap<String, UserOptions>,
    #[serde(default)]
    pub next_id: u64,
}

impl Tables {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn count_since(&self, item_type_id: u64, user: &str, since: DateTime<Utc>) -> u64 {
        self.counted_items
            .iter()
            .filter(|item| {
                item.item_type_id == item_type_id && item.user == user && item.created >= since
            })
            .count() as u64
    }
}

/// Tables held in memory and written as one JSON snapshot after each change.
pub struct JsonStore {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl JsonStore {
    pub async fn open(path: PathBuf) -> Self {
        let tables = load_data(&path).await;
        Self {
            path: Some(path),
            tables: Mutex::new(tables),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Applies `change` to a copy of the tables and swaps the copy in only
    /// once it has been written out.
    async fn commit<R: Send>(
        &self,
        change: impl FnOnce(&mut Tables) -> Result<R, StoreError> + Send,
    ) -> Result<R, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut next = tables.clone();
        let result = change(&mut next)?;
        if let Some(path) = &self.path {
            persist_data(path, &next).await?;
        }
        *tables = next;
        Ok(result)
    }
}

#[async_trait]
impl Datastore for JsonStore {
    async fn load_config(&self) -> Result<Option<ConfigurationData>, StoreError> {
        Ok(self.tables.lock().await.config.clone())
    }

    async fn save_config(&self, data: &ConfigurationData) -> Result<(), StoreError> {
        self.commit(|tables| {
            tables.config = Some(data.clone());
            Ok(())
        })
        .await
    }

    async fn list_item_types(
        &self,
        active_only: bool,
        limit: usize,
    ) -> Result<Vec<ItemType>, StoreError> {
        let tables = self.tables.lock().await;
        let mut items: Vec<ItemType> = tables
            .item_types
            .iter()
            .filter(|item| !active_only || item.active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        items.truncate(limit);
        Ok(items)
    }

    async fn find_active_item_type(&self, name: &str) -> Result<Option<ItemType>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .item_types
            .iter()
            .find(|item| item.active && item.name == name)
            .cloned())
    }

    async fn insert_item_type(
        &self,
        name: &str,
        created: DateTime<Utc>,
    ) -> Result<ItemType, StoreError> {
        self.commit(|tables| {
            let item = ItemType {
                id: tables.allocate_id(),
                name: name.to_string(),
                active: true,
                created,
            };
            tables.item_types.push(item.clone());
            Ok(item)
        })
        .await
    }

    async fn set_item_type_active(&self, id: u64, active: bool) -> Result<ItemType, StoreError> {
        self.commit(|tables| {
            let item = tables
                .item_types
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or(StoreError::UnknownItemType(id))?;
            item.active = active;
            Ok(item.clone())
        })
        .await
    }

    async fn record_item(
        &self,
        item_type_id: u64,
        user: &str,
        created: DateTime<Utc>,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.commit(|tables| {
            if !tables.item_types.iter().any(|item| item.id == item_type_id) {
                return Err(StoreError::UnknownItemType(item_type_id));
            }
            let item = CountedItem {
                id: tables.allocate_id(),
                item_type_id,
                user: user.to_string(),
                created,
            };
            tables.counted_items.push(item);
            Ok(tables.count_since(item_type_id, user, since))
        })
        .await
    }

    async fn count_items_since(
        &self,
        item_type_id: u64,
        user: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self.tables.lock().await.count_since(item_type_id, user, since))
    }

    async fn find_user_options(&self, user: &str) -> Result<Option<UserOptions>, StoreError> {
        Ok(self.tables.lock().await.user_options.get(user).cloned())
    }

    async fn save_user_options(&self, options: &UserOptions) -> Result<(), StoreError> {
        self.commit(|tables| {
            tables
                .user_options
                .insert(options.user.clone(), options.clone());
            Ok(())
        })
        .await
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}

pub async fn load_data(path: &Path) -> Tables {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                Tables::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Tables::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            Tables::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &Tables) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn item_types_are_listed_oldest_first_and_capped() {
        let store = JsonStore::in_memory();
        store.insert_item_type("tea", at(9)).await.unwrap();
        store.insert_item_type("water", at(7)).await.unwrap();
        store.insert_item_type("coffee", at(8)).await.unwrap();

        let names: Vec<String> = store
            .list_item_types(false, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["water", "coffee"]);
    }

    #[tokio::test]
    async fn inactive_types_are_hidden_but_kept() {
        let store = JsonStore::in_memory();
        let water = store.insert_item_type("water", at(7)).await.unwrap();
        store.insert_item_type("tea", at(8)).await.unwrap();
        store.set_item_type_active(water.id, false).await.unwrap();

        assert!(store.find_active_item_type("water").await.unwrap().is_none());
        assert_eq!(store.list_item_types(true, 10).await.unwrap().len(), 1);
        assert_eq!(store.list_item_types(false, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn toggling_unknown_type_fails() {
        let store = JsonStore::in_memory();
        let err = store.set_item_type_active(42, false).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownItemType(42)));
    }

    #[tokio::test]
    async fn record_item_counts_from_lower_bound_inclusive() {
        let store = JsonStore::in_memory();
        let water = store.insert_item_type("water", at(0)).await.unwrap();
        let since = at(8);

        assert_eq!(
            store
                .record_item(water.id, "a@example.com", since - Duration::seconds(1), since)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            store.record_item(water.id, "a@example.com", since, since).await.unwrap(),
            1
        );
        assert_eq!(
            store.record_item(water.id, "b@example.com", at(9), since).await.unwrap(),
            1
        );
        assert_eq!(
            store
                .count_items_since(water.id, "a@example.com", since)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn record_item_rejects_unknown_type() {
        let store = JsonStore::in_memory();
        assert!(store.record_item(9, "a@example.com", at(1), at(0)).await.is_err());
        assert_eq!(store.tables.lock().await.counted_items.len(), 0);
    }

    #[tokio::test]
    async fn user_options_are_upserted_by_user() {
        let store = JsonStore::in_memory();
        let mut options = UserOptions::with_default_timezone("a@example.com");
        store.save_user_options(&options).await.unwrap();
        options.timezone = "Europe/Paris".to_string();
        store.save_user_options(&options).await.unwrap();

        let tables = store.tables.lock().await;
        assert_eq!(tables.user_options.len(), 1);
        assert_eq!(tables.user_options["a@example.com"].timezone, "Europe/Paris");
    }

    #[tokio::test]
    async fn failed_write_leaves_tables_untouched() {
        let dir = std::env::temp_dir().join(format!("daily_count_dir_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        // writing the snapshot to a directory path always fails
        let store = JsonStore::open(dir.clone()).await;

        assert!(store.insert_item_type("water", at(7)).await.is_err());
        assert!(
            store
                .save_user_options(&UserOptions::with_default_timezone("a@example.com"))
                .await
                .is_err()
        );

        let tables = store.tables.lock().await;
        assert!(tables.item_types.is_empty());
        assert!(tables.user_options.is_empty());
        assert_eq!(tables.next_id, 0);
        drop(tables);
        let _ = std::fs::remove_dir(dir);
    }

    #[tokio::test]
    async fn failed_record_is_not_counted_on_retry() {
        let dir = std::env::temp_dir().join(format!("daily_count_retry_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = JsonStore::open(dir.clone()).await;
        store.tables.lock().await.item_types.push(ItemType {
            id: 1,
            name: "water".to_string(),
            active: true,
            created: at(0),
        });

        assert!(store.record_item(1, "a@example.com", at(9), at(8)).await.is_err());
        assert_eq!(store.count_items_since(1, "a@example.com", at(8)).await.unwrap(), 0);
        let _ = std::fs::remove_dir(dir);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let mut path = std::env::temp_dir();
        path.push(format!("daily_count_store_{}.json", std::process::id()));

        let store = JsonStore::open(path.clone()).await;
        store.insert_item_type("water", at(7)).await.unwrap();
        drop(store);

        let reopened = JsonStore::open(path.clone()).await;
        let items = reopened.list_item_types(true, 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "water");
        let _ = std::fs::remove_file(path);
    }
}
