//! 内存菜单存储：按插入顺序保存，进程退出即丢失

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{name_matches, MenuItem, MenuStore, StoreError};

#[derive(Default)]
pub struct InMemoryMenuStore {
    items: RwLock<Vec<MenuItem>>,
}

impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<MenuItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl MenuStore for InMemoryMenuStore {
    async fn find_by_name(&self, fragment: &str) -> Result<Option<MenuItem>, StoreError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|i| name_matches(&i.name, fragment)).cloned())
    }

    async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn seed_if_empty(&self, items: &[MenuItem]) -> Result<bool, StoreError> {
        let mut current = self.items.write().await;
        if !current.is_empty() {
            return Ok(false);
        }
        current.extend_from_slice(items);
        Ok(true)
    }
}
