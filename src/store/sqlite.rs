//! SQLite 菜单存储
//!
//! rusqlite 为同步接口：连接放在 Mutex 中，每次查询经 spawn_blocking 执行，避免阻塞其他线程的对话。
//! 价格以文本保存（如 "40.00"），读出时解析为 Decimal，保留两位小数精度。

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{name_matches, MenuItem, MenuStore, StoreError};

pub struct SqliteMenuStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMenuStore {
    /// 打开（或创建）数据库文件并建表
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pizza (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                ingredients TEXT NOT NULL,
                price TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn load_all(conn: &Connection) -> Result<Vec<MenuItem>, StoreError> {
    let mut stmt = conn.prepare("SELECT name, ingredients, price FROM pizza ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (name, ingredients, price) = row?;
        let price = Decimal::from_str(&price).map_err(|_| StoreError::InvalidPrice(price))?;
        items.push(MenuItem {
            name,
            ingredients,
            price,
        });
    }
    Ok(items)
}

#[async_trait]
impl MenuStore for SqliteMenuStore {
    async fn find_by_name(&self, fragment: &str) -> Result<Option<MenuItem>, StoreError> {
        // SQLite 的 lower()/LIKE 只处理 ASCII，匹配在 Rust 侧完成以支持带重音的名字
        let fragment = fragment.to_string();
        self.with_conn(move |conn| {
            Ok(load_all(conn)?
                .into_iter()
                .find(|item| name_matches(&item.name, &fragment)))
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError> {
        self.with_conn(|conn| load_all(conn)).await
    }

    async fn seed_if_empty(&self, items: &[MenuItem]) -> Result<bool, StoreError> {
        let items = items.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM pizza", [], |r| r.get(0))?;
            if count > 0 {
                return Ok(false);
            }
            for item in &items {
                tx.execute(
                    "INSERT INTO pizza (name, ingredients, price) VALUES (?1, ?2, ?3)",
                    params![item.name, item.ingredients, item.price.to_string()],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::default_menu;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_seed_and_list_preserves_order_and_price() {
        let store = SqliteMenuStore::open_in_memory().unwrap();
        assert!(store.seed_if_empty(&default_menu()).await.unwrap());

        let items = store.list_all().await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Calabresa", "Mussarela", "Portuguesa"]);
        assert_eq!(format!("{:.2}", items[0].price), "40.00");
    }

    #[tokio::test]
    async fn test_seed_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menu.db");

        {
            let store = SqliteMenuStore::open(&path).unwrap();
            assert!(store.seed_if_empty(&default_menu()).await.unwrap());
        }

        let store = SqliteMenuStore::open(&path).unwrap();
        assert!(!store.seed_if_empty(&default_menu()).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_by_name_fuzzy() {
        let store = SqliteMenuStore::open_in_memory().unwrap();
        store.seed_if_empty(&default_menu()).await.unwrap();

        let item = store.find_by_name("mussa").await.unwrap().unwrap();
        assert_eq!(item.name, "Mussarela");
        assert_eq!(item.price, Decimal::new(3500, 2));
        assert!(store.find_by_name("frango").await.unwrap().is_none());
    }
}
