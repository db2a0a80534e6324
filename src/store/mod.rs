//! 菜单存储：披萨目录的只读查询与启动时播种
//!
//! 编排层只依赖 MenuStore trait：按名称模糊查找、列出全部、为空时写入初始菜单。
//! 提供内存实现（测试 / 无数据库时）与 SQLite 实现（rusqlite，经 spawn_blocking 调用）。

pub mod memory;
pub mod seed;
pub mod sqlite;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryMenuStore;
pub use seed::{default_menu, seed_menu};
pub use sqlite::SqliteMenuStore;

/// 菜单条目：name 为大小写不敏感的唯一匹配键
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub ingredients: String,
    pub price: Decimal,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, ingredients: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            ingredients: ingredients.into(),
            price,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid price '{0}'")]
    InvalidPrice(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store task failed: {0}")]
    Task(String),
}

/// 菜单存储接口；实现须保证 list_all 的顺序稳定（即「存储定义的顺序」）
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// 名称包含 fragment（忽略大小写）的第一条；多条命中时按存储顺序取第一条
    async fn find_by_name(&self, fragment: &str) -> Result<Option<MenuItem>, StoreError>;

    async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError>;

    /// 存储为空时写入 items，返回是否写入
    async fn seed_if_empty(&self, items: &[MenuItem]) -> Result<bool, StoreError>;
}

/// 模糊匹配规则（等价于 SQL `name ILIKE '%fragment%'`）
pub fn name_matches(name: &str, fragment: &str) -> bool {
    name.to_lowercase().contains(&fragment.trim().to_lowercase())
}
