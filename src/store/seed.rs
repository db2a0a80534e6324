//! 初始菜单与启动播种

use rust_decimal::Decimal;

use super::{MenuItem, MenuStore, StoreError};

/// 初始菜单（存储为空时写入）
pub fn default_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::new(
            "Calabresa",
            "Molho de tomate, queijo, calabresa e cebola",
            Decimal::new(4000, 2),
        ),
        MenuItem::new(
            "Mussarela",
            "Molho de tomate, queijo mussarela e orégano",
            Decimal::new(3500, 2),
        ),
        MenuItem::new(
            "Portuguesa",
            "Molho de tomate, queijo, presunto, ovo, cebola e azeitona",
            Decimal::new(4500, 2),
        ),
    ]
}

/// 启动时播种；失败视为启动失败，由调用方中止进程
pub async fn seed_menu(store: &dyn MenuStore, items: &[MenuItem]) -> Result<(), StoreError> {
    if store.seed_if_empty(items).await? {
        tracing::info!(count = items.len(), "Menu seeded successfully");
    } else {
        tracing::info!("Menu already seeded");
    }
    Ok(())
}
