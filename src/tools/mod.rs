//! 能力层：目录、注册表、执行器与菜单能力

pub mod executor;
pub mod menu;
pub mod registry;
pub mod schema;

pub use executor::CapabilityExecutor;
pub use menu::{format_menu, AddToOrder, ListMenu, LookupPrice, DEFAULT_MENU_MARKER};
pub use registry::{Capability, CapabilityKind, CapabilityOutput, CapabilityRegistry};
pub use schema::{AddToOrderArgs, CapabilitySpec, ListMenuArgs, LookupPriceArgs};

use std::sync::Arc;

use crate::store::MenuStore;

/// 注册全部菜单能力
pub fn menu_registry(store: Arc<dyn MenuStore>, menu_marker: &str) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(LookupPrice::new(store.clone()));
    registry.register(AddToOrder::new(store.clone()));
    registry.register(ListMenu::new(store, menu_marker));
    registry
}
