pub mod books;
pub mod fortune;
pub mod publishers;

use std::sync::Arc;

use shop_kernel::{settings::Settings, ModuleRegistry};

use crate::store::ShopStore;

/// Register every shop module, in mount order, against one shared store
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: Arc<ShopStore>,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register(books::create_module(store.clone()))?;
    registry.register(publishers::create_module(store))?;
    registry.register(fortune::create_module(&settings.fortune)?)?;
    Ok(())
}
