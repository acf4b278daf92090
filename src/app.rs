use std::sync::Arc;

use anyhow::Context;
use shop_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::{modules, store::ShopStore};

/// Registry holding every shop module over a fresh, empty store
pub fn build_registry(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let store = Arc::new(ShopStore::new());
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, settings)
        .context("failed to register shop modules")?;
    Ok(registry)
}

/// Run the service until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = shop_http::start_server(&registry, &settings, shop_http::shutdown_signal()).await;

    // Modules are stopped even when the server failed.
    registry.stop_all().await?;
    served
}
