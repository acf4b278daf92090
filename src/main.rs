use anyhow::Context;
use shop_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load shop settings")?;
    shop_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.bind_address(),
        "shop-app bootstrap starting"
    );

    shop_app::run(settings).await
}
