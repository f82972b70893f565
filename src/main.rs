//! linkshelf daemon.
//!
//! Loads settings, opens the database, starts the ranking jobs and runs until Ctrl-C.

use linkshelf::app::App;
use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = SettingsEngine::new(None);
    let settings = engine.load()?;

    let default_level = settings.logging.level.clone();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = engine.get_config_path(),
        database = %settings.database_path,
        "starting linkshelf"
    );

    let app = App::new(settings).await?;
    let jobs = app.startup().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    app.shutdown(jobs).await;
    Ok(())
}
