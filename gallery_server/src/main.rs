//! Main entry point for the gallery upload server binary

use anyhow::Result;
use gallery_core::{
    create_app_with_config, run_server, AppConfig, AppState, FileManager, FileManagerConfig,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!("Upload directory: {}", config.storage.upload_dir.display());

    config.create_directories()
        .map_err(|e| anyhow::anyhow!("Failed to create directories: {}", e))?;

    let addr: SocketAddr = config.bind_address().parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let file_manager = FileManager::new(FileManagerConfig::from(&config.storage));
    file_manager.initialize().await
        .map_err(|e| anyhow::anyhow!("Failed to initialize file manager: {}", e))?;

    let state = AppState::with_file_manager(file_manager)
        .with_public_prefix(config.storage.public_prefix.clone());

    info!("App: {} v{}", state.app_name, state.version);
    info!("Uploaded files served under {}", state.public_prefix);

    let app = create_app_with_config(state, config);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let default_level = if cfg!(debug_assertions) {
                "debug"
            } else {
                "info"
            };

            format!(
                "gallery_core={level},{}={level},tower_http=debug,axum=debug",
                env!("CARGO_CRATE_NAME").replace('-', "_"),
                level = default_level
            ).into()
        });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
