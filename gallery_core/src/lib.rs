//! Core library for the gallery upload service: storage directory manager,
//! upload handlers and the router that ties them together.

pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use files::{FileKind, FileManager, FileManagerConfig, FileStore, FileUpload, StoredFile};
pub use handlers::routes::create_routes;
pub use middleware::cors::{cors_layer_from_config, cors_layer_permissive};

use axum::{extract::DefaultBodyLimit, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub public_prefix: String,
    pub file_store: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(file_store: Arc<dyn FileStore>) -> Self {
        Self {
            app_name: "Gallery Upload Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            public_prefix: config::StorageConfig::default().public_prefix,
            file_store,
        }
    }

    pub fn with_file_manager(file_manager: FileManager) -> Self {
        Self::new(Arc::new(file_manager))
    }

    pub fn with_public_prefix(mut self, public_prefix: impl Into<String>) -> Self {
        self.public_prefix = public_prefix.into();
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: AppConfig) -> Router {
    let mut router = Router::new()
        .merge(create_routes(&state.public_prefix))
        .layer(DefaultBodyLimit::max(config.max_body_size_bytes()));

    router = router.layer(middleware::cors::cors_layer_from_config(&config.cors));

    if config.logging.log_requests {
        router = middleware::logging::with_request_logging(router);
    }

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
