use axum::Router;
use pictor_core::config::{PictorConfig, StorageKind};
use pictor_imaging::RustImageEngine;
use pictor_storage::{StorageConfig, StorageType};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

use crate::{
    routes::{create_router, AppState},
    ServerError, ServerResult,
};

/// Main server struct that owns the router and listen address
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Create a new server instance with the provided configuration
    pub async fn new(config: PictorConfig) -> ServerResult<Self> {
        info!("Initializing pictor server...");

        let storage_config = storage_config(&config);
        let storage_backend = storage_config
            .create_backend()
            .await
            .map_err(|e| ServerError::Internal(format!("Storage initialization failed: {}", e)))?;

        let state = AppState::new(&config, storage_backend, Arc::new(RustImageEngine::new()));

        info!(
            "Output encoding: {:?}, max dimension: {}px, max area: {} pixels",
            state.transform_options.output_type(),
            state.limits.max_dimension,
            state.limits.max_pixels
        );

        let router = create_app_router(state);

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ServerError::Internal(format!("Invalid server address: {}", e)))?;

        Ok(Self { router, addr })
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Start the server and listen for incoming connections
    pub async fn serve(self) -> ServerResult<()> {
        info!("Starting server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", self.addr);
        info!("Liveness probe available at http://{}/ping", self.addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Convert the core storage settings into a storage crate config
pub fn storage_config(config: &PictorConfig) -> StorageConfig {
    let storage_type = match config.storage.backend {
        StorageKind::Local => StorageType::Local {
            path: config.storage.local.base_path.clone(),
        },
        StorageKind::S3 => StorageType::S3 {
            bucket: config.storage.s3.bucket.clone(),
            region: config.storage.s3.region.clone(),
            access_key_id: config.storage.s3.access_key_id.clone(),
            secret_access_key: config.storage.s3.secret_access_key.clone(),
            session_token: config.storage.s3.session_token.clone(),
            endpoint: config.storage.s3.endpoint.clone(),
        },
    };

    StorageConfig::new(storage_type)
}

/// Wrap the application router in the middleware stack
fn create_app_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware_stack = ServiceBuilder::new().layer(trace_layer);

    create_router(state).layer(middleware_stack)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
