use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pictor_core::{
    resolve, CoreError, DimensionLimits, PictorConfig, TransformDescriptor, TransformOptions,
};
use pictor_imaging::ImageEngine;
use pictor_storage::StorageBackend;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    pub storage_backend: Arc<dyn StorageBackend>,
    pub image_engine: Arc<dyn ImageEngine>,
    pub transform_options: TransformOptions,
    pub limits: DimensionLimits,
    pub fetch_timeout: Duration,
    pub process_timeout: Duration,
    pub report_output_content_type: bool,
}

impl AppState {
    pub fn new(
        config: &PictorConfig,
        storage_backend: Arc<dyn StorageBackend>,
        image_engine: Arc<dyn ImageEngine>,
    ) -> Self {
        Self {
            storage_backend,
            image_engine,
            transform_options: config.transform_options(),
            limits: config.transform.limits(),
            fetch_timeout: Duration::from_secs(config.server.fetch_timeout),
            process_timeout: Duration::from_secs(config.server.process_timeout),
            report_output_content_type: config.features.report_output_content_type,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/listings/:resource_id/", get(missing_descriptor))
        .route("/listings/:resource_id/:descriptor", get(get_image))
        .with_state(state)
}

/// Liveness probe
async fn ping() -> Json<Value> {
    Json(json!({ "message": "Pong" }))
}

async fn missing_descriptor() -> ServerError {
    ServerError::Decode(CoreError::malformed_descriptor())
}

/// Fetch a source image and return it transformed per the descriptor.
pub async fn get_image(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ServerResult<Response> {
    // Undecodable segments (e.g. invalid UTF-8) are malformed descriptors too
    let Path((resource_id, descriptor)) = path.map_err(|rejection| {
        debug!("Rejected request path: {}", rejection);
        ServerError::Decode(CoreError::malformed_descriptor())
    })?;

    let descriptor = TransformDescriptor::parse_with_limits(&descriptor, state.limits)?;
    let config = resolve(&descriptor, &state.transform_options)?;
    let key = descriptor.storage_key();

    debug!(
        "Resource {}: fetching '{}' for {:?} {}x{}",
        resource_id,
        key,
        config.mode(),
        config.width,
        config.height
    );

    let object = tokio::time::timeout(state.fetch_timeout, state.storage_backend.retrieve(&key))
        .await
        .map_err(|_| ServerError::FetchTimeout(key.clone()))??;

    let stored_content_type = object.content_type_or_guess(&key);

    let engine = state.image_engine.clone();
    let task = tokio::task::spawn_blocking(move || engine.process(&object.data, &config));
    let processed = tokio::time::timeout(state.process_timeout, task)
        .await
        .map_err(|_| ServerError::ProcessTimeout(key.clone()))?
        .map_err(|e| ServerError::Internal(format!("Transform task failed: {}", e)))??;

    let content_type = if state.report_output_content_type {
        processed.output_type.content_type().to_string()
    } else {
        stored_content_type
    };

    debug!(
        "Transformed '{}' into {}x{} ({} bytes)",
        key,
        processed.width,
        processed.height,
        processed.data.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, processed.data.len().to_string()),
        ],
        processed.data,
    )
        .into_response())
}
