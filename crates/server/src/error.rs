use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pictor_core::CoreError;
use pictor_imaging::ImagingError;
use pictor_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type ServerResult<T> = Result<T, ServerError>;

pub const CODE_CANNOT_DECODE_REQUEST: &str = "DecodeRequest::CannotDecodeRequest";
pub const CODE_NO_SUCH_KEY: &str = "GetObject::NoSuchKey";
pub const CODE_FETCH_TIMEOUT: &str = "GetObject::Timeout";
pub const CODE_CANNOT_PROCESS_IMAGE: &str = "ProcessImage::CannotProcessImage";
pub const CODE_PROCESS_TIMEOUT: &str = "ProcessImage::Timeout";
pub const CODE_INTERNAL: &str = "Internal::ServerError";

const NOT_FOUND_MESSAGE: &str = "The specified key does not exist.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Cannot decode request: {0}")]
    Decode(#[from] CoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Timed out fetching '{0}'")]
    FetchTimeout(String),

    #[error("Image processing error: {0}")]
    Processing(#[from] ImagingError),

    #[error("Timed out processing '{0}'")]
    ProcessTimeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    pub level: &'static str,
}

impl ServerError {
    fn status_code_message(&self) -> (StatusCode, &'static str, String) {
        match self {
            ServerError::Decode(CoreError::InvalidDescriptor(msg)) => {
                (StatusCode::BAD_REQUEST, CODE_CANNOT_DECODE_REQUEST, msg.clone())
            }
            ServerError::Decode(err @ CoreError::InvalidColor(_)) => {
                (StatusCode::BAD_REQUEST, CODE_CANNOT_DECODE_REQUEST, err.to_string())
            }
            ServerError::Storage(StorageError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                CODE_NO_SUCH_KEY,
                NOT_FOUND_MESSAGE.to_string(),
            ),
            ServerError::Storage(StorageError::InvalidPath(msg)) => {
                (StatusCode::BAD_REQUEST, CODE_CANNOT_DECODE_REQUEST, msg.clone())
            }
            ServerError::FetchTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                CODE_FETCH_TIMEOUT,
                "Timed out fetching the source image.".to_string(),
            ),
            ServerError::Processing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_CANNOT_PROCESS_IMAGE,
                "The source image could not be processed.".to_string(),
            ),
            ServerError::ProcessTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                CODE_PROCESS_TIMEOUT,
                "Timed out processing the source image.".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL,
                "Internal server error".to_string(),
            ),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code_message().0
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_code_message();

        if status.is_server_error() {
            error!("{} ({}): {}", status, code, self);
        } else {
            warn!("{} ({}): {}", status, code, self);
        }

        let body = Json(ErrorEnvelope {
            status: status.as_u16(),
            code,
            message,
            level: "error",
        });

        (status, body).into_response()
    }
}
