use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use pictor_core::{OutputType, PictorConfig, ProcessingConfig};
use pictor_imaging::{ImageEngine, ImagingResult, ProcessedImage, RustImageEngine};
use pictor_server::{create_router, AppState, Server};
use pictor_storage::{LocalStorage, StorageBackend, StorageResult, StoredObject};
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const CONTENT_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

/// Local storage seeded with `listings/{CONTENT_ID}.jpg` (400x200).
async fn seeded_storage() -> (TempDir, LocalStorage) {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());
    storage
        .store(
            &format!("listings/{}.jpg", CONTENT_ID),
            &encoded_image(400, 200, ImageFormat::Jpeg),
        )
        .await
        .unwrap();
    (temp_dir, storage)
}

async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Engine that records calls and delegates to the real engine.
#[derive(Default)]
struct RecordingEngine {
    calls: AtomicUsize,
    inner: RustImageEngine,
}

impl ImageEngine for RecordingEngine {
    fn process(&self, source: &[u8], config: &ProcessingConfig) -> ImagingResult<ProcessedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.process(source, config)
    }
}

/// Engine that blocks well past any test timeout before delegating.
#[derive(Default)]
struct SlowEngine {
    inner: RustImageEngine,
}

impl ImageEngine for SlowEngine {
    fn process(&self, source: &[u8], config: &ProcessingConfig) -> ImagingResult<ProcessedImage> {
        std::thread::sleep(Duration::from_millis(500));
        self.inner.process(source, config)
    }
}

/// Backend whose fetch never finishes in time.
struct SlowStorage;

#[async_trait]
impl StorageBackend for SlowStorage {
    async fn retrieve(&self, _path: &str) -> StorageResult<StoredObject> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(StoredObject {
            data: vec![],
            content_type: None,
        })
    }
}

/// Backend that returns a fixed object with a stored content type.
struct FixedStorage(StoredObject);

#[async_trait]
impl StorageBackend for FixedStorage {
    async fn retrieve(&self, _path: &str) -> StorageResult<StoredObject> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_end_to_end_crop_through_server() {
    let (temp_dir, _storage) = seeded_storage().await;

    let mut config = PictorConfig::default();
    config.storage.local.base_path = temp_dir.path().to_path_buf();
    let server = Server::new(config).await.unwrap();

    let response = get(
        server.router(),
        &format!("/listings/r1/{}.crop.100x100.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let content_length: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = body_bytes(response).await;
    assert_eq!(body.len(), content_length);

    let output = image::load_from_memory_with_format(&body, ImageFormat::Jpeg).unwrap();
    assert_eq!(output.dimensions(), (100, 100));
}

#[tokio::test]
async fn test_undecodable_descriptor_through_server() {
    let temp_dir = tempdir().unwrap();
    let mut config = PictorConfig::default();
    config.storage.local.base_path = temp_dir.path().to_path_buf();
    let server = Server::new(config).await.unwrap();

    let response = get(
        server.router(),
        &format!("/listings/r1/{}.crop.10x10.j%FFg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "DecodeRequest::CannotDecodeRequest");
    assert_eq!(body["level"], "error");
}

#[tokio::test]
async fn test_ping_through_server() {
    let temp_dir = tempdir().unwrap();
    let mut config = PictorConfig::default();
    config.storage.local.base_path = temp_dir.path().to_path_buf();
    let server = Server::new(config).await.unwrap();

    let response = get(server.router(), "/ping").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Pong");
}

#[tokio::test]
async fn test_each_mode_returns_expected_dimensions() {
    let (_temp_dir, storage) = seeded_storage().await;
    let state = AppState::new(
        &PictorConfig::default(),
        Arc::new(storage),
        Arc::new(RustImageEngine::new()),
    );

    let cases = [
        ("auto.100x100", (100, 50)),
        ("fit.100x100", (100, 50)),
        ("scale.1000x1000", (1000, 500)),
        ("crop.50x80", (50, 80)),
        ("pad-fff.120x120", (120, 120)),
        ("auto.1000x1000", (400, 200)),
    ];

    for (suffix, expected) in cases {
        let response = get(
            create_router(state.clone()),
            &format!("/listings/r1/{}.{}.jpg", CONTENT_ID, suffix),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{suffix}");

        let output = image::load_from_memory(&body_bytes(response).await).unwrap();
        assert_eq!(output.dimensions(), expected, "{suffix}");
    }
}

#[tokio::test]
async fn test_missing_object_never_reaches_engine() {
    let temp_dir = tempdir().unwrap();
    let engine = Arc::new(RecordingEngine::default());
    let state = AppState::new(
        &PictorConfig::default(),
        Arc::new(LocalStorage::new(temp_dir.path().to_path_buf())),
        engine.clone(),
    );

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.crop.100x100.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "The specified key does not exist.");
    assert_eq!(body["level"], "error");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_decode_errors_never_reach_storage_or_engine() {
    let engine = Arc::new(RecordingEngine::default());
    let state = AppState::new(
        &PictorConfig::default(),
        Arc::new(SlowStorage),
        engine.clone(),
    );

    for suffix in ["crop.0x100.jpg", "crop.100.jpg", "pad-12.10x10.jpg", "crop.axb.jpg"] {
        let response = get(
            create_router(state.clone()),
            &format!("/listings/r1/{}.{}", CONTENT_ID, suffix),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{suffix}");
        assert_eq!(
            body_json(response).await["code"],
            "DecodeRequest::CannotDecodeRequest"
        );
    }

    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_webp_output_keeps_stored_content_type_by_default() {
    let (_temp_dir, storage) = seeded_storage().await;
    let mut config = PictorConfig::default();
    config.features.enable_webp = true;
    let state = AppState::new(&config, Arc::new(storage), Arc::new(RustImageEngine::new()));

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.auto.50x50.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let body = body_bytes(response).await;
    assert_eq!(image::guess_format(&body).unwrap(), ImageFormat::WebP);
}

#[tokio::test]
async fn test_report_output_content_type() {
    let (_temp_dir, storage) = seeded_storage().await;
    let mut config = PictorConfig::default();
    config.features.enable_webp = true;
    config.features.report_output_content_type = true;
    let state = AppState::new(&config, Arc::new(storage), Arc::new(RustImageEngine::new()));

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.auto.50x50.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        OutputType::WebP.content_type()
    );
}

#[tokio::test]
async fn test_stored_content_type_is_propagated() {
    let object = StoredObject {
        data: encoded_image(20, 20, ImageFormat::Png),
        content_type: Some("image/x-listing".to_string()),
    };
    let state = AppState::new(
        &PictorConfig::default(),
        Arc::new(FixedStorage(object)),
        Arc::new(RustImageEngine::new()),
    );

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.scale.40x40.png", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/x-listing");
}

#[tokio::test]
async fn test_corrupt_source_is_server_error() {
    let object = StoredObject {
        data: b"not an image".to_vec(),
        content_type: Some("image/jpeg".to_string()),
    };
    let state = AppState::new(
        &PictorConfig::default(),
        Arc::new(FixedStorage(object)),
        Arc::new(RustImageEngine::new()),
    );

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.crop.10x10.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ProcessImage::CannotProcessImage");
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mut state = AppState::new(
        &PictorConfig::default(),
        Arc::new(SlowStorage),
        Arc::new(RustImageEngine::new()),
    );
    state.fetch_timeout = Duration::from_millis(50);

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.crop.10x10.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["code"], "GetObject::Timeout");
}

#[tokio::test]
async fn test_slow_transform_is_gateway_timeout() {
    let (_temp_dir, storage) = seeded_storage().await;
    let mut state = AppState::new(
        &PictorConfig::default(),
        Arc::new(storage),
        Arc::new(SlowEngine::default()),
    );
    state.process_timeout = Duration::from_millis(50);

    let response = get(
        create_router(state),
        &format!("/listings/r1/{}.crop.10x10.jpg", CONTENT_ID),
    )
    .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["status"], 504);
    assert_eq!(body["code"], "ProcessImage::Timeout");
    assert_eq!(body["level"], "error");
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let (_temp_dir, storage) = seeded_storage().await;
    let state = AppState::new(
        &PictorConfig::default(),
        Arc::new(storage),
        Arc::new(RustImageEngine::new()),
    );

    let mut handles = vec![];
    for i in 0..8 {
        let app = create_router(state.clone());
        handles.push(tokio::spawn(async move {
            // Every other request is malformed
            let uri = if i % 2 == 0 {
                format!("/listings/r{}/{}.crop.32x32.jpg", i, CONTENT_ID)
            } else {
                format!("/listings/r{}/{}.crop.32.jpg", i, CONTENT_ID)
            };
            (i, get(app, &uri).await.status())
        }));
    }

    for handle in handles {
        let (i, status) = handle.await.unwrap();
        let expected = if i % 2 == 0 {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        assert_eq!(status, expected);
    }
}
