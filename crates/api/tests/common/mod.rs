#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use roadsign_core::geometry::{BoxCoords, Xyxy};
use roadsign_db::DbPool;
use roadsign_pipeline::{
    DetectionModel, Detector, DetectorConfig, InferenceError, InferencePool, PixelArray,
    RawDetection,
};
use tower::ServiceExt;

use roadsign_api::auth::jwt::JwtConfig;
use roadsign_api::config::ServerConfig;
use roadsign_api::router::build_app_router;
use roadsign_api::state::AppState;
use roadsign_api::ws::WsManager;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        persist_anonymous: true,
        ws_heartbeat_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        detector: DetectorConfig::default(),
    }
}

/// Stands in for the ONNX model: every frame yields the same boxes,
/// optionally after blocking for `delay`.
pub struct ScriptedModel {
    boxes: Vec<RawDetection>,
    delay: Duration,
}

impl ScriptedModel {
    pub fn empty() -> Self {
        Self::with_boxes(Vec::new())
    }

    pub fn with_boxes(boxes: Vec<RawDetection>) -> Self {
        Self {
            boxes,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            boxes: Vec::new(),
            delay,
        }
    }
}

impl DetectionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn predict(
        &self,
        _frame: &PixelArray,
        _confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.boxes.clone())
    }
}

/// A single "Stop" box over the top-left quarter of the frame.
pub fn stop_sign() -> RawDetection {
    RawDetection {
        class_id: 14,
        confidence: 0.9,
        coords: BoxCoords::Normalized(Xyxy::new(0.0, 0.0, 0.5, 0.5)),
    }
}

pub fn build_test_state(pool: DbPool, model: ScriptedModel, config: &ServerConfig) -> AppState {
    let detector = Arc::new(Detector::new(Box::new(model), 0.25));
    AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        inference: InferencePool::new(detector, 2, Duration::from_secs(5)),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and a model that never finds anything.
pub fn build_test_app(pool: DbPool) -> Router {
    build_test_app_with(pool, ScriptedModel::empty())
}

pub fn build_test_app_with(pool: DbPool, model: ScriptedModel) -> Router {
    build_test_app_with_config(pool, model, test_config())
}

pub fn build_test_app_with_config(
    pool: DbPool,
    model: ScriptedModel,
    config: ServerConfig,
) -> Router {
    let state = build_test_state(pool, model, &config);
    build_app_router(state, &config)
}

/// Serve the app on an ephemeral local port for WebSocket tests.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A 1x1 black PNG as a data URI.
pub fn png_data_uri() -> String {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

/// POST a raw body, for requests that are not valid JSON.
pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> Response<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, Some(token)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user through the API and return its access token.
pub async fn register_user(app: Router, username: &str) -> String {
    let body = serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "password123",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
