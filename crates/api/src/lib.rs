//! Emotion Session Server
//!
//! WebSocket server for webcam emotion sessions. Each connection on `/` gets
//! its own session driver; `/api/v1/health` and `/metrics` report on the
//! process as a whole.

pub mod config;
mod ws;

pub use config::ServerConfig;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use emotion_detect::EmotionClassifier;
use metrics_exporter_prometheus::PrometheusHandle;
use report::ReportRenderer;
use serde::Serialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Shared by all sessions
    pub classifier: Arc<dyn EmotionClassifier>,
    pub renderer: Arc<ReportRenderer>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Currently connected sessions
    pub active_sessions: AtomicUsize,
    /// Sessions accepted since start
    pub total_sessions: AtomicU64,
    /// Prometheus recorder handle, when one is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServerConfig,
        classifier: Arc<dyn EmotionClassifier>,
        renderer: Arc<ReportRenderer>,
    ) -> Self {
        Self {
            config,
            classifier,
            renderer,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            active_sessions: AtomicUsize::new(0),
            total_sessions: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub classifier: String,
    pub sessions: SessionCounts,
}

/// Session counters
#[derive(Debug, Serialize)]
pub struct SessionCounts {
    pub active: usize,
    pub total: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ws::ws_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        classifier: state.classifier.name().to_string(),
        sessions: SessionCounts {
            active: state.active_sessions.load(Ordering::Relaxed),
            total: state.total_sessions.load(Ordering::Relaxed),
        },
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Initialize logging at `level`; unknown levels fall back to info
pub fn init_logging(level: &str) {
    let max_level = Level::from_str(level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Run the server until it fails
pub async fn run_server(state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = state.config.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Emotion server listening on ws://{}", addr);
    let app = create_router(state);
    axum::serve(listener, app).await.map_err(ServerError::Serve)?;

    Ok(())
}

/// Serve forever, restarting after `restart_backoff` whenever the server stops
pub async fn run_forever(state: Arc<AppState>) {
    let backoff = state.config.restart_backoff();
    loop {
        match run_server(Arc::clone(&state)).await {
            Ok(()) => warn!("Server stopped"),
            Err(e) => error!("Server failed: {}", e),
        }
        info!("Restarting server in {:?}", backoff);
        tokio::time::sleep(backoff).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use emotion_detect::{Classification, DetectError};
    use frame_intake::Frame;
    use futures_util::{SinkExt, StreamExt};
    use image::{ImageFormat, Rgb, RgbImage};
    use report::ReportConfig;
    use std::io::Cursor;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tower::ServiceExt;

    struct NoFaceClassifier;

    impl EmotionClassifier for NoFaceClassifier {
        fn classify(&self, _frame: &Frame) -> Result<Classification, DetectError> {
            Ok(Classification::NoFace)
        }

        fn name(&self) -> &str {
            "no-face"
        }
    }

    struct HappyClassifier;

    impl EmotionClassifier for HappyClassifier {
        fn classify(&self, _frame: &Frame) -> Result<Classification, DetectError> {
            Ok(Classification::Emotion {
                label: "happiness".to_string(),
                confidence: 0.9,
            })
        }
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            ServerConfig::default(),
            Arc::new(NoFaceClassifier),
            Arc::new(ReportRenderer::new(ReportConfig::default())),
        ))
    }

    #[tokio::test]
    async fn test_health() {
        let state = state();
        state.total_sessions.store(4, Ordering::Relaxed);
        let app = create_router(Arc::clone(&state));

        let response = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["classifier"], "no-face");
        assert_eq!(json["sessions"]["active"], 0);
        assert_eq!(json["sessions"]["total"], 4);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_empty() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_root_requires_websocket_upgrade() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let mut config = ServerConfig::default();
        config.bind_addr = "not-an-address".to_string();
        let state = Arc::new(AppState::new(
            config,
            Arc::new(NoFaceClassifier),
            Arc::new(ReportRenderer::new(ReportConfig::default())),
        ));
        assert!(matches!(
            run_server(state).await,
            Err(ServerError::Bind { .. })
        ));
    }

    async fn next_text<S>(socket: &mut S) -> String
    where
        S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        let message = tokio::time::timeout(Duration::from_secs(10), socket.next())
            .await
            .expect("reply in time")
            .expect("socket open")
            .unwrap();
        message.into_text().unwrap()
    }

    #[tokio::test]
    async fn test_dropped_socket_renders_final_report() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::new(
            ServerConfig::default(),
            Arc::new(HappyClassifier),
            Arc::new(ReportRenderer::new(ReportConfig {
                output_dir: dir.path().to_path_buf(),
                chart_width: 300,
                chart_height: 200,
                ..Default::default()
            })),
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(Arc::clone(&state));
        tokio::spawn(async move { axum::serve(listener, app).await });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/", addr))
            .await
            .unwrap();

        socket.send(WsMessage::Text("ping".to_string())).await.unwrap();
        assert_eq!(next_text(&mut socket).await, "pong");

        let mut png = Cursor::new(Vec::new());
        RgbImage::from_pixel(8, 8, Rgb([90, 120, 150]))
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        socket.send(WsMessage::Binary(png.into_inner())).await.unwrap();
        assert_eq!(next_text(&mut socket).await, "frame:1");
        assert_eq!(next_text(&mut socket).await, "happiness");
        assert_eq!(state.active_sessions.load(Ordering::Relaxed), 1);

        // No close handshake
        drop(socket);

        for _ in 0..200 {
            if state.active_sessions.load(Ordering::Relaxed) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert_eq!(state.active_sessions.load(Ordering::Relaxed), 0);
        assert_eq!(state.total_sessions.load(Ordering::Relaxed), 1);

        let reports: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "pdf"))
            .collect();
        assert_eq!(reports.len(), 1, "exactly one final report");
    }
}
