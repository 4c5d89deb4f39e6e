//! WebSocket session endpoint

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use session::SessionDriver;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::AppState;

/// Socket-level cap relative to the session payload limit. Payloads between
/// the two are answered with an error reply instead of a dropped connection.
const SOCKET_LIMIT_FACTOR: usize = 2;

/// Upgrade `GET /` to a session socket
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let limit = state
        .config
        .session
        .max_payload_bytes
        .saturating_mul(SOCKET_LIMIT_FACTOR);
    ws.max_message_size(limit)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Tracks the active-session gauge for one connection
struct ActiveSession {
    state: Arc<AppState>,
}

impl ActiveSession {
    fn enter(state: Arc<AppState>) -> Self {
        state.active_sessions.fetch_add(1, Ordering::Relaxed);
        state.total_sessions.fetch_add(1, Ordering::Relaxed);
        metrics::gauge!("emotion_active_sessions").increment(1.0);
        Self { state }
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.state.active_sessions.fetch_sub(1, Ordering::Relaxed);
        metrics::gauge!("emotion_active_sessions").decrement(1.0);
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let _active = ActiveSession::enter(Arc::clone(&state));
    let mut session = SessionDriver::new(
        state.config.session.clone(),
        Arc::clone(&state.classifier),
        Arc::clone(&state.renderer),
    );
    info!("Client connected: session {}", session.id());

    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!("Session {}: receive failed: {}", session.id(), e);
                break;
            }
        };

        let replies = match message {
            Message::Text(text) => session.handle_text(&text).await,
            Message::Binary(bytes) => session.handle_binary(bytes).await,
            Message::Close(_) => break,
            // Protocol-level ping/pong is answered by axum
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let replies = match replies {
            Ok(replies) => replies,
            Err(e) => {
                warn!("Session {}: {}", session.id(), e);
                break;
            }
        };

        for reply in replies {
            if let Err(e) = socket.send(Message::Text(reply.to_string())).await {
                warn!("Session {}: send failed: {}", session.id(), e);
                session.close().await;
                return;
            }
        }
    }

    match session.close().await {
        Some(path) => info!("Session {} final report: {}", session.id(), path.display()),
        None => debug!("Session {} closed without a final report", session.id()),
    }
}
