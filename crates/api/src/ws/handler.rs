use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::auth::jwt::validate_token;
use crate::middleware::auth::AuthUser;
use crate::persistence::{persist, PersistPolicy};
use crate::state::AppState;
use crate::ws::manager::WsSender;
use crate::ws::messages::{ClientMessage, ServerEvent, DETECT_FRAME};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Browsers cannot set headers on upgrade requests, so the access token
    /// travels in the query string.
    pub token: Option<String>,
}

/// HTTP handler that upgrades the connection to a detection session.
///
/// An invalid or expired token does not reject the upgrade; the session
/// simply runs anonymously.
pub async fn ws_detect_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let user = params
        .token
        .as_deref()
        .and_then(|token| match validate_token(token, &state.config.jwt) {
            Ok(claims) => Some(AuthUser::from(claims)),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid WebSocket token");
                None
            }
        });

    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Inbound text frames waiting for the frame worker, per session.
const FRAME_QUEUE_CAPACITY: usize = 32;

/// How long a closing session waits for queued events to reach the client.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Run one detection session after upgrade.
///
/// Three tasks cooperate per session:
///   1. The sender task forwards the manager channel to the socket sink.
///   2. The frame worker handles queued text frames one at a time, so
///      results leave in the order frames arrived.
///   3. The receive loop (this task) keeps reading the socket while a frame
///      is being inferred. It answers pings and queues text frames.
async fn handle_socket(socket: WebSocket, state: AppState, user: Option<AuthUser>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let user_id = user.as_ref().map(|u| u.user_id);
    tracing::info!(conn_id = %conn_id, user_id = ?user_id, "WebSocket connected");

    let ws_manager = state.ws_manager.clone();
    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;
    let Some(out) = ws_manager.sender(&conn_id).await else {
        return;
    };

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let username = user.as_ref().map(|u| u.username.clone());
    send_event(&out, &conn_id, ServerEvent::connection_established(username));

    let (frames_tx, frames_rx) = mpsc::channel::<String>(FRAME_QUEUE_CAPACITY);
    let worker = tokio::spawn(frame_worker(
        state,
        user,
        conn_id.clone(),
        out.clone(),
        frames_rx,
    ));

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match frames_tx.try_send(text.as_str().to_owned()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(conn_id = %conn_id, "Frame queue full, dropping frame");
                    send_event(&out, &conn_id, ServerEvent::error("Too many frames queued"));
                }
                Err(TrySendError::Closed(_)) => break,
            },
            Ok(Message::Ping(payload)) => {
                let _ = out.send(Message::Pong(payload));
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Frames still queued or in flight are abandoned with the client.
    drop(frames_tx);
    worker.abort();
    let _ = worker.await;

    // With every sender gone the sender task drains what is already queued
    // and then ends on its own.
    ws_manager.remove(&conn_id).await;
    drop(out);
    if tokio::time::timeout(DRAIN_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Handle queued frames one at a time, in arrival order.
async fn frame_worker(
    state: AppState,
    user: Option<AuthUser>,
    conn_id: String,
    out: WsSender,
    mut frames: mpsc::Receiver<String>,
) {
    while let Some(text) = frames.recv().await {
        if let Some(event) = handle_text(&state, user.as_ref(), &conn_id, &text).await {
            send_event(&out, &conn_id, event);
        }
    }
}

/// Turn one inbound text frame into at most one outbound event.
async fn handle_text(
    state: &AppState,
    user: Option<&AuthUser>,
    conn_id: &str,
    text: &str,
) -> Option<ServerEvent> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => return Some(ServerEvent::error(format!("Invalid message: {e}"))),
    };

    if message.kind != DETECT_FRAME {
        tracing::debug!(conn_id, kind = %message.kind, "Ignoring unknown message type");
        return None;
    }
    let image = message.image.filter(|image| !image.trim().is_empty())?;

    let summary = state.inference.detect_data_uri(image).await;
    if let Some(error) = &summary.error {
        return Some(ServerEvent::error(error.clone()));
    }

    let policy = PersistPolicy {
        persist_anonymous: state.config.persist_anonymous,
    };
    let user_id = user.map(|u| u.user_id);
    let saved = match persist(&state.pool, policy, &summary, user_id).await {
        Ok(stored) => stored.is_some(),
        Err(e) => {
            tracing::warn!(conn_id, error = %e, "Streaming detection not saved");
            false
        }
    };

    tracing::debug!(
        conn_id,
        count = summary.detections_count,
        saved,
        "Frame result"
    );
    Some(ServerEvent::detection_result(summary, saved))
}

fn send_event(out: &WsSender, conn_id: &str, event: ServerEvent) {
    match event.to_message() {
        Ok(msg) => {
            let _ = out.send(msg);
        }
        Err(e) => tracing::error!(conn_id, error = %e, "Failed to encode WebSocket event"),
    }
}
