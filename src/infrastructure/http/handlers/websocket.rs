//! WebSocket Handlers
//!
//! - `/ws/editor/{session_id}`: 编辑会话事件（自动保存结果、正文替换、会话关闭）
//! - `/ws/events`: 全局事件（生成结果、故事删除）

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// 编辑会话 WebSocket
pub async fn editor_websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_editor_socket(socket, session_id, state))
}

/// 全局 WebSocket
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

fn encode(event: &WsEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_editor_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    if !state.session_manager.is_valid(&session_id) {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    }

    let mut event_rx = state.event_publisher.register_session(&session_id);

    tracing::info!(session_id = %session_id, "Editor WebSocket connected");

    let forward_session_id = session_id.clone();
    let forward_task = tokio::spawn(async move {
        // 发送端被移除（会话关闭）时 recv 返回 Closed，循环结束
        while let Ok(event) = event_rx.recv().await {
            let closing = matches!(event, WsEvent::SessionClosed { .. });
            let Some(msg) = encode(&event) else {
                continue;
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    session_id = %forward_session_id,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }

            if closing {
                let _ = sender.close().await;
                break;
            }
        }
    });

    // 客户端消息只用作心跳
    let session_manager = state.session_manager.clone();
    let receive_session_id = session_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %receive_session_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %receive_session_id, error = %e, "WebSocket error");
                    break;
                }
                Ok(_) => session_manager.touch(&receive_session_id),
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    // 会话仍然有效时保留事件通道，便于重连
    if !state.session_manager.is_valid(&session_id) {
        state.event_publisher.unregister_session(&session_id);
    }
    tracing::info!(session_id = %session_id, "Editor WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut event_rx = state.event_publisher.subscribe_global();

    tracing::info!("Global WebSocket connected");

    let forward_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match &event {
                WsEvent::GenerationCompleted { .. }
                | WsEvent::GenerationFailed { .. }
                | WsEvent::StoryDeleted { .. } => {
                    let Some(msg) = encode(&event) else {
                        continue;
                    };

                    if let Err(e) = sender.send(msg).await {
                        tracing::debug!(error = %e, "Failed to send global WebSocket message");
                        break;
                    }
                }
                _ => {}
            }
        }
    });

    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Global WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Global WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Global WebSocket disconnected");
}
