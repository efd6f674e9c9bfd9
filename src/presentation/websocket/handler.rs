//! WebSocket Connection Handler
//!
//! Authenticates the upgrade, then runs three parts per connection: a
//! reader that decodes frames onto the session's inbound queue, the session
//! worker that processes them, and a writer that drains the session's
//! outbound queue onto the socket.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use super::gateway::Gateway;
use super::session::spawn_session_worker;
use crate::application::realtime::ClientEvent;
use crate::shared::error::{AppError, GatewayError};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// The token may come from `?token=` (browsers cannot set headers on a
/// WebSocket handshake) or from an `Authorization: Bearer` header. The
/// token is checked before the upgrade headers; an unknown token is always
/// a 401.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(query): Query<GatewayQuery>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<AppState>,
) -> Response {
    let user_id = match authenticate(&state, query.token, bearer).await {
        Ok(user_id) => user_id,
        Err(e) => return e.into_response(),
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let gateway = state.gateway.clone();
    let inbound_buffer = state.settings.websocket.inbound_buffer;

    ws.max_message_size(state.settings.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, gateway, user_id, inbound_buffer))
}

async fn authenticate(
    state: &AppState,
    query_token: Option<String>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<i64, AppError> {
    let token = query_token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer.map(|TypedHeader(Authorization(b))| b.token().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let user = state
        .repos
        .users
        .find_by_token(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))?;

    Ok(user.id)
}

/// Handle individual WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    gateway: Arc<Gateway>,
    user_id: i64,
    inbound_buffer: usize,
) {
    let Some((connection_id, mut outbound)) = gateway.connect(user_id) else {
        tracing::info!(user_id, "Connection refused: gateway is shutting down");
        return;
    };

    tracing::info!(connection_id = %connection_id, user_id, "User connected");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Ends when the session is torn down and its queue sender dropped
    let mut writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(error = %e, event = event.name(), "Failed to serialize event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let (inbound, worker) = spawn_session_worker(gateway.clone(), connection_id, inbound_buffer);

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => {
                                if inbound.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(
                                    connection_id = %connection_id,
                                    error = %e,
                                    "Malformed event"
                                );
                                gateway.report(
                                    connection_id,
                                    &GatewayError::Invalid("Malformed event.".into()),
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary frames are not part of the protocol; ping/pong is handled by axum
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            _ = &mut writer => {
                tracing::debug!(connection_id = %connection_id, "Session closed by server");
                break;
            }
        }
    }

    // Cleanup
    drop(inbound);
    gateway.disconnect(connection_id);
    if let Err(e) = worker.await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Session worker failed");
    }

    tracing::info!(connection_id = %connection_id, user_id, "User disconnected");
}
