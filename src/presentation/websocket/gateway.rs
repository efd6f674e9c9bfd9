//! WebSocket Gateway
//!
//! Entry point of every gateway event. Owns the session registry for the
//! lifetime of the process and dispatches decoded events to the messaging
//! services. Failures are reported to the originating connection only.

use std::sync::Arc;

use tokio::sync::mpsc;
use validator::Validate;

use crate::application::realtime::{ClientEvent, ConnectionId, ServerEvent, SessionRegistry};
use crate::application::services::{
    HistoryReplayService, IngestRequest, MessagePipeline, Origin, Repositories,
    RoomMembershipService, SignallingRelay,
};
use crate::shared::error::GatewayError;
use crate::shared::validation::validation_message;

const IDENTITY_MISMATCH_REASON: &str = "User id does not match the connected user.";

pub struct Gateway {
    registry: Arc<SessionRegistry>,
    membership: RoomMembershipService,
    pipeline: Arc<MessagePipeline>,
    relay: SignallingRelay,
    outbound_buffer: usize,
}

impl Gateway {
    pub fn new(
        repos: Repositories,
        registry: Arc<SessionRegistry>,
        pipeline: Arc<MessagePipeline>,
        history_limit: usize,
        outbound_buffer: usize,
    ) -> Self {
        let history = HistoryReplayService::new(repos.clone(), history_limit);
        Self {
            membership: RoomMembershipService::new(repos.channels, registry.clone(), history),
            relay: SignallingRelay::new(registry.clone()),
            registry,
            pipeline,
            outbound_buffer,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Register a new session for an authenticated user.
    ///
    /// Returns the connection id and the receiving end of the session's
    /// outbound queue, or `None` once the gateway has been shut down.
    pub fn connect(&self, user_id: i64) -> Option<(ConnectionId, mpsc::Receiver<ServerEvent>)> {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        if !self.registry.register(connection_id, user_id, tx) {
            return None;
        }
        Some((connection_id, rx))
    }

    /// Process one inbound event to completion.
    ///
    /// Events for a connection that is no longer registered are ignored.
    pub async fn handle(&self, connection_id: ConnectionId, event: ClientEvent) {
        let Some(user_id) = self.registry.user_of(connection_id) else {
            tracing::debug!(
                connection_id = %connection_id,
                event = event.name(),
                "Event for a closed session ignored"
            );
            return;
        };

        let event_name = event.name();
        if let Err(err) = self.dispatch(connection_id, user_id, event).await {
            tracing::debug!(
                connection_id = %connection_id,
                user_id,
                event = event_name,
                "Event rejected"
            );
            self.report(connection_id, &err);
        }
    }

    async fn dispatch(
        &self,
        connection_id: ConnectionId,
        user_id: i64,
        event: ClientEvent,
    ) -> Result<(), GatewayError> {
        match event {
            ClientEvent::JoinChannel(request) => {
                ensure_identity(request.user_id, user_id)?;
                self.membership
                    .join_channel(connection_id, request.channel_id, user_id)
                    .await?;
            }
            ClientEvent::SendMessage(request) => {
                ensure_identity(request.user_id, user_id)?;
                request
                    .validate()
                    .map_err(|e| GatewayError::Invalid(validation_message(&e)))?;

                self.pipeline
                    .ingest(
                        Origin::Session(connection_id),
                        IngestRequest {
                            channel_id: request.channel_id,
                            sender_id: user_id,
                            message_type: request.message_type,
                            text: request.text,
                            media_ref: request.media_ref,
                        },
                    )
                    .await?;
            }
            ClientEvent::PeerConnected(request) => {
                self.relay
                    .relay(request.channel_id, request.peer_id, connection_id);
            }
        }
        Ok(())
    }

    /// Send an `error` event to one connection.
    pub fn report(&self, connection_id: ConnectionId, err: &GatewayError) {
        match err {
            GatewayError::Persistence { source, .. } => {
                tracing::error!(
                    connection_id = %connection_id,
                    error = %err,
                    cause = %source,
                    "Persistence failure"
                );
            }
            _ => {
                tracing::info!(connection_id = %connection_id, error = %err, "Gateway error");
            }
        }

        self.registry
            .send_to(connection_id, ServerEvent::Error(err.client_reason()));
    }

    /// Transport is gone; drop the session and every room membership.
    pub fn disconnect(&self, connection_id: ConnectionId) -> Option<Vec<i64>> {
        self.registry.teardown(connection_id)
    }

    /// Stop accepting connections and tear down every live session.
    pub fn shutdown(&self) -> usize {
        self.registry.shutdown()
    }
}

fn ensure_identity(claimed: Option<i64>, user_id: i64) -> Result<(), GatewayError> {
    match claimed {
        Some(claimed) if claimed != user_id => {
            Err(GatewayError::Forbidden(IDENTITY_MISMATCH_REASON))
        }
        _ => Ok(()),
    }
}
