//! Per-connection Event Worker
//!
//! Inbound events of one connection are queued and processed strictly one
//! after another, so a join always completes before a later send from the
//! same connection is looked at.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::gateway::Gateway;
use crate::application::realtime::{ClientEvent, ConnectionId};

/// Spawn the worker for one connection.
///
/// The worker ends once every sender of the returned queue is dropped and
/// the queue is drained.
pub fn spawn_session_worker(
    gateway: Arc<Gateway>,
    connection_id: ConnectionId,
    buffer: usize,
) -> (mpsc::Sender<ClientEvent>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<ClientEvent>(buffer);

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            gateway.handle(connection_id, event).await;
        }
        tracing::trace!(connection_id = %connection_id, "Session worker finished");
    });

    (tx, handle)
}
