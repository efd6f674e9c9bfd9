//! Session Registry
//!
//! Process-local map of live connections: who is behind each one, which
//! channel rooms it is subscribed to, and the outbound queue that feeds its
//! transport writer. A room is nothing more than the set of sessions keyed
//! by a channel id.
//!
//! All structural changes happen under one write lock, so a broadcast never
//! observes a half-removed session. Fan-out collects its targets under the
//! read lock and enqueues after releasing it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::events::{ConnectionId, ServerEvent};
use crate::infrastructure::metrics;

struct SessionEntry {
    user_id: i64,
    rooms: HashSet<i64>,
    outbound: mpsc::Sender<ServerEvent>,
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<ConnectionId, SessionEntry>,
    rooms: HashMap<i64, HashSet<ConnectionId>>,
}

impl RegistryState {
    fn detach_from_room(&mut self, connection_id: ConnectionId, channel_id: i64) {
        if let Some(members) = self.rooms.get_mut(&channel_id) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(&channel_id);
            }
        }
    }
}

/// Outcome of one room fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Sessions the event was enqueued for
    pub delivered: usize,
    /// Sessions skipped and unsubscribed because their user is banned
    pub banned: Vec<ConnectionId>,
    /// Sessions torn down because their queue was full or closed
    pub evicted: Vec<ConnectionId>,
}

/// Owner of all live session state.
///
/// Created empty and accepting; [`SessionRegistry::shutdown`] tears every
/// session down and stops accepting registrations.
pub struct SessionRegistry {
    state: RwLock<RegistryState>,
    accepting: AtomicBool,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            accepting: AtomicBool::new(true),
        }
    }

    /// Record a new session with no rooms.
    ///
    /// Returns false if the connection is already registered (the existing
    /// session is kept) or the registry has been shut down.
    pub fn register(
        &self,
        connection_id: ConnectionId,
        user_id: i64,
        outbound: mpsc::Sender<ServerEvent>,
    ) -> bool {
        if !self.accepting.load(Ordering::SeqCst) {
            return false;
        }

        let mut state = self.state.write();
        if state.sessions.contains_key(&connection_id) {
            return false;
        }
        state.sessions.insert(
            connection_id,
            SessionEntry {
                user_id,
                rooms: HashSet::new(),
                outbound,
            },
        );
        metrics::set_active_sessions(state.sessions.len());
        drop(state);

        tracing::info!(connection_id = %connection_id, user_id, "Session registered");
        true
    }

    /// Subscribe a session to a channel room. Idempotent.
    ///
    /// Returns false if the session is not registered.
    pub fn add_to_room(&self, connection_id: ConnectionId, channel_id: i64) -> bool {
        let mut state = self.state.write();
        match state.sessions.get_mut(&connection_id) {
            Some(session) => {
                session.rooms.insert(channel_id);
            }
            None => return false,
        }
        state.rooms.entry(channel_id).or_default().insert(connection_id);
        true
    }

    /// Unsubscribe a session from a channel room.
    ///
    /// Returns false if the session was not in that room.
    pub fn remove_from_room(&self, connection_id: ConnectionId, channel_id: i64) -> bool {
        let mut state = self.state.write();
        let was_member = state
            .sessions
            .get_mut(&connection_id)
            .map(|session| session.rooms.remove(&channel_id))
            .unwrap_or(false);
        state.detach_from_room(connection_id, channel_id);
        was_member
    }

    /// Remove a session and all of its room memberships.
    ///
    /// Returns the rooms it was in, or `None` if it was not registered.
    /// Dropping the session's queue sender lets its writer task finish.
    pub fn teardown(&self, connection_id: ConnectionId) -> Option<Vec<i64>> {
        let mut state = self.state.write();
        let session = state.sessions.remove(&connection_id)?;
        for channel_id in &session.rooms {
            state.detach_from_room(connection_id, *channel_id);
        }
        metrics::set_active_sessions(state.sessions.len());
        drop(state);

        tracing::info!(
            connection_id = %connection_id,
            user_id = session.user_id,
            rooms = session.rooms.len(),
            "Session torn down"
        );
        Some(session.rooms.into_iter().collect())
    }

    /// Stop accepting sessions and tear down every live one.
    pub fn shutdown(&self) -> usize {
        self.accepting.store(false, Ordering::SeqCst);
        let mut state = self.state.write();
        let count = state.sessions.len();
        state.sessions.clear();
        state.rooms.clear();
        metrics::set_active_sessions(0);
        drop(state);

        tracing::info!(sessions = count, "Session registry shut down");
        count
    }

    pub fn user_of(&self, connection_id: ConnectionId) -> Option<i64> {
        self.state
            .read()
            .sessions
            .get(&connection_id)
            .map(|session| session.user_id)
    }

    pub fn is_in_room(&self, connection_id: ConnectionId, channel_id: i64) -> bool {
        self.state
            .read()
            .sessions
            .get(&connection_id)
            .map(|session| session.rooms.contains(&channel_id))
            .unwrap_or(false)
    }

    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    pub fn room_size(&self, channel_id: i64) -> usize {
        self.state
            .read()
            .rooms
            .get(&channel_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Enqueue an event for exactly one session.
    ///
    /// A full or closed queue tears the session down. Returns whether the
    /// event was enqueued.
    pub fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        let outbound = match self.state.read().sessions.get(&connection_id) {
            Some(session) => session.outbound.clone(),
            None => return false,
        };

        match outbound.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                self.evict(connection_id, &err);
                false
            }
        }
    }

    /// Fan an event out to every session in a channel room.
    ///
    /// `except` skips one connection (the originator of a relay). Sessions
    /// whose user is in `banned` receive nothing and are unsubscribed from
    /// the room. Full or closed queues get their session torn down.
    pub fn broadcast(
        &self,
        channel_id: i64,
        event: &ServerEvent,
        except: Option<ConnectionId>,
        banned: &HashSet<i64>,
    ) -> Delivery {
        let mut delivery = Delivery::default();
        let targets: Vec<(ConnectionId, mpsc::Sender<ServerEvent>)> = {
            let state = self.state.read();
            let Some(members) = state.rooms.get(&channel_id) else {
                return delivery;
            };
            members
                .iter()
                .filter(|connection_id| Some(**connection_id) != except)
                .filter_map(|connection_id| {
                    let session = state.sessions.get(connection_id)?;
                    if banned.contains(&session.user_id) {
                        delivery.banned.push(*connection_id);
                        None
                    } else {
                        Some((*connection_id, session.outbound.clone()))
                    }
                })
                .collect()
        };

        for connection_id in &delivery.banned {
            self.remove_from_room(*connection_id, channel_id);
            tracing::info!(
                connection_id = %connection_id,
                channel_id,
                "Banned session removed from room during fan-out"
            );
        }

        for (connection_id, outbound) in targets {
            match outbound.try_send(event.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(err) => {
                    self.evict(connection_id, &err);
                    delivery.evicted.push(connection_id);
                }
            }
        }

        metrics::record_deliveries(event.name(), delivery.delivered);
        delivery
    }

    fn evict(&self, connection_id: ConnectionId, err: &TrySendError<ServerEvent>) {
        match err {
            TrySendError::Full(_) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    "Outbound queue full, evicting slow session"
                );
                metrics::record_eviction("slow_consumer");
            }
            TrySendError::Closed(_) => {
                tracing::debug!(connection_id = %connection_id, "Outbound queue closed");
                metrics::record_eviction("closed");
            }
        }
        self.teardown(connection_id);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
