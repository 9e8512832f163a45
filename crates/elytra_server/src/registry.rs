// SPDX-License-Identifier: MIT

//! Connection Registry (spec.md §4.2 / §4.7): tracks every open
//! worker/observer channel and the liveness sweep that prunes dead ones.
//!
//! Each connection gets an unbounded `mpsc` sender for its outbound text
//! frames; the websocket write task (see `ws.rs`) owns the receiving end
//! and is the only thing that ever calls `.send()` on the socket itself.
//! This mirrors the teacher's `docker/ws.rs` split between a cheap,
//! clonable handle and the actual socket task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use elytra_core::ConnectionId;
use elytra_protocol::ServerFrame;
use parking_lot::RwLock;
use tokio::sync::mpsc;

/// Distinguishes a data-producing worker from a read-only dashboard
/// observer (spec.md §4.2): only workers receive `execute_chunk`, and
/// `broadcast` fans telemetry out to observers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Worker,
    Observer,
}

/// A connection's outbound mailbox and liveness flag. Cheap to clone
/// (an `Arc` internally via the channel sender); many tasks can hold one.
#[derive(Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub role: Role,
    sender: mpsc::UnboundedSender<String>,
    alive: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// Serialize and enqueue a server-originated frame. Errors (the
    /// socket task having already exited) are swallowed — the registry
    /// notices the dead connection on the next liveness sweep or `drop`.
    pub fn send(&self, frame: &ServerFrame) {
        match serde_json::to_string(frame) {
            Ok(text) => {
                let _ = self.sender.send(text);
            }
            Err(e) => tracing::error!(connection_id = %self.id, error = %e, "failed to serialize outgoing frame"),
        }
    }

    /// Rebroadcast a raw telemetry frame byte-for-byte (spec.md §4.3).
    pub fn send_raw(&self, raw: String) {
        let _ = self.sender.send(raw);
    }

    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Relaxed);
    }

    fn take_alive(&self) -> bool {
        self.alive.swap(false, Ordering::Relaxed)
    }
}

struct Connection {
    handle: ConnectionHandle,
}

#[derive(Default)]
pub struct Registry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly upgraded connection and return the receiving
    /// half the write task should drain.
    pub fn accept(&self, role: Role) -> (ConnectionHandle, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle { id, role, sender: tx, alive: Arc::new(AtomicBool::new(true)) };
        self.connections.write().insert(id, Connection { handle: handle.clone() });
        (handle, rx)
    }

    pub fn drop_connection(&self, id: ConnectionId) {
        self.connections.write().remove(&id);
    }

    pub fn get(&self, id: ConnectionId) -> Option<ConnectionHandle> {
        self.connections.read().get(&id).map(|c| c.handle.clone())
    }

    pub fn workers(&self) -> Vec<ConnectionHandle> {
        self.by_role(Role::Worker)
    }

    pub fn observers(&self) -> Vec<ConnectionHandle> {
        self.by_role(Role::Observer)
    }

    fn by_role(&self, role: Role) -> Vec<ConnectionHandle> {
        self.connections
            .read()
            .values()
            .map(|c| &c.handle)
            .filter(|h| h.role == role)
            .cloned()
            .collect()
    }

    /// Rebroadcast a raw telemetry frame to every connected observer
    /// (spec.md §4.3, §4.7).
    pub fn broadcast_to_observers(&self, raw: &str) {
        for handle in self.observers() {
            handle.send_raw(raw.to_string());
        }
    }

    /// One liveness tick (spec.md §4.7): ping every connection, then drop
    /// whichever one didn't answer the *previous* tick's ping before this
    /// one arrived. The ping/pong here is an application-level JSON frame,
    /// not a WebSocket control frame, so "alive" means "answered our own
    /// protocol", not merely "TCP socket still open".
    pub fn sweep_liveness(&self) {
        let dead: Vec<ConnectionId> = {
            let connections = self.connections.read();
            connections
                .values()
                .filter(|c| !c.handle.take_alive())
                .map(|c| c.handle.id)
                .collect()
        };
        for id in &dead {
            tracing::warn!(connection_id = %id, "connection missed liveness ping, dropping");
            self.drop_connection(*id);
        }
        for handle in self.connections.read().values().map(|c| &c.handle) {
            handle.send(&ServerFrame::Ping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_registers_and_reports_role() {
        let registry = Registry::new();
        let (handle, _rx) = registry.accept(Role::Worker);
        assert_eq!(registry.workers().len(), 1);
        assert!(registry.observers().is_empty());
        assert_eq!(registry.get(handle.id).unwrap().id, handle.id);
    }

    #[test]
    fn drop_connection_removes_it() {
        let registry = Registry::new();
        let (handle, _rx) = registry.accept(Role::Observer);
        registry.drop_connection(handle.id);
        assert!(registry.get(handle.id).is_none());
        assert!(registry.observers().is_empty());
    }

    #[test]
    fn broadcast_reaches_observers_only() {
        let registry = Registry::new();
        let (_worker, mut worker_rx) = registry.accept(Role::Worker);
        let (_observer, mut observer_rx) = registry.accept(Role::Observer);

        registry.broadcast_to_observers(r#"{"type":"worker_progress"}"#);

        assert!(observer_rx.try_recv().is_ok());
        assert!(worker_rx.try_recv().is_err());
    }

    #[test]
    fn sweep_drops_connections_that_never_marked_alive() {
        let registry = Registry::new();
        let (handle, mut rx) = registry.accept(Role::Worker);

        // First sweep: freshly accepted connections start alive, so they
        // survive and get pinged.
        registry.sweep_liveness();
        assert!(registry.get(handle.id).is_some());
        assert!(rx.try_recv().is_ok());

        // No mark_alive() call in between: the connection missed its
        // window and the second sweep evicts it.
        registry.sweep_liveness();
        assert!(registry.get(handle.id).is_none());
    }

    #[test]
    fn mark_alive_keeps_a_connection_through_the_next_sweep() {
        let registry = Registry::new();
        let (handle, _rx) = registry.accept(Role::Worker);

        registry.sweep_liveness();
        handle.mark_alive();
        registry.sweep_liveness();
        assert!(registry.get(handle.id).is_some());
    }
}
