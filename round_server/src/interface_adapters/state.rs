use crate::interface_adapters::world::InMemoryWorld;
use crate::use_cases::Arena;
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    // Round host; owns the active round and its tick loop.
    pub arena: Arc<Arena>,
    // Concrete world so handlers can manage the roster.
    pub world: Arc<InMemoryWorld>,
    // Serialized round events, shared across all websocket connections.
    pub event_bytes_tx: broadcast::Sender<Utf8Bytes>,
}
