//! WebSocket replication boundary

pub mod handler;
pub mod protocol;
