//! WebSocket layer

pub mod handler;
pub mod protocol;
