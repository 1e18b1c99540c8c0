//! Game simulation modules

pub mod bullet;
pub mod r#match;
pub mod physics;
pub mod rocket;
pub mod snapshot;
pub mod vec2;

pub use r#match::{GameMatch, MatchHandle, MatchRegistry, PlayerSlot};

use crate::ws::protocol::ClientMsg;
use uuid::Uuid;

/// Player input received from WebSocket
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub player_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}
