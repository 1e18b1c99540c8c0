//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::rocket::{Action, RocketView};
use crate::game::vec2::Vec2;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request to join a match
    JoinMatch {
        /// Optional specific match ID, otherwise the server assigns one
        match_id: Option<Uuid>,
    },

    /// The batch of actions to apply on the next simulation tick
    ActionTick {
        /// Sequence number; stale batches are dropped
        seq: u32,
        /// Ordered actions for this tick
        actions: Vec<Action>,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave current match
    LeaveMatch,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        player_id: Uuid,
        server_time: u64,
    },

    /// Confirmation of match join
    MatchJoined {
        match_id: Uuid,
        /// Seed for deterministic random generation
        seed: u64,
        /// All players in the match at join time
        players: Vec<PlayerInfo>,
    },

    /// Player joined the match
    PlayerJoined {
        player: PlayerInfo,
    },

    /// Player left the match
    PlayerLeft {
        player_id: Uuid,
        reason: String,
    },

    /// Game state snapshot (sent at regular intervals)
    Snapshot {
        /// Server tick number
        tick: u64,
        /// All rocket states
        rockets: Vec<RocketSnapshot>,
        /// Live bullets
        bullets: Vec<BulletSnapshot>,
        /// Events that occurred since last snapshot
        events: Vec<GameEvent>,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Player info for join messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: Uuid,
    pub display_name: String,
}

/// One rocket in a snapshot. `state` is the entity's serialization view;
/// per-tick transient flags never reach the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocketSnapshot {
    pub player_id: Uuid,
    #[serde(flatten)]
    pub state: RocketView,
    /// Last processed input sequence, for client-side reconciliation
    pub last_input_seq: u32,
}

/// One bullet in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub id: Uuid,
    pub shooter_id: Uuid,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Game events (shots fired, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A rocket fired a bullet
    Fired {
        shooter_id: Uuid,
        bullet_id: Uuid,
        position: Vec2,
        orientation: f64,
    },
}
