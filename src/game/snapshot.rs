//! Snapshot building for network transmission

use std::collections::HashMap;
use uuid::Uuid;

use crate::game::bullet::Bullet;
use crate::ws::protocol::{BulletSnapshot, GameEvent, RocketSnapshot, ServerMsg};

use super::r#match::PlayerSlot;

/// Builds full-state snapshots every Nth simulation tick
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot message from the rockets' serialization views
    pub fn build(
        &self,
        tick: u64,
        players: &HashMap<Uuid, PlayerSlot>,
        bullets: &[Bullet],
        events: Vec<GameEvent>,
    ) -> ServerMsg {
        let rockets: Vec<RocketSnapshot> = players
            .values()
            .map(|slot| RocketSnapshot {
                player_id: slot.player_id,
                state: slot.rocket.view(),
                last_input_seq: slot.last_input_seq,
            })
            .collect();

        let bullets: Vec<BulletSnapshot> = bullets
            .iter()
            .map(|b| BulletSnapshot {
                id: b.id,
                shooter_id: b.shooter_id,
                position: b.position,
                velocity: b.velocity,
            })
            .collect();

        ServerMsg::Snapshot {
            tick,
            rockets,
            bullets,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sends_every_nth_tick() {
        let mut builder = SnapshotBuilder::new(3);
        assert!(!builder.should_send());
        assert!(!builder.should_send());
        assert!(builder.should_send());
        assert!(!builder.should_send());
    }

    #[test]
    fn force_next_triggers_immediately() {
        let mut builder = SnapshotBuilder::new(5);
        builder.force_next();
        assert!(builder.should_send());
        assert!(!builder.should_send());
    }
}
