//! Match state and authoritative tick loop

use dashmap::DashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::time::{tick_delta, SIMULATION_TPS, SNAPSHOT_TPS};
use crate::ws::protocol::{ClientMsg, GameEvent, PlayerInfo, ServerMsg};

use super::bullet::Bullet;
use super::physics::ArcadePhysics;
use super::rocket::{Action, Rocket};
use super::snapshot::SnapshotBuilder;
use super::vec2::Vec2;
use super::PlayerInput;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Waiting for the first player
    Waiting,
    /// Match in progress
    InProgress,
    /// Match ended
    Ended,
}

/// One player's seat in a match. Owns the rocket; the tick loop is the only
/// code that ever mutates it.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    pub player_id: Uuid,
    pub display_name: String,
    pub rocket: Rocket,
    /// Highest input sequence number accepted so far
    pub last_input_seq: u32,
    /// Action batch queued for the next tick, consumed when it runs
    pub pending_actions: Vec<Action>,
}

/// Match state (owned by the match task)
pub struct MatchState {
    pub id: Uuid,
    pub seed: u64,
    pub phase: MatchPhase,
    pub tick: u64,
    pub players: HashMap<Uuid, PlayerSlot>,
    pub bullets: Vec<Bullet>,
    pub config: GameConfig,
    pub physics: ArcadePhysics,
    pub rng: ChaCha8Rng,
}

impl MatchState {
    pub fn new(id: Uuid, seed: u64, config: GameConfig) -> Self {
        Self {
            id,
            seed,
            phase: MatchPhase::Waiting,
            tick: 0,
            players: HashMap::new(),
            bullets: Vec::new(),
            physics: ArcadePhysics::new(&config),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate a spawn position on the spawn ring, facing a random way
    pub fn generate_spawn_position(&mut self) -> (Vec2, f64) {
        let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let distance = self.rng.gen_range(0.0..self.config.spawn_radius);
        let position = Vec2::from_angle(angle) * distance;
        let orientation = self.rng.gen_range(0.0..std::f64::consts::TAU);
        (position, orientation)
    }
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<PlayerInput>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub player_count: Arc<std::sync::atomic::AtomicUsize>,
}

impl MatchHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn total_players(&self) -> usize {
        self.matches.iter().map(|m| m.value().player_count()).sum()
    }

    /// Find a match with available slots
    pub fn find_available_match(&self, max_players: usize) -> Option<MatchHandle> {
        for entry in self.matches.iter() {
            if entry.value().player_count() < max_players {
                return Some(entry.value().clone());
            }
        }
        None
    }

    /// Join the first match with a free slot, or spin up a new one.
    /// A new match's tick loop runs on its own task until the match ends.
    pub fn join_or_create(registry: &Arc<MatchRegistry>, config: GameConfig) -> MatchHandle {
        if let Some(handle) = registry.find_available_match(config.max_players) {
            return handle;
        }

        let match_id = Uuid::new_v4();
        let seed = rand::random::<u64>();
        let (game_match, handle) = GameMatch::new(match_id, seed, config);
        registry.insert(handle.clone());

        let registry = Arc::clone(registry);
        tokio::spawn(async move {
            game_match.run().await;
            registry.remove(&match_id);
            info!(match_id = %match_id, "Match removed from registry");
        });

        handle
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative game match
pub struct GameMatch {
    state: MatchState,
    input_rx: mpsc::Receiver<PlayerInput>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    player_count: Arc<std::sync::atomic::AtomicUsize>,
}

impl GameMatch {
    /// Create a new match
    pub fn new(id: Uuid, seed: u64, config: GameConfig) -> (Self, MatchHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let handle = MatchHandle {
            id,
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            player_count: player_count.clone(),
        };

        let snapshot_interval = SIMULATION_TPS / SNAPSHOT_TPS;
        let game_match = Self {
            state: MatchState::new(id, seed, config),
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            player_count,
        };

        (game_match, handle)
    }

    /// Run the authoritative tick loop
    pub async fn run(mut self) {
        info!(match_id = %self.state.id, "Match started");

        let tick_duration = Duration::from_micros(1_000_000 / SIMULATION_TPS as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            // Drain input queue
            self.process_inputs();

            // Run simulation tick
            let events = self.run_tick();

            // Build and broadcast snapshot if needed
            if self.snapshot_builder.should_send() {
                let snapshot = self.snapshot_builder.build(
                    self.state.tick,
                    &self.state.players,
                    &self.state.bullets,
                    events,
                );

                let _ = self.snapshot_tx.send(snapshot);
            }

            // A match that has seen players ends once they are all gone
            if self.state.players.is_empty() && self.state.phase != MatchPhase::Waiting {
                self.state.phase = MatchPhase::Ended;
                info!(match_id = %self.state.id, "All players left, ending match");
                break;
            }
        }
    }

    /// Process all pending inputs from players
    fn process_inputs(&mut self) {
        while let Ok(input) = self.input_rx.try_recv() {
            match input.msg {
                ClientMsg::JoinMatch { .. } => {
                    self.handle_join(input.player_id);
                }
                ClientMsg::ActionTick { seq, actions } => {
                    self.handle_actions(input.player_id, seq, actions);
                }
                ClientMsg::Ping { t } => {
                    let _ = self.snapshot_tx.send(ServerMsg::Pong { t });
                }
                ClientMsg::LeaveMatch => {
                    self.handle_leave(input.player_id);
                }
            }
        }
    }

    /// Handle player join request
    fn handle_join(&mut self, player_id: Uuid) {
        if self.state.players.contains_key(&player_id) {
            warn!(player_id = %player_id, "Player already in match");
            return;
        }

        if self.state.players.len() >= self.state.config.max_players {
            let _ = self.snapshot_tx.send(ServerMsg::Error {
                code: "match_full".to_string(),
                message: "Match is full".to_string(),
            });
            return;
        }

        let (spawn_position, spawn_orientation) = self.state.generate_spawn_position();
        let slot = PlayerSlot {
            player_id,
            display_name: format!("Player_{}", &player_id.to_string()[..8]),
            rocket: Rocket::new(spawn_position, spawn_orientation, player_id),
            last_input_seq: 0,
            pending_actions: Vec::new(),
        };

        let player_info = PlayerInfo {
            player_id,
            display_name: slot.display_name.clone(),
        };

        self.state.players.insert(player_id, slot);
        self.player_count
            .store(self.state.players.len(), std::sync::atomic::Ordering::Relaxed);

        // Notify all players of the new player
        let _ = self.snapshot_tx.send(ServerMsg::PlayerJoined {
            player: player_info,
        });

        // Send match joined to the new player
        let players: Vec<PlayerInfo> = self
            .state
            .players
            .values()
            .map(|slot| PlayerInfo {
                player_id: slot.player_id,
                display_name: slot.display_name.clone(),
            })
            .collect();

        let _ = self.snapshot_tx.send(ServerMsg::MatchJoined {
            match_id: self.state.id,
            seed: self.state.seed,
            players,
        });

        info!(
            match_id = %self.state.id,
            player_id = %player_id,
            player_count = self.state.players.len(),
            "Player joined match"
        );

        if self.state.phase == MatchPhase::Waiting {
            self.state.phase = MatchPhase::InProgress;
        }
    }

    /// Buffer a player's action batch for the next tick. Stale batches
    /// (sequence number not above the last accepted one) are dropped.
    fn handle_actions(&mut self, player_id: Uuid, seq: u32, actions: Vec<Action>) {
        if let Some(slot) = self.state.players.get_mut(&player_id) {
            if seq > slot.last_input_seq {
                slot.last_input_seq = seq;
                slot.pending_actions = actions;
            }
        }
    }

    /// Handle player leave
    fn handle_leave(&mut self, player_id: Uuid) {
        if self.state.players.remove(&player_id).is_some() {
            self.player_count
                .store(self.state.players.len(), std::sync::atomic::Ordering::Relaxed);

            let _ = self.snapshot_tx.send(ServerMsg::PlayerLeft {
                player_id,
                reason: "disconnected".to_string(),
            });

            info!(
                match_id = %self.state.id,
                player_id = %player_id,
                "Player left match"
            );
        }
    }

    /// Run a single simulation tick: each rocket folds its queued action
    /// batch into its state exactly once, then bullets advance.
    fn run_tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.state.tick += 1;

        if self.state.phase != MatchPhase::InProgress {
            return events;
        }

        let dt = tick_delta();

        // Advance rockets, collecting fire requests
        let mut fire_requests = Vec::new();
        for slot in self.state.players.values_mut() {
            let actions = std::mem::take(&mut slot.pending_actions);
            match slot
                .rocket
                .advance(&actions, &self.state.config, &self.state.physics, dt)
            {
                Ok(Some(request)) => fire_requests.push(request),
                Ok(None) => {}
                Err(e) => {
                    // Entity state is untouched on error; skip this tick
                    error!(
                        match_id = %self.state.id,
                        player_id = %slot.player_id,
                        error = %e,
                        "Tick failed for rocket"
                    );
                }
            }
        }

        // Spawn bullets from this tick's fire requests
        for request in fire_requests {
            let bullet = Bullet::spawn(&request, &self.state.config);
            events.push(GameEvent::Fired {
                shooter_id: request.shooter_id,
                bullet_id: bullet.id,
                position: request.position,
                orientation: request.orientation,
            });
            self.state.bullets.push(bullet);
        }

        // Advance bullets and drop expired ones
        self.state.bullets.retain_mut(|b| b.update(dt));

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_match(config: GameConfig) -> GameMatch {
        let (game_match, _handle) = GameMatch::new(Uuid::new_v4(), 7, config);
        game_match
    }

    #[test]
    fn join_seats_player_and_starts_match() {
        let mut m = test_match(GameConfig::default());
        let player_id = Uuid::new_v4();

        m.handle_join(player_id);

        assert_eq!(m.state.players.len(), 1);
        assert_eq!(m.state.phase, MatchPhase::InProgress);
        assert_eq!(m.player_count.load(std::sync::atomic::Ordering::Relaxed), 1);
        let rocket = &m.state.players[&player_id].rocket;
        assert_eq!(rocket.id, player_id);
        assert!(rocket.orientation >= 0.0 && rocket.orientation < std::f64::consts::TAU);
    }

    #[test]
    fn join_rejected_when_full() {
        let config = GameConfig {
            max_players: 1,
            ..GameConfig::default()
        };
        let mut m = test_match(config);

        m.handle_join(Uuid::new_v4());
        m.handle_join(Uuid::new_v4());

        assert_eq!(m.state.players.len(), 1);
    }

    #[test]
    fn stale_action_batches_are_dropped() {
        let mut m = test_match(GameConfig::default());
        let player_id = Uuid::new_v4();
        m.handle_join(player_id);

        m.handle_actions(player_id, 2, vec![Action::Thrust]);
        m.handle_actions(player_id, 1, vec![Action::Fire]);

        assert_eq!(m.state.players[&player_id].pending_actions, vec![Action::Thrust]);
        assert_eq!(m.state.players[&player_id].last_input_seq, 2);
    }

    #[test]
    fn fire_spawns_bullet_and_event() {
        let config = GameConfig {
            fire_cooldown: 0.0,
            ..GameConfig::default()
        };
        let mut m = test_match(config);
        let player_id = Uuid::new_v4();
        m.handle_join(player_id);

        // First tick builds up the cooldown clock past the (zero) threshold
        m.run_tick();

        m.handle_actions(player_id, 1, vec![Action::Fire]);
        let events = m.run_tick();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::Fired { shooter_id, .. } if shooter_id == player_id));
        assert_eq!(m.state.bullets.len(), 1);
    }

    #[test]
    fn action_batch_applies_for_exactly_one_tick() {
        let mut m = test_match(GameConfig::default());
        let player_id = Uuid::new_v4();
        m.handle_join(player_id);

        m.handle_actions(player_id, 1, vec![Action::TurnLeft]);
        m.run_tick();
        assert_ne!(m.state.players[&player_id].rocket.angular_velocity, 0.0);

        // No new batch arrived; the next tick coasts
        m.run_tick();
        assert_eq!(m.state.players[&player_id].rocket.angular_velocity, 0.0);
        assert!(m.state.players[&player_id].pending_actions.is_empty());
    }

    #[test]
    fn bullets_expire_after_lifetime() {
        let config = GameConfig {
            fire_cooldown: 0.0,
            bullet_lifetime: 2.0 * tick_delta(),
            ..GameConfig::default()
        };
        let mut m = test_match(config);
        let player_id = Uuid::new_v4();
        m.handle_join(player_id);

        m.run_tick();
        m.handle_actions(player_id, 1, vec![Action::Fire]);
        m.run_tick();
        assert_eq!(m.state.bullets.len(), 1);

        m.run_tick();
        assert!(m.state.bullets.is_empty());
    }

    #[test]
    fn leave_frees_seat() {
        let mut m = test_match(GameConfig::default());
        let player_id = Uuid::new_v4();
        m.handle_join(player_id);
        m.handle_leave(player_id);

        assert!(m.state.players.is_empty());
        assert_eq!(m.player_count.load(std::sync::atomic::Ordering::Relaxed), 0);
    }
}
