//! Rocket entity state and the per-tick action/physics pipeline

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::physics::{Aabb, PhysicsModel};
use crate::game::vec2::Vec2;

/// A discrete player command issued within one simulation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TurnLeft,
    TurnRight,
    Thrust,
    Fire,
}

/// Request to spawn a projectile, handed back to the match loop rather than
/// applied to shared state directly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireRequest {
    pub shooter_id: Uuid,
    pub position: Vec2,
    pub orientation: f64,
}

/// Errors from advancing a rocket by one tick
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The caller handed us a negative time delta. This is an upstream
    /// scheduling bug and is reported rather than clamped.
    #[error("negative time delta: {0}")]
    NegativeDelta(f64),

    /// The physics model returned a NaN or infinite vector. Integrating it
    /// would poison the entity for every future tick, so the step fails
    /// before touching any state.
    #[error("physics model produced a non-finite {0} vector")]
    NonFinite(&'static str),
}

/// The agents in the game: rockets with physics attached.
///
/// One instance per player, owned by the match loop. `angular_velocity` and
/// `thrusters_active` are transient: they are cleared at the start of every
/// tick's action resolution, so a tick without turn/thrust actions coasts
/// straight with no spin.
#[derive(Debug, Clone)]
pub struct Rocket {
    /// Unique within a match, immutable after spawn
    pub id: Uuid,
    pub position: Vec2,
    /// Units per game second
    pub velocity: Vec2,
    /// Acceleration excluding gravity; gravity is added at integration time
    pub acceleration: Vec2,
    /// Radians in `[0, 2π)`; 0 faces along +x, the direction thrust pushes
    pub orientation: f64,
    /// Radians per game second, nonzero only on ticks with a turn action
    pub angular_velocity: f64,
    /// True only while a thrust action is present in the current tick
    pub thrusters_active: bool,
    /// Game seconds since the last successful shot, never negative
    pub cooldown: f64,
}

/// Externally observable snapshot of a rocket. The transient pair
/// (angular velocity, thruster flag) is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocketView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub orientation: f64,
    pub cooldown: f64,
}

impl Rocket {
    /// Spawn a rocket at the given position and orientation with zero
    /// velocity and acceleration, thrusters off, and no fire cooldown.
    pub fn new(position: Vec2, orientation: f64, id: Uuid) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            orientation: orientation.rem_euclid(TAU),
            angular_velocity: 0.0,
            thrusters_active: false,
            cooldown: 0.0,
        }
    }

    /// Bounding box for hit-testing, centered on the rocket
    pub fn body(&self, config: &GameConfig) -> Aabb {
        Aabb::centered(self.position, config.player_radius, config.player_radius)
    }

    /// Serialization view sent to clients and observers
    pub fn view(&self) -> RocketView {
        RocketView {
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
            orientation: self.orientation,
            cooldown: self.cooldown,
        }
    }

    /// Advance this rocket by one tick: clear transient flags, resolve the
    /// action batch in order, then integrate motion forward by `dt`.
    ///
    /// Returns the fire request to spawn a bullet, if the batch contained a
    /// `Fire` that passed the cooldown gate. Repeated `Fire` actions in one
    /// batch fire at most once: the first success resets the cooldown, which
    /// then fails the strict threshold check for the rest.
    pub fn advance(
        &mut self,
        actions: &[Action],
        config: &GameConfig,
        model: &dyn PhysicsModel,
        dt: f64,
    ) -> Result<Option<FireRequest>, TickError> {
        if dt < 0.0 {
            return Err(TickError::NegativeDelta(dt));
        }

        self.reset();

        let mut fired = None;
        for &action in actions {
            if let Some(request) = self.apply(action, config) {
                fired.get_or_insert(request);
            }
        }

        self.integrate(dt, model)?;
        Ok(fired)
    }

    /// Clear the per-tick transient state before resolving actions
    fn reset(&mut self) {
        self.angular_velocity = 0.0;
        self.thrusters_active = false;
    }

    /// Apply a single action. Each variant performs exactly its own mutation;
    /// none of them integrates motion.
    fn apply(&mut self, action: Action, config: &GameConfig) -> Option<FireRequest> {
        match action {
            Action::TurnLeft => {
                self.angular_velocity = config.turn_speed;
                None
            }
            Action::TurnRight => {
                self.angular_velocity = -config.turn_speed;
                None
            }
            Action::Thrust => {
                self.thrusters_active = true;
                None
            }
            Action::Fire => self.fire(config),
        }
    }

    /// Fire if the cooldown clock strictly exceeds the configured threshold.
    /// Firing below threshold is a silent no-op, not an error.
    fn fire(&mut self, config: &GameConfig) -> Option<FireRequest> {
        if self.cooldown > config.fire_cooldown {
            self.cooldown = 0.0;
            Some(FireRequest {
                shooter_id: self.id,
                position: self.position,
                orientation: self.orientation,
            })
        } else {
            None
        }
    }

    /// Explicit-Euler integration over `dt` game seconds.
    ///
    /// The update order is deliberate and load-bearing: position advances on
    /// the pre-tick velocity, velocity on the pre-tick acceleration plus
    /// gravity, and only then does acceleration absorb this tick's drag and
    /// thrust. Thrust applied this tick moves the rocket starting next tick.
    /// Accuracy degrades as `dt` grows; the match loop keeps it small and
    /// constant.
    pub fn integrate(&mut self, dt: f64, model: &dyn PhysicsModel) -> Result<(), TickError> {
        if dt < 0.0 {
            return Err(TickError::NegativeDelta(dt));
        }

        // Model outputs are sampled at the pre-update orientation and
        // velocity, and validated before any field changes.
        let thrust = if self.thrusters_active {
            model.thrust(self.orientation)
        } else {
            Vec2::ZERO
        };
        let drag = model.drag(self.velocity);
        let gravity = model.gravity();

        if !thrust.is_finite() {
            return Err(TickError::NonFinite("thrust"));
        }
        if !drag.is_finite() {
            return Err(TickError::NonFinite("drag"));
        }
        if !gravity.is_finite() {
            return Err(TickError::NonFinite("gravity"));
        }

        self.position += self.velocity * dt;
        self.orientation = (self.orientation + dt * self.angular_velocity).rem_euclid(TAU);

        self.velocity += (self.acceleration + gravity) * dt;
        self.acceleration += (drag + thrust) * dt;

        self.cooldown += dt;

        Ok(())
    }
}
