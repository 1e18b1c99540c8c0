//! Physics model trait and the arcade model used by matches

use crate::config::GameConfig;
use crate::game::vec2::Vec2;

/// Pluggable physics strategy injected into the integration step.
///
/// Implementations must be pure: the same inputs always yield the same
/// vectors, and nothing here mutates shared state.
pub trait PhysicsModel {
    /// Thrust acceleration for a rocket facing `orientation` (radians)
    fn thrust(&self, orientation: f64) -> Vec2;

    /// Drag acceleration for a rocket moving at `velocity`
    fn drag(&self, velocity: Vec2) -> Vec2;

    /// Constant gravity acceleration
    fn gravity(&self) -> Vec2;
}

/// Arcade physics: constant-magnitude directional thrust, linear drag,
/// constant gravity. All tuning comes from [`GameConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ArcadePhysics {
    thrust_power: f64,
    drag_coefficient: f64,
    gravity: Vec2,
}

impl ArcadePhysics {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            thrust_power: config.thrust_power,
            drag_coefficient: config.drag_coefficient,
            gravity: config.gravity,
        }
    }
}

impl PhysicsModel for ArcadePhysics {
    fn thrust(&self, orientation: f64) -> Vec2 {
        Vec2::from_angle(orientation) * self.thrust_power
    }

    fn drag(&self, velocity: Vec2) -> Vec2 {
        velocity * -self.drag_coefficient
    }

    fn gravity(&self) -> Vec2 {
        self.gravity
    }
}

/// Axis-aligned bounding box for hit-testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_width: f64,
    pub half_height: f64,
}

impl Aabb {
    pub fn centered(center: Vec2, half_width: f64, half_height: f64) -> Self {
        Self {
            center,
            half_width,
            half_height,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_width
            && (point.y - self.center.y).abs() <= self.half_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arcade_thrust_follows_orientation() {
        let config = GameConfig {
            thrust_power: 10.0,
            ..GameConfig::default()
        };
        let model = ArcadePhysics::new(&config);

        let t = model.thrust(0.0);
        assert!((t.x - 10.0).abs() < 1e-12);
        assert!(t.y.abs() < 1e-12);

        let t = model.thrust(std::f64::consts::FRAC_PI_2);
        assert!(t.x.abs() < 1e-12);
        assert!((t.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn arcade_drag_opposes_velocity() {
        let config = GameConfig {
            drag_coefficient: 0.5,
            ..GameConfig::default()
        };
        let model = ArcadePhysics::new(&config);

        let d = model.drag(Vec2::new(4.0, -2.0));
        assert_eq!(d, Vec2::new(-2.0, 1.0));
    }

    #[test]
    fn aabb_contains() {
        let body = Aabb::centered(Vec2::new(5.0, 5.0), 2.0, 2.0);
        assert!(body.contains(Vec2::new(6.9, 3.1)));
        assert!(!body.contains(Vec2::new(7.1, 5.0)));
    }
}
