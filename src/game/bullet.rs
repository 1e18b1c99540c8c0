//! Bullets spawned from rocket fire requests

use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::rocket::FireRequest;
use crate::game::vec2::Vec2;

/// A live bullet in a match. Flies straight from the shooter's position
/// along the shooter's orientation until its lifetime runs out.
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: Uuid,
    pub shooter_id: Uuid,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f64,
    pub lifetime_remaining: f64,
}

impl Bullet {
    pub fn spawn(request: &FireRequest, config: &GameConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            shooter_id: request.shooter_id,
            position: request.position,
            velocity: Vec2::from_angle(request.orientation) * config.bullet_speed,
            radius: config.bullet_radius,
            lifetime_remaining: config.bullet_lifetime,
        }
    }

    /// Advance the bullet by `dt`, returns false once expired
    pub fn update(&mut self, dt: f64) -> bool {
        self.position += self.velocity * dt;
        self.lifetime_remaining -= dt;
        self.lifetime_remaining > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> FireRequest {
        FireRequest {
            shooter_id: Uuid::new_v4(),
            position: Vec2::new(5.0, 5.0),
            orientation: 0.0,
        }
    }

    #[test]
    fn spawns_along_shooter_orientation() {
        let config = GameConfig {
            bullet_speed: 100.0,
            ..GameConfig::default()
        };
        let bullet = Bullet::spawn(&request(), &config);

        assert_eq!(bullet.position, Vec2::new(5.0, 5.0));
        assert!((bullet.velocity.x - 100.0).abs() < 1e-9);
        assert!(bullet.velocity.y.abs() < 1e-9);
    }

    #[test]
    fn expires_after_lifetime() {
        let config = GameConfig {
            bullet_lifetime: 0.5,
            ..GameConfig::default()
        };
        let mut bullet = Bullet::spawn(&request(), &config);

        assert!(bullet.update(0.3));
        assert!(!bullet.update(0.3));
    }
}
