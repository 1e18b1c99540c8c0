//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::game::vec2::Vec2;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin for CORS ("*" allows any)
    pub client_origin: String,
    /// Game simulation tuning
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            game: GameConfig::from_env()?,
        })
    }
}

/// Tuning values for the rocket simulation.
///
/// Passed by reference into every tick rather than read from globals, so
/// entities stay testable in isolation.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    /// Angular speed applied while a turn action is held, rad/s
    pub turn_speed: f64,
    /// Minimum game-seconds between shots. A rocket may fire only when its
    /// cooldown clock exceeds this (strictly).
    pub fire_cooldown: f64,
    /// Half-extent of a rocket's bounding box
    pub player_radius: f64,
    /// Thrust magnitude while thrusters are active, units/s^2
    pub thrust_power: f64,
    /// Linear drag coefficient (drag = -k * velocity)
    pub drag_coefficient: f64,
    /// Constant gravity vector, units/s^2
    pub gravity: Vec2,
    /// Bullet muzzle speed, units/s
    pub bullet_speed: f64,
    /// Bullet hitbox radius
    pub bullet_radius: f64,
    /// Bullet lifetime, game seconds
    pub bullet_lifetime: f64,
    /// Radius of the ring new rockets spawn on
    pub spawn_radius: f64,
    /// Maximum players per match
    pub max_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_speed: 2.5,
            fire_cooldown: 0.5,
            player_radius: 16.0,
            thrust_power: 60.0,
            drag_coefficient: 0.4,
            gravity: Vec2::new(0.0, -20.0),
            bullet_speed: 300.0,
            bullet_radius: 3.0,
            bullet_lifetime: 2.0,
            spawn_radius: 400.0,
            max_players: 8,
        }
    }
}

impl GameConfig {
    /// Load tuning from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            turn_speed: env_f64("TURN_SPEED", defaults.turn_speed)?,
            fire_cooldown: env_f64("FIRE_COOLDOWN", defaults.fire_cooldown)?,
            player_radius: env_f64("PLAYER_RADIUS", defaults.player_radius)?,
            thrust_power: env_f64("THRUST_POWER", defaults.thrust_power)?,
            drag_coefficient: env_f64("DRAG_COEFFICIENT", defaults.drag_coefficient)?,
            gravity: Vec2::new(
                env_f64("GRAVITY_X", defaults.gravity.x)?,
                env_f64("GRAVITY_Y", defaults.gravity.y)?,
            ),
            bullet_speed: env_f64("BULLET_SPEED", defaults.bullet_speed)?,
            bullet_radius: env_f64("BULLET_RADIUS", defaults.bullet_radius)?,
            bullet_lifetime: env_f64("BULLET_LIFETIME", defaults.bullet_lifetime)?,
            spawn_radius: env_f64("SPAWN_RADIUS", defaults.spawn_radius)?,
            max_players: env_usize("MAX_PLAYERS", defaults.max_players)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject tuning values the simulation cannot run with.
    ///
    /// A negative fire cooldown is disallowed: the at-most-one-shot-per-tick
    /// guarantee relies on a freshly reset cooldown failing the fire check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("TURN_SPEED", self.turn_speed),
            ("FIRE_COOLDOWN", self.fire_cooldown),
            ("PLAYER_RADIUS", self.player_radius),
            ("THRUST_POWER", self.thrust_power),
            ("DRAG_COEFFICIENT", self.drag_coefficient),
            ("GRAVITY_X", self.gravity.x),
            ("GRAVITY_Y", self.gravity.y),
            ("BULLET_SPEED", self.bullet_speed),
            ("BULLET_RADIUS", self.bullet_radius),
            ("BULLET_LIFETIME", self.bullet_lifetime),
            ("SPAWN_RADIUS", self.spawn_radius),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::InvalidNumber(name));
            }
        }

        if self.turn_speed <= 0.0 {
            return Err(ConfigError::InvalidNumber("TURN_SPEED"));
        }
        if self.fire_cooldown < 0.0 {
            return Err(ConfigError::InvalidNumber("FIRE_COOLDOWN"));
        }
        if self.player_radius <= 0.0 {
            return Err(ConfigError::InvalidNumber("PLAYER_RADIUS"));
        }
        if self.thrust_power < 0.0 {
            return Err(ConfigError::InvalidNumber("THRUST_POWER"));
        }
        if self.drag_coefficient < 0.0 {
            return Err(ConfigError::InvalidNumber("DRAG_COEFFICIENT"));
        }
        if self.bullet_speed <= 0.0 || self.bullet_radius <= 0.0 || self.bullet_lifetime <= 0.0 {
            return Err(ConfigError::InvalidNumber("BULLET_*"));
        }
        if self.spawn_radius <= 0.0 {
            return Err(ConfigError::InvalidNumber("SPAWN_RADIUS"));
        }
        if self.max_players == 0 {
            return Err(ConfigError::InvalidNumber("MAX_PLAYERS"));
        }

        Ok(())
    }
}

fn env_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

fn env_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid numeric value for {0}")]
    InvalidNumber(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_fire_cooldown_rejected() {
        let config = GameConfig {
            fire_cooldown: -0.1,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_tuning_rejected() {
        let config = GameConfig {
            turn_speed: f64::NAN,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            gravity: Vec2::new(0.0, f64::INFINITY),
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_fire_cooldown_allowed() {
        let config = GameConfig {
            fire_cooldown: 0.0,
            ..GameConfig::default()
        };
        config.validate().unwrap();
    }
}
