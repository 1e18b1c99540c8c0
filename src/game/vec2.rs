//! 2D vector type used for positions, velocities, and accelerations

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

/// A 2D vector in game-world units. Doubles as a point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along the given angle (radians, 0 = +x axis)
    pub fn from_angle(angle: f64) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// True if neither component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_scale() {
        let v = Vec2::new(1.0, 2.0) + Vec2::new(3.0, -1.0) * 2.0;
        assert_eq!(v, Vec2::new(7.0, 0.0));
    }

    #[test]
    fn from_angle_zero_points_along_x() {
        let v = Vec2::from_angle(0.0);
        assert!((v.x - 1.0).abs() < 1e-12);
        assert!(v.y.abs() < 1e-12);
    }

    #[test]
    fn length_is_euclidean() {
        assert!((Vec2::new(3.0, 4.0).length() - 5.0).abs() < 1e-12);
        assert_eq!(Vec2::ZERO.length(), 0.0);
    }

    #[test]
    fn finiteness() {
        assert!(Vec2::new(1.0, -2.5).is_finite());
        assert!(!Vec2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f64::INFINITY).is_finite());
    }
}
