//! Physical body state and the per-tick force integrator.

use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a physical body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BodyError {
    #[error("mass must be positive and finite")]
    InvalidMass,
    #[error("radius must be non-negative and finite")]
    InvalidRadius,
    #[error("position and velocity must be finite")]
    NonFiniteState,
}

/// Point mass with a collision radius, advanced by semi-implicit Euler.
///
/// Forces accumulate as pending acceleration between [`PhysicsBody::apply_force`]
/// calls and are consumed exactly once per [`PhysicsBody::integrate`] step.
/// Magnitude limits are the caller's responsibility; this type never clamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    mass: f32,
    radius: f32,
}

impl PhysicsBody {
    /// Construct a body, validating mass and radius up front. Division by
    /// mass inside the integrator relies on this check.
    pub fn new(position: Vec2, velocity: Vec2, mass: f32, radius: f32) -> Result<Self, BodyError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(BodyError::InvalidMass);
        }
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(BodyError::InvalidRadius);
        }
        if !(position.is_finite() && velocity.is_finite()) {
            return Err(BodyError::NonFiniteState);
        }
        Ok(Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            mass,
            radius,
        })
    }

    /// Convenience constructor for a stationary body.
    pub fn at_rest(position: Vec2, mass: f32, radius: f32) -> Result<Self, BodyError> {
        Self::new(position, Vec2::ZERO, mass, radius)
    }

    /// Accumulate `force / mass` into the pending acceleration.
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force / self.mass;
    }

    /// Advance one step: velocity first, then position (symplectic order),
    /// then clear the accumulator.
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = Vec2::ZERO;
    }

    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    #[must_use]
    pub const fn mass(&self) -> f32 {
        self.mass
    }

    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Pending acceleration accumulated since the last integration step.
    #[must_use]
    pub const fn acceleration(&self) -> Vec2 {
        self.acceleration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_degenerate_parameters() {
        assert_eq!(
            PhysicsBody::at_rest(Vec2::ZERO, 0.0, 1.0),
            Err(BodyError::InvalidMass)
        );
        assert_eq!(
            PhysicsBody::at_rest(Vec2::ZERO, -1.0, 1.0),
            Err(BodyError::InvalidMass)
        );
        assert_eq!(
            PhysicsBody::at_rest(Vec2::ZERO, f32::NAN, 1.0),
            Err(BodyError::InvalidMass)
        );
        assert_eq!(
            PhysicsBody::at_rest(Vec2::ZERO, 1.0, -0.5),
            Err(BodyError::InvalidRadius)
        );
        assert!(PhysicsBody::at_rest(Vec2::ZERO, 1.0, 0.0).is_ok());
    }

    #[test]
    fn integrate_updates_velocity_before_position() {
        let mut body = PhysicsBody::at_rest(Vec2::ZERO, 2.0, 1.0).expect("body");
        body.apply_force(Vec2::new(4.0, 0.0));
        body.integrate(0.5);

        // a = F/m = 2; v = a*dt = 1; position uses the *new* velocity.
        assert!((body.velocity().x - 1.0).abs() < 1e-6);
        assert!((body.position().x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn accumulator_clears_after_integration() {
        let mut body = PhysicsBody::at_rest(Vec2::ZERO, 1.0, 1.0).expect("body");
        body.apply_force(Vec2::new(3.0, 0.0));
        body.integrate(1.0);
        assert_eq!(body.acceleration(), Vec2::ZERO);

        let velocity_before = body.velocity();
        body.integrate(1.0);
        assert_eq!(body.velocity(), velocity_before, "no force, no acceleration");
    }

    #[test]
    fn forces_accumulate_between_steps() {
        let mut body = PhysicsBody::at_rest(Vec2::ZERO, 1.0, 1.0).expect("body");
        body.apply_force(Vec2::new(1.0, 0.0));
        body.apply_force(Vec2::new(0.0, 2.0));
        body.integrate(1.0);
        assert!((body.velocity().x - 1.0).abs() < 1e-6);
        assert!((body.velocity().y - 2.0).abs() < 1e-6);
    }
}
