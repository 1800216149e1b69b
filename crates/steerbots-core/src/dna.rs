//! Per-agent genetic parameters bounding what an agent can do.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use thiserror::Error;

/// Sampling ranges used by [`Dna::random`], matching the legacy game tuning.
const MAX_SPEED_RANGE: (f32, f32) = (3.0, 5.0);
const MAX_FORCE_RANGE: (f32, f32) = (4.0, 7.0);
const PURSUIT_HORIZON_RANGE: (f32, f32) = (0.5, 1.0);
const ARRIVE_RADIUS_RANGE: (f32, f32) = (3.0, 5.0);
const WANDER_INTERVAL_RANGE: (f32, f32) = (0.5, 1.2);
const WANDER_RADIUS_RANGE: (f32, f32) = (2.0, 3.0);
const BASE_VISION_DISTANCE: f32 = 1.0;
const BASE_VISION_ANGLE: f32 = PI * 0.8;
const BASE_WANDER_JITTER: f32 = PI / 8.0;

/// Fraction of the vision distance covered by the omnidirectional near zone.
pub const SAFE_DISTANCE_FRACTION: f32 = 0.25;

/// Errors raised when validating a trait set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DnaError {
    #[error("max_speed must be positive and finite")]
    InvalidMaxSpeed,
    #[error("max_force must be positive and finite")]
    InvalidMaxForce,
    #[error("vision_distance must be non-negative and finite")]
    InvalidVisionDistance,
    #[error("vision_angle must lie in (0, pi]")]
    InvalidVisionAngle,
    #[error("pursuit_horizon must be positive and finite")]
    InvalidPursuitHorizon,
    #[error("arrive_radius must be positive and finite")]
    InvalidArriveRadius,
    #[error("wander geometry must be positive and finite, jitter non-negative")]
    InvalidWander,
}

/// Capability presets carried over from the game's entity roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    Neutral,
    Predator,
    Prey,
}

impl Archetype {
    /// `(max_speed, max_force, vision_distance, vision_safe_distance, vision_angle)`
    #[must_use]
    pub fn movement_profile(self) -> (f32, f32, f32, f32, f32) {
        match self {
            Self::Neutral => (5.0, 0.0, 0.0, 0.0, 0.0),
            Self::Predator => (5.0, 5.0, 5.0, 0.1, PI * 0.3),
            Self::Prey => (9.0, 9.0, 20.0, 0.5, PI * 0.75),
        }
    }
}

/// Randomized, per-agent scalar parameters. Sampled once at construction and
/// immutable afterwards except for explicit external tuning (e.g. promoting
/// a pursuer via [`crate::World::dna_mut`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    /// Upper bound on desired-velocity magnitudes produced by behaviors.
    pub max_speed: f32,
    /// Upper bound on the blended steering force applied per tick.
    pub max_force: f32,
    /// Reach of the frontal vision cone.
    pub vision_distance: f32,
    /// Reach of the omnidirectional near zone (0.25 x vision_distance).
    pub vision_safe_distance: f32,
    /// Half-angle of the frontal vision cone, in (0, pi].
    pub vision_angle: f32,
    /// Look-ahead horizon used by pursuit prediction, in seconds.
    pub pursuit_horizon: f32,
    /// Radius at which an arriving agent is considered on target.
    pub arrive_radius: f32,
    /// Forward projection distance of the wander circle.
    pub wander_interval: f32,
    /// Radius of the wander circle.
    pub wander_radius: f32,
    /// Per-tick bound on the wander heading random walk.
    pub wander_jitter: f32,
}

impl Dna {
    /// Sample a fresh trait set from the fixed legacy ranges.
    #[must_use]
    pub fn random(rng: &mut dyn RngCore) -> Self {
        let vision_distance = BASE_VISION_DISTANCE;
        Self {
            max_speed: rng.random_range(MAX_SPEED_RANGE.0..=MAX_SPEED_RANGE.1),
            max_force: rng.random_range(MAX_FORCE_RANGE.0..=MAX_FORCE_RANGE.1),
            vision_distance,
            vision_safe_distance: SAFE_DISTANCE_FRACTION * vision_distance,
            vision_angle: BASE_VISION_ANGLE,
            pursuit_horizon: rng.random_range(PURSUIT_HORIZON_RANGE.0..=PURSUIT_HORIZON_RANGE.1),
            arrive_radius: rng.random_range(ARRIVE_RADIUS_RANGE.0..=ARRIVE_RADIUS_RANGE.1),
            wander_interval: rng.random_range(WANDER_INTERVAL_RANGE.0..=WANDER_INTERVAL_RANGE.1),
            wander_radius: rng.random_range(WANDER_RADIUS_RANGE.0..=WANDER_RADIUS_RANGE.1),
            wander_jitter: BASE_WANDER_JITTER,
        }
    }

    /// Sample a trait set and overlay an [`Archetype`]'s movement and vision
    /// profile. Timing traits (pursuit, wander) stay randomized.
    #[must_use]
    pub fn for_archetype(archetype: Archetype, rng: &mut dyn RngCore) -> Self {
        let mut dna = Self::random(rng);
        let (max_speed, max_force, vision_distance, vision_safe_distance, vision_angle) =
            archetype.movement_profile();
        dna.max_speed = max_speed;
        dna.max_force = max_force;
        dna.vision_distance = vision_distance;
        dna.vision_safe_distance = vision_safe_distance;
        dna.vision_angle = vision_angle;
        dna
    }

    /// Check the structural invariants. Called by the world when an agent is
    /// spawned with caller-supplied traits.
    pub fn validate(&self) -> Result<(), DnaError> {
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(DnaError::InvalidMaxSpeed);
        }
        if !(self.max_force.is_finite() && self.max_force > 0.0) {
            return Err(DnaError::InvalidMaxForce);
        }
        if !(self.vision_distance.is_finite() && self.vision_distance >= 0.0)
            || !(self.vision_safe_distance.is_finite() && self.vision_safe_distance >= 0.0)
        {
            return Err(DnaError::InvalidVisionDistance);
        }
        if !(self.vision_angle.is_finite() && self.vision_angle > 0.0 && self.vision_angle <= PI) {
            return Err(DnaError::InvalidVisionAngle);
        }
        if !(self.pursuit_horizon.is_finite() && self.pursuit_horizon > 0.0) {
            return Err(DnaError::InvalidPursuitHorizon);
        }
        if !(self.arrive_radius.is_finite() && self.arrive_radius > 0.0) {
            return Err(DnaError::InvalidArriveRadius);
        }
        if !(self.wander_interval.is_finite() && self.wander_interval > 0.0)
            || !(self.wander_radius.is_finite() && self.wander_radius > 0.0)
            || !(self.wander_jitter.is_finite() && self.wander_jitter >= 0.0)
        {
            return Err(DnaError::InvalidWander);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn sampled_dna_stays_in_range_and_validates() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..64 {
            let dna = Dna::random(&mut rng);
            assert!(dna.validate().is_ok());
            assert!((3.0..=5.0).contains(&dna.max_speed));
            assert!((4.0..=7.0).contains(&dna.max_force));
            assert!((0.5..=1.0).contains(&dna.pursuit_horizon));
            assert!((0.5..=1.2).contains(&dna.wander_interval));
            assert!((2.0..=3.0).contains(&dna.wander_radius));
            assert!(
                (dna.vision_safe_distance - SAFE_DISTANCE_FRACTION * dna.vision_distance).abs()
                    < 1e-6
            );
        }
    }

    #[test]
    fn validation_rejects_degenerate_traits() {
        let mut rng = SmallRng::seed_from_u64(7);
        let base = Dna::random(&mut rng);

        let mut dna = base;
        dna.max_speed = 0.0;
        assert_eq!(dna.validate(), Err(DnaError::InvalidMaxSpeed));

        let mut dna = base;
        dna.max_force = f32::NAN;
        assert_eq!(dna.validate(), Err(DnaError::InvalidMaxForce));

        let mut dna = base;
        dna.vision_angle = 0.0;
        assert_eq!(dna.validate(), Err(DnaError::InvalidVisionAngle));

        let mut dna = base;
        dna.vision_angle = PI * 1.5;
        assert_eq!(dna.validate(), Err(DnaError::InvalidVisionAngle));

        let mut dna = base;
        dna.wander_jitter = -0.1;
        assert_eq!(dna.validate(), Err(DnaError::InvalidWander));
    }

    #[test]
    fn archetype_overlays_movement_profile() {
        let mut rng = SmallRng::seed_from_u64(11);
        let prey = Dna::for_archetype(Archetype::Prey, &mut rng);
        assert_eq!(prey.max_speed, 9.0);
        assert_eq!(prey.vision_distance, 20.0);
        assert!((prey.vision_angle - PI * 0.75).abs() < 1e-6);
        // Timing traits still come from the random ranges.
        assert!((0.5..=1.0).contains(&prey.pursuit_horizon));
    }
}
