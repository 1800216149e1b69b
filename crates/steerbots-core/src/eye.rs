//! Directional perception: per-tick filtering of tracked bodies into a
//! frontal vision cone and an omnidirectional near zone.

use crate::body::PhysicsBody;
use crate::dna::Dna;
use crate::vec2::Vec2;
use crate::{BodyId, GroupId};
use slotmap::SlotMap;
use std::f32::consts::PI;

/// Squared-velocity threshold below which an agent has no usable heading.
const HEADING_EPSILON: f32 = 1e-5;

/// Vision component attached to a steering agent.
///
/// `look` rebuilds both sight lists from scratch each call; they are empty
/// before the first call. The roster it filters is a shared, externally
/// managed group the eye only reads.
#[derive(Debug, Clone)]
pub struct Eye {
    vision_distance: f32,
    vision_safe_distance: f32,
    vision_angle: f32,
    tracked: GroupId,
    target: Option<BodyId>,
    far_sight: Vec<BodyId>,
    near_sight: Vec<BodyId>,
}

impl Eye {
    /// Build an eye from the owner's traits, watching `tracked`. The initial
    /// target is chosen by the world (first roster entry, or none).
    #[must_use]
    pub fn new(dna: &Dna, tracked: GroupId, target: Option<BodyId>) -> Self {
        Self {
            vision_distance: dna.vision_distance,
            vision_safe_distance: dna.vision_safe_distance,
            vision_angle: dna.vision_angle,
            tracked,
            target,
            far_sight: Vec::new(),
            near_sight: Vec::new(),
        }
    }

    /// Roster this eye filters every tick.
    #[must_use]
    pub const fn tracked(&self) -> GroupId {
        self.tracked
    }

    /// Currently selected target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<BodyId> {
        self.target
    }

    /// Reassign the target. The eye never changes it on its own.
    pub fn set_target(&mut self, target: Option<BodyId>) {
        self.target = target;
    }

    /// Bodies inside the frontal cone as of the last `look`.
    #[must_use]
    pub fn far_sight(&self) -> &[BodyId] {
        &self.far_sight
    }

    /// Bodies inside the omnidirectional near zone as of the last `look`.
    #[must_use]
    pub fn near_sight(&self) -> &[BodyId] {
        &self.near_sight
    }

    /// Recompute both sight lists against the current roster. Stale roster
    /// handles (bodies removed since the roster was built) are skipped.
    pub fn look(
        &mut self,
        owner: BodyId,
        owner_body: &PhysicsBody,
        bodies: &SlotMap<BodyId, PhysicsBody>,
        roster: &[BodyId],
    ) {
        self.far_sight.clear();
        self.near_sight.clear();
        for &id in roster {
            if id == owner {
                continue;
            }
            let Some(candidate) = bodies.get(id) else {
                continue;
            };
            let target_pos = candidate.position();
            if Self::in_sight(owner_body, target_pos, self.vision_distance, self.vision_angle) {
                self.far_sight.push(id);
            }
            if Self::in_sight(owner_body, target_pos, self.vision_safe_distance, PI) {
                self.near_sight.push(id);
            }
        }
    }

    /// Membership test: inside `max_distance` (strictly beyond the owner's
    /// own position) and within `max_angle` of the movement direction.
    ///
    /// A stationary owner has no heading, so the frontal cone matches
    /// nothing; zones spanning a half-turn or more stay omnidirectional.
    fn in_sight(owner: &PhysicsBody, target: Vec2, max_distance: f32, max_angle: f32) -> bool {
        let to_target = target - owner.position();
        let distance = to_target.length();
        if !(distance > 0.0 && distance < max_distance) {
            return false;
        }
        let velocity = owner.velocity();
        if velocity.length_sq() <= HEADING_EPSILON {
            return max_angle >= PI;
        }
        to_target.angle_between(velocity) < max_angle
    }
}
