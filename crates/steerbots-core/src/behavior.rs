//! Steering behaviors: each produces a desired velocity (or steering delta)
//! that the owning agent blends by weight into one applied force.

use crate::body::PhysicsBody;
use crate::dna::Dna;
use crate::eye::Eye;
use crate::vec2::Vec2;
use crate::{BodyId, GroupId};
use rand::{Rng, RngCore};
use slotmap::SlotMap;
use std::fmt;

/// Threshold on squared magnitude applied before any normalize; keeps NaNs
/// out of the pipeline when vectors collapse to near-zero.
pub(crate) const STEER_EPSILON_SQ: f32 = 1e-5;

/// Distance below which a seek target counts as already reached.
pub(crate) const TARGET_EPSILON: f32 = 1e-6;

/// Read-mostly view handed to behaviors during evaluation.
///
/// Carries a copy of the owner's physics (behaviors never see partially
/// updated self-state), shared read access to the live body arena and group
/// rosters, and mutable access to the agent-owned wander heading. The wander
/// heading lives on the agent rather than the behavior so behavior values
/// can be cloned or rebuilt without leaking state across agents.
pub struct SteeringContext<'a> {
    pub(crate) me: BodyId,
    pub(crate) body: PhysicsBody,
    pub(crate) dna: &'a Dna,
    pub(crate) speed: f32,
    pub(crate) eye: Option<&'a Eye>,
    pub(crate) bodies: &'a SlotMap<BodyId, PhysicsBody>,
    pub(crate) groups: &'a SlotMap<GroupId, Vec<BodyId>>,
    pub(crate) wander_phi: &'a mut f32,
    pub(crate) rng: &'a mut dyn RngCore,
}

impl fmt::Debug for SteeringContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteeringContext")
            .field("me", &self.me)
            .field("body", &self.body)
            .field("speed", &self.speed)
            .field("wander_phi", &self.wander_phi)
            .finish()
    }
}

impl<'a> SteeringContext<'a> {
    /// Owner position at evaluation time.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position()
    }

    /// Owner velocity at evaluation time.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.body.velocity()
    }

    /// Owner traits.
    #[must_use]
    pub fn dna(&self) -> &Dna {
        self.dna
    }

    /// Agent-level speed multiplier (applied by Seek on top of max_speed).
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// The owner's perception, when attached.
    #[must_use]
    pub fn eye(&self) -> Option<&Eye> {
        self.eye
    }

    /// Physics of the eye's current target, if perception is attached, a
    /// target is selected, and the target body is still alive.
    #[must_use]
    pub fn target_body(&self) -> Option<&PhysicsBody> {
        self.eye
            .and_then(Eye::target)
            .and_then(|id| self.bodies.get(id))
    }

    /// Bodies currently inside the eye's near zone.
    pub fn near_sight_bodies(&self) -> impl Iterator<Item = &PhysicsBody> + '_ {
        self.eye
            .map(Eye::near_sight)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.bodies.get(*id))
    }

    /// Live bodies in `group`, excluding the owner and stale handles.
    pub fn neighbors(&self, group: GroupId) -> impl Iterator<Item = &PhysicsBody> + '_ {
        let me = self.me;
        self.groups
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter(move |&&id| id != me)
            .filter_map(|id| self.bodies.get(*id))
    }

    /// Current wander heading.
    #[must_use]
    pub fn wander_phi(&self) -> f32 {
        *self.wander_phi
    }

    /// Random-walk the wander heading by a uniform sample in
    /// `[-jitter, +jitter]`. A zero jitter leaves the heading untouched.
    pub fn jitter_wander(&mut self, jitter: f32) {
        if jitter > 0.0 {
            *self.wander_phi += self.rng.random_range(-jitter..jitter);
        }
    }
}

/// Contract shared by all steering behaviors.
///
/// `desired_velocity` may return `None` to opt out of this tick entirely; a
/// returned vector (including the zero vector) is blended into both the
/// weighted force sum and the weight denominator.
pub trait Steering: fmt::Debug + Send + Sync {
    /// Static identifier, useful for introspection and logs.
    fn kind(&self) -> &'static str;

    /// Compute the desired velocity or steering delta for this tick.
    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2>;

    /// Blend weight for this behavior.
    fn weight(&self) -> f32;

    /// Adjust the blend weight.
    fn set_weight(&mut self, weight: f32);
}

macro_rules! impl_kind {
    ($ty:ty, $kind:literal) => {
        impl $ty {
            /// Static identifier of this behavior.
            pub const KIND: &'static str = $kind;
        }
    };
}

/// Head straight for the eye's current target at full speed.
#[derive(Debug, Clone, Copy)]
pub struct Seek {
    weight: f32,
}

impl Seek {
    #[must_use]
    pub const fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl_kind!(Seek, "seek");

impl Steering for Seek {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let Some(target) = ctx.target_body() else {
            return Some(Vec2::ZERO);
        };
        let desired = target.position() - ctx.position();
        if desired.length() < TARGET_EPSILON {
            return Some(Vec2::ZERO);
        }
        Some(desired.normalized() * (ctx.dna().max_speed * ctx.speed()))
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Run directly away from the eye's current target.
///
/// The result is deliberately unnormalized: the push grows with distance to
/// the target, matching the original game's tuning.
#[derive(Debug, Clone, Copy)]
pub struct Flee {
    weight: f32,
}

impl Flee {
    #[must_use]
    pub const fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl_kind!(Flee, "flee");

impl Steering for Flee {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let Some(target) = ctx.target_body() else {
            return Some(Vec2::ZERO);
        };
        Some(-(target.position() - ctx.position()))
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Predictive chase: aim where the target will be after the DNA's pursuit
/// horizon, returned as a steering delta (desired minus current velocity).
#[derive(Debug, Clone, Copy)]
pub struct Pursuit {
    weight: f32,
}

impl Pursuit {
    #[must_use]
    pub const fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl_kind!(Pursuit, "pursuit");

impl Steering for Pursuit {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let Some(target) = ctx.target_body() else {
            return Some(Vec2::ZERO);
        };
        let future = target.position() + target.velocity() * ctx.dna().pursuit_horizon;
        let mut desired = future - ctx.position();
        if desired.length_sq() > STEER_EPSILON_SQ {
            desired = desired.normalized() * ctx.dna().max_speed;
        }
        Some(desired - ctx.velocity())
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Smooth erratic roaming: chase a point on a circle projected ahead of the
/// agent while the circle angle random-walks tick to tick.
#[derive(Debug, Clone, Copy)]
pub struct Wander {
    weight: f32,
}

impl Wander {
    #[must_use]
    pub const fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl_kind!(Wander, "wander");

impl Steering for Wander {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let dna = *ctx.dna();
        let mut center = ctx.position();
        if ctx.velocity().length_sq() > STEER_EPSILON_SQ {
            center += ctx.velocity().normalized() * dna.wander_interval;
        }
        let offset = Vec2::from_angle(ctx.wander_phi()) * dna.wander_radius;
        let target = center + offset;

        let mut desired = target - ctx.position();
        if desired.length_sq() > STEER_EPSILON_SQ {
            desired = desired.normalized() * dna.max_speed;
        }
        let steer = desired - ctx.velocity();

        // Heading evolves after this tick's steering is fixed, keeping the
        // walk temporally correlated instead of white noise.
        ctx.jitter_wander(dna.wander_jitter);
        Some(steer)
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Keep clear of group neighbors closer than the desired separation,
/// weighting each push by inverse distance.
#[derive(Debug, Clone, Copy)]
pub struct Separation {
    neighbors: GroupId,
    desired_separation: f32,
    weight: f32,
}

impl Separation {
    #[must_use]
    pub const fn new(neighbors: GroupId, desired_separation: f32, weight: f32) -> Self {
        Self {
            neighbors,
            desired_separation,
            weight,
        }
    }
}

impl_kind!(Separation, "separation");

impl Steering for Separation {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let mut steer = Vec2::ZERO;
        let mut count = 0u32;
        let me = ctx.position();

        for neighbor in ctx.neighbors(self.neighbors) {
            let d = me.distance(neighbor.position());
            if d > 0.0 && d < self.desired_separation {
                steer += (me - neighbor.position()).normalized() / d;
                count += 1;
            }
        }

        if count > 0 {
            steer /= count as f32;
        }
        if steer.length_sq() > STEER_EPSILON_SQ {
            steer = steer.normalized() * ctx.dna().max_speed - ctx.velocity();
        }
        Some(steer)
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Match the average velocity of group neighbors inside the neighbor radius.
#[derive(Debug, Clone, Copy)]
pub struct Alignment {
    neighbors: GroupId,
    neighbor_radius: f32,
    weight: f32,
}

impl Alignment {
    #[must_use]
    pub const fn new(neighbors: GroupId, neighbor_radius: f32, weight: f32) -> Self {
        Self {
            neighbors,
            neighbor_radius,
            weight,
        }
    }
}

impl_kind!(Alignment, "alignment");

impl Steering for Alignment {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let mut average = Vec2::ZERO;
        let mut count = 0u32;
        let me = ctx.position();

        for neighbor in ctx.neighbors(self.neighbors) {
            let d = me.distance(neighbor.position());
            if d > 0.0 && d < self.neighbor_radius {
                average += neighbor.velocity();
                count += 1;
            }
        }

        if count == 0 {
            return Some(Vec2::ZERO);
        }
        average /= count as f32;

        if average.length_sq() > STEER_EPSILON_SQ {
            average = average.normalized() * ctx.dna().max_speed;
        }
        let steer = (average - ctx.velocity()).limit(ctx.dna().max_force);
        Some(steer)
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Pull toward the centroid of group neighbors inside the neighbor radius.
#[derive(Debug, Clone, Copy)]
pub struct Cohesion {
    neighbors: GroupId,
    neighbor_radius: f32,
    weight: f32,
}

impl Cohesion {
    #[must_use]
    pub const fn new(neighbors: GroupId, neighbor_radius: f32, weight: f32) -> Self {
        Self {
            neighbors,
            neighbor_radius,
            weight,
        }
    }
}

impl_kind!(Cohesion, "cohesion");

impl Steering for Cohesion {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let mut center = Vec2::ZERO;
        let mut count = 0u32;
        let me = ctx.position();

        for neighbor in ctx.neighbors(self.neighbors) {
            let d = me.distance(neighbor.position());
            if d > 0.0 && d < self.neighbor_radius {
                center += neighbor.position();
                count += 1;
            }
        }

        if count == 0 {
            return Some(Vec2::ZERO);
        }
        center /= count as f32;

        let mut desired = center - me;
        if desired.length_sq() > STEER_EPSILON_SQ {
            desired = desired.normalized() * ctx.dna().max_speed;
        }
        let steer = (desired - ctx.velocity()).limit(ctx.dna().max_force);
        Some(steer)
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}

/// Inverse-square repulsion from everything inside the eye's near zone.
///
/// Unnormalized like [`Flee`]; the accumulated push explodes as bodies close
/// in, which is the point of a last-resort avoidance zone.
#[derive(Debug, Clone, Copy)]
pub struct Avoidance {
    weight: f32,
}

impl Avoidance {
    #[must_use]
    pub const fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl_kind!(Avoidance, "avoidance");

impl Steering for Avoidance {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn desired_velocity(&self, ctx: &mut SteeringContext<'_>) -> Option<Vec2> {
        let me = ctx.position();
        let mut push = Vec2::ZERO;
        for body in ctx.near_sight_bodies() {
            let r = me - body.position();
            let d = r.length();
            if d > 0.0 {
                push += r / (d * d);
            }
        }
        Some(push)
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }
}
