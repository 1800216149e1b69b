//! The world: body arena, agent records, shared group rosters, and the
//! per-tick simulation pipeline that drives them.

use crate::behavior::{Steering, SteeringContext};
use crate::body::PhysicsBody;
use crate::dna::{Archetype, Dna, DnaError};
use crate::eye::Eye;
use crate::vec2::Vec2;
use crate::{BodyId, BodyMap, GroupId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::VecDeque;
use std::f32::consts::TAU;
use thiserror::Error;

/// Monotonic simulation step counter.
pub type Tick = u64;

/// Errors surfaced by world construction and manager operations. Per-tick
/// stepping never fails; everything that can go wrong is rejected up front.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("unknown body")]
    UnknownBody,
    #[error("body is not a steering agent")]
    NotAnAgent,
    #[error("unknown group")]
    UnknownGroup,
    #[error("agent has no perception attached")]
    NoPerception,
    #[error("no behavior with that key")]
    UnknownBehavior,
    #[error("behavior weight must be finite and non-negative")]
    InvalidWeight,
    #[error("speed multiplier must be positive and finite")]
    InvalidSpeed,
    #[error(transparent)]
    Dna(#[from] DnaError),
}

/// World-level tuning. Validated once by [`World::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Horizontal extent of the playfield; bodies wrap across it.
    pub width: f32,
    /// How many tick summaries to retain.
    pub history_capacity: usize,
    /// Fixed RNG seed; `None` draws one from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 160.0,
            history_capacity: 256,
            rng_seed: None,
        }
    }
}

impl WorldConfig {
    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(WorldError::InvalidConfig("width must be positive and finite"));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig("history_capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Per-agent handle for a behavior added via [`World::add_behavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorKey(u64);

struct BehaviorEntry {
    key: BehaviorKey,
    behavior: Box<dyn Steering>,
}

/// Agent-side record living beside the physics arena.
struct Boid {
    dna: Dna,
    eye: Option<Eye>,
    behaviors: Vec<BehaviorEntry>,
    wander_phi: f32,
    speed: f32,
    next_key: u64,
}

/// Aggregate state captured after each [`World::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub body_count: usize,
    pub agent_count: usize,
    pub average_speed: f32,
    pub max_speed: f32,
}

/// Single-threaded simulation world.
///
/// Bodies live in a generational arena; agents carry their steering state in
/// a side map keyed by the same handle, so plain trackable bodies (a player,
/// projectiles) and steering agents share one id space. Group rosters are
/// owned here and mutated only through manager calls, never during `step`.
pub struct World {
    config: WorldConfig,
    bodies: SlotMap<BodyId, PhysicsBody>,
    boids: BodyMap<Boid>,
    order: Vec<BodyId>,
    groups: SlotMap<GroupId, Vec<BodyId>>,
    rng: SmallRng,
    tick: Tick,
    history: VecDeque<TickSummary>,
}

impl World {
    /// Build a world from a validated config.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            bodies: SlotMap::with_key(),
            boids: BodyMap::new(),
            order: Vec::new(),
            groups: SlotMap::with_key(),
            rng: SmallRng::seed_from_u64(seed),
            tick: 0,
            history: VecDeque::new(),
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Insert a plain trackable body that is never steered.
    pub fn spawn_body(&mut self, body: PhysicsBody) -> BodyId {
        self.bodies.insert(body)
    }

    /// Insert a steering agent. Traits are sampled from the world RNG when
    /// absent and validated either way.
    pub fn spawn_boid(
        &mut self,
        body: PhysicsBody,
        dna: Option<Dna>,
    ) -> Result<BodyId, WorldError> {
        let dna = match dna {
            Some(dna) => dna,
            None => Dna::random(&mut self.rng),
        };
        dna.validate()?;
        let id = self.bodies.insert(body);
        self.boids.insert(
            id,
            Boid {
                dna,
                eye: None,
                behaviors: Vec::new(),
                wander_phi: self.rng.random_range(0.0..TAU),
                speed: 1.0,
                next_key: 0,
            },
        );
        self.order.push(id);
        Ok(id)
    }

    /// Insert an agent with an [`Archetype`] preset overlaid on sampled
    /// traits. `Neutral` carries no force budget and fails validation; use
    /// [`World::spawn_body`] for neutral actors.
    pub fn spawn_archetype(
        &mut self,
        body: PhysicsBody,
        archetype: Archetype,
    ) -> Result<BodyId, WorldError> {
        let dna = Dna::for_archetype(archetype, &mut self.rng);
        self.spawn_boid(body, Some(dna))
    }

    /// Drop a body along with its agent record and every roster entry that
    /// pointed at it. Eyes that tracked it skip the stale handle on their
    /// next refresh.
    pub fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(id);
        self.boids.remove(id);
        self.order.retain(|&other| other != id);
        for roster in self.groups.values_mut() {
            roster.retain(|&other| other != id);
        }
    }

    /// Create a shared roster. Membership changes made later through
    /// [`World::group_push`] / [`World::group_remove`] are visible to every
    /// eye tracking the group on its next refresh.
    pub fn create_group(&mut self, members: Vec<BodyId>) -> GroupId {
        self.groups.insert(members)
    }

    /// Current members of a roster.
    #[must_use]
    pub fn group(&self, group: GroupId) -> Option<&[BodyId]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Append a member to a roster.
    pub fn group_push(&mut self, group: GroupId, id: BodyId) -> Result<(), WorldError> {
        let roster = self.groups.get_mut(group).ok_or(WorldError::UnknownGroup)?;
        roster.push(id);
        Ok(())
    }

    /// Remove every occurrence of `id` from a roster.
    pub fn group_remove(&mut self, group: GroupId, id: BodyId) -> Result<(), WorldError> {
        let roster = self.groups.get_mut(group).ok_or(WorldError::UnknownGroup)?;
        roster.retain(|&other| other != id);
        Ok(())
    }

    /// Give an agent perception over `tracked`, built from its own traits.
    /// When no explicit target is given the roster's first entry (if any)
    /// becomes the target.
    pub fn attach_perception(
        &mut self,
        id: BodyId,
        tracked: GroupId,
        target: Option<BodyId>,
    ) -> Result<(), WorldError> {
        let roster = self.groups.get(tracked).ok_or(WorldError::UnknownGroup)?;
        let target = target.or_else(|| roster.first().copied());
        let boid = self.boids.get_mut(id).ok_or(WorldError::NotAnAgent)?;
        boid.eye = Some(Eye::new(&boid.dna, tracked, target));
        Ok(())
    }

    /// Redirect an agent's perception at a new target (or none).
    pub fn set_target(&mut self, id: BodyId, target: Option<BodyId>) -> Result<(), WorldError> {
        let boid = self.boids.get_mut(id).ok_or(WorldError::NotAnAgent)?;
        let eye = boid.eye.as_mut().ok_or(WorldError::NoPerception)?;
        eye.set_target(target);
        Ok(())
    }

    /// Append a behavior to an agent's blend set. Rejects weights that are
    /// non-finite or negative; the returned key removes exactly this entry.
    pub fn add_behavior(
        &mut self,
        id: BodyId,
        behavior: Box<dyn Steering>,
    ) -> Result<BehaviorKey, WorldError> {
        let weight = behavior.weight();
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(WorldError::InvalidWeight);
        }
        let boid = self.boids.get_mut(id).ok_or(WorldError::NotAnAgent)?;
        let key = BehaviorKey(boid.next_key);
        boid.next_key += 1;
        boid.behaviors.push(BehaviorEntry { key, behavior });
        Ok(key)
    }

    /// Remove a behavior previously added with [`World::add_behavior`],
    /// leaving the rest of the set untouched and in order.
    pub fn remove_behavior(&mut self, id: BodyId, key: BehaviorKey) -> Result<(), WorldError> {
        let boid = self.boids.get_mut(id).ok_or(WorldError::NotAnAgent)?;
        let index = boid
            .behaviors
            .iter()
            .position(|entry| entry.key == key)
            .ok_or(WorldError::UnknownBehavior)?;
        boid.behaviors.remove(index);
        Ok(())
    }

    /// Advance the simulation by one step of `dt` seconds.
    ///
    /// Agents run in spawn order against the live arena: an agent updated
    /// later in the frame observes the already-updated positions of agents
    /// before it. Each agent refreshes its eye, evaluates its behaviors,
    /// blends the results by weight, clamps to `max_force`, applies the
    /// force, integrates, and wraps horizontally.
    pub fn step(&mut self, dt: f32) -> TickSummary {
        for i in 0..self.order.len() {
            let id = self.order[i];
            let Some(body) = self.bodies.get(id).copied() else {
                continue;
            };
            let Some(boid) = self.boids.get_mut(id) else {
                continue;
            };

            if let Some(eye) = boid.eye.as_mut() {
                let roster = self
                    .groups
                    .get(eye.tracked())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                eye.look(id, &body, &self.bodies, roster);
            }

            let Boid {
                dna,
                eye,
                behaviors,
                wander_phi,
                speed,
                ..
            } = boid;

            let mut total = Vec2::ZERO;
            let mut weight_sum = 0.0_f32;
            {
                let mut ctx = SteeringContext {
                    me: id,
                    body,
                    dna: &*dna,
                    speed: *speed,
                    eye: eye.as_ref(),
                    bodies: &self.bodies,
                    groups: &self.groups,
                    wander_phi,
                    rng: &mut self.rng,
                };
                for entry in behaviors.iter() {
                    if let Some(desired) = entry.behavior.desired_velocity(&mut ctx) {
                        let weight = entry.behavior.weight();
                        total += desired * weight;
                        weight_sum += weight;
                    }
                }
            }

            let max_force = dna.max_force;
            if let Some(live) = self.bodies.get_mut(id) {
                if weight_sum > 0.0 {
                    live.apply_force((total / weight_sum).limit(max_force));
                }
                live.integrate(dt);

                let radius = live.radius();
                let mut position = live.position();
                if position.x > self.config.width + radius {
                    position.x = -radius;
                } else if position.x < -radius {
                    position.x = self.config.width + radius;
                }
                live.set_position(position);
            }
        }

        self.tick += 1;
        let summary = self.summarize();
        self.history.push_back(summary);
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }
        summary
    }

    fn summarize(&self) -> TickSummary {
        let mut average_speed = 0.0_f32;
        let mut max_speed = 0.0_f32;
        for body in self.bodies.values() {
            let speed = body.velocity().length();
            average_speed += speed;
            max_speed = max_speed.max(speed);
        }
        if !self.bodies.is_empty() {
            average_speed /= self.bodies.len() as f32;
        }
        TickSummary {
            tick: self.tick,
            body_count: self.bodies.len(),
            agent_count: self.order.len(),
            average_speed,
            max_speed,
        }
    }

    /// Physics state of any body.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&PhysicsBody> {
        self.bodies.get(id)
    }

    /// Mutable physics access, the hook for gameplay-layer interventions
    /// such as reflecting vertical velocity at playfield bounds.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut PhysicsBody> {
        self.bodies.get_mut(id)
    }

    /// Traits of an agent.
    #[must_use]
    pub fn dna(&self, id: BodyId) -> Option<&Dna> {
        self.boids.get(id).map(|boid| &boid.dna)
    }

    /// Mutable trait access for explicit external tuning (e.g. promoting a
    /// pursuer to a faster chaser).
    pub fn dna_mut(&mut self, id: BodyId) -> Option<&mut Dna> {
        self.boids.get_mut(id).map(|boid| &mut boid.dna)
    }

    /// Agent-level speed multiplier.
    #[must_use]
    pub fn speed(&self, id: BodyId) -> Option<f32> {
        self.boids.get(id).map(|boid| boid.speed)
    }

    /// Set the agent-level speed multiplier.
    pub fn set_speed(&mut self, id: BodyId, speed: f32) -> Result<(), WorldError> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(WorldError::InvalidSpeed);
        }
        let boid = self.boids.get_mut(id).ok_or(WorldError::NotAnAgent)?;
        boid.speed = speed;
        Ok(())
    }

    /// Read-only view of an agent's perception.
    #[must_use]
    pub fn eye(&self, id: BodyId) -> Option<&Eye> {
        self.boids.get(id).and_then(|boid| boid.eye.as_ref())
    }

    /// Current wander heading of an agent.
    #[must_use]
    pub fn wander_phi(&self, id: BodyId) -> Option<f32> {
        self.boids.get(id).map(|boid| boid.wander_phi)
    }

    /// Kinds of the behaviors attached to an agent, in blend order.
    #[must_use]
    pub fn behavior_kinds(&self, id: BodyId) -> Option<Vec<&'static str>> {
        self.boids.get(id).map(|boid| {
            boid.behaviors
                .iter()
                .map(|entry| entry.behavior.kind())
                .collect()
        })
    }

    /// Completed step count.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Retained tick summaries, oldest first.
    #[must_use]
    pub const fn history(&self) -> &VecDeque<TickSummary> {
        &self.history
    }

    /// Total bodies, steered or not.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Steering agents only.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.order.len()
    }

    /// The world's seeded RNG, for callers that lay out content (spawn
    /// positions, wave composition) reproducibly from the same seed.
    pub fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}
