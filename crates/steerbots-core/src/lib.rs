//! Core types for the steerbots simulation: autonomous steering agents that
//! perceive nearby bodies through a directional vision model and blend
//! weighted behavioral impulses into one applied force per tick.

use slotmap::{new_key_type, SecondaryMap};

pub mod behavior;
pub mod body;
pub mod dna;
pub mod eye;
pub mod vec2;
pub mod world;

new_key_type! {
    /// Stable generational handle for any body tracked by the world,
    /// steered or not.
    pub struct BodyId;

    /// Handle for a shared roster of bodies (tracking lists, neighbor
    /// groups). Rosters are owned by the world and referenced by handle so
    /// many agents can observe one live list without copies.
    pub struct GroupId;
}

/// Convenience alias for associating side data with bodies.
pub type BodyMap<T> = SecondaryMap<BodyId, T>;

pub use behavior::{
    Alignment, Avoidance, Cohesion, Flee, Pursuit, Seek, Separation, Steering, SteeringContext,
    Wander,
};
pub use body::{BodyError, PhysicsBody};
pub use dna::{Archetype, Dna, DnaError};
pub use eye::Eye;
pub use vec2::Vec2;
pub use world::{BehaviorKey, Tick, TickSummary, World, WorldConfig, WorldError};
