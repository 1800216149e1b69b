//! Headless driver for the steering core: spawns waves of agents the way the
//! game layer would, steps the world at a fixed rate, and logs summaries.

use anyhow::Result;
use rand::Rng;
use steerbots_core::{
    Alignment, Archetype, Avoidance, BodyId, Cohesion, Flee, GroupId, PhysicsBody, Pursuit,
    Separation, Vec2, Wander, World, WorldConfig,
};
use tracing::info;

const DT: f32 = 1.0 / 60.0;
const FRAMES_PER_WAVE: usize = 600;
const FIELD_WIDTH: f32 = 160.0;
const FIELD_MIN_Y: f32 = 0.0;
const FIELD_MAX_Y: f32 = 90.0;

fn main() -> Result<()> {
    init_tracing();

    let seed = std::env::var("STEERBOTS_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());
    let mut world = World::new(WorldConfig {
        width: FIELD_WIDTH,
        history_capacity: 600,
        rng_seed: seed,
    })?;

    // The player is a plain body the core never steers; we bounce it
    // vertically so pursuers have something moving to chase.
    let player = world.spawn_body(PhysicsBody::new(
        Vec2::new(20.0, 45.0),
        Vec2::new(0.0, 12.0),
        1.0,
        2.0,
    )?);
    let player_group = world.create_group(vec![player]);

    info!(seed = ?seed, "starting steerbots demo");

    let wave = spawn_wander_wave(&mut world, 8)?;
    run_wave(&mut world, "wander", &wave, player);
    clear_wave(&mut world, &wave);

    let wave = spawn_pursuit_wave(&mut world, 6, player_group)?;
    run_wave(&mut world, "pursuit", &wave, player);
    clear_wave(&mut world, &wave);

    let wave = spawn_flock_wave(&mut world, 16, player_group)?;
    run_wave(&mut world, "flock", &wave, player);
    clear_wave(&mut world, &wave);

    info!(ticks = world.tick(), "demo complete");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Idle wave: agents roam on their own, no perception needed.
fn spawn_wander_wave(world: &mut World, count: usize) -> Result<Vec<BodyId>> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let y = world.rng_mut().random_range(15.0..75.0);
        let x = (i as f32 + 0.5) * FIELD_WIDTH / count as f32;
        let body = PhysicsBody::new(Vec2::new(x, y), Vec2::new(1.0, 0.0), 1.0, 1.5)?;
        let id = world.spawn_boid(body, None)?;
        world.add_behavior(id, Box::new(Wander::new(1.0)))?;
        ids.push(id);
    }
    Ok(ids)
}

/// Hunting wave: predators pursue the player while avoiding whatever crowds
/// their near zone. One random pursuer is promoted to a faster, stronger
/// chaser.
fn spawn_pursuit_wave(world: &mut World, count: usize, quarry: GroupId) -> Result<Vec<BodyId>> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let y = world.rng_mut().random_range(10.0..80.0);
        let x = FIELD_WIDTH - 10.0 - (i as f32 * 6.0);
        let body = PhysicsBody::new(Vec2::new(x, y), Vec2::new(-1.0, 0.0), 1.0, 1.5)?;
        let id = world.spawn_archetype(body, Archetype::Predator)?;
        world.attach_perception(id, quarry, None)?;
        world.add_behavior(id, Box::new(Pursuit::new(1.0)))?;
        world.add_behavior(id, Box::new(Avoidance::new(0.6)))?;
        ids.push(id);
    }

    let chaser = ids[world.rng_mut().random_range(0..ids.len())];
    if let Some(dna) = world.dna_mut(chaser) {
        dna.max_speed *= 1.3;
        dna.max_force *= 1.2;
    }
    info!(chaser = ?chaser, "promoted chaser");
    Ok(ids)
}

/// Flocking wave: prey keep formation with each other and scatter from the
/// player when it gets close.
fn spawn_flock_wave(world: &mut World, count: usize, threat: GroupId) -> Result<Vec<BodyId>> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let y = world.rng_mut().random_range(20.0..70.0);
        let x = 100.0 + (i % 4) as f32 * 5.0;
        let body = PhysicsBody::new(Vec2::new(x, y), Vec2::new(-1.0, 0.5), 1.0, 1.0)?;
        let id = world.spawn_archetype(body, Archetype::Prey)?;
        world.attach_perception(id, threat, None)?;
        ids.push(id);
    }

    let flock = world.create_group(ids.clone());
    for &id in &ids {
        world.add_behavior(id, Box::new(Separation::new(flock, 6.0, 1.5)))?;
        world.add_behavior(id, Box::new(Alignment::new(flock, 25.0, 1.0)))?;
        world.add_behavior(id, Box::new(Cohesion::new(flock, 25.0, 1.0)))?;
        world.add_behavior(id, Box::new(Flee::new(0.05)))?;
    }
    Ok(ids)
}

fn run_wave(world: &mut World, name: &str, members: &[BodyId], player: BodyId) {
    info!(wave = name, agents = members.len(), "wave start");
    for frame in 0..FRAMES_PER_WAVE {
        let summary = world.step(DT);
        reflect_vertical(world, player);
        for &id in members {
            reflect_vertical(world, id);
        }
        if frame % 120 == 0 {
            info!(
                wave = name,
                tick = summary.tick,
                bodies = summary.body_count,
                agents = summary.agent_count,
                avg_speed = summary.average_speed,
                max_speed = summary.max_speed,
                "tick summary",
            );
        }
    }
}

/// Bounce a body off the playfield's top and bottom edges. The core only
/// wraps horizontally; vertical containment is a gameplay concern.
fn reflect_vertical(world: &mut World, id: BodyId) {
    if let Some(body) = world.body_mut(id) {
        let position = body.position();
        let velocity = body.velocity();
        if (position.y < FIELD_MIN_Y && velocity.y < 0.0)
            || (position.y > FIELD_MAX_Y && velocity.y > 0.0)
        {
            body.set_velocity(Vec2::new(velocity.x, -velocity.y));
        }
    }
}

fn clear_wave(world: &mut World, members: &[BodyId]) {
    for &id in members {
        world.remove_body(id);
    }
}
