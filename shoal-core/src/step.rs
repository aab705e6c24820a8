//! Per-agent force composition and integration for one fixed tick.

use crate::agent::Agent;
use crate::config::FlockConfig;
use crate::neighbors::{Neighbor, NeighborQuery};
use crate::obstacle::ObstacleSensor;
use crate::random::RandomSource;
use crate::steering;
use crate::vector::Vector2D;

/// Squared speed above which the heading tracks the velocity.
pub const HEADING_EPSILON: f32 = 1.0e-4;
/// Squared speed below which an agent counts as stalled.
pub const STALL_SPEED_SQ: f32 = 0.01;
/// Fraction of `max_speed` a stalled agent is kicked back up to.
pub const STALL_RECOVERY_FRACTION: f32 = 0.2;

/// Time inputs for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Monotonic simulation clock, in seconds.
    pub now: f32,
}

impl TickContext {
    pub fn new(dt: f32, now: f32) -> Self {
        Self { dt, now }
    }

    /// `dt` with negative and non-finite values treated as zero.
    pub fn effective_dt(&self) -> f32 {
        if self.dt.is_finite() && self.dt > 0.0 {
            self.dt
        } else {
            0.0
        }
    }
}

/// Unweighted steering contributions for one agent in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub alignment: Vector2D,
    pub cohesion: Vector2D,
    pub separation: Vector2D,
    pub avoidance: Vector2D,
    pub target: Vector2D,
    /// Raw unit-disk sample.
    pub noise: Vector2D,
}

impl SteeringForces {
    /// Weighted sum of every contribution. `align_factor` scales only the
    /// alignment term.
    pub fn combine(&self, config: &FlockConfig, align_factor: f32) -> Vector2D {
        self.alignment * (config.alignment_weight * align_factor)
            + self.cohesion * config.cohesion_weight
            + self.separation * config.separation_weight
            + self.avoidance * config.avoidance_weight
            + self.target * config.target_weight
            + self.noise * config.noise_weight
    }
}

/// Evaluates every behavior for `agent` against the settled snapshot behind
/// `neighbors`.
///
/// Neighbors are gathered once, at the larger of the two perception radii,
/// into `scratch`; alignment and cohesion then see those within
/// `neighbor_radius` and separation filters by `separation_radius`. If the
/// query yields more than `N` agents the excess is ignored.
pub fn compute_forces<const N: usize, Q, S, R>(
    agent: &Agent,
    config: &FlockConfig,
    target: Option<Vector2D>,
    neighbors: &Q,
    obstacles: &S,
    rng: &mut R,
    scratch: &mut heapless::Vec<Neighbor, N>,
) -> SteeringForces
where
    Q: NeighborQuery + ?Sized,
    S: ObstacleSensor + ?Sized,
    R: RandomSource + ?Sized,
{
    scratch.clear();
    let mut dropped = 0usize;
    neighbors.for_each_neighbor(agent.id, agent.position, config.query_radius(), &mut |n| {
        if scratch.push(n).is_err() {
            dropped += 1;
        }
    });
    if dropped > 0 {
        log::trace!(
            "Agent {:?} saw {} more neighbors than its buffer holds",
            agent.id,
            dropped
        );
    }

    let gathered: &[Neighbor] = &scratch[..];
    let neighbor_radius_sq = config.neighbor_radius * config.neighbor_radius;
    let in_neighbor_radius =
        |n: &&Neighbor| n.position.distance_squared(&agent.position) <= neighbor_radius_sq;

    SteeringForces {
        alignment: steering::alignment(agent, gathered.iter().filter(in_neighbor_radius), config),
        cohesion: steering::cohesion(agent, gathered.iter().filter(in_neighbor_radius), config),
        separation: steering::separation(agent, gathered.iter(), config),
        avoidance: steering::avoid_obstacles(agent, obstacles, config),
        target: steering::target_attraction(agent, target, config),
        noise: rng.unit_disk(),
    }
}

/// Applies `acceleration` for `dt` seconds: velocity integration, speed
/// clamp, anti-stall kick, position integration and heading update.
pub fn integrate<R>(
    agent: &mut Agent,
    acceleration: Vector2D,
    dt: f32,
    config: &FlockConfig,
    rng: &mut R,
) where
    R: RandomSource + ?Sized,
{
    agent.velocity += acceleration * dt;
    agent.velocity = agent.velocity.limit(config.max_speed);

    // A resting agent gives its neighbors nothing to align with and can't
    // resume steering on its own.
    if agent.velocity.magnitude_squared() < STALL_SPEED_SQ {
        agent.velocity = rng.unit_vector() * (config.max_speed * STALL_RECOVERY_FRACTION);
    }

    agent.position += agent.velocity * dt;

    if agent.velocity.magnitude_squared() > HEADING_EPSILON {
        agent.heading = agent.velocity.normalize();
    }
}
