use crate::agent::{Agent, AgentId, AgentSnapshot};
use crate::config::FlockConfig;
use crate::error::FlockError;
use crate::neighbors::{Neighbor, NeighborQuery};
use crate::obstacle::ObstacleSensor;
use crate::random::RandomSource;
use crate::step::{self, TickContext};
use crate::vector::Vector2D;

/// Jitter added to the spawn direction, as a fraction of its unit length.
pub const SPAWN_DIRECTION_JITTER: f32 = 0.2;
/// Initial speed of spawned agents, as a fraction of `max_speed`.
pub const SPAWN_SPEED_FRACTION: f32 = 0.5;

/// Where and how many agents to spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    pub count: usize,
    /// Agents are placed uniformly inside this radius around `origin`.
    pub radius: f32,
    pub origin: Vector2D,
    /// Direction the flock starts out moving in.
    pub forward: Vector2D,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            count: 50,
            radius: 3.0,
            origin: Vector2D::zero(),
            forward: Vector2D::UP,
        }
    }
}

/// A flock of up to `N` agents with its shared configuration
///
/// The roster lives in fixed-capacity storage so the simulation runs
/// without an allocator.
#[derive(Debug, Clone)]
pub struct Flock<const N: usize> {
    config: FlockConfig,
    agents: heapless::Vec<Agent, N>,
    target: Option<Vector2D>,
    spawn_time: Option<f32>,
    next_id: u32,
}

impl<const N: usize> Flock<N> {
    pub fn new(config: FlockConfig) -> Result<Self, FlockError> {
        config.validate()?;
        Ok(Self {
            config,
            agents: heapless::Vec::new(),
            target: None,
            spawn_time: None,
            next_id: 0,
        })
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Replaces the configuration; the old one is kept if validation fails.
    pub fn set_config(&mut self, config: FlockConfig) -> Result<(), FlockError> {
        config.validate()?;
        log::debug!("Flock config updated: {:?}", config);
        self.config = config;
        Ok(())
    }

    pub fn target(&self) -> Option<Vector2D> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<Vector2D>) {
        self.target = target;
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn snapshots(&self) -> impl Iterator<Item = AgentSnapshot> + '_ {
        self.agents.iter().map(Agent::snapshot)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn spawn_time(&self) -> Option<f32> {
        self.spawn_time
    }

    /// Tears the flock down.
    pub fn clear(&mut self) {
        self.agents.clear();
        self.spawn_time = None;
        self.next_id = 0;
    }

    /// Adds a single agent with an explicit state.
    pub fn add_agent(&mut self, position: Vector2D, velocity: Vector2D) -> Result<AgentId, FlockError> {
        let id = AgentId(self.next_id);
        let agent = Agent::new(id, position, velocity.limit(self.config.max_speed));
        self.agents
            .push(agent)
            .map_err(|_| FlockError::CapacityExceeded {
                requested: self.agents.len() + 1,
                capacity: N,
            })?;
        self.next_id += 1;
        Ok(id)
    }

    /// Replaces the roster with `params.count` fresh agents and restarts
    /// the initial alignment boost at `now`.
    pub fn spawn<R>(&mut self, params: &SpawnParams, now: f32, rng: &mut R) -> Result<(), FlockError>
    where
        R: RandomSource + ?Sized,
    {
        if !params.radius.is_finite() || params.radius < 0.0 {
            return Err(FlockError::InvalidSpawnRadius(params.radius));
        }
        if params.count > N {
            return Err(FlockError::CapacityExceeded {
                requested: params.count,
                capacity: N,
            });
        }

        self.clear();

        let forward = match params.forward.normalize() {
            f if f == Vector2D::zero() => Vector2D::UP,
            f => f,
        };
        let speed = self.config.max_speed * SPAWN_SPEED_FRACTION;

        for _ in 0..params.count {
            let position = params.origin + rng.unit_disk() * params.radius;
            let direction = forward + rng.unit_disk() * SPAWN_DIRECTION_JITTER;
            self.add_agent(position, direction.normalize() * speed)?;
        }

        self.spawn_time = Some(now);
        log::debug!(
            "Spawned {} agents around ({:.2}, {:.2}) within radius {:.2}",
            params.count,
            params.origin.x,
            params.origin.y,
            params.radius
        );
        Ok(())
    }

    /// Alignment multiplier at time `now`: `initial_align_strength` at
    /// spawn, falling linearly to exactly 1 after `initial_align_duration`.
    pub fn initial_align_factor(&self, now: f32) -> f32 {
        let Some(spawn_time) = self.spawn_time else {
            return 1.0;
        };

        let strength = self.config.initial_align_strength;
        let duration = self.config.initial_align_duration;
        let elapsed = now - spawn_time;

        if duration <= 0.0 || elapsed >= duration {
            return 1.0;
        }
        if elapsed <= 0.0 {
            return strength;
        }

        let t = elapsed / duration;
        strength + (1.0 - strength) * t
    }

    /// Advances every agent by one tick, using the roster itself as the
    /// neighbor index.
    pub fn step<S, R>(&mut self, ctx: TickContext, obstacles: &S, rng: &mut R)
    where
        S: ObstacleSensor + ?Sized,
        R: RandomSource + ?Sized,
    {
        let accelerations = self.accelerations(ctx.now, &self.agents[..], obstacles, rng);
        self.integrate_all(&accelerations, ctx.effective_dt(), rng);
    }

    /// Advances every agent by one tick using an external neighbor index.
    ///
    /// `neighbors` must describe the roster as it is before this call, e.g.
    /// a [`SpatialGrid`](crate::SpatialGrid) rebuilt from [`Flock::agents`].
    pub fn step_with<Q, S, R>(&mut self, ctx: TickContext, neighbors: &Q, obstacles: &S, rng: &mut R)
    where
        Q: NeighborQuery + ?Sized,
        S: ObstacleSensor + ?Sized,
        R: RandomSource + ?Sized,
    {
        let accelerations = self.accelerations(ctx.now, neighbors, obstacles, rng);
        self.integrate_all(&accelerations, ctx.effective_dt(), rng);
    }

    // Reads only the settled roster; nothing is mutated until every
    // acceleration is known.
    fn accelerations<Q, S, R>(
        &self,
        now: f32,
        neighbors: &Q,
        obstacles: &S,
        rng: &mut R,
    ) -> heapless::Vec<Vector2D, N>
    where
        Q: NeighborQuery + ?Sized,
        S: ObstacleSensor + ?Sized,
        R: RandomSource + ?Sized,
    {
        let align_factor = self.initial_align_factor(now);
        let mut scratch = heapless::Vec::<Neighbor, N>::new();
        let mut accelerations = heapless::Vec::<Vector2D, N>::new();

        for agent in self.agents.iter() {
            let forces = step::compute_forces(
                agent,
                &self.config,
                self.target,
                neighbors,
                obstacles,
                rng,
                &mut scratch,
            );
            // Same length as the roster, so this cannot overflow.
            let _ = accelerations.push(forces.combine(&self.config, align_factor));
        }

        log::trace!(
            "Computed {} accelerations (align factor {:.3})",
            accelerations.len(),
            align_factor
        );
        accelerations
    }

    fn integrate_all<R>(&mut self, accelerations: &[Vector2D], dt: f32, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        for (agent, acceleration) in self.agents.iter_mut().zip(accelerations.iter()) {
            step::integrate(agent, *acceleration, dt, &self.config, rng);
        }
    }
}
