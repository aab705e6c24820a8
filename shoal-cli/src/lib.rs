//! Headless flock runner: loads a scene, advances it on a fixed time step
//! and streams frame snapshots as JSON lines.

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use shoal_core::steering::ray_fan;
use shoal_core::{Flock, Obstacle, ObstacleSensor, SpatialGrid, TickContext};
use shoal_shared::{AgentState, FrameReport, Position, ProbeRay, SceneEvent, SceneSettings};
use std::io::Write;
use std::path::Path;

/// Largest flock a scene may spawn.
pub const MAX_AGENTS: usize = 1024;

pub type SceneFlock = Flock<MAX_AGENTS>;

/// How a scene is run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub ticks: u64,
    /// Fixed time step, in seconds.
    pub dt: f32,
    /// Write a frame every `every` ticks (0 writes only the last frame).
    pub every: u64,
    /// Use a spatial grid instead of scanning the whole roster.
    pub use_grid: bool,
    /// Include avoidance probe rays in frames.
    pub probes: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ticks: 600,
            dt: 1.0 / 60.0,
            every: 1,
            use_grid: false,
            probes: false,
        }
    }
}

/// Totals reported once a run finishes
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames: u64,
    pub agents: usize,
    pub sim_time: f32,
    pub max_speed_seen: f32,
}

/// Reads a scene file, or returns the default scene when no path is given.
pub fn load_scene(path: Option<&Path>) -> Result<SceneSettings> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read scene file {}", path.display()))?;
            SceneSettings::from_json(&json)
                .with_context(|| format!("Failed to parse scene file {}", path.display()))
        }
        None => {
            log::info!("No scene given, using the default scene");
            Ok(SceneSettings::default())
        }
    }
}

/// A running scene: the flock plus the world it swims in.
pub struct Simulation {
    flock: Box<SceneFlock>,
    obstacles: Vec<Obstacle>,
    timeline: Vec<SceneEvent>,
    next_event: usize,
    grid: Option<SpatialGrid>,
    tick: u64,
    time: f32,
}

impl Simulation {
    pub fn new<R: Rng>(scene: &SceneSettings, use_grid: bool, rng: &mut R) -> Result<Self> {
        let mut flock = Box::new(
            SceneFlock::new(scene.flock.into()).context("Invalid flock settings")?,
        );
        flock
            .spawn(&scene.spawn.into(), 0.0, rng)
            .context("Failed to spawn flock")?;
        flock.set_target(scene.target.map(Into::into));

        let grid = use_grid.then(|| SpatialGrid::new(flock.config().query_radius()));

        log::info!(
            "Scene ready: {} agents, {} obstacles, {} scheduled events{}",
            flock.len(),
            scene.obstacles.len(),
            scene.events.len(),
            if use_grid { ", spatial grid" } else { "" }
        );

        Ok(Self {
            flock,
            obstacles: scene.obstacle_layer(),
            timeline: scene.timeline(),
            next_event: 0,
            grid,
            tick: 0,
            time: 0.0,
        })
    }

    pub fn flock(&self) -> &SceneFlock {
        &self.flock
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Applies due scene events, then advances the flock by `dt`.
    pub fn advance<R: Rng>(&mut self, dt: f32, rng: &mut R) -> Result<()> {
        self.apply_due_events()?;

        let ctx = TickContext::new(dt, self.time);
        match self.grid.as_mut() {
            Some(grid) => {
                grid.rebuild(self.flock.agents());
                self.flock.step_with(ctx, &*grid, &self.obstacles[..], rng);
            }
            None => self.flock.step(ctx, &self.obstacles[..], rng),
        }

        self.tick += 1;
        self.time += ctx.effective_dt();
        Ok(())
    }

    fn apply_due_events(&mut self) -> Result<()> {
        while let Some(event) = self.timeline.get(self.next_event) {
            if event.at() > self.time {
                break;
            }
            match *event {
                SceneEvent::Target { position, .. } => {
                    log::debug!("t={:.2}: target -> {:?}", self.time, position);
                    self.flock.set_target(position.map(Into::into));
                }
                SceneEvent::Settings { settings, .. } => {
                    log::debug!("t={:.2}: retuning flock", self.time);
                    self.flock
                        .set_config(settings.into())
                        .with_context(|| format!("Invalid settings event at t={}", event.at()))?;
                    if let Some(grid) = self.grid.as_mut() {
                        *grid = SpatialGrid::new(self.flock.config().query_radius());
                    }
                }
            }
            self.next_event += 1;
        }
        Ok(())
    }

    /// Current state of every agent.
    pub fn frame(&self, with_probes: bool) -> FrameReport {
        let probes = if with_probes {
            self.probe_rays()
        } else {
            Vec::new()
        };

        FrameReport {
            tick: self.tick,
            time: self.time,
            agents: self.flock.snapshots().map(AgentState::from).collect(),
            probes,
        }
    }

    fn probe_rays(&self) -> Vec<ProbeRay> {
        let config = self.flock.config();
        let mut rays = Vec::with_capacity(self.flock.len() * config.ray_count as usize);

        for agent in self.flock.agents() {
            for direction in ray_fan(agent.forward(), config) {
                let hit = self.obstacles[..].raycast(agent.position, direction, config.avoid_distance);
                let end = match hit {
                    Some(hit) => hit.point,
                    None => agent.position + direction * config.avoid_distance,
                };
                rays.push(ProbeRay {
                    agent: agent.id.0,
                    origin: Position::from(agent.position),
                    end: Position::from(end),
                    hit: hit.is_some(),
                });
            }
        }
        rays
    }
}

/// Runs `scene` for `options.ticks` ticks, writing frames to `out`.
pub fn run<W: Write, R: Rng>(
    scene: &SceneSettings,
    options: &RunOptions,
    rng: &mut R,
    out: &mut W,
) -> Result<RunSummary> {
    let mut sim = Simulation::new(scene, options.use_grid, rng)?;
    let mut summary = RunSummary {
        agents: sim.flock().len(),
        ..RunSummary::default()
    };

    for _ in 0..options.ticks {
        sim.advance(options.dt, rng)?;

        let last = sim.tick() == options.ticks;
        let due = options.every > 0 && sim.tick() % options.every == 0;
        if due || last {
            let frame = sim.frame(options.probes);
            summary.max_speed_seen = summary.max_speed_seen.max(frame.max_speed());
            let line = frame.to_json_line().context("Failed to serialize frame")?;
            writeln!(out, "{}", line).context("Failed to write frame")?;
            summary.frames += 1;
        }

        if sim.tick() % 600 == 0 {
            log::debug!("Tick {} (t={:.2}s)", sim.tick(), sim.time());
        }
    }

    out.flush().context("Failed to flush output")?;
    summary.ticks = sim.tick();
    summary.sim_time = sim.time();
    Ok(summary)
}
