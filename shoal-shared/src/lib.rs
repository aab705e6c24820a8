#![cfg_attr(not(feature = "std"), no_std)]

//! Serializable settings and snapshot types shared by flock front-ends.

use serde::{Deserialize, Serialize};
use shoal_core::{AgentSnapshot, FlockConfig, Obstacle, SpawnParams, Vector2D};

#[cfg(feature = "std")]
pub use scene::{FrameReport, ProbeRay, SceneEvent, SceneSettings};

/// Represents a 2D position in world coordinates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        libm::sqrtf(dx * dx + dy * dy)
    }
}

impl From<Vector2D> for Position {
    fn from(v: Vector2D) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Position> for Vector2D {
    fn from(p: Position) -> Self {
        Vector2D::new(p.x, p.y)
    }
}

/// Flock tuning as stored in scene files. Missing fields take the
/// simulation defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockSettings {
    pub max_speed: f32,
    pub max_force: f32,
    pub neighbor_radius: f32,
    pub separation_radius: f32,
    pub avoid_distance: f32,
    pub ray_count: u32,
    pub spread_angle_degrees: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub avoidance_weight: f32,
    pub target_weight: f32,
    pub noise_weight: f32,
    pub initial_align_strength: f32,
    pub initial_align_duration: f32,
}

impl Default for FlockSettings {
    fn default() -> Self {
        FlockSettings::from(&FlockConfig::default())
    }
}

impl From<&FlockConfig> for FlockSettings {
    fn from(c: &FlockConfig) -> Self {
        Self {
            max_speed: c.max_speed,
            max_force: c.max_force,
            neighbor_radius: c.neighbor_radius,
            separation_radius: c.separation_radius,
            avoid_distance: c.avoid_distance,
            ray_count: c.ray_count,
            spread_angle_degrees: c.spread_angle_degrees,
            alignment_weight: c.alignment_weight,
            cohesion_weight: c.cohesion_weight,
            separation_weight: c.separation_weight,
            avoidance_weight: c.avoidance_weight,
            target_weight: c.target_weight,
            noise_weight: c.noise_weight,
            initial_align_strength: c.initial_align_strength,
            initial_align_duration: c.initial_align_duration,
        }
    }
}

impl From<FlockSettings> for FlockConfig {
    fn from(s: FlockSettings) -> Self {
        Self {
            max_speed: s.max_speed,
            max_force: s.max_force,
            neighbor_radius: s.neighbor_radius,
            separation_radius: s.separation_radius,
            avoid_distance: s.avoid_distance,
            ray_count: s.ray_count,
            spread_angle_degrees: s.spread_angle_degrees,
            alignment_weight: s.alignment_weight,
            cohesion_weight: s.cohesion_weight,
            separation_weight: s.separation_weight,
            avoidance_weight: s.avoidance_weight,
            target_weight: s.target_weight,
            noise_weight: s.noise_weight,
            initial_align_strength: s.initial_align_strength,
            initial_align_duration: s.initial_align_duration,
        }
    }
}

/// Spawn settings for a scene
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnSettings {
    pub count: usize,
    pub radius: f32,
    pub origin: Position,
    pub forward: Position,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        let params = SpawnParams::default();
        Self {
            count: params.count,
            radius: params.radius,
            origin: params.origin.into(),
            forward: params.forward.into(),
        }
    }
}

impl From<SpawnSettings> for SpawnParams {
    fn from(s: SpawnSettings) -> Self {
        Self {
            count: s.count,
            radius: s.radius,
            origin: s.origin.into(),
            forward: s.forward.into(),
        }
    }
}

/// A static obstacle in a scene file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleSpec {
    Segment { a: Position, b: Position },
    Circle { center: Position, radius: f32 },
}

impl From<ObstacleSpec> for Obstacle {
    fn from(spec: ObstacleSpec) -> Self {
        match spec {
            ObstacleSpec::Segment { a, b } => Obstacle::segment(a.into(), b.into()),
            ObstacleSpec::Circle { center, radius } => Obstacle::circle(center.into(), radius),
        }
    }
}

/// Per-agent state published after each tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    pub id: u32,
    pub position: Position,
    pub heading: Position,
    pub velocity: Position,
}

impl From<AgentSnapshot> for AgentState {
    fn from(s: AgentSnapshot) -> Self {
        Self {
            id: s.id.0,
            position: s.position.into(),
            heading: s.heading.into(),
            velocity: s.velocity.into(),
        }
    }
}

impl AgentState {
    pub fn speed(&self) -> f32 {
        self.velocity.distance_to(&Position::default())
    }
}

#[cfg(feature = "std")]
mod scene {
    use super::{AgentState, FlockSettings, ObstacleSpec, Position, SpawnSettings};
    use serde::{Deserialize, Serialize};
    use shoal_core::Obstacle;

    /// A complete simulation scene, usually loaded from JSON
    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    pub struct SceneSettings {
        pub flock: FlockSettings,
        pub spawn: SpawnSettings,
        pub obstacles: Vec<ObstacleSpec>,
        /// Optional shared target every agent is drawn toward.
        pub target: Option<Position>,
        /// Changes applied while the scene runs, in any order.
        pub events: Vec<SceneEvent>,
    }

    impl SceneSettings {
        pub fn from_json(json: &str) -> serde_json::Result<Self> {
            serde_json::from_str(json)
        }

        pub fn obstacle_layer(&self) -> Vec<Obstacle> {
            self.obstacles.iter().copied().map(Obstacle::from).collect()
        }

        /// Events sorted by the time they fire at.
        pub fn timeline(&self) -> Vec<SceneEvent> {
            let mut events = self.events.clone();
            events.sort_by(|a, b| a.at().total_cmp(&b.at()));
            events
        }
    }

    /// A scheduled change to a running scene
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum SceneEvent {
        /// Move the shared target, or remove it with `null`.
        Target { at: f32, position: Option<Position> },
        /// Retune the flock.
        Settings { at: f32, settings: FlockSettings },
    }

    impl SceneEvent {
        pub fn at(&self) -> f32 {
            match self {
                SceneEvent::Target { at, .. } | SceneEvent::Settings { at, .. } => *at,
            }
        }
    }

    /// One avoidance probe, for debug visualisation
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub struct ProbeRay {
        pub agent: u32,
        pub origin: Position,
        pub end: Position,
        pub hit: bool,
    }

    /// Snapshot of the whole flock after a tick
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct FrameReport {
        pub tick: u64,
        pub time: f32,
        pub agents: Vec<AgentState>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub probes: Vec<ProbeRay>,
    }

    impl FrameReport {
        pub fn to_json_line(&self) -> serde_json::Result<String> {
            serde_json::to_string(self)
        }

        pub fn max_speed(&self) -> f32 {
            self.agents
                .iter()
                .map(AgentState::speed)
                .fold(0.0, f32::max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::AgentId;

    #[test]
    fn test_position_distance() {
        let p1 = Position::new(0.0, 0.0);
        let p2 = Position::new(3.0, 4.0);
        assert_eq!(p1.distance_to(&p2), 5.0);
    }

    #[test]
    fn test_settings_round_trip_core_config() {
        let config = FlockConfig {
            max_speed: 9.0,
            ray_count: 3,
            ..FlockConfig::default()
        };
        let settings = FlockSettings::from(&config);
        assert_eq!(FlockConfig::from(settings), config);
    }

    #[test]
    fn test_partial_scene_uses_defaults() {
        let json = r#"{
            "flock": { "max_speed": 5.0 },
            "spawn": { "count": 12 },
            "obstacles": [
                { "type": "segment", "a": { "x": -1.0, "y": 2.0 }, "b": { "x": 1.0, "y": 2.0 } },
                { "type": "circle", "center": { "x": 0.0, "y": -3.0 }, "radius": 0.5 }
            ],
            "events": [
                { "type": "target", "at": 2.0, "position": null },
                { "type": "target", "at": 1.0, "position": { "x": 4.0, "y": 0.0 } }
            ]
        }"#;

        let scene = SceneSettings::from_json(json).unwrap();
        let config = FlockConfig::from(scene.flock);
        assert_eq!(config.max_speed, 5.0);
        assert_eq!(config.neighbor_radius, FlockConfig::default().neighbor_radius);
        assert_eq!(scene.spawn.count, 12);
        assert_eq!(scene.spawn.radius, 3.0);
        assert_eq!(scene.spawn.forward, Position::new(0.0, 1.0));
        assert_eq!(scene.target, None);

        let layer = scene.obstacle_layer();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer[1], Obstacle::circle(Vector2D::new(0.0, -3.0), 0.5));

        let timeline = scene.timeline();
        assert_eq!(timeline[0].at(), 1.0);
        assert_eq!(
            timeline[1],
            SceneEvent::Target {
                at: 2.0,
                position: None
            }
        );
    }

    #[test]
    fn test_obstacle_spec_tagged_json() {
        let segment: ObstacleSpec = serde_json::from_str(
            r#"{ "type": "segment", "a": { "x": 0.0, "y": 1.0 }, "b": { "x": 2.0, "y": 1.0 } }"#,
        )
        .unwrap();
        assert_eq!(
            Obstacle::from(segment),
            Obstacle::segment(Vector2D::new(0.0, 1.0), Vector2D::new(2.0, 1.0))
        );

        let circle = ObstacleSpec::Circle {
            center: Position::new(1.0, -1.0),
            radius: 2.5,
        };
        let json = serde_json::to_string(&circle).unwrap();
        assert!(json.contains("\"type\":\"circle\""));

        assert!(serde_json::from_str::<ObstacleSpec>(r#"{ "type": "polygon" }"#).is_err());
    }

    #[test]
    fn test_empty_scene_is_default() {
        let scene = SceneSettings::from_json("{}").unwrap();
        assert_eq!(scene, SceneSettings::default());
        assert_eq!(scene.spawn.count, 50);
    }

    #[test]
    fn test_frame_report_json() {
        let snapshot = AgentSnapshot {
            id: AgentId(7),
            position: Vector2D::new(1.0, 2.0),
            heading: Vector2D::new(0.0, 1.0),
            velocity: Vector2D::new(0.0, 3.0),
        };
        let report = FrameReport {
            tick: 4,
            time: 0.08,
            agents: vec![AgentState::from(snapshot)],
            probes: Vec::new(),
        };

        let line = report.to_json_line().unwrap();
        assert!(!line.contains("probes"));
        assert!(line.contains("\"id\":7"));

        let parsed: FrameReport = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.max_speed(), 3.0);
    }
}
