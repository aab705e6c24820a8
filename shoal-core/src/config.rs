use crate::error::ConfigError;

/// Upper bound on avoidance rays per agent. Every ray is a ray cast per
/// agent per tick.
pub const MAX_RAY_COUNT: u32 = 64;

/// Configuration for the flock simulation
///
/// Shared by every agent and read-only for the duration of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockConfig {
    // Movement
    pub max_speed: f32,
    /// Cap on each steering contribution before weighting.
    pub max_force: f32,

    // Perception
    pub neighbor_radius: f32,
    pub separation_radius: f32,

    // Obstacle avoidance
    pub avoid_distance: f32,
    pub ray_count: u32,
    pub spread_angle_degrees: f32,

    // Behavior weights
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub avoidance_weight: f32,
    pub target_weight: f32,
    pub noise_weight: f32,

    /// Alignment multiplier right after spawn, decaying to 1.
    pub initial_align_strength: f32,
    /// Seconds over which the alignment boost decays.
    pub initial_align_duration: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            max_speed: 3.5,
            max_force: 2.0,
            neighbor_radius: 2.0,
            separation_radius: 0.8,
            avoid_distance: 1.5,
            ray_count: 5,
            spread_angle_degrees: 60.0,
            alignment_weight: 1.0,
            cohesion_weight: 0.8,
            separation_weight: 1.4,
            avoidance_weight: 2.0,
            target_weight: 0.6,
            noise_weight: 0.2,
            initial_align_strength: 2.0,
            initial_align_duration: 3.0,
        }
    }
}

impl FlockConfig {
    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("max_force", self.max_force),
            ("neighbor_radius", self.neighbor_radius),
            ("separation_radius", self.separation_radius),
            ("avoid_distance", self.avoid_distance),
            ("spread_angle_degrees", self.spread_angle_degrees),
            ("alignment_weight", self.alignment_weight),
            ("cohesion_weight", self.cohesion_weight),
            ("separation_weight", self.separation_weight),
            ("avoidance_weight", self.avoidance_weight),
            ("target_weight", self.target_weight),
            ("noise_weight", self.noise_weight),
            ("initial_align_duration", self.initial_align_duration),
        ];

        if !self.max_speed.is_finite() {
            return Err(ConfigError::NonFinite("max_speed"));
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::NonPositiveMaxSpeed(self.max_speed));
        }

        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(field));
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.ray_count == 0 {
            return Err(ConfigError::ZeroRayCount);
        }
        if self.ray_count > MAX_RAY_COUNT {
            return Err(ConfigError::TooManyRays(self.ray_count));
        }

        if !self.initial_align_strength.is_finite() {
            return Err(ConfigError::NonFinite("initial_align_strength"));
        }
        if self.initial_align_strength < 1.0 {
            return Err(ConfigError::AlignStrengthBelowOne(
                self.initial_align_strength,
            ));
        }

        if self.separation_radius > self.neighbor_radius {
            log::warn!(
                "separation_radius ({}) exceeds neighbor_radius ({}); neighbors are gathered at the larger radius",
                self.separation_radius,
                self.neighbor_radius
            );
        }

        Ok(())
    }

    /// Largest radius any behavior scans.
    pub fn query_radius(&self) -> f32 {
        self.neighbor_radius.max(self.separation_radius)
    }
}
