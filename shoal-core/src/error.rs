//! Error types for flock construction and spawning.
//!
//! The simulation step itself never fails; only degenerate configuration and
//! roster requests are rejected.

use core::fmt;

/// Configuration values rejected by [`FlockConfig::validate`](crate::FlockConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A parameter was NaN or infinite.
    NonFinite(&'static str),
    /// `max_speed` must be strictly positive.
    NonPositiveMaxSpeed(f32),
    /// A radius, distance, weight, angle or duration was negative.
    Negative { field: &'static str, value: f32 },
    /// At least one avoidance ray is required.
    ZeroRayCount,
    /// More avoidance rays than [`MAX_RAY_COUNT`](crate::config::MAX_RAY_COUNT).
    TooManyRays(u32),
    /// `initial_align_strength` must be at least 1.
    AlignStrengthBelowOne(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonFinite(field) => write!(f, "{} must be a finite number", field),
            ConfigError::NonPositiveMaxSpeed(v) => {
                write!(f, "max_speed must be greater than zero (got {})", v)
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{} must not be negative (got {})", field, value)
            }
            ConfigError::ZeroRayCount => write!(f, "ray_count must be at least 1"),
            ConfigError::TooManyRays(n) => write!(
                f,
                "ray_count must be at most {} (got {})",
                crate::config::MAX_RAY_COUNT,
                n
            ),
            ConfigError::AlignStrengthBelowOne(v) => {
                write!(f, "initial_align_strength must be at least 1 (got {})", v)
            }
        }
    }
}

/// Errors returned by [`Flock`](crate::Flock) operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlockError {
    /// The flock configuration is invalid.
    Config(ConfigError),
    /// More agents were requested than the roster can hold.
    CapacityExceeded { requested: usize, capacity: usize },
    /// Spawn radius was negative or not finite.
    InvalidSpawnRadius(f32),
}

impl fmt::Display for FlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlockError::Config(e) => write!(f, "Invalid flock configuration: {}", e),
            FlockError::CapacityExceeded {
                requested,
                capacity,
            } => write!(
                f,
                "Cannot spawn {} agents into a flock with capacity {}",
                requested, capacity
            ),
            FlockError::InvalidSpawnRadius(r) => {
                write!(f, "Spawn radius must be finite and non-negative (got {})", r)
            }
        }
    }
}

impl From<ConfigError> for FlockError {
    fn from(e: ConfigError) -> Self {
        FlockError::Config(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for FlockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlockError::Config(e) => Some(e),
            _ => None,
        }
    }
}
