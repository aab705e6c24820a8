#![cfg_attr(not(feature = "std"), no_std)]

//! Flocking simulation core.
//!
//! Agents steer by alignment, cohesion, separation, ray-cast obstacle
//! avoidance and an optional shared target. Neighbor lookup, obstacle
//! ray casts and randomness are supplied by the caller through the
//! [`NeighborQuery`], [`ObstacleSensor`] and [`RandomSource`] traits.

pub mod agent;
pub mod config;
pub mod error;
pub mod flock;
pub mod neighbors;
pub mod obstacle;
pub mod random;
pub mod steering;
pub mod step;
pub mod vector;

pub use agent::{Agent, AgentId, AgentSnapshot};
pub use config::FlockConfig;
pub use error::{ConfigError, FlockError};
pub use flock::{Flock, SpawnParams};
pub use neighbors::{Neighbor, NeighborQuery};
#[cfg(feature = "std")]
pub use neighbors::SpatialGrid;
pub use obstacle::{NoObstacles, Obstacle, ObstacleSensor, RayHit};
pub use random::RandomSource;
pub use step::{SteeringForces, TickContext};
pub use vector::Vector2D;
