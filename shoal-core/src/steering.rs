//! Steering behaviors.
//!
//! Each behavior is a pure function of one agent's state plus the neighbors
//! or obstacle hits supplied to it, and returns an acceleration. Alignment,
//! cohesion, separation and avoidance are capped at `max_force`.

use crate::agent::Agent;
use crate::config::FlockConfig;
use crate::neighbors::Neighbor;
use crate::obstacle::ObstacleSensor;
use crate::vector::Vector2D;

/// Offsets shorter than this (squared) produce no steering.
pub const STEER_EPSILON: f32 = 1.0e-4;
/// Neighbors closer than this (squared distance) are ignored by separation.
pub const SEPARATION_EPSILON: f32 = 1.0e-5;
/// Scale applied to the target attraction, on top of its weight.
pub const TARGET_SCALE: f32 = 0.5;

/// Steers toward `desired_direction` at full speed.
fn steer_along(agent: &Agent, desired_direction: Vector2D, config: &FlockConfig) -> Vector2D {
    let desired = desired_direction.normalize() * config.max_speed;
    (desired - agent.velocity).limit(config.max_force)
}

/// Shared primitive: steer toward a point `offset` away from the agent.
pub fn steer_towards(agent: &Agent, offset: Vector2D, config: &FlockConfig) -> Vector2D {
    if offset.magnitude_squared() < STEER_EPSILON {
        return Vector2D::zero();
    }
    steer_along(agent, offset, config)
}

/// Match the average velocity of neighbors within `neighbor_radius`.
pub fn alignment<'a, I>(agent: &Agent, neighbors: I, config: &FlockConfig) -> Vector2D
where
    I: IntoIterator<Item = &'a Neighbor>,
{
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in neighbors {
        if other.id == agent.id {
            continue;
        }
        sum += other.velocity;
        count += 1;
    }

    if count == 0 {
        return Vector2D::zero();
    }

    let average = sum / count as f32;
    steer_along(agent, average, config)
}

/// Move toward the centroid of neighbors within `neighbor_radius`.
pub fn cohesion<'a, I>(agent: &Agent, neighbors: I, config: &FlockConfig) -> Vector2D
where
    I: IntoIterator<Item = &'a Neighbor>,
{
    let mut center = Vector2D::zero();
    let mut count = 0;

    for other in neighbors {
        if other.id == agent.id {
            continue;
        }
        center += other.position;
        count += 1;
    }

    if count == 0 {
        return Vector2D::zero();
    }

    center = center / count as f32;
    steer_towards(agent, center - agent.position, config)
}

/// Push away from neighbors at most `separation_radius` away.
///
/// Each neighbor contributes its unit offset divided by its distance, so
/// the repulsion falls off with the inverse of distance.
pub fn separation<'a, I>(agent: &Agent, neighbors: I, config: &FlockConfig) -> Vector2D
where
    I: IntoIterator<Item = &'a Neighbor>,
{
    let radius_sq = config.separation_radius * config.separation_radius;
    let mut steering = Vector2D::zero();
    let mut count = 0;

    for other in neighbors {
        if other.id == agent.id {
            continue;
        }
        let away = agent.position - other.position;
        let distance_sq = away.magnitude_squared();
        if distance_sq <= radius_sq && distance_sq > SEPARATION_EPSILON {
            steering += away.normalize() / crate::vector::sqrt(distance_sq);
            count += 1;
        }
    }

    if count == 0 {
        return Vector2D::zero();
    }

    steering = steering / count as f32;
    steer_along(agent, steering, config)
}

/// Directions of the avoidance probes: `ray_count` rays spread evenly over
/// `spread_angle_degrees`, centered on `forward`.
pub fn ray_fan(forward: Vector2D, config: &FlockConfig) -> impl Iterator<Item = Vector2D> {
    let rays = config.ray_count.max(1);
    let half = config.spread_angle_degrees.to_radians() * 0.5;

    (0..rays).map(move |i| {
        let t = if rays == 1 {
            0.5
        } else {
            i as f32 / (rays - 1) as f32
        };
        forward.rotate(-half + t * 2.0 * half)
    })
}

/// Sum of the hit normals along the ray fan, each weighted by how deep
/// inside `avoid_distance` the hit is (1 at the agent, 0 at the ray's end).
pub fn obstacle_push<S>(agent: &Agent, sensor: &S, config: &FlockConfig) -> Vector2D
where
    S: ObstacleSensor + ?Sized,
{
    if config.avoid_distance <= 0.0 {
        return Vector2D::zero();
    }

    let mut push = Vector2D::zero();
    for direction in ray_fan(agent.forward(), config) {
        if let Some(hit) = sensor.raycast(agent.position, direction, config.avoid_distance) {
            let closeness = (config.avoid_distance - hit.distance) / config.avoid_distance;
            push += hit.normal.normalize() * closeness;
        }
    }
    push
}

/// Steer away from obstacles sensed by the ray fan, toward the direction
/// of [`obstacle_push`].
pub fn avoid_obstacles<S>(agent: &Agent, sensor: &S, config: &FlockConfig) -> Vector2D
where
    S: ObstacleSensor + ?Sized,
{
    let avoid = obstacle_push(agent, sensor, config);
    if avoid.magnitude_squared() == 0.0 {
        return Vector2D::zero();
    }

    steer_along(agent, avoid, config)
}

/// Pull toward the flock's shared target, if one is set.
pub fn target_attraction(agent: &Agent, target: Option<Vector2D>, config: &FlockConfig) -> Vector2D {
    match target {
        Some(target) => steer_towards(agent, target - agent.position, config) * TARGET_SCALE,
        None => Vector2D::zero(),
    }
}
