use crate::vector::{sqrt, Vector2D};

/// Result of a ray hitting an obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vector2D,
    /// Surface normal at the hit, facing back toward the ray origin.
    pub normal: Vector2D,
    pub distance: f32,
}

/// Ray-cast query against an obstacle layer owned by the caller.
pub trait ObstacleSensor {
    /// Nearest hit along `direction` (unit length) within `max_distance`.
    fn raycast(&self, origin: Vector2D, direction: Vector2D, max_distance: f32) -> Option<RayHit>;
}

/// An empty obstacle layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleSensor for NoObstacles {
    fn raycast(&self, _origin: Vector2D, _direction: Vector2D, _max_distance: f32) -> Option<RayHit> {
        None
    }
}

/// Static collision shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    /// A wall between two points, solid from both sides.
    Segment { a: Vector2D, b: Vector2D },
    Circle { center: Vector2D, radius: f32 },
}

impl Obstacle {
    pub fn segment(a: Vector2D, b: Vector2D) -> Self {
        Obstacle::Segment { a, b }
    }

    pub fn circle(center: Vector2D, radius: f32) -> Self {
        Obstacle::Circle { center, radius }
    }

    pub fn raycast(&self, origin: Vector2D, direction: Vector2D, max_distance: f32) -> Option<RayHit> {
        match *self {
            Obstacle::Segment { a, b } => raycast_segment(a, b, origin, direction, max_distance),
            Obstacle::Circle { center, radius } => {
                raycast_circle(center, radius, origin, direction, max_distance)
            }
        }
    }
}

/// Nearest hit over every shape in the layer.
impl ObstacleSensor for [Obstacle] {
    fn raycast(&self, origin: Vector2D, direction: Vector2D, max_distance: f32) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for obstacle in self.iter() {
            if let Some(hit) = obstacle.raycast(origin, direction, max_distance) {
                nearest = match nearest {
                    Some(n) if n.distance <= hit.distance => Some(n),
                    _ => Some(hit),
                };
            }
        }
        nearest
    }
}

const PARALLEL_EPSILON: f32 = 1.0e-8;

fn raycast_segment(
    a: Vector2D,
    b: Vector2D,
    origin: Vector2D,
    direction: Vector2D,
    max_distance: f32,
) -> Option<RayHit> {
    let edge = b - a;
    let denom = direction.cross(edge);
    if denom * denom < PARALLEL_EPSILON {
        return None;
    }

    let to_a = a - origin;
    let t = to_a.cross(edge) / denom;
    let u = to_a.cross(direction) / denom;

    if !(0.0..=1.0).contains(&u) || t < 0.0 || t > max_distance {
        return None;
    }

    let mut normal = edge.perp().normalize();
    if normal.dot(direction) > 0.0 {
        normal = -normal;
    }

    Some(RayHit {
        point: origin + direction * t,
        normal,
        distance: t,
    })
}

fn raycast_circle(
    center: Vector2D,
    radius: f32,
    origin: Vector2D,
    direction: Vector2D,
    max_distance: f32,
) -> Option<RayHit> {
    let offset = origin - center;
    let c = offset.magnitude_squared() - radius * radius;

    // A ray starting inside the shape hits it immediately.
    if c <= 0.0 {
        return Some(RayHit {
            point: origin,
            normal: -direction,
            distance: 0.0,
        });
    }

    let b = offset.dot(direction);
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - sqrt(discriminant);
    if t > max_distance {
        return None;
    }

    let point = origin + direction * t;
    Some(RayHit {
        point,
        normal: (point - center).normalize(),
        distance: t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector2D, b: Vector2D) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn test_segment_hit_faces_origin() {
        let wall = Obstacle::segment(Vector2D::new(-5.0, 2.0), Vector2D::new(5.0, 2.0));
        let hit = wall
            .raycast(Vector2D::zero(), Vector2D::UP, 3.0)
            .expect("ray should hit the wall");

        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!(approx(hit.point, Vector2D::new(0.0, 2.0)));
        assert!(approx(hit.normal, Vector2D::new(0.0, -1.0)));
    }

    #[test]
    fn test_segment_out_of_range_or_beside() {
        let wall = Obstacle::segment(Vector2D::new(-5.0, 2.0), Vector2D::new(5.0, 2.0));
        assert!(wall.raycast(Vector2D::zero(), Vector2D::UP, 1.5).is_none());
        assert!(wall
            .raycast(Vector2D::new(6.0, 0.0), Vector2D::UP, 3.0)
            .is_none());
        assert!(wall
            .raycast(Vector2D::zero(), Vector2D::new(1.0, 0.0), 10.0)
            .is_none());
        assert!(wall
            .raycast(Vector2D::zero(), Vector2D::new(0.0, -1.0), 10.0)
            .is_none());
    }

    #[test]
    fn test_circle_hit() {
        let rock = Obstacle::circle(Vector2D::new(0.0, 5.0), 1.0);
        let hit = rock
            .raycast(Vector2D::zero(), Vector2D::UP, 10.0)
            .expect("ray should hit the rock");

        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!(approx(hit.normal, Vector2D::new(0.0, -1.0)));
        assert!(rock
            .raycast(Vector2D::zero(), Vector2D::new(1.0, 0.0), 10.0)
            .is_none());
    }

    #[test]
    fn test_circle_from_inside() {
        let rock = Obstacle::circle(Vector2D::zero(), 2.0);
        let hit = rock
            .raycast(Vector2D::new(0.5, 0.0), Vector2D::UP, 1.0)
            .expect("origin inside the rock");
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.normal, Vector2D::new(0.0, -1.0));
    }

    #[test]
    fn test_layer_returns_nearest_hit() {
        let layer = [
            Obstacle::segment(Vector2D::new(-5.0, 4.0), Vector2D::new(5.0, 4.0)),
            Obstacle::circle(Vector2D::new(0.0, 2.0), 0.5),
        ];
        let hit = layer[..]
            .raycast(Vector2D::zero(), Vector2D::UP, 10.0)
            .expect("ray should hit");
        assert!((hit.distance - 1.5).abs() < 1e-5);

        // Order of the layer does not matter.
        let reversed = [layer[1], layer[0]];
        let hit = reversed[..]
            .raycast(Vector2D::zero(), Vector2D::UP, 10.0)
            .expect("ray should hit");
        assert!((hit.distance - 1.5).abs() < 1e-5);

        assert!(NoObstacles
            .raycast(Vector2D::zero(), Vector2D::UP, 10.0)
            .is_none());
    }
}
