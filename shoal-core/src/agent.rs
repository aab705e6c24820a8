use crate::vector::Vector2D;

/// Stable identifier of an agent within its flock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

/// A single flocking agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vector2D,
    pub velocity: Vector2D,
    /// Unit facing direction; held at its last value while the agent is
    /// (nearly) at rest.
    pub heading: Vector2D,
}

impl Agent {
    pub fn new(id: AgentId, position: Vector2D, velocity: Vector2D) -> Self {
        let heading = if velocity.magnitude_squared() > crate::step::HEADING_EPSILON {
            velocity.normalize()
        } else {
            Vector2D::UP
        };

        Self {
            id,
            position,
            velocity,
            heading,
        }
    }

    /// Direction the agent is currently moving in, falling back to its
    /// heading when it is nearly still.
    pub fn forward(&self) -> Vector2D {
        if self.velocity.magnitude_squared() > crate::step::HEADING_EPSILON {
            self.velocity.normalize()
        } else {
            self.heading
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            heading: self.heading,
            velocity: self.velocity,
        }
    }
}

/// Read-only view of an agent for rendering, UI or audio consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vector2D,
    pub heading: Vector2D,
    pub velocity: Vector2D,
}
