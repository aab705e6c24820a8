//! Neighbor queries over a settled snapshot of the flock.
//!
//! Queries never see agents moved during the current tick: the brute-force
//! scan reads the roster before integration starts, and [`SpatialGrid`]
//! keeps its own copy of positions and velocities.

use crate::agent::{Agent, AgentId};
use crate::vector::Vector2D;

/// Another agent seen by a neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: AgentId,
    pub position: Vector2D,
    pub velocity: Vector2D,
}

impl From<&Agent> for Neighbor {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            position: agent.position,
            velocity: agent.velocity,
        }
    }
}

/// Finds the agents within a radius of a point.
pub trait NeighborQuery {
    /// Calls `visit` once for every agent other than `exclude` whose
    /// distance to `position` is at most `radius`. Order is unspecified.
    fn for_each_neighbor(
        &self,
        exclude: AgentId,
        position: Vector2D,
        radius: f32,
        visit: &mut dyn FnMut(Neighbor),
    );
}

/// Naive O(n^2) scan over the roster.
impl NeighborQuery for [Agent] {
    fn for_each_neighbor(
        &self,
        exclude: AgentId,
        position: Vector2D,
        radius: f32,
        visit: &mut dyn FnMut(Neighbor),
    ) {
        let radius_sq = radius * radius;
        for other in self.iter() {
            if other.id == exclude {
                continue;
            }
            if other.position.distance_squared(&position) <= radius_sq {
                visit(Neighbor::from(other));
            }
        }
    }
}

#[cfg(feature = "std")]
pub use grid::SpatialGrid;

#[cfg(feature = "std")]
mod grid {
    use super::{Neighbor, NeighborQuery};
    use crate::agent::{Agent, AgentId};
    use crate::vector::Vector2D;

    const MIN_CELL_SIZE: f32 = 1.0e-3;
    const INVALID_INDEX: usize = usize::MAX;
    // Keeps sparse, far-flung flocks from allocating huge grids.
    const MAX_CELLS_PER_AXIS: usize = 1024;

    /// Uniform grid over the bounding box of a flock snapshot.
    ///
    /// Cells hold intrusive linked lists (`head`/`next`) of agent indices,
    /// so a rebuild does not allocate once the buffers have grown.
    pub struct SpatialGrid {
        base_cell_size: f32,
        cell_size: f32,
        origin: Vector2D,
        cols: usize,
        rows: usize,
        head: Vec<usize>,
        next: Vec<usize>,
        agents: Vec<Neighbor>,
    }

    impl SpatialGrid {
        pub fn new(cell_size: f32) -> Self {
            let cell_size = cell_size.max(MIN_CELL_SIZE);
            Self {
                base_cell_size: cell_size,
                cell_size,
                origin: Vector2D::zero(),
                cols: 0,
                rows: 0,
                head: Vec::new(),
                next: Vec::new(),
                agents: Vec::new(),
            }
        }

        /// Builds a grid over `agents`. A cell size equal to the largest
        /// query radius keeps each query to a 3x3 block of cells.
        pub fn from_agents(agents: &[Agent], cell_size: f32) -> Self {
            let mut grid = Self::new(cell_size);
            grid.rebuild(agents);
            grid
        }

        pub fn cell_size(&self) -> f32 {
            self.cell_size
        }

        pub fn len(&self) -> usize {
            self.agents.len()
        }

        pub fn is_empty(&self) -> bool {
            self.agents.is_empty()
        }

        /// Re-indexes the grid from a fresh snapshot.
        pub fn rebuild(&mut self, agents: &[Agent]) {
            self.agents.clear();
            self.agents.extend(agents.iter().map(Neighbor::from));

            if self.agents.is_empty() {
                self.cols = 0;
                self.rows = 0;
                self.head.clear();
                self.next.clear();
                return;
            }

            let mut min = self.agents[0].position;
            let mut max = min;
            for agent in &self.agents {
                min.x = min.x.min(agent.position.x);
                min.y = min.y.min(agent.position.y);
                max.x = max.x.max(agent.position.x);
                max.y = max.y.max(agent.position.y);
            }

            let span_x = max.x - min.x;
            let span_y = max.y - min.y;
            let widest = span_x.max(span_y);
            self.cell_size = self.base_cell_size;
            if widest / self.cell_size > MAX_CELLS_PER_AXIS as f32 {
                log::debug!(
                    "Flock spans {:.1} units; growing grid cell size from {:.3}",
                    widest,
                    self.cell_size
                );
                self.cell_size = widest / MAX_CELLS_PER_AXIS as f32;
            }

            self.origin = min;
            self.cols = (span_x / self.cell_size).floor() as usize + 1;
            self.rows = (span_y / self.cell_size).floor() as usize + 1;

            self.head.clear();
            self.head.resize(self.cols * self.rows, INVALID_INDEX);
            self.next.clear();
            self.next.resize(self.agents.len(), INVALID_INDEX);

            for i in 0..self.agents.len() {
                let (cx, cy) = self.cell_coords(self.agents[i].position);
                let cell = cy as usize * self.cols + cx as usize;
                self.next[i] = self.head[cell];
                self.head[cell] = i;
            }
        }

        fn cell_coords(&self, position: Vector2D) -> (isize, isize) {
            let cx = ((position.x - self.origin.x) / self.cell_size).floor() as isize;
            let cy = ((position.y - self.origin.y) / self.cell_size).floor() as isize;
            (
                cx.clamp(0, self.cols as isize - 1),
                cy.clamp(0, self.rows as isize - 1),
            )
        }
    }

    impl NeighborQuery for SpatialGrid {
        fn for_each_neighbor(
            &self,
            exclude: AgentId,
            position: Vector2D,
            radius: f32,
            visit: &mut dyn FnMut(Neighbor),
        ) {
            if self.agents.is_empty() {
                return;
            }

            let radius = radius.max(0.0);
            let radius_sq = radius * radius;
            let reach = (radius / self.cell_size).ceil() as isize;

            // Positions outside the snapshot's bounds are clamped onto the
            // border cells; the reach still covers everything within radius.
            let raw_x = ((position.x - self.origin.x) / self.cell_size).floor() as isize;
            let raw_y = ((position.y - self.origin.y) / self.cell_size).floor() as isize;

            let min_x = (raw_x - reach).max(0);
            let max_x = (raw_x + reach).min(self.cols as isize - 1);
            let min_y = (raw_y - reach).max(0);
            let max_y = (raw_y + reach).min(self.rows as isize - 1);

            for cy in min_y..=max_y {
                for cx in min_x..=max_x {
                    let mut index = self.head[cy as usize * self.cols + cx as usize];
                    while index != INVALID_INDEX {
                        let other = &self.agents[index];
                        if other.id != exclude
                            && other.position.distance_squared(&position) <= radius_sq
                        {
                            visit(*other);
                        }
                        index = self.next[index];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn agent(id: u32, x: f32, y: f32) -> Agent {
        Agent::new(AgentId(id), Vector2D::new(x, y), Vector2D::new(1.0, 0.0))
    }

    fn collect<Q: NeighborQuery + ?Sized>(
        query: &Q,
        exclude: AgentId,
        position: Vector2D,
        radius: f32,
    ) -> Vec<u32> {
        let mut ids = Vec::new();
        query.for_each_neighbor(exclude, position, radius, &mut |n| ids.push(n.id.0));
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_brute_force_excludes_self_and_far_agents() {
        let agents = [agent(0, 0.0, 0.0), agent(1, 1.0, 0.0), agent(2, 5.0, 0.0)];
        let ids = collect(&agents[..], AgentId(0), Vector2D::zero(), 2.0);
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_radius_is_inclusive() {
        let agents = [agent(0, 0.0, 0.0), agent(1, 2.0, 0.0)];
        let ids = collect(&agents[..], AgentId(0), Vector2D::zero(), 2.0);
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_empty_roster_has_no_neighbors() {
        let agents: [Agent; 0] = [];
        assert!(collect(&agents[..], AgentId(0), Vector2D::zero(), 10.0).is_empty());
        let grid = SpatialGrid::from_agents(&agents, 1.0);
        assert!(grid.is_empty());
        assert!(collect(&grid, AgentId(0), Vector2D::zero(), 10.0).is_empty());
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let agents: Vec<Agent> = (0..200)
            .map(|i| agent(i, rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)))
            .collect();

        let grid = SpatialGrid::from_agents(&agents, 2.0);
        assert_eq!(grid.len(), 200);

        for query in agents.iter().take(50) {
            for radius in [0.5, 2.0, 3.7] {
                let expected = collect(&agents[..], query.id, query.position, radius);
                let actual = collect(&grid, query.id, query.position, radius);
                assert_eq!(actual, expected);
            }
        }
    }

    #[test]
    fn test_grid_query_outside_bounds() {
        let agents = [agent(0, 0.0, 0.0), agent(1, 1.0, 1.0)];
        let grid = SpatialGrid::from_agents(&agents, 0.5);
        let ids = collect(&grid, AgentId(99), Vector2D::new(2.0, 1.0), 1.5);
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_grid_coarsens_for_sparse_flocks() {
        let agents = [agent(0, 0.0, 0.0), agent(1, 100_000.0, 0.0)];
        let grid = SpatialGrid::from_agents(&agents, 0.01);
        assert!(grid.cell_size() > 0.01);
        let ids = collect(&grid, AgentId(0), Vector2D::zero(), 200_000.0);
        assert_eq!(ids, vec![1]);
    }
}
