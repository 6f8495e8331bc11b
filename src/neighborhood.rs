/*
 * Neighborhood Query Module
 *
 * For one agent, visits the other members of its flock and reduces them to
 * NeighborStats in a single pass:
 * 1. Alignment: flockmates closer than `visibility` contribute their speed,
 *    heading and position
 * 2. Separation: flockmates closer than `separation_distance` contribute the
 *    unit vector pointing away from them and their distance scaled by
 *    `weight_separation`
 *
 * The two radii are independent, so a flockmate can count toward either
 * accumulator, both, or neither. Distances are measured in the plane and the
 * agent itself is always skipped. No neighbour list survives the query.
 */

use std::cell::RefCell;

use glam::Vec3;

use crate::agent_store::Snapshot;
use crate::params::FlockConfig;
use crate::spatial_grid::SpatialGrid;

/// Reduced view of an agent's neighbourhood for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighborStats {
    pub speed_sum: f32,
    pub direction_sum: Vec3,
    pub position_sum: Vec3,
    pub count: usize,
    pub separation_direction_sum: Vec3,
    pub separation_speed_sum: f32,
    pub separation_count: usize,
}

impl NeighborStats {
    // Fold one flockmate into the accumulators
    #[inline]
    pub fn accumulate(
        &mut self,
        position: Vec3,
        other_position: Vec3,
        other_direction: Vec3,
        other_speed: f32,
        config: &FlockConfig,
    ) {
        let offset = planar(position - other_position);
        let distance = offset.length();

        if distance < config.visibility {
            self.speed_sum += other_speed;
            self.direction_sum += other_direction;
            self.position_sum += other_position;
            self.count += 1;
        }

        if distance < config.separation_distance {
            self.separation_direction_sum += offset.normalize_or_zero();
            self.separation_speed_sum += distance * config.weight_separation;
            self.separation_count += 1;
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.count == 0 && self.separation_count == 0
    }
}

/// A way of finding an agent's flockmates.
///
/// Implementations must visit the same flockmates in ascending index order so
/// that every backend produces bit-identical statistics.
pub trait NeighborhoodQuery: Sync {
    fn gather(&self, agent: usize, snapshot: &Snapshot<'_>, config: &FlockConfig) -> NeighborStats;
}

/// Scan of every member of the flock. O(n) per agent, O(n²) per flock.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceQuery<'a> {
    members: &'a [usize],
}

impl<'a> BruteForceQuery<'a> {
    pub fn new(members: &'a [usize]) -> Self {
        Self { members }
    }
}

impl NeighborhoodQuery for BruteForceQuery<'_> {
    fn gather(&self, agent: usize, snapshot: &Snapshot<'_>, config: &FlockConfig) -> NeighborStats {
        accumulate_over(agent, self.members.iter().copied(), snapshot, config)
    }
}

/// Grid-accelerated lookup over a prebuilt SpatialGrid of the flock.
#[derive(Debug, Clone, Copy)]
pub struct GridQuery<'a> {
    grid: &'a SpatialGrid,
}

impl<'a> GridQuery<'a> {
    pub fn new(grid: &'a SpatialGrid) -> Self {
        Self { grid }
    }
}

thread_local! {
    static CANDIDATES: RefCell<Vec<usize>> = RefCell::new(Vec::with_capacity(64));
}

impl NeighborhoodQuery for GridQuery<'_> {
    fn gather(&self, agent: usize, snapshot: &Snapshot<'_>, config: &FlockConfig) -> NeighborStats {
        let Some(&position) = snapshot.positions.get(agent) else {
            return NeighborStats::default();
        };
        CANDIDATES.with(|candidates| {
            let mut candidates = candidates.borrow_mut();
            self.grid.candidates_into(position, &mut candidates);
            accumulate_over(agent, candidates.iter().copied(), snapshot, config)
        })
    }
}

/// Per-flock query selected by the configured NeighborStrategy.
#[derive(Debug, Clone, Copy)]
pub enum FlockNeighborhood<'a> {
    BruteForce(BruteForceQuery<'a>),
    Grid(GridQuery<'a>),
}

impl NeighborhoodQuery for FlockNeighborhood<'_> {
    fn gather(&self, agent: usize, snapshot: &Snapshot<'_>, config: &FlockConfig) -> NeighborStats {
        match self {
            Self::BruteForce(query) => query.gather(agent, snapshot, config),
            Self::Grid(query) => query.gather(agent, snapshot, config),
        }
    }
}

fn accumulate_over(
    agent: usize,
    others: impl Iterator<Item = usize>,
    snapshot: &Snapshot<'_>,
    config: &FlockConfig,
) -> NeighborStats {
    let mut stats = NeighborStats::default();
    let Some(&position) = snapshot.positions.get(agent) else {
        return stats;
    };

    for other in others {
        if other == agent {
            continue;
        }
        let (Some(&other_position), Some(&other_direction), Some(&other_speed)) = (
            snapshot.positions.get(other),
            snapshot.directions.get(other),
            snapshot.speeds.get(other),
        ) else {
            continue;
        };
        stats.accumulate(position, other_position, other_direction, other_speed, config);
    }

    stats
}

#[inline]
fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot<'a>(positions: &'a [Vec3], directions: &'a [Vec3], speeds: &'a [f32]) -> Snapshot<'a> {
        Snapshot {
            positions,
            directions,
            speeds,
            flocks: &[],
        }
    }

    fn config(visibility: f32, separation_distance: f32) -> FlockConfig {
        FlockConfig {
            visibility,
            separation_distance,
            ..FlockConfig::default()
        }
    }

    #[test]
    fn excludes_self_and_respects_each_radius() {
        let positions = [
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(50.0, 0.0, 0.0),
        ];
        let directions = [Vec3::X, Vec3::Y, Vec3::X, Vec3::Y];
        let speeds = [1.0, 2.0, 4.0, 8.0];
        let members = [0, 1, 2, 3];

        let stats = BruteForceQuery::new(&members).gather(0, &snapshot(&positions, &directions, &speeds), &config(10.0, 2.0));

        assert_eq!(stats.count, 2);
        assert_eq!(stats.separation_count, 1);
        assert_relative_eq!(stats.speed_sum, 6.0);
        assert_eq!(stats.direction_sum, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(stats.position_sum, Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(stats.separation_direction_sum, Vec3::new(-1.0, 0.0, 0.0));
        assert_relative_eq!(stats.separation_speed_sum, 1.0);
    }

    #[test]
    fn separation_can_count_without_alignment() {
        let positions = [Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)];
        let directions = [Vec3::X, Vec3::X];
        let speeds = [1.0, 1.0];
        let members = [0, 1];

        let stats = BruteForceQuery::new(&members).gather(0, &snapshot(&positions, &directions, &speeds), &config(0.5, 3.0));

        assert_eq!(stats.count, 0);
        assert_eq!(stats.separation_count, 1);
        assert_eq!(stats.separation_direction_sum, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn distance_ignores_height() {
        let positions = [Vec3::ZERO, Vec3::new(1.0, 0.0, 100.0)];
        let directions = [Vec3::X, Vec3::X];
        let speeds = [1.0, 1.0];
        let members = [0, 1];

        let stats = BruteForceQuery::new(&members).gather(0, &snapshot(&positions, &directions, &speeds), &config(2.0, 2.0));
        assert_eq!(stats.count, 1);
        assert_eq!(stats.separation_count, 1);
    }

    #[test]
    fn isolated_agent_reports_nothing() {
        let positions = [Vec3::ZERO, Vec3::new(100.0, 100.0, 0.0)];
        let directions = [Vec3::X, Vec3::Y];
        let speeds = [1.0, 1.0];
        let members = [0, 1];

        let stats = BruteForceQuery::new(&members).gather(0, &snapshot(&positions, &directions, &speeds), &config(10.0, 2.0));
        assert!(stats.is_isolated());
        assert_eq!(stats, NeighborStats::default());
    }

    #[test]
    fn grid_matches_brute_force_exactly() {
        let positions: Vec<Vec3> = (0..200)
            .map(|i| {
                let t = i as f32 * 0.37;
                Vec3::new((t * 7.1).sin() * 30.0, (t * 3.3).cos() * 30.0, 0.0)
            })
            .collect();
        let directions: Vec<Vec3> = (0..200)
            .map(|i| Vec3::new((i as f32).cos(), (i as f32).sin(), 0.0))
            .collect();
        let speeds: Vec<f32> = (0..200).map(|i| 1.0 + (i % 5) as f32).collect();
        let members: Vec<usize> = (0..200).collect();
        let config = config(6.0, 2.0);

        let mut grid = SpatialGrid::new(config.max_radius());
        grid.rebuild(&members, &positions, config.max_radius());

        let view = snapshot(&positions, &directions, &speeds);
        let brute = BruteForceQuery::new(&members);
        let gridded = GridQuery::new(&grid);
        for agent in 0..200 {
            assert_eq!(brute.gather(agent, &view, &config), gridded.gather(agent, &view, &config));
        }
    }
}
