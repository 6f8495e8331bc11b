/*
 * Spatial Grid Module
 *
 * Uniform bucketing of one flock's members for faster neighbour lookups.
 * The grid covers the bounding box of the members' current positions, so
 * agents that wandered outside the simulation bounds are still found.
 *
 * Cells are at least as wide as the largest rule radius, so every neighbour
 * within range of an agent sits in the agent's cell or one of its eight
 * surrounding cells. Candidates come back sorted by agent index, which keeps
 * the accumulation order identical to a plain scan of the member list.
 */

use glam::{Vec2, Vec3};

// Upper bound on cells per member before cells are widened
const MAX_CELLS_PER_MEMBER: usize = 4;

// Cap on cells along one axis, keeps the usize arithmetic from overflowing
const MAX_AXIS_CELLS: f32 = u32::MAX as f32;

#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    pub cell_size: f32,
    origin: Vec2,
    cols: usize,
    rows: usize,
    grid: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            ..Self::default()
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Re-bucket `members` using their positions in `positions`.
    ///
    /// `min_cell_size` must be at least the largest query radius.
    pub fn rebuild(&mut self, members: &[usize], positions: &[Vec3], min_cell_size: f32) {
        for cell in &mut self.grid {
            cell.clear();
        }

        let Some((min, max)) = planar_extent(members, positions) else {
            self.cols = 0;
            self.rows = 0;
            return;
        };

        let extent = (max - min).max(Vec2::splat(f32::EPSILON));
        let mut cell_size = min_cell_size.max(f32::EPSILON);

        // Widen cells for sparse, spread-out flocks so memory stays bounded
        let cell_budget = members.len().saturating_mul(MAX_CELLS_PER_MEMBER).max(1);
        cell_size = cell_size.max((extent.x * extent.y / cell_budget as f32).sqrt());
        while cells_along(extent.x, cell_size).saturating_mul(cells_along(extent.y, cell_size)) > cell_budget {
            cell_size *= 2.0;
        }

        self.cell_size = cell_size;
        self.origin = min;
        self.cols = cells_along(extent.x, cell_size);
        self.rows = cells_along(extent.y, cell_size);

        let total = self.cols * self.rows;
        if self.grid.len() < total {
            self.grid.resize_with(total, Vec::new);
        }

        for &member in members {
            if let Some(position) = positions.get(member) {
                let (x, y) = self.cell_coords(*position);
                let cell_index = y * self.cols + x;
                self.grid[cell_index].push(member);
            }
        }
    }

    /// Collect members in the 3x3 block of cells around `position` into
    /// `out`, sorted by agent index.
    pub fn candidates_into(&self, position: Vec3, out: &mut Vec<usize>) {
        out.clear();
        if self.cols == 0 || self.rows == 0 {
            return;
        }

        let (grid_x, grid_y) = self.cell_coords(position);
        let (grid_x, grid_y) = (grid_x as isize, grid_y as isize);
        let cols = self.cols as isize;
        let rows = self.rows as isize;

        // Check the cell and its neighbors (3x3 grid)
        for y_offset in -1..=1 {
            let check_y = grid_y + y_offset;
            if check_y < 0 || check_y >= rows {
                continue;
            }
            let y_index = check_y as usize * self.cols;

            for x_offset in -1..=1 {
                let check_x = grid_x + x_offset;
                if check_x < 0 || check_x >= cols {
                    continue;
                }
                out.extend_from_slice(&self.grid[y_index + check_x as usize]);
            }
        }

        out.sort_unstable();
    }

    // Convert world coordinates to clamped grid cell coordinates
    #[inline]
    fn cell_coords(&self, position: Vec3) -> (usize, usize) {
        let local = (position.truncate() - self.origin) / self.cell_size;
        let x = local.x.floor().clamp(0.0, (self.cols - 1) as f32) as usize;
        let y = local.y.floor().clamp(0.0, (self.rows - 1) as f32) as usize;
        (x, y)
    }
}

// Always at least one cell; NaN from an infinite extent over an infinite cell counts as one
fn cells_along(extent: f32, cell_size: f32) -> usize {
    let cells = (extent / cell_size).floor();
    if cells.is_nan() || cells <= 0.0 {
        1
    } else {
        cells.min(MAX_AXIS_CELLS) as usize + 1
    }
}

fn planar_extent(members: &[usize], positions: &[Vec3]) -> Option<(Vec2, Vec2)> {
    members
        .iter()
        .filter_map(|&member| positions.get(member))
        .map(|position| position.truncate())
        .fold(None, |extent, point| match extent {
            None => Some((point, point)),
            Some((min, max)) => Some((min.min(point), max.max(point))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_members_in_adjacent_cells() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
        ];
        let members = [0, 1, 2, 3];
        let mut grid = SpatialGrid::new(2.0);
        grid.rebuild(&members, &positions, 2.0);

        let mut out = Vec::new();
        grid.candidates_into(positions[0], &mut out);
        assert_eq!(out, vec![0, 1, 3]);
    }

    #[test]
    fn ignores_non_members() {
        let positions = vec![Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.2, 0.0, 0.0)];
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(&[0, 2], &positions, 1.0);

        let mut out = Vec::new();
        grid.candidates_into(Vec3::ZERO, &mut out);
        assert_eq!(out, vec![0, 2]);
    }

    #[test]
    fn sparse_flocks_widen_cells() {
        let positions = vec![Vec3::new(-1000.0, -1000.0, 0.0), Vec3::new(1000.0, 1000.0, 0.0)];
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(&[0, 1], &positions, 1.0);

        let (cols, rows) = grid.dimensions();
        assert!(cols * rows <= 2 * MAX_CELLS_PER_MEMBER);
        assert!(grid.cell_size >= 1.0);
    }

    #[test]
    fn widely_scattered_members_stay_within_budget() {
        let positions = vec![
            Vec3::new(-5.0e12, 0.0, 0.0),
            Vec3::new(5.0e12, 3.0e12, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let members = [0, 1, 2];
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&members, &positions, 10.0);

        let (cols, rows) = grid.dimensions();
        assert!(cols >= 1 && rows >= 1);
        assert!(cols * rows <= members.len() * MAX_CELLS_PER_MEMBER);
        assert!(grid.cell_size >= 10.0);

        let mut out = Vec::new();
        for (member, &position) in positions.iter().enumerate() {
            grid.candidates_into(position, &mut out);
            assert!(out.contains(&member));
        }
    }

    #[test]
    fn infinite_extent_collapses_to_one_cell() {
        let positions = vec![Vec3::new(f32::MAX, 0.0, 0.0), Vec3::new(-f32::MAX, 0.0, 0.0)];
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(&[0, 1], &positions, 1.0);

        let (cols, rows) = grid.dimensions();
        assert!(cols >= 1 && rows >= 1);
        assert!(cols * rows <= 2 * MAX_CELLS_PER_MEMBER);
    }

    #[test]
    fn empty_grid_has_no_candidates() {
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(&[], &[], 1.0);
        let mut out = vec![42];
        grid.candidates_into(Vec3::ZERO, &mut out);
        assert!(out.is_empty());
    }
}
