/*
 * Agent Store Module
 *
 * Flat, struct-of-arrays storage for every agent in the simulation.
 *
 * Positions and headings are kept in two generations. During a tick the
 * read generation is the immutable snapshot every worker samples, and each
 * worker writes only its own slots of the write generation. Swapping the
 * generations flips an index, so it costs the same for ten agents as for a
 * million.
 *
 * Per-agent attributes that the steering pass never writes (speed caps,
 * owning flock) and the scalar speed updated by integration live in single
 * arrays next to the buffered ones.
 */

use glam::Vec3;

use crate::flock::FlockId;

// Attributes copied from the owning flock when an agent is spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentAttributes {
    pub flock: FlockId,
    pub speed: f32,
    pub max_speed: f32,
    pub max_rotation_speed: f32,
}

/// Read-only view of one generation, shared by every worker during a tick.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub positions: &'a [Vec3],
    pub directions: &'a [Vec3],
    pub speeds: &'a [f32],
    pub flocks: &'a [FlockId],
}

/// The generation being filled by the current tick.
#[derive(Debug)]
pub struct WriteGeneration<'a> {
    pub positions: &'a mut [Vec3],
    pub directions: &'a mut [Vec3],
}

/// Mutable access to the current generation for the integration pass.
#[derive(Debug)]
pub struct IntegrationView<'a> {
    pub positions: &'a mut [Vec3],
    pub directions: &'a mut [Vec3],
    // Headings from before the last swap
    pub previous_directions: &'a [Vec3],
    pub speeds: &'a mut [f32],
    pub max_speeds: &'a [f32],
    pub max_rotation_speeds: &'a [f32],
}

/// One agent as handed to the host for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub index: usize,
    pub flock: FlockId,
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
}

#[derive(Debug, Default)]
pub struct AgentStore {
    positions: [Vec<Vec3>; 2],
    directions: [Vec<Vec3>; 2],
    // Index of the read generation in the buffered pairs
    front: usize,
    generation: u64,
    speeds: Vec<f32>,
    max_speeds: Vec<f32>,
    max_rotation_speeds: Vec<f32>,
    flocks: Vec<FlockId>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let buffer = || Vec::with_capacity(capacity);
        Self {
            positions: [buffer(), buffer()],
            directions: [buffer(), buffer()],
            front: 0,
            generation: 0,
            speeds: Vec::with_capacity(capacity),
            max_speeds: Vec::with_capacity(capacity),
            max_rotation_speeds: Vec::with_capacity(capacity),
            flocks: Vec::with_capacity(capacity),
        }
    }

    pub fn count(&self) -> usize {
        self.flocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flocks.is_empty()
    }

    // Number of buffer swaps performed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append a new agent to both generations and return its stable index.
    ///
    /// The heading is normalized on the way in, so a zero heading stays zero
    /// and anything else becomes unit length. Existing indices never move.
    pub fn append(&mut self, position: Vec3, direction: Vec3, attributes: AgentAttributes) -> usize {
        let index = self.count();
        let direction = direction.normalize_or_zero();
        for generation in 0..2 {
            self.positions[generation].push(position);
            self.directions[generation].push(direction);
        }
        self.speeds.push(attributes.speed.max(0.0));
        self.max_speeds.push(attributes.max_speed);
        self.max_rotation_speeds.push(attributes.max_rotation_speed);
        self.flocks.push(attributes.flock);
        index
    }

    // Position and heading of an agent in the read generation
    pub fn get(&self, index: usize) -> Option<(Vec3, Vec3)> {
        let position = *self.positions[self.front].get(index)?;
        let direction = *self.directions[self.front].get(index)?;
        Some((position, direction))
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions[self.front]
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions[self.front]
    }

    pub fn write_positions(&self) -> &[Vec3] {
        &self.positions[self.back()]
    }

    pub fn write_directions(&self) -> &[Vec3] {
        &self.directions[self.back()]
    }

    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    pub fn speed(&self, index: usize) -> Option<f32> {
        self.speeds.get(index).copied()
    }

    pub fn max_speed(&self, index: usize) -> Option<f32> {
        self.max_speeds.get(index).copied()
    }

    pub fn flock_of(&self, index: usize) -> Option<FlockId> {
        self.flocks.get(index).copied()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            positions: &self.positions[self.front],
            directions: &self.directions[self.front],
            speeds: &self.speeds,
            flocks: &self.flocks,
        }
    }

    /// Borrow the read generation immutably and the write generation
    /// mutably at the same time.
    pub fn split(&mut self) -> (Snapshot<'_>, WriteGeneration<'_>) {
        let (read_positions, write_positions) = split_generations(&mut self.positions, self.front);
        let (read_directions, write_directions) = split_generations(&mut self.directions, self.front);
        (
            Snapshot {
                positions: read_positions,
                directions: read_directions,
                speeds: &self.speeds,
                flocks: &self.flocks,
            },
            WriteGeneration {
                positions: write_positions,
                directions: write_directions,
            },
        )
    }

    /// Exchange the read and write generations. O(1), nothing is copied.
    pub fn swap_buffers(&mut self) {
        self.front = self.back();
        self.generation += 1;
    }

    pub fn integration_view(&mut self) -> IntegrationView<'_> {
        let front = self.front;
        let (previous_directions, directions) = split_generations(&mut self.directions, 1 - front);
        IntegrationView {
            positions: &mut self.positions[front],
            directions,
            previous_directions,
            speeds: &mut self.speeds,
            max_speeds: &self.max_speeds,
            max_rotation_speeds: &self.max_rotation_speeds,
        }
    }

    // Overwrite an agent's heading in the read generation
    pub fn set_direction(&mut self, index: usize, direction: Vec3) {
        if let Some(slot) = self.directions[self.front].get_mut(index) {
            *slot = direction.normalize_or_zero();
        }
    }

    pub fn scale_max_speed(&mut self, index: usize, factor: f32) {
        if let Some(max_speed) = self.max_speeds.get_mut(index) {
            *max_speed *= factor;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentView> + '_ {
        let positions = &self.positions[self.front];
        let directions = &self.directions[self.front];
        (0..self.count()).map(move |index| AgentView {
            index,
            flock: self.flocks[index],
            position: positions[index],
            direction: directions[index],
            speed: self.speeds[index],
        })
    }

    fn back(&self) -> usize {
        1 - self.front
    }
}

fn split_generations(pair: &mut [Vec<Vec3>; 2], front: usize) -> (&[Vec3], &mut [Vec3]) {
    let [first, second] = pair;
    if front == 0 {
        (first.as_slice(), second.as_mut_slice())
    } else {
        (second.as_slice(), first.as_mut_slice())
    }
}
