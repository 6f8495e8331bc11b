/*
 * Tick Scheduler Module
 *
 * Drives one simulation tick over the whole population:
 * 1. Rebuild per-flock spatial grids when the grid strategy is selected
 * 2. Split the population into batches and run the neighbourhood query and
 *    steering update for every agent, reading only the snapshot generation
 *    and writing only the agent's own slot of the write generation
 * 3. Wait for every batch (rayon joins before returning), then swap buffers
 * 4. Run the integration pass on the freshly swapped generation
 *
 * The TickGate marks the window in which the population must not change.
 */

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use log::trace;
use rayon::prelude::*;

use crate::agent_store::{AgentStore, Snapshot};
use crate::error::{FlockError, Result};
use crate::flock::FlockRegistry;
use crate::integrate::{integrate_all, IntegrationSettings};
use crate::neighborhood::{BruteForceQuery, FlockNeighborhood, GridQuery, NeighborhoodQuery};
use crate::params::{FlockConfig, NeighborStrategy, SimulationParams};
use crate::spatial_grid::SpatialGrid;
use crate::steering::{agent_rng, random_perturbation, target_direction};

/// Flag raised for the duration of a tick.
#[derive(Debug, Default)]
pub struct TickGate {
    ticking: AtomicBool,
}

/// Lowers the gate when dropped, including on unwind.
#[derive(Debug)]
pub struct TickGuard<'a> {
    ticking: &'a AtomicBool,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.ticking.store(false, Ordering::Release);
    }
}

impl TickGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the gate, failing if a tick is already running.
    pub fn enter(&self) -> Result<TickGuard<'_>> {
        self.ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FlockError::ConcurrencyViolation("tick"))?;
        Ok(TickGuard {
            ticking: &self.ticking,
        })
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }

    // Reject a population mutation while a tick is in flight
    pub fn ensure_idle(&self, operation: &'static str) -> Result<()> {
        if self.is_ticking() {
            Err(FlockError::ConcurrencyViolation(operation))
        } else {
            Ok(())
        }
    }
}

// How the steering pass was partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub batches: usize,
    pub batch_size: usize,
}

/// Seeds for the two random passes of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSeeds {
    pub steering: u64,
    pub integration: u64,
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    // One grid per flock, reused across ticks
    grids: Vec<SpatialGrid>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steering for every agent, then the swap. Returns once every batch
    /// has finished.
    pub fn compute_steering(
        &mut self,
        store: &mut AgentStore,
        registry: &FlockRegistry,
        params: &SimulationParams,
        seed: u64,
    ) -> BatchReport {
        let batch_size = params.batch_size.max(1);
        let agents = store.count();

        if params.neighbor_strategy == NeighborStrategy::Grid {
            self.rebuild_grids(store.positions(), registry);
        }

        let configs: Vec<&FlockConfig> = registry.iter().map(|flock| flock.config()).collect();
        let neighborhoods: Vec<FlockNeighborhood<'_>> = registry
            .iter()
            .map(|flock| match params.neighbor_strategy {
                NeighborStrategy::BruteForce => FlockNeighborhood::BruteForce(BruteForceQuery::new(flock.members())),
                NeighborStrategy::Grid => FlockNeighborhood::Grid(GridQuery::new(&self.grids[flock.id().0])),
            })
            .collect();

        let (snapshot, write) = store.split();
        let steer = |agent: usize| steer_agent(agent, &snapshot, &neighborhoods, &configs, params, seed);

        // Each batch owns a disjoint slice of the write generation
        let process_batch = |(batch, (positions, directions)): (usize, (&mut [Vec3], &mut [Vec3]))| {
            let start = batch * batch_size;
            for (offset, (position, direction)) in positions.iter_mut().zip(directions.iter_mut()).enumerate() {
                let agent = start + offset;
                *position = snapshot.positions[agent];
                *direction = steer(agent);
            }
        };

        if params.enable_parallel {
            write
                .positions
                .par_chunks_mut(batch_size)
                .zip(write.directions.par_chunks_mut(batch_size))
                .enumerate()
                .for_each(process_batch);
        } else {
            write
                .positions
                .chunks_mut(batch_size)
                .zip(write.directions.chunks_mut(batch_size))
                .enumerate()
                .for_each(process_batch);
        }

        store.swap_buffers();

        BatchReport {
            batches: agents.div_ceil(batch_size),
            batch_size,
        }
    }

    /// Run a full tick: steering, swap, then integration.
    pub fn run(
        &mut self,
        store: &mut AgentStore,
        registry: &FlockRegistry,
        params: &SimulationParams,
        seeds: TickSeeds,
        integration: &IntegrationSettings<'_>,
    ) -> BatchReport {
        let report = self.compute_steering(store, registry, params, seeds.steering);
        trace!(
            "steering done: {} agents in {} batches of {}",
            store.count(),
            report.batches,
            report.batch_size
        );
        integrate_all(store.integration_view(), seeds.integration, integration, params.enable_parallel);
        report
    }

    fn rebuild_grids(&mut self, positions: &[Vec3], registry: &FlockRegistry) {
        if self.grids.len() < registry.len() {
            self.grids.resize_with(registry.len(), SpatialGrid::default);
        }
        for flock in registry.iter() {
            let radius = flock.config().max_radius();
            self.grids[flock.id().0].rebuild(flock.members(), positions, radius);
        }
    }
}

fn steer_agent(
    agent: usize,
    snapshot: &Snapshot<'_>,
    neighborhoods: &[FlockNeighborhood<'_>],
    configs: &[&FlockConfig],
    params: &SimulationParams,
    seed: u64,
) -> Vec3 {
    let flock = snapshot.flocks[agent].0;
    let (Some(neighborhood), Some(config)) = (neighborhoods.get(flock), configs.get(flock)) else {
        return snapshot.directions[agent];
    };

    let stats = neighborhood.gather(agent, snapshot, config);
    let mut rng = agent_rng(seed, agent);
    let perturbation = random_perturbation(&mut rng, params.perturbation);

    target_direction(
        &stats,
        snapshot.positions[agent],
        config,
        params.separation_normalization,
        perturbation,
    )
}
