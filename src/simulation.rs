/*
 * Simulation Module
 *
 * The host-facing entry point. A Simulation owns the agent store, the flock
 * registry and the tick scheduler, and exposes the operations a host loop
 * needs: initialize, spawn agents, tick, and read back a snapshot for
 * rendering.
 *
 * Population growth is serialized with ticks. Direct calls need `&mut self`
 * and are also checked against the TickGate; other threads can queue growth
 * through a SpawnHandle, and queued requests are applied at the start of
 * the next tick, before the gate is raised.
 */

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use glam::Vec3;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent_store::{AgentAttributes, AgentStore, AgentView};
use crate::avoidance::{push_from_enemies, Obstacle};
use crate::bounds::Bounds;
use crate::config::SimulationConfig;
use crate::debug::TickStats;
use crate::error::{FlockError, Result};
use crate::flock::{FlockId, FlockRegistry};
use crate::integrate::IntegrationSettings;
use crate::params::{FlockConfig, SimulationParams};
use crate::scheduler::{TickGate, TickScheduler, TickSeeds};

/// A queued request to grow a flock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    pub count: usize,
    pub flock: FlockId,
}

/// Cloneable sender for growth requests from other threads.
#[derive(Debug, Clone)]
pub struct SpawnHandle {
    sender: Sender<SpawnRequest>,
}

impl SpawnHandle {
    /// Queue `count` new agents for `flock`. Returns `false` once the
    /// simulation has been dropped.
    pub fn request(&self, count: usize, flock: FlockId) -> bool {
        self.sender.send(SpawnRequest { count, flock }).is_ok()
    }
}

#[derive(Debug)]
pub struct Simulation {
    bounds: Bounds,
    params: SimulationParams,
    store: AgentStore,
    registry: FlockRegistry,
    scheduler: TickScheduler,
    gate: TickGate,
    obstacles: Vec<Obstacle>,
    rng: StdRng,
    spawn_sender: Sender<SpawnRequest>,
    spawn_receiver: Receiver<SpawnRequest>,
    tick: u64,
    last_stats: TickStats,
}

impl Simulation {
    /// Set up the flock registry and an empty agent store with default
    /// simulation parameters.
    pub fn initialize(bounds: Bounds, flocks: impl IntoIterator<Item = FlockConfig>) -> Result<Self> {
        Self::with_params(bounds, SimulationParams::default(), flocks)
    }

    pub fn with_params(
        bounds: Bounds,
        params: SimulationParams,
        flocks: impl IntoIterator<Item = FlockConfig>,
    ) -> Result<Self> {
        bounds.validate()?;
        params.validate()?;

        let mut registry = FlockRegistry::new();
        for config in flocks {
            let id = registry.create_flock(config)?;
            debug!("registered flock {id} '{}'", registry.get(id)?.name());
        }
        if registry.is_empty() {
            return Err(FlockError::invalid("at least one flock must be configured"));
        }

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (spawn_sender, spawn_receiver) = mpsc::channel();

        info!(
            "simulation initialized: {} flock(s), bounds {} .. {}, batch size {}",
            registry.len(),
            bounds.min,
            bounds.max,
            params.batch_size
        );

        Ok(Self {
            bounds,
            params,
            store: AgentStore::new(),
            registry,
            scheduler: TickScheduler::new(),
            gate: TickGate::new(),
            obstacles: Vec::new(),
            rng,
            spawn_sender,
            spawn_receiver,
            tick: 0,
            last_stats: TickStats::default(),
        })
    }

    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Self::with_params(config.bounds, config.params, config.flocks)
    }

    /// Spawn every flock's configured `num_boids`.
    pub fn populate(&mut self) -> Result<usize> {
        let targets: Vec<(FlockId, usize)> = self
            .registry
            .iter()
            .map(|flock| (flock.id(), flock.config().num_boids))
            .collect();

        let mut spawned = 0;
        for (flock, count) in targets {
            spawned += self.spawn_agents(count, flock)?.len();
        }
        info!("populated {} flock(s) with {spawned} agents", self.registry.len());
        Ok(spawned)
    }

    /// Append `count` agents to `flock` at random positions within the
    /// bounds, each with a random unit heading.
    ///
    /// All members are registered before this returns, so the flock's
    /// `num_boids` grows by exactly `count`. Returns the new agent indices.
    pub fn spawn_agents(&mut self, count: usize, flock: FlockId) -> Result<Range<usize>> {
        self.gate.ensure_idle("spawn_agents")?;
        if count == 0 {
            return Err(FlockError::invalid("spawn count must be at least 1"));
        }
        let config = self.registry.config(flock)?;
        let attributes = AgentAttributes {
            flock,
            speed: config.max_speed,
            max_speed: config.max_speed,
            max_rotation_speed: config.max_rotation_speed,
        };

        let start = self.store.count();
        for _ in 0..count {
            let position = self.bounds.random_position(&mut self.rng);
            let direction = Vec3::new(self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0), 0.0);
            self.store.append(position, direction, attributes);
        }
        let end = self.store.count();
        self.registry.add_members(flock, start..end)?;

        debug!("spawned {count} agents into flock {flock} (population {end})");
        Ok(start..end)
    }

    /// Grow the first flock by `params.boid_increment` agents.
    pub fn grow_default(&mut self) -> Result<Range<usize>> {
        self.spawn_agents(self.params.boid_increment, FlockId(0))
    }

    pub fn spawn_handle(&self) -> SpawnHandle {
        SpawnHandle {
            sender: self.spawn_sender.clone(),
        }
    }

    // Drain queued spawn requests; returns the number of agents added
    fn apply_pending_spawns(&mut self) -> usize {
        let pending: Vec<SpawnRequest> = self.spawn_receiver.try_iter().collect();
        let mut spawned = 0;
        for request in pending {
            match self.spawn_agents(request.count, request.flock) {
                Ok(range) => spawned += range.len(),
                Err(err) => warn!("rejected queued spawn of {} into flock {}: {err}", request.count, request.flock),
            }
        }
        spawned
    }

    /// Advance the simulation by `elapsed` seconds.
    pub fn tick(&mut self, elapsed: f32) -> Result<TickStats> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(FlockError::invalid(format!(
                "elapsed time must be a non-negative number, got {elapsed}"
            )));
        }

        let spawned = self.apply_pending_spawns();
        let started = Instant::now();

        let _guard = self.gate.enter()?;
        let seeds = TickSeeds {
            steering: self.rng.gen(),
            integration: self.rng.gen(),
        };
        let integration = IntegrationSettings {
            elapsed,
            wander: self.params.wander,
            integrate_speed: self.params.integrate_speed,
            limit_rotation: self.params.limit_rotation,
            bounds: self.bounds,
            bounds_mode: self.params.bounds_mode,
            obstacles: &self.obstacles,
            obstacle_margin: self.params.obstacle_margin,
        };
        let report = self
            .scheduler
            .run(&mut self.store, &self.registry, &self.params, seeds, &integration);

        self.tick += 1;
        self.last_stats = TickStats {
            tick: self.tick,
            generation: self.store.generation(),
            agents: self.store.count(),
            batches: report.batches,
            batch_size: report.batch_size,
            spawned,
            elapsed,
            duration: started.elapsed(),
        };
        trace!(
            "tick {} finished: {} agents in {:?}",
            self.tick,
            self.last_stats.agents,
            self.last_stats.duration
        );
        Ok(self.last_stats)
    }

    /// Position and heading of every agent, in index order.
    pub fn agent_snapshot(&self) -> Vec<(Vec3, Vec3)> {
        self.store
            .positions()
            .iter()
            .copied()
            .zip(self.store.directions().iter().copied())
            .collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentView> + '_ {
        self.store.iter()
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> Result<()> {
        self.gate.ensure_idle("add_obstacle")?;
        if !obstacle.radius.is_finite() || obstacle.radius <= 0.0 || !obstacle.position.is_finite() {
            return Err(FlockError::invalid(format!(
                "obstacle radius must be positive and its position finite, got {obstacle:?}"
            )));
        }
        self.obstacles.push(obstacle);
        Ok(())
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Push every member of `flock` away from enemies closer than
    /// `separation_distance`, scaling its max speed by `weight` once per
    /// enemy in range. Returns how many members were affected.
    ///
    /// The pushed heading replaces the agent's current heading only. The
    /// next tick's steering rebuilds every heading from the flockmates, so
    /// the push carries into motion only as the turn origin when
    /// `limit_rotation` is set. The max speed scaling is permanent and caps
    /// movement whenever `integrate_speed` is set.
    pub fn separate_from_enemies(
        &mut self,
        flock: FlockId,
        enemies: &[Vec3],
        separation_distance: f32,
        weight: f32,
    ) -> Result<usize> {
        self.gate.ensure_idle("separate_from_enemies")?;
        let members = self.registry.members(flock)?;

        let mut affected = 0;
        for &agent in members {
            let Some((position, direction)) = self.store.get(agent) else {
                continue;
            };
            let push = push_from_enemies(position, direction, enemies, separation_distance);
            if push.hits == 0 {
                continue;
            }
            self.store.set_direction(agent, push.direction);
            for _ in 0..push.hits {
                self.store.scale_max_speed(agent, weight);
            }
            affected += 1;
        }
        Ok(affected)
    }

    pub fn set_params(&mut self, params: SimulationParams) -> Result<()> {
        self.gate.ensure_idle("set_params")?;
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn update_flock_config(&mut self, flock: FlockId, config: FlockConfig) -> Result<()> {
        self.gate.ensure_idle("update_flock_config")?;
        self.registry.update_config(flock, config)
    }

    pub fn members(&self, flock: FlockId) -> Result<&[usize]> {
        self.registry.members(flock)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn registry(&self) -> &FlockRegistry {
        &self.registry
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    pub fn agent_count(&self) -> usize {
        self.store.count()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn last_stats(&self) -> &TickStats {
        &self.last_stats
    }

    pub fn is_ticking(&self) -> bool {
        self.gate.is_ticking()
    }
}
