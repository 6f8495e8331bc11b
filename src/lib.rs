/*
 * Flocking Simulation - Module Definitions
 *
 * A batched, double-buffered flocking core. Agents live in a struct-of-arrays
 * store, grouped into flocks with independent steering parameters. Each tick
 * computes every agent's new heading from a frozen snapshot of the previous
 * tick, in parallel batches, then swaps buffers and integrates.
 *
 * The nannou viewer is compiled only with the `viewer` feature.
 */

// Re-export key components for easier access
pub use agent_store::{AgentAttributes, AgentStore, AgentView, Snapshot};
pub use avoidance::Obstacle;
pub use bounds::{Bounds, BoundsMode};
pub use config::SimulationConfig;
pub use debug::TickStats;
pub use error::{FlockError, Result};
pub use flock::{Flock, FlockId, FlockRegistry};
pub use neighborhood::{NeighborStats, NeighborhoodQuery};
pub use params::{FlockConfig, NeighborStrategy, SeparationNormalization, SimulationParams};
pub use scheduler::{TickGate, TickScheduler};
pub use simulation::{Simulation, SpawnHandle, SpawnRequest};
pub use spatial_grid::SpatialGrid;

// Define modules
pub mod agent_store;
pub mod avoidance;
pub mod bounds;
pub mod config;
pub mod debug;
pub mod error;
pub mod flock;
pub mod integrate;
pub mod logging;
pub mod neighborhood;
pub mod params;
pub mod scheduler;
pub mod simulation;
pub mod spatial_grid;
pub mod steering;

#[cfg(feature = "viewer")]
pub mod viewer;

// Constants
pub const BOID_SIZE: f32 = 6.0;
pub const WORLD_SIZE: f32 = 100.0;
