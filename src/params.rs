/*
 * Simulation Parameters Module
 *
 * This module defines the tunable parameters of the simulation: the
 * per-flock FlockConfig (radii, rule weights, rule toggles, speed caps and
 * target population) and the global SimulationParams (batching, noise,
 * integration and neighbour search settings). Both can be edited from the
 * viewer UI and loaded from a JSON configuration file, and both are
 * validated before the first tick rather than during one.
 */

use serde::{Deserialize, Serialize};

use crate::bounds::BoundsMode;
use crate::error::{FlockError, Result};

/// How the summed separation speed is averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparationNormalization {
    /// Divide by the alignment neighbour count, zero when it is zero.
    #[default]
    AlignmentCount,
    /// Divide by the separation neighbour count.
    OwnCount,
}

/// Neighbour search backend. Both produce the same statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// Scan every member of the flock.
    #[default]
    BruteForce,
    /// Bucket members into a uniform grid sized from the flock radii.
    Grid,
}

// Parameters shared by every member of one flock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    pub name: String,
    pub visibility: f32,
    pub separation_distance: f32,
    pub weight_alignment: f32,
    pub weight_separation: f32,
    pub weight_cohesion: f32,
    pub use_alignment_rule: bool,
    pub use_separation_rule: bool,
    pub use_cohesion_rule: bool,
    pub max_speed: f32,
    pub max_rotation_speed: f32,
    // Population spawned by Simulation::populate
    pub num_boids: usize,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            name: "flock".to_string(),
            visibility: 10.0,
            separation_distance: 2.0,
            weight_alignment: 1.0,
            weight_separation: 1.0,
            weight_cohesion: 1.0,
            use_alignment_rule: true,
            use_separation_rule: true,
            use_cohesion_rule: true,
            max_speed: 5.0,
            max_rotation_speed: 4.0,
            num_boids: 100,
        }
    }
}

impl FlockConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reject values that would make the steering rules meaningless.
    pub fn validate(&self) -> Result<()> {
        positive(&self.name, "visibility", self.visibility)?;
        positive(&self.name, "separation_distance", self.separation_distance)?;
        non_negative(&self.name, "weight_alignment", self.weight_alignment)?;
        non_negative(&self.name, "weight_separation", self.weight_separation)?;
        non_negative(&self.name, "weight_cohesion", self.weight_cohesion)?;
        positive(&self.name, "max_speed", self.max_speed)?;
        non_negative(&self.name, "max_rotation_speed", self.max_rotation_speed)?;
        if self.num_boids == 0 {
            return Err(FlockError::invalid(format!(
                "flock '{}': num_boids must be at least 1",
                self.name
            )));
        }
        Ok(())
    }

    // The largest radius any rule looks at, used to size grid cells
    pub fn max_radius(&self) -> f32 {
        self.visibility.max(self.separation_distance)
    }

    // Get parameter ranges for UI sliders
    pub fn get_weight_range() -> std::ops::RangeInclusive<f32> {
        0.0..=3.0
    }

    pub fn get_radius_range() -> std::ops::RangeInclusive<f32> {
        0.5..=100.0
    }

    pub fn get_max_speed_range() -> std::ops::RangeInclusive<f32> {
        0.5..=50.0
    }
}

// Global parameters for the scheduler, noise and integration passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub batch_size: usize,
    // Agents added to the first flock per growth request
    pub boid_increment: usize,
    // Half-width of the uniform steering perturbation per axis
    pub perturbation: f32,
    // Half-width of the uniform wander added during integration
    pub wander: f32,
    pub separation_normalization: SeparationNormalization,
    pub neighbor_strategy: NeighborStrategy,
    pub enable_parallel: bool,
    pub bounds_mode: BoundsMode,
    pub integrate_speed: bool,
    pub limit_rotation: bool,
    pub obstacle_margin: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            batch_size: 100,
            boid_increment: 100,
            perturbation: 0.05,
            wander: 0.05,
            separation_normalization: SeparationNormalization::AlignmentCount,
            neighbor_strategy: NeighborStrategy::BruteForce,
            enable_parallel: true,
            bounds_mode: BoundsMode::Free,
            integrate_speed: false,
            limit_rotation: false,
            obstacle_margin: 1.0,
            seed: None,
        }
    }
}

impl SimulationParams {
    // Parameters with every random term switched off
    pub fn deterministic() -> Self {
        Self {
            perturbation: 0.0,
            wander: 0.0,
            seed: Some(0),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(FlockError::invalid("batch_size must be at least 1"));
        }
        if self.boid_increment == 0 {
            return Err(FlockError::invalid("boid_increment must be at least 1"));
        }
        non_negative("simulation", "perturbation", self.perturbation)?;
        non_negative("simulation", "wander", self.wander)?;
        non_negative("simulation", "obstacle_margin", self.obstacle_margin)?;
        Ok(())
    }

    pub fn get_batch_size_range() -> std::ops::RangeInclusive<usize> {
        1..=10000
    }

    pub fn get_noise_range() -> std::ops::RangeInclusive<f32> {
        0.0..=1.0
    }
}

fn positive(owner: &str, field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!(
            "{owner}: {field} must be a positive number, got {value}"
        )))
    }
}

fn non_negative(owner: &str, field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlockError::invalid(format!(
            "{owner}: {field} must not be negative, got {value}"
        )))
    }
}
