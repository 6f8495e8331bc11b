/*
 * Steering Module
 *
 * Turns an agent's NeighborStats into its next target direction by blending
 * the three classic rules with a small random perturbation:
 * 1. Alignment: mean flockmate heading scaled by mean flockmate speed
 * 2. Separation: unit vector away from crowding flockmates scaled by the
 *    averaged separation speed
 * 3. Cohesion: offset from the agent to its flockmates' centroid
 *
 * The result is deliberately left unnormalized; its magnitude is consumed
 * by the integration pass. Nothing here touches shared state, which is what
 * lets the scheduler run it for every agent in parallel.
 */

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::neighborhood::NeighborStats;
use crate::params::{FlockConfig, SeparationNormalization};

/// Per-agent generator for one pass of one tick.
///
/// Seeding from the tick seed and the agent index alone keeps results
/// independent of batch size and of parallel versus sequential execution.
pub fn agent_rng(tick_seed: u64, agent: usize) -> StdRng {
    let mixed = (agent as u64 ^ 0x5851_F42D_4C95_7F2D).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(tick_seed ^ mixed)
}

/// Draw an independent uniform value in `[-magnitude, magnitude]` for x and
/// y. Planar motion keeps z at zero.
pub fn random_perturbation<R: Rng + ?Sized>(rng: &mut R, magnitude: f32) -> Vec3 {
    if magnitude <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.gen_range(-magnitude..=magnitude),
        rng.gen_range(-magnitude..=magnitude),
        0.0,
    )
}

// Compute the unnormalized target direction for one agent
pub fn target_direction(
    stats: &NeighborStats,
    position: Vec3,
    config: &FlockConfig,
    normalization: SeparationNormalization,
    perturbation: Vec3,
) -> Vec3 {
    let mut mean_speed = 0.0;
    let mut mean_direction = Vec3::ZERO;
    let mut cohesion_offset = Vec3::ZERO;

    if stats.count > 0 {
        let count = stats.count as f32;
        mean_speed = stats.speed_sum / count;
        mean_direction = (stats.direction_sum / count).normalize_or_zero();
        cohesion_offset = stats.position_sum / count - position;
    }

    let mut separation_speed = 0.0;
    let mut separation_direction = Vec3::ZERO;

    if stats.separation_count > 0 {
        let divisor = match normalization {
            SeparationNormalization::AlignmentCount => stats.count,
            SeparationNormalization::OwnCount => stats.separation_count,
        };
        if divisor > 0 {
            separation_speed = stats.separation_speed_sum / divisor as f32;
        }
        separation_direction = stats.separation_direction_sum.normalize_or_zero();
    }

    let alignment_weight = rule_weight(config.use_alignment_rule, config.weight_alignment);
    let separation_weight = rule_weight(config.use_separation_rule, config.weight_separation);
    let cohesion_weight = rule_weight(config.use_cohesion_rule, config.weight_cohesion);

    mean_direction * mean_speed * alignment_weight
        + separation_direction * separation_speed * separation_weight
        + cohesion_offset * cohesion_weight
        + perturbation
}

#[inline]
fn rule_weight(enabled: bool, weight: f32) -> f32 {
    if enabled {
        weight
    } else {
        0.0
    }
}
