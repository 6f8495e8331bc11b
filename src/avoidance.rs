/*
 * Avoidance Module
 *
 * Repulsion from things that are not flockmates. Obstacles are treated as
 * repulsive points with a radius; enemies are bare positions handed in by
 * the host. Neither is owned by the simulation core beyond the list of
 * obstacles registered on the Simulation.
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }
}

/// Push a unit heading away from every obstacle closer than its radius
/// plus `margin`, then renormalize.
///
/// When the push exactly cancels the heading (an agent flying straight at
/// an obstacle) the agent turns to the push alone, so it never stalls in
/// front of the obstacle.
pub fn avoid_obstacles(position: Vec3, direction: Vec3, obstacles: &[Obstacle], margin: f32) -> Vec3 {
    let mut push = Vec3::ZERO;
    let mut touched = false;

    for obstacle in obstacles {
        let away = planar(position - obstacle.position);
        if away.length() < obstacle.radius + margin {
            push += away.normalize_or_zero();
            touched = true;
        }
    }

    if !touched {
        return direction;
    }

    let steered = (direction + push).normalize_or_zero();
    if steered != Vec3::ZERO {
        return steered;
    }
    push.normalize_or_zero()
}

/// Outcome of pushing one agent away from nearby enemies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyPush {
    pub direction: Vec3,
    // Number of enemies in range; the max speed is scaled once per enemy
    pub hits: usize,
}

// For every enemy in range: add the unit vector away from it and renormalize
pub fn push_from_enemies(position: Vec3, direction: Vec3, enemies: &[Vec3], separation_distance: f32) -> EnemyPush {
    let mut steered = direction;
    let mut hits = 0;

    for &enemy in enemies {
        let away = planar(position - enemy);
        if away.length() < separation_distance {
            steered = (steered + away.normalize_or_zero()).normalize_or_zero();
            hits += 1;
        }
    }

    EnemyPush {
        direction: steered,
        hits,
    }
}

#[inline]
fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}
