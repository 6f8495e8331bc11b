/*
 * Integration Module
 *
 * Movement application, run after the steering results have been swapped
 * into the read generation. For each agent:
 * 1. Normalize the target direction (its magnitude is kept as the raw speed)
 * 2. Add a small random wander and normalize again
 * 3. Bend away from obstacles and, optionally, cap the turn rate
 * 4. Advance the position by direction * step * elapsed time
 * 5. Apply the bounds policy
 *
 * Each agent only touches its own slots, so the pass runs in parallel as
 * well.
 */

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use crate::agent_store::IntegrationView;
use crate::avoidance::{avoid_obstacles, Obstacle};
use crate::bounds::{Bounds, BoundsMode};
use crate::steering::{agent_rng, random_perturbation};

// Everything the integration pass needs besides the agents themselves
#[derive(Debug, Clone, Copy)]
pub struct IntegrationSettings<'a> {
    pub elapsed: f32,
    pub wander: f32,
    pub integrate_speed: bool,
    pub limit_rotation: bool,
    pub bounds: Bounds,
    pub bounds_mode: BoundsMode,
    pub obstacles: &'a [Obstacle],
    pub obstacle_margin: f32,
}

/// One agent's state going into the integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentMotion {
    pub position: Vec3,
    pub target: Vec3,
    pub previous_direction: Vec3,
    pub max_speed: f32,
    pub max_rotation_speed: f32,
}

/// Result of integrating one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovedAgent {
    pub position: Vec3,
    pub direction: Vec3,
    // Set only when speed integration is enabled
    pub speed: Option<f32>,
}

// Integrate a single agent given its wander sample
pub fn integrate_agent(motion: &AgentMotion, wander: Vec3, settings: &IntegrationSettings<'_>) -> MovedAgent {
    let raw_speed = motion.target.length();
    let mut direction = motion.target.normalize_or_zero();
    direction = (direction + wander).normalize_or_zero();

    if !settings.obstacles.is_empty() {
        direction = avoid_obstacles(motion.position, direction, settings.obstacles, settings.obstacle_margin);
    }

    if settings.limit_rotation {
        direction = limit_turn(
            motion.previous_direction,
            direction,
            motion.max_rotation_speed * settings.elapsed,
        );
    }

    let (step, speed) = if settings.integrate_speed {
        let speed = raw_speed.clamp(0.0, motion.max_speed);
        (speed, Some(speed))
    } else {
        (1.0, None)
    };

    let moved = motion.position + direction * step * settings.elapsed;
    MovedAgent {
        position: settings.bounds.apply(settings.bounds_mode, moved),
        direction,
        speed,
    }
}

/// Run the integration pass over every agent in `view`.
pub fn integrate_all(view: IntegrationView<'_>, tick_seed: u64, settings: &IntegrationSettings<'_>, parallel: bool) {
    let IntegrationView {
        positions,
        directions,
        previous_directions,
        speeds,
        max_speeds,
        max_rotation_speeds,
    } = view;

    let step = |(index, ((position, direction), speed)): (usize, ((&mut Vec3, &mut Vec3), &mut f32))| {
        let motion = AgentMotion {
            position: *position,
            target: *direction,
            previous_direction: previous_directions[index],
            max_speed: max_speeds[index],
            max_rotation_speed: max_rotation_speeds[index],
        };
        let mut rng = agent_rng(tick_seed, index);
        let wander = random_perturbation(&mut rng, settings.wander);
        let moved = integrate_agent(&motion, wander, settings);

        *position = moved.position;
        *direction = moved.direction;
        if let Some(new_speed) = moved.speed {
            *speed = new_speed;
        }
    };

    if parallel {
        positions
            .par_iter_mut()
            .zip(directions.par_iter_mut())
            .zip(speeds.par_iter_mut())
            .enumerate()
            .for_each(step);
    } else {
        positions
            .iter_mut()
            .zip(directions.iter_mut())
            .zip(speeds.iter_mut())
            .enumerate()
            .for_each(step);
    }
}

// Rotate `from` toward `to` by at most `max_angle` radians in the plane
fn limit_turn(from: Vec3, to: Vec3, max_angle: f32) -> Vec3 {
    let from_planar = from.truncate();
    let to_planar = to.truncate();
    if from_planar == Vec2::ZERO || to_planar == Vec2::ZERO {
        return to;
    }

    let angle = from_planar.perp_dot(to_planar).atan2(from_planar.dot(to_planar));
    if angle.abs() <= max_angle {
        return to;
    }

    let turned = Vec2::from_angle(max_angle.copysign(angle)).rotate(from_planar.normalize());
    turned.extend(0.0)
}
