/*
 * Bounds Module
 *
 * The axis-aligned rectangle the flock lives in. It seeds spawn positions
 * and, depending on the BoundsMode, clamps or wraps agents during
 * integration.
 */

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};

/// What happens to an agent that moves past the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsMode {
    /// Agents may leave the rectangle.
    #[default]
    Free,
    /// Positions are clamped to the rectangle edges.
    Clamp,
    /// Agents leaving one edge re-enter at the opposite edge.
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::centered(crate::WORLD_SIZE, crate::WORLD_SIZE)
    }
}

impl Bounds {
    /// Build bounds from two corners, rejecting empty or inverted rectangles.
    pub fn new(min: Vec2, max: Vec2) -> Result<Self> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    // A rectangle of the given size centred on the origin
    pub fn centered(width: f32, height: f32) -> Self {
        let half = Vec2::new(width, height) * 0.5;
        Self {
            min: -half,
            max: half,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(FlockError::invalid("bounds corners must be finite"));
        }
        if self.min.x >= self.max.x || self.min.y >= self.max.y {
            return Err(FlockError::invalid(format!(
                "bounds min {} must be strictly below max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    // Planar containment test, z is ignored
    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
    }

    /// Uniformly sample a spawn position inside the rectangle (z = 0).
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let x = rng.gen_range(self.min.x..self.max.x);
        let y = rng.gen_range(self.min.y..self.max.y);
        Vec3::new(x, y, 0.0)
    }

    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(self.min.x, self.max.x),
            position.y.clamp(self.min.y, self.max.y),
            position.z,
        )
    }

    pub fn wrap(&self, position: Vec3) -> Vec3 {
        let size = self.size();
        let wrap_axis = |value: f32, min: f32, extent: f32| min + (value - min).rem_euclid(extent);
        Vec3::new(
            wrap_axis(position.x, self.min.x, size.x),
            wrap_axis(position.y, self.min.y, size.y),
            position.z,
        )
    }

    pub fn apply(&self, mode: BoundsMode, position: Vec3) -> Vec3 {
        match mode {
            BoundsMode::Free => position,
            BoundsMode::Clamp => self.clamp(position),
            BoundsMode::Wrap => self.wrap(position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn rejects_inverted_corners() {
        let result = Bounds::new(Vec2::new(5.0, 0.0), Vec2::new(-5.0, 10.0));
        assert!(matches!(result, Err(FlockError::InvalidConfiguration(_))));
    }

    #[test]
    fn random_positions_stay_inside() {
        let bounds = Bounds::new(Vec2::new(-3.0, 2.0), Vec2::new(4.0, 9.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = bounds.random_position(&mut rng);
            assert!(bounds.contains(p), "{p} escaped {bounds:?}");
            assert_eq!(p.z, 0.0);
        }
    }

    #[rstest]
    #[case(Vec3::new(11.0, 0.0, 0.0), Vec3::new(-9.0, 0.0, 0.0))]
    #[case(Vec3::new(-12.5, 3.0, 0.0), Vec3::new(7.5, 3.0, 0.0))]
    #[case(Vec3::new(2.0, -10.5, 0.0), Vec3::new(2.0, 9.5, 0.0))]
    fn wrap_reenters_on_opposite_edge(#[case] input: Vec3, #[case] expected: Vec3) {
        let bounds = Bounds::centered(20.0, 20.0);
        assert!(bounds.wrap(input).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn clamp_keeps_z() {
        let bounds = Bounds::centered(2.0, 2.0);
        let clamped = bounds.clamp(Vec3::new(5.0, -5.0, 0.5));
        assert_eq!(clamped, Vec3::new(1.0, -1.0, 0.5));
    }
}
