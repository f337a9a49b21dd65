use glam::Vec4;
use rand::Rng;

use crate::{color::Gradient, error::FractalError, types::Color};

/// Shallowest supported hierarchy (root, one branch level, one leaf level).
pub const MIN_DEPTH: usize = 3;
/// Deepest supported hierarchy; level 7 alone holds 78 125 parts.
pub const MAX_DEPTH: usize = 8;
/// Upper bound for both sag angles (degrees) and spin speeds (degrees/s).
pub const MAX_ANGLE_DEGREES: f32 = 90.0;

/// An inclusive `[min, max]` range of angles, expressed in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws one angle uniformly from the range and returns it in radians.
    pub fn sample_radians(&self, rng: &mut impl Rng) -> f32 {
        rng.random_range(self.min..=self.max).to_radians()
    }

    fn validate(&self, field: &'static str) -> Result<(), FractalError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(FractalError::invalid(field, "bounds must be finite"));
        }
        if self.min < 0.0 || self.max > MAX_ANGLE_DEGREES {
            return Err(FractalError::invalid(
                field,
                format!(
                    "[{}, {}] lies outside [0, {MAX_ANGLE_DEGREES}]",
                    self.min, self.max
                ),
            ));
        }
        if self.min > self.max {
            return Err(FractalError::invalid(
                field,
                format!("min {} is greater than max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Everything needed to (re)build a fractal hierarchy.
///
/// Any change to these values requires a full rebuild; see
/// [`crate::fractal::Fractal::reconfigure`].
///
/// ### Fields
/// - `depth` - Number of levels, in `[MIN_DEPTH, MAX_DEPTH]`.
/// - `sag_angle_range` - Per-part maximum sag, degrees.
/// - `spin_speed_range` - Per-part spin speed magnitude, degrees per second.
/// - `reverse_spin_chance` - Probability in `[0, 1]` that a part spins backwards.
/// - `seed` - Seed for the one-time per-part random draws.
/// - `worker_threads` - Size of the level update pool, `0` for rayon's default.
/// - `parallel_threshold` - Levels with fewer parts than this update serially.
/// - `gradient_a` / `gradient_b` - Colour pair source for branch levels.
/// - `leaf_color_a` / `leaf_color_b` - Colour pair for the leaf level.
#[derive(Clone, Debug)]
pub struct FractalConfig {
    pub depth: usize,
    pub sag_angle_range: AngleRange,
    pub spin_speed_range: AngleRange,
    pub reverse_spin_chance: f32,
    pub seed: u64,
    pub worker_threads: usize,
    pub parallel_threshold: usize,
    pub gradient_a: Gradient,
    pub gradient_b: Gradient,
    pub leaf_color_a: Color,
    pub leaf_color_b: Color,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            sag_angle_range: AngleRange::new(15.0, 25.0),
            spin_speed_range: AngleRange::new(20.0, 25.0),
            reverse_spin_chance: 0.25,
            seed: 0x5eed_f4ac_7a1e,
            worker_threads: 0,
            parallel_threshold: 125,
            gradient_a: Gradient::linear(
                Vec4::new(0.35, 0.22, 0.12, 1.0),
                Vec4::new(0.55, 0.45, 0.25, 1.0),
            ),
            gradient_b: Gradient::linear(
                Vec4::new(0.25, 0.15, 0.08, 1.0),
                Vec4::new(0.45, 0.50, 0.22, 1.0),
            ),
            leaf_color_a: Vec4::new(0.35, 0.75, 0.20, 1.0),
            leaf_color_b: Vec4::new(0.60, 0.85, 0.25, 1.0),
        }
    }
}

impl FractalConfig {
    /// Checks that every value is inside its supported range.
    ///
    /// ### Returns
    /// - `Ok(())` if the config can be used to allocate a hierarchy.
    /// - `Err(FractalError::InvalidConfig)` naming the first offending field.
    pub fn validate(&self) -> Result<(), FractalError> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.depth) {
            return Err(FractalError::invalid(
                "depth",
                format!("{} is outside [{MIN_DEPTH}, {MAX_DEPTH}]", self.depth),
            ));
        }
        self.sag_angle_range.validate("sag_angle_range")?;
        self.spin_speed_range.validate("spin_speed_range")?;
        if !(0.0..=1.0).contains(&self.reverse_spin_chance) {
            return Err(FractalError::invalid(
                "reverse_spin_chance",
                format!("{} is outside [0, 1]", self.reverse_spin_chance),
            ));
        }
        Ok(())
    }
}
