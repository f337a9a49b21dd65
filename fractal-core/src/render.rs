//! The boundary between the hierarchy and whatever draws it.
//!
//! The core never touches meshes, materials or GPU buffers. Each frame it
//! describes every level as a [`LevelDraw`] and hands it to an
//! [`InstanceSink`], which owns the actual resources.

use glam::{Vec3, Vec4};

use crate::{
    config::FractalConfig,
    part::InstanceTransform,
    store::Level,
    types::{Color, LevelIndex},
};

/// Which of the boundary's two meshes a level should be drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshSlot {
    Branch,
    Leaf,
}

/// Axis-aligned bounds handed to the draw call for culling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Bounds {
    /// Bounds of the whole fractal: a cube around the root.
    ///
    /// The root spans `[-0.5, 0.5]` scaled, and each level adds half as much
    /// reach as the one before, so `1.5 * scale` covers any depth.
    pub fn around_root(root_position: Vec3, object_scale: f32) -> Self {
        Self {
            center: root_position,
            half_extents: Vec3::splat(1.5 * object_scale),
        }
    }
}

/// Everything the boundary needs to issue one instanced draw.
#[derive(Clone, Copy, Debug)]
pub struct LevelDraw<'a> {
    pub level: LevelIndex,
    pub mesh: MeshSlot,
    pub color_a: Color,
    pub color_b: Color,
    pub sequence_numbers: Vec4,
    pub bounds: Bounds,
    /// Exactly `5^level` transforms.
    pub transforms: &'a [InstanceTransform],
}

impl LevelDraw<'_> {
    /// Per-instance colour variation driven by the level's sequence numbers.
    ///
    /// RGB is interpolated between `color_a` and `color_b` by
    /// `fract(index * seq.x + seq.y)`; alpha carries a second independent
    /// value `fract(index * seq.z + seq.w)` that renderers may use for
    /// smoothness or similar material parameters.
    pub fn instance_color(&self, index: usize) -> Color {
        let i = index as f32;
        let seq = self.sequence_numbers;
        let t = (i * seq.x + seq.y).fract();
        let mut color = self.color_a.lerp(self.color_b, t);
        color.w = (i * seq.z + seq.w).fract();
        color
    }
}

/// Receives the per-level output buffers once a frame's update is complete.
pub trait InstanceSink {
    fn draw_level(&mut self, draw: LevelDraw<'_>);
}

impl<S: InstanceSink + ?Sized> InstanceSink for &mut S {
    fn draw_level(&mut self, draw: LevelDraw<'_>) {
        (**self).draw_level(draw);
    }
}

/// Mesh and colour pair for `level` of a hierarchy with `depth` levels.
///
/// The deepest level is the leaf level. Every other level samples both
/// gradients at `level / (depth - 2)`, so the last branch level reads the
/// gradients' end colours.
pub fn level_appearance(
    config: &FractalConfig,
    level: LevelIndex,
    depth: usize,
) -> (MeshSlot, Color, Color) {
    if level + 1 == depth {
        (MeshSlot::Leaf, config.leaf_color_a, config.leaf_color_b)
    } else {
        let t = if depth > 2 {
            level as f32 / (depth as f32 - 2.0)
        } else {
            0.0
        };
        (
            MeshSlot::Branch,
            config.gradient_a.evaluate(t),
            config.gradient_b.evaluate(t),
        )
    }
}

/// Hands every level to `sink`, root first.
pub fn submit_levels(
    levels: &[Level],
    config: &FractalConfig,
    bounds: Bounds,
    sink: &mut impl InstanceSink,
) {
    let depth = levels.len();
    for (li, level) in levels.iter().enumerate() {
        let (mesh, color_a, color_b) = level_appearance(config, li, depth);
        sink.draw_level(LevelDraw {
            level: li,
            mesh,
            color_a,
            color_b,
            sequence_numbers: level.sequence_numbers(),
            bounds,
            transforms: level.transforms(),
        });
    }
}
