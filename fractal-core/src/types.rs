use glam::Vec4;

/// Index of a part within its level.
///
/// Parts are stored level by level in flat arrays, so this is only
/// meaningful together with the level it was taken from.
pub type PartIndex = usize;

/// Depth of a level in the hierarchy; level `0` holds the single root.
pub type LevelIndex = usize;

/// Linear RGBA colour, components in `[0, 1]`.
pub type Color = Vec4;

/// Number of children every non-leaf part has.
pub const BRANCH_FACTOR: usize = 5;
