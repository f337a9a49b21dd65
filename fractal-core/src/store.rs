use glam::Vec4;
use log::{debug, info};
use rand::Rng;

use crate::{
    config::FractalConfig,
    error::FractalError,
    part::{InstanceTransform, PartRecord, branch_rotation},
    types::{BRANCH_FACTOR, LevelIndex, PartIndex},
};

/// Number of parts on `level`: `5^level`.
#[inline]
pub fn level_part_count(level: LevelIndex) -> usize {
    BRANCH_FACTOR.pow(level as u32)
}

/// Number of parts in a hierarchy of `depth` levels.
pub fn total_part_count(depth: usize) -> usize {
    (0..depth).map(level_part_count).sum()
}

/// Index of the parent (in the previous level) of the part at `index`.
#[inline]
pub fn parent_index(index: PartIndex) -> PartIndex {
    index / BRANCH_FACTOR
}

/// Uniform scale of `level` for a root object of scale `root_scale`.
#[inline]
pub fn level_scale(root_scale: f32, level: LevelIndex) -> f32 {
    // Halving is exact in binary floating point, so this equals repeated
    // `scale *= 0.5` bit for bit.
    root_scale * 0.5f32.powi(level as i32)
}

/// One depth level: parts and their output transforms, index-aligned.
///
/// Both buffers hold exactly `5^level` entries for the level's lifetime;
/// callers get slices, never the vectors.
#[derive(Debug)]
pub struct Level {
    parts: Vec<PartRecord>,
    transforms: Vec<InstanceTransform>,
    sequence_numbers: Vec4,
}

impl Level {
    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[inline]
    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    #[inline]
    pub fn parts_mut(&mut self) -> &mut [PartRecord] {
        &mut self.parts
    }

    #[inline]
    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    /// Split borrow of both buffers, for writing a part and its transform
    /// together.
    #[inline]
    pub fn parts_and_transforms_mut(&mut self) -> (&mut [PartRecord], &mut [InstanceTransform]) {
        (&mut self.parts, &mut self.transforms)
    }

    /// Four random values per level used by the renderer to vary colour
    /// across instances.
    #[inline]
    pub fn sequence_numbers(&self) -> Vec4 {
        self.sequence_numbers
    }

    /// The output transforms as raw bytes, ready for a GPU buffer upload.
    pub fn transform_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.transforms)
    }
}

/// Owns every level of the hierarchy.
///
/// A store is either released (no levels) or fully allocated for a given
/// depth. There is no resizing; a new depth needs [`HierarchyStore::release`]
/// followed by [`HierarchyStore::allocate`].
#[derive(Debug, Default)]
pub struct HierarchyStore {
    levels: Vec<Level>,
}

impl HierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates and populates all `config.depth` levels.
    ///
    /// For each part, in level order then index order, draws the maximum sag
    /// angle, then the spin speed, then the spin direction from `rng`. Local
    /// rotations come from the slot (`index % 5`), spin angles start at zero
    /// and world state starts at identity.
    ///
    /// ### Parameters
    /// - `config` - Only depth and the random ranges are read here; the
    ///   whole config is validated first.
    /// - `rng` - Source of the one-time per-part draws.
    ///
    /// ### Returns
    /// - `Err(FractalError::InvalidConfig)` if `config` fails validation;
    ///   the store is left untouched.
    /// - `Err(FractalError::AlreadyAllocated)` if the store holds levels.
    /// - `Err(FractalError::Allocation)` if a level cannot be reserved; the
    ///   store is left released.
    pub fn allocate(
        &mut self,
        config: &FractalConfig,
        rng: &mut impl Rng,
    ) -> Result<(), FractalError> {
        config.validate()?;
        if self.is_allocated() {
            return Err(FractalError::AlreadyAllocated);
        }

        let result = self.populate(config, rng);
        match &result {
            Ok(()) => info!(
                "allocated fractal hierarchy: depth {}, {} parts",
                self.depth(),
                self.part_count()
            ),
            Err(_) => self.levels = Vec::new(),
        }
        result
    }

    fn populate(&mut self, config: &FractalConfig, rng: &mut impl Rng) -> Result<(), FractalError> {
        self.levels
            .try_reserve_exact(config.depth)
            .map_err(|source| FractalError::Allocation {
                level: 0,
                parts: 0,
                source,
            })?;

        for level in 0..config.depth {
            let len = level_part_count(level);

            let mut parts = Vec::new();
            parts
                .try_reserve_exact(len)
                .map_err(|source| FractalError::Allocation {
                    level,
                    parts: len,
                    source,
                })?;
            let mut transforms = Vec::new();
            transforms
                .try_reserve_exact(len)
                .map_err(|source| FractalError::Allocation {
                    level,
                    parts: len,
                    source,
                })?;

            for index in 0..len {
                parts.push(create_part(index, config, rng));
                transforms.push(InstanceTransform::IDENTITY);
            }

            let sequence_numbers = Vec4::new(rng.random(), rng.random(), rng.random(), rng.random());
            self.levels.push(Level {
                parts,
                transforms,
                sequence_numbers,
            });
        }
        Ok(())
    }

    /// Frees every level. Safe to call on a released store.
    pub fn release(&mut self) {
        if self.is_allocated() {
            debug!(
                "released fractal hierarchy: depth {}, {} parts",
                self.depth(),
                self.part_count()
            );
        }
        self.levels = Vec::new();
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.levels.is_empty()
    }

    /// Number of levels, `0` when released.
    #[inline]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn part_count(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    pub fn level(&self, level: LevelIndex) -> Option<&Level> {
        self.levels.get(level)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn levels_mut(&mut self) -> &mut [Level] {
        &mut self.levels
    }

    pub fn root(&self) -> Option<&PartRecord> {
        self.levels.first().and_then(|l| l.parts.first())
    }
}

fn create_part(index: PartIndex, config: &FractalConfig, rng: &mut impl Rng) -> PartRecord {
    let max_sag_angle = config.sag_angle_range.sample_radians(rng);
    let speed = config.spin_speed_range.sample_radians(rng);
    let direction = if rng.random_bool(f64::from(config.reverse_spin_chance)) {
        -1.0
    } else {
        1.0
    };
    PartRecord::new(branch_rotation(index), max_sag_angle, direction * speed)
}
