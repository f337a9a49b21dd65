//! Level-by-level dispatch of [`update_part`] across the hierarchy.
//!
//! Inside a level, the parts are split into chunks of five siblings, one
//! chunk per parent, and the chunks run on a rayon pool. A level's parallel
//! iterator has joined before the next level is touched, so every read of a
//! parent sees that parent's final state for the frame.

use log::trace;
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

use crate::{
    error::FractalError,
    kernel::update_part,
    part::{InstanceTransform, PartRecord},
    store::{Level, level_scale},
    types::BRANCH_FACTOR,
};

/// Drives the level update kernel over levels `1..depth`.
pub struct LevelScheduler {
    pool: ThreadPool,
    parallel_threshold: usize,
}

impl LevelScheduler {
    /// Builds the worker pool.
    ///
    /// ### Parameters
    /// - `worker_threads` - Pool size; `0` lets rayon pick (one per core).
    /// - `parallel_threshold` - Levels with fewer parts than this are
    ///   updated on the calling thread.
    pub fn new(worker_threads: usize, parallel_threshold: usize) -> Result<Self, FractalError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("fractal-level-{i}"))
            .build()?;
        Ok(Self {
            pool,
            parallel_threshold,
        })
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Updates every non-root level, root to leaf.
    ///
    /// The root level must already hold this frame's state (see
    /// [`crate::root::drive_root`]). Returns once every level is written.
    ///
    /// ### Parameters
    /// - `levels` - All levels of the hierarchy, root first.
    /// - `dt` - Elapsed time since the previous frame, seconds.
    /// - `root_scale` - Scale of level 0; each further level halves it.
    pub fn update_levels(&self, levels: &mut [Level], dt: f32, root_scale: f32) {
        for li in 1..levels.len() {
            let scale = level_scale(root_scale, li);
            let (done, rest) = levels.split_at_mut(li);
            let parents = done[li - 1].parts();
            let level = &mut rest[0];

            if level.len() < self.parallel_threshold {
                update_level_serial(parents, level, dt, scale);
            } else {
                self.pool
                    .install(|| update_level_parallel(parents, level, dt, scale));
            }
            trace!("updated level {li}: {} parts at scale {scale}", level.len());
        }
    }
}

fn update_siblings(
    parent: &PartRecord,
    parts: &mut [PartRecord],
    transforms: &mut [InstanceTransform],
    dt: f32,
    scale: f32,
) {
    for (part, transform) in parts.iter_mut().zip(transforms.iter_mut()) {
        *transform = update_part(parent, part, dt, scale);
    }
}

fn update_level_serial(parents: &[PartRecord], level: &mut Level, dt: f32, scale: f32) {
    let (parts, transforms) = level.parts_and_transforms_mut();
    parts
        .chunks_mut(BRANCH_FACTOR)
        .zip(transforms.chunks_mut(BRANCH_FACTOR))
        .zip(parents)
        .for_each(|((parts, transforms), parent)| {
            update_siblings(parent, parts, transforms, dt, scale)
        });
}

fn update_level_parallel(parents: &[PartRecord], level: &mut Level, dt: f32, scale: f32) {
    let (parts, transforms) = level.parts_and_transforms_mut();
    parts
        .par_chunks_mut(BRANCH_FACTOR)
        .zip(transforms.par_chunks_mut(BRANCH_FACTOR))
        .zip(parents.par_iter())
        .for_each(|((parts, transforms), parent)| {
            update_siblings(parent, parts, transforms, dt, scale)
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::FractalConfig,
        root::{RootPlacement, drive_root},
        store::{HierarchyStore, level_part_count, parent_index},
    };
    use glam::{Quat, Vec3};
    use rand::{SeedableRng, rngs::StdRng};

    fn store(depth: usize, seed: u64) -> HierarchyStore {
        let cfg = FractalConfig {
            depth,
            ..FractalConfig::default()
        };
        let mut store = HierarchyStore::new();
        store
            .allocate(&cfg, &mut StdRng::seed_from_u64(seed))
            .unwrap();
        store
    }

    fn step(scheduler: &LevelScheduler, store: &mut HierarchyStore, dt: f32) {
        let placement = RootPlacement {
            position: Vec3::new(0.5, 0.0, -1.0),
            rotation: Quat::from_rotation_x(0.2),
            scale: Vec3::splat(1.5),
        };
        let (parts, transforms) = store.levels_mut()[0].parts_and_transforms_mut();
        transforms[0] = drive_root(&mut parts[0], &placement, dt);
        scheduler.update_levels(store.levels_mut(), dt, placement.object_scale());
    }

    #[test]
    fn parallel_and_serial_dispatch_agree_bit_for_bit() {
        let parallel = LevelScheduler::new(4, 0).unwrap();
        let serial = LevelScheduler::new(1, usize::MAX).unwrap();

        let mut a = store(6, 11);
        let mut b = store(6, 11);
        for dt in [0.016, 0.020, 0.012, 0.033] {
            step(&parallel, &mut a, dt);
            step(&serial, &mut b, dt);
        }

        for (la, lb) in a.levels().iter().zip(b.levels()) {
            assert_eq!(la.parts(), lb.parts());
            assert_eq!(la.transforms(), lb.transforms());
        }
    }

    #[test]
    fn children_sit_at_offset_from_their_parents() {
        let scheduler = LevelScheduler::new(2, 0).unwrap();
        let mut s = store(5, 3);
        step(&scheduler, &mut s, 0.05);

        for li in 1..s.depth() {
            let scale = level_scale(1.5, li);
            let parents = s.levels()[li - 1].parts();
            for (i, part) in s.levels()[li].parts().iter().enumerate() {
                let parent = &parents[parent_index(i)];
                let d = (part.world_position - parent.world_position).length();
                assert!((d - 1.5 * scale).abs() < 1e-5, "level {li} part {i}: {d}");
            }
        }
    }

    #[test]
    fn transforms_mirror_part_state() {
        let scheduler = LevelScheduler::new(0, 25).unwrap();
        let mut s = store(4, 8);
        step(&scheduler, &mut s, 0.1);

        for level in s.levels() {
            for (part, t) in level.parts().iter().zip(level.transforms()) {
                assert_eq!(t.translation(), part.world_position);
            }
        }
    }

    #[test]
    fn every_transform_is_rewritten_each_frame() {
        let scheduler = LevelScheduler::new(2, 0).unwrap();
        let mut s = store(5, 21);
        let stale = InstanceTransform::from_rotation_translation_scale(
            Quat::IDENTITY,
            Vec3::splat(1.0e6),
            1.0,
        );
        for level in s.levels_mut() {
            level.parts_and_transforms_mut().1.fill(stale);
        }

        step(&scheduler, &mut s, 0.04);

        for (li, level) in s.levels().iter().enumerate() {
            assert_eq!(level.len(), level_part_count(li));
            assert_eq!(level.transforms().len(), level_part_count(li));
            for (i, (part, t)) in level.parts().iter().zip(level.transforms()).enumerate() {
                assert_ne!(*t, stale, "level {li} part {i} was skipped");
                assert_eq!(t.translation(), part.world_position);
            }
        }
    }

    #[test]
    fn leaf_transforms_carry_the_level_scale() {
        let scheduler = LevelScheduler::new(1, usize::MAX).unwrap();
        let mut s = store(6, 13);
        step(&scheduler, &mut s, 0.02);

        let leaf = s.depth() - 1;
        let expected = level_scale(1.5, leaf);
        for t in s.levels()[leaf].transforms() {
            let basis = t.to_affine().matrix3;
            assert!((basis.y_axis.length() - expected).abs() < 1e-7);
        }
    }

    #[test]
    fn worker_threads_are_honoured() {
        let scheduler = LevelScheduler::new(3, 10).unwrap();
        assert_eq!(scheduler.worker_threads(), 3);
        assert_eq!(scheduler.parallel_threshold(), 10);
    }
}
