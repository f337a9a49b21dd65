use glam::Vec3;
use log::{debug, trace};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::FractalConfig,
    error::FractalError,
    render::{Bounds, InstanceSink, submit_levels},
    root::{RootPlacement, drive_root},
    scheduler::LevelScheduler,
    store::HierarchyStore,
};

/// An animated fractal tree: configuration, storage and per-frame driver.
///
/// A frame is [`Fractal::update`] followed by [`Fractal::render`]. Until
/// the first update after a (re)build the buffers hold no frame, and
/// `render` submits nothing.
pub struct Fractal {
    config: FractalConfig,
    store: HierarchyStore,
    scheduler: LevelScheduler,
    root_position: Vec3,
    object_scale: f32,
    frame_ready: bool,
}

impl Fractal {
    /// Validates `config`, builds the worker pool and allocates the hierarchy.
    pub fn new(config: FractalConfig) -> Result<Self, FractalError> {
        config.validate()?;
        let scheduler = LevelScheduler::new(config.worker_threads, config.parallel_threshold)?;
        let mut fractal = Self {
            config,
            store: HierarchyStore::new(),
            scheduler,
            root_position: Vec3::ZERO,
            object_scale: 1.0,
            frame_ready: false,
        };
        fractal.build()?;
        Ok(fractal)
    }

    fn build(&mut self) -> Result<(), FractalError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.frame_ready = false;
        self.store.allocate(&self.config, &mut rng)
    }

    /// Tears the hierarchy down and rebuilds it from `config`.
    ///
    /// An invalid `config` is rejected before anything is released. The
    /// worker pool is rebuilt only if its size changed.
    pub fn reconfigure(&mut self, config: FractalConfig) -> Result<(), FractalError> {
        config.validate()?;
        if config.worker_threads != self.config.worker_threads
            || config.parallel_threshold != self.config.parallel_threshold
        {
            self.scheduler =
                LevelScheduler::new(config.worker_threads, config.parallel_threshold)?;
        }
        debug!(
            "rebuilding fractal: depth {} -> {}",
            self.config.depth, config.depth
        );
        self.store.release();
        self.config = config;
        self.build()
    }

    /// Frees the hierarchy. [`Fractal::update`] and [`Fractal::render`]
    /// become no-ops until [`Fractal::reconfigure`] is called.
    pub fn release(&mut self) {
        self.store.release();
        self.frame_ready = false;
    }

    /// Runs one full update chain: root, then every level in order.
    ///
    /// ### Parameters
    /// - `dt` - Elapsed time since the previous frame, seconds.
    /// - `placement` - World placement of the hosting object.
    pub fn update(&mut self, dt: f32, placement: &RootPlacement) {
        let Some(root_level) = self.store.levels_mut().first_mut() else {
            return;
        };
        let (parts, transforms) = root_level.parts_and_transforms_mut();
        transforms[0] = drive_root(&mut parts[0], placement, dt);

        let object_scale = placement.object_scale();
        self.scheduler
            .update_levels(self.store.levels_mut(), dt, object_scale);

        self.root_position = placement.position;
        self.object_scale = object_scale;
        self.frame_ready = true;
        trace!("fractal frame complete: dt {dt}");
    }

    /// Hands the last completed frame to `sink`, one call per level.
    ///
    /// ### Returns
    /// `false` if no frame has completed since the last (re)build.
    pub fn render(&self, sink: &mut impl InstanceSink) -> bool {
        if !self.frame_ready {
            return false;
        }
        submit_levels(self.store.levels(), &self.config, self.bounds(), sink);
        true
    }

    /// Convenience for `update` followed by `render`.
    pub fn frame(&mut self, dt: f32, placement: &RootPlacement, sink: &mut impl InstanceSink) {
        self.update(dt, placement);
        self.render(sink);
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::around_root(self.root_position, self.object_scale)
    }

    pub fn config(&self) -> &FractalConfig {
        &self.config
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub fn is_frame_ready(&self) -> bool {
        self.frame_ready
    }
}
