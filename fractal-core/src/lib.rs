//! Animated fractal tree hierarchy for GPU instanced drawing.
//!
//! Main components:
//! - [`part`] — per-part state, branch rotation table, instance transforms.
//! - [`store`] — level-by-level storage of parts and their transforms.
//! - [`kernel`] — the pure per-part update (spin, sag, placement).
//! - [`scheduler`] — parallel, level-ordered dispatch of the kernel.
//! - [`root`] — folds the host object's placement into the root part.
//! - [`render`] — the hand-off to whatever draws the instances.
//! - [`fractal`] — the component tying it together frame by frame.
//! - [`config`] / [`color`] — build-time configuration and colour gradients.
//! - [`error`] — the crate's error type.
//! - [`types`] — shared aliases and constants.

pub mod color;
pub mod config;
pub mod error;
pub mod fractal;
pub mod kernel;
pub mod part;
pub mod render;
pub mod root;
pub mod scheduler;
pub mod store;
pub mod types;

pub use config::FractalConfig;
pub use error::FractalError;
pub use fractal::Fractal;
pub use render::{InstanceSink, LevelDraw, MeshSlot};
pub use root::RootPlacement;
