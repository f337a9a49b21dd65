use std::collections::TryReserveError;

use thiserror::Error;

use crate::types::LevelIndex;

#[derive(Error, Debug)]
pub enum FractalError {
    #[error("invalid fractal config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("hierarchy is already allocated; release it before allocating again")]
    AlreadyAllocated,
    #[error("failed to allocate {parts} parts for level {level}: {source}")]
    Allocation {
        level: LevelIndex,
        parts: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("failed to build level update thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FractalError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
