use thiserror::Error;

use crate::board::{BoardError, Racer};
use crate::combos::EnumerateError;
use crate::resolve::ApplyError;

/// Failures surfaced by the calculation entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid board: {0}")]
    Board(#[from] BoardError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Enumerate(#[from] EnumerateError),
    #[error("remaining racer {racer} is not on the board")]
    UnknownRemaining { racer: Racer },
    #[error("exact and sampled tallies cannot be combined")]
    MixedCoverage,
    #[error("sampling needs at least one trial")]
    NoTrials,
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
