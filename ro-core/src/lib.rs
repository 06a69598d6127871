//! ro-core: board state, move resolution, combination enumeration and
//! outcome aggregation for the leg-odds calculator.
//!
//! Data flow: a [`BoardState`] and the racers still owed a roll go to the
//! [`Enumerator`]; each combination is played out with [`resolve::apply`],
//! ranked with [`finish_order`], and tallied into a [`ProbabilityTable`].

pub mod aggregate;
pub mod board;
pub mod calc;
pub mod combos;
pub mod config;
pub mod error;
pub mod rank;
pub mod resolve;
pub mod sample;
pub mod scenario;

pub use aggregate::{
    aggregate, aggregate_par, aggregate_with_deadline, records, CombinationRecord, Coverage,
    OrderProbability, ProbabilityTable, RankRow, Tally, TallySource,
};
pub use board::{
    BoardError, BoardState, Placement, Position, Racer, Spectator, DEFAULT_TRACK_LEN, MAX_STACK,
};
pub use calc::{CalcRequest, Calculator};
pub use combos::{combination_count, Combination, Combinations, EnumerateError, Enumerator};
pub use config::{Config, ConfigError};
pub use error::EngineError;
pub use rank::{finish_order, ordinal, FinishOrder};
pub use resolve::{apply, apply_all, landing, ApplyError, Landing, Move, DIE_FACES};
pub use scenario::{Scenario, SpectatorPlacement};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod aggregate_tests;
#[cfg(test)]
mod resolve_tests;
