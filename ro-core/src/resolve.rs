//! Move resolution: one racer's die roll applied to a board.
//!
//! A rolled racer always carries every racer stacked above it, from any cell
//! including the start. Destinations clamp to the finish cell before the
//! spectator tile at the landing cell is consulted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardState, Racer, Spectator};

/// Faces of the race die.
pub const DIE_FACES: [u8; 3] = [1, 2, 3];

/// One roll: `racer` moves `die` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub racer: Racer,
    pub die: u8,
}

impl Move {
    pub fn new(racer: Racer, die: u8) -> Self {
        Self { racer, die }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("racer {racer} is not on the board")]
    UnknownRacer { racer: Racer },
    #[error("die value {die} is not a face of the race die")]
    InvalidDie { die: u8 },
}

/// Where a moving group ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    pub cell: u8,
    pub underneath: bool,
}

/// Resolve the landing cell for a group leaving `from` with roll `die`.
pub fn landing(state: &BoardState, from: u8, die: u8) -> Landing {
    let finish = state.track_len();
    let raw = from.saturating_add(die).min(finish);
    match state.spectator(raw) {
        Some(Spectator::Advance) => Landing {
            cell: raw.saturating_add(1).min(finish),
            underneath: false,
        },
        Some(Spectator::Retreat) => Landing {
            cell: raw.saturating_sub(1),
            underneath: true,
        },
        None => Landing {
            cell: raw,
            underneath: false,
        },
    }
}

/// Apply `mv` to `state`, returning the resulting board. `state` is untouched.
pub fn apply(state: &BoardState, mv: Move) -> Result<BoardState, ApplyError> {
    let mut next = state.clone();
    apply_in_place(&mut next, mv)?;
    Ok(next)
}

/// Apply a whole roll sequence, each move seeing the board left by the last.
pub fn apply_all(state: &BoardState, moves: &[Move]) -> Result<BoardState, ApplyError> {
    let mut next = state.clone();
    for &mv in moves {
        apply_in_place(&mut next, mv)?;
    }
    Ok(next)
}

/// Mutating form for callers that own a private copy of the board.
pub(crate) fn apply_in_place(state: &mut BoardState, mv: Move) -> Result<(), ApplyError> {
    if !DIE_FACES.contains(&mv.die) {
        return Err(ApplyError::InvalidDie { die: mv.die });
    }
    let (from, group) = state
        .lift(mv.racer)
        .ok_or(ApplyError::UnknownRacer { racer: mv.racer })?;

    let to = landing(state, from, mv.die);
    if to.underneath {
        state.drop_underneath(to.cell, group);
    } else {
        state.drop_on_top(to.cell, group);
    }
    Ok(())
}
