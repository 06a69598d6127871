//! Board state: racers stacked on a linear track, plus spectator tiles.
//!
//! Stacks are stored per cell, bottom-to-top. A racer's `(cell, stack)` position
//! is always derived from the stacks, never stored next to them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Finish boundary of the standard track (cells 0..=16).
pub const DEFAULT_TRACK_LEN: u8 = 16;

/// Highest stack index a caller may place a racer at, plus one.
pub const MAX_STACK: u8 = Racer::COUNT as u8;

/// Racer identity. Declaration order is the canonical order used wherever
/// output must be deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Racer {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
}

impl Racer {
    pub const COUNT: usize = 5;
    pub const ALL: [Racer; Racer::COUNT] = [
        Racer::Red,
        Racer::Blue,
        Racer::Green,
        Racer::Yellow,
        Racer::Orange,
    ];

    /// Dense index 0..COUNT, usable for fixed-size tally arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Racer::Red => "red",
            Racer::Blue => "blue",
            Racer::Green => "green",
            Racer::Yellow => "yellow",
            Racer::Orange => "orange",
        }
    }
}

impl fmt::Display for Racer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown racer name: {0:?}")]
pub struct ParseRacerError(pub String);

impl FromStr for Racer {
    type Err = ParseRacerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Racer::ALL
            .into_iter()
            .find(|r| r.name() == lower)
            .ok_or_else(|| ParseRacerError(s.to_string()))
    }
}

/// Effect printed on a spectator tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spectator {
    /// Landing group moves one cell forward and goes on top.
    #[serde(alias = "oasis")]
    Advance,
    /// Landing group moves one cell back and goes underneath.
    #[serde(alias = "mirage")]
    Retreat,
}

impl fmt::Display for Spectator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spectator::Advance => f.write_str("advance"),
            Spectator::Retreat => f.write_str("retreat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown spectator effect: {0:?}")]
pub struct ParseSpectatorError(pub String);

impl FromStr for Spectator {
    type Err = ParseSpectatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advance" | "oasis" | "+1" => Ok(Spectator::Advance),
            "retreat" | "mirage" | "-1" => Ok(Spectator::Retreat),
            _ => Err(ParseSpectatorError(s.to_string())),
        }
    }
}

/// Derived `(cell, stack)` view of a racer. Stack index 0 is the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub cell: u8,
    pub stack: u8,
}

/// One racer's position, as supplied by callers and reported in records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub racer: Racer,
    pub cell: u8,
    pub stack: u8,
}

impl Placement {
    pub fn position(&self) -> Position {
        Position {
            cell: self.cell,
            stack: self.stack,
        }
    }
}

/// Rejections raised while building a board from caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("track length must be at least 2, got {track_len}")]
    TrackTooShort { track_len: u8 },
    #[error("racer {racer} is at cell {cell}, beyond the finish cell {finish}")]
    CellOutOfRange { racer: Racer, cell: u8, finish: u8 },
    #[error("racer {racer} has stack index {stack}, outside 0..=4")]
    StackOutOfRange { racer: Racer, stack: u8 },
    #[error("racer {racer} is placed more than once")]
    DuplicateRacer { racer: Racer },
    #[error("racers {first} and {second} both occupy cell {cell} stack {stack}")]
    DuplicatePosition {
        first: Racer,
        second: Racer,
        cell: u8,
        stack: u8,
    },
    #[error("stack at cell {cell} has a gap at index {missing}")]
    StackGap { cell: u8, missing: u8 },
    #[error("spectator tile at cell {cell} must be within 1..{finish}")]
    SpectatorOutOfRange { cell: u8, finish: u8 },
    #[error("cell {cell} has more than one spectator tile")]
    DuplicateSpectator { cell: u8 },
    #[error("spectator tile at cell {cell} shares the cell with racer {racer}")]
    SpectatorOnRacer { cell: u8, racer: Racer },
    #[error("spectator tiles at cells {low} and {high} are adjacent")]
    AdjacentSpectators { low: u8, high: u8 },
}

/// Immutable snapshot of the track. The resolver returns new values rather
/// than mutating a shared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    track_len: u8,
    /// `cells[c]` is the stack at cell `c`, bottom first. Length `track_len + 1`.
    cells: Vec<Vec<Racer>>,
    /// `spectators[c]` is the effect at cell `c`. Length `track_len + 1`.
    spectators: Vec<Option<Spectator>>,
}

impl BoardState {
    /// Build and validate a board.
    ///
    /// Every placement must sit on `0..=track_len` with a stack index below
    /// [`MAX_STACK`]; each cell's stack indices must be exactly `0..k`.
    /// Spectator tiles must lie on `1..track_len`, away from racers and from
    /// each other.
    pub fn new(
        track_len: u8,
        placements: &[Placement],
        spectators: &[(u8, Spectator)],
    ) -> Result<Self, BoardError> {
        if track_len < 2 {
            return Err(BoardError::TrackTooShort { track_len });
        }
        let n_cells = track_len as usize + 1;

        let mut slots: Vec<[Option<Racer>; MAX_STACK as usize]> =
            vec![[None; MAX_STACK as usize]; n_cells];
        let mut seen = [false; Racer::COUNT];

        for p in placements {
            if p.cell > track_len {
                return Err(BoardError::CellOutOfRange {
                    racer: p.racer,
                    cell: p.cell,
                    finish: track_len,
                });
            }
            if p.stack >= MAX_STACK {
                return Err(BoardError::StackOutOfRange {
                    racer: p.racer,
                    stack: p.stack,
                });
            }
            if std::mem::replace(&mut seen[p.racer.index()], true) {
                return Err(BoardError::DuplicateRacer { racer: p.racer });
            }
            let slot = &mut slots[p.cell as usize][p.stack as usize];
            if let Some(first) = *slot {
                return Err(BoardError::DuplicatePosition {
                    first,
                    second: p.racer,
                    cell: p.cell,
                    stack: p.stack,
                });
            }
            *slot = Some(p.racer);
        }

        let mut cells: Vec<Vec<Racer>> = Vec::with_capacity(n_cells);
        for (cell, column) in slots.iter().enumerate() {
            let height = column.iter().take_while(|s| s.is_some()).count();
            if column[height..].iter().any(Option::is_some) {
                return Err(BoardError::StackGap {
                    cell: cell as u8,
                    missing: height as u8,
                });
            }
            cells.push(column[..height].iter().flatten().copied().collect());
        }

        let mut tiles = vec![None; n_cells];
        for &(cell, effect) in spectators {
            if cell == 0 || cell >= track_len {
                return Err(BoardError::SpectatorOutOfRange {
                    cell,
                    finish: track_len,
                });
            }
            if tiles[cell as usize].is_some() {
                return Err(BoardError::DuplicateSpectator { cell });
            }
            if let Some(&racer) = cells[cell as usize].first() {
                return Err(BoardError::SpectatorOnRacer { cell, racer });
            }
            tiles[cell as usize] = Some(effect);
        }
        for low in 1..track_len as usize {
            if tiles[low].is_some() && tiles[low + 1].is_some() {
                return Err(BoardError::AdjacentSpectators {
                    low: low as u8,
                    high: low as u8 + 1,
                });
            }
        }

        Ok(Self {
            track_len,
            cells,
            spectators: tiles,
        })
    }

    /// Index of the finish cell (`N`).
    #[inline]
    pub fn track_len(&self) -> u8 {
        self.track_len
    }

    /// Racers at `cell`, bottom first. Empty for cells off the track.
    pub fn stack(&self, cell: u8) -> &[Racer] {
        self.cells
            .get(cell as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn spectator(&self, cell: u8) -> Option<Spectator> {
        self.spectators.get(cell as usize).copied().flatten()
    }

    /// Spectator tiles in cell order.
    pub fn spectators(&self) -> Vec<(u8, Spectator)> {
        self.spectators
            .iter()
            .enumerate()
            .filter_map(|(c, s)| s.map(|s| (c as u8, s)))
            .collect()
    }

    pub fn position(&self, racer: Racer) -> Option<Position> {
        self.cells.iter().enumerate().find_map(|(cell, stack)| {
            stack.iter().position(|&r| r == racer).map(|idx| Position {
                cell: cell as u8,
                stack: idx as u8,
            })
        })
    }

    pub fn contains(&self, racer: Racer) -> bool {
        self.cells.iter().any(|s| s.contains(&racer))
    }

    /// Placed racers in canonical order.
    pub fn racers(&self) -> Vec<Racer> {
        let mut out: Vec<Racer> = self.cells.iter().flatten().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn racer_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Every placed racer's position, in canonical racer order.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out: Vec<Placement> = self
            .cells
            .iter()
            .enumerate()
            .flat_map(|(cell, stack)| {
                stack.iter().enumerate().map(move |(idx, &racer)| Placement {
                    racer,
                    cell: cell as u8,
                    stack: idx as u8,
                })
            })
            .collect();
        out.sort_unstable_by_key(|p| p.racer);
        out
    }

    /// Cells from the finish back to the start, paired with their stacks.
    pub(crate) fn cells_descending(&self) -> impl Iterator<Item = &[Racer]> + '_ {
        self.cells.iter().rev().map(Vec::as_slice)
    }

    /// Detach `racer` and everything above it. Returns the source cell and the
    /// group, bottom first.
    pub(crate) fn lift(&mut self, racer: Racer) -> Option<(u8, Vec<Racer>)> {
        let pos = self.position(racer)?;
        let group = self.cells[pos.cell as usize].split_off(pos.stack as usize);
        Some((pos.cell, group))
    }

    pub(crate) fn drop_on_top(&mut self, cell: u8, group: Vec<Racer>) {
        self.cells[cell as usize].extend(group);
    }

    pub(crate) fn drop_underneath(&mut self, cell: u8, mut group: Vec<Racer>) {
        let stack = &mut self.cells[cell as usize];
        group.append(stack);
        *stack = group;
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (cell, stack) in self.cells.iter().enumerate() {
            let tile = self.spectators[cell];
            if stack.is_empty() && tile.is_none() {
                continue;
            }
            write!(f, "{cell:>2}:")?;
            if let Some(t) = tile {
                write!(f, " [{t}]")?;
            }
            for r in stack {
                write!(f, " {r}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
