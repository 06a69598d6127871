//! Finishing order derived from final stacks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{BoardState, Racer};

/// Total ranking of the placed racers, leader first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinishOrder(Vec<Racer>);

impl FinishOrder {
    pub fn new(racers: Vec<Racer>) -> Self {
        Self(racers)
    }

    pub fn racers(&self) -> &[Racer] {
        &self.0
    }

    pub fn leader(&self) -> Option<Racer> {
        self.0.first().copied()
    }

    /// Zero-based rank of `racer`.
    pub fn rank_of(&self, racer: Racer) -> Option<usize> {
        self.0.iter().position(|&r| r == racer)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FinishOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

/// Rank racers: farther cell first, then higher in the stack first.
///
/// No two racers share a `(cell, stack)` pair, so the order is always total.
pub fn finish_order(state: &BoardState) -> FinishOrder {
    let mut out = Vec::with_capacity(state.racer_count());
    for stack in state.cells_descending() {
        out.extend(stack.iter().rev().copied());
    }
    FinishOrder(out)
}

/// English ordinal label for a one-based rank ("1st", "2nd", ...).
pub fn ordinal(rank: usize) -> String {
    let suffix = match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{rank}{suffix}")
}
