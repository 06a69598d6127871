//! Outcome aggregation: play every combination out and tally finishing orders.
//!
//! Counts are integers until the final conversion, so the resulting table does
//! not depend on the order in which combinations (or shards) were processed.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::board::{BoardState, Placement, Racer};
use crate::combos::Enumerator;
use crate::error::EngineError;
use crate::rank::{finish_order, FinishOrder};
use crate::resolve::{apply_all, apply_in_place, ApplyError, Move};

/// Combinations handed to one rayon task.
const SHARD_SIZE: u64 = 1024;
/// How often (in combinations) the deadline is polled. Divides `SHARD_SIZE`.
const DEADLINE_POLL: u64 = 256;

/// How much of the outcome space a table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Coverage {
    /// Every combination was played out.
    Exact,
    /// A deadline cut enumeration short; probabilities are approximate.
    Partial { processed: u64, total: u64 },
    /// Random trials instead of enumeration.
    Sampled { trials: u64, seed: u64 },
}

impl Coverage {
    pub fn is_exact(&self) -> bool {
        matches!(self, Coverage::Exact)
    }
}

/// Where a tally's samples came from. Tallies of different kinds never merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallySource {
    Enumerated,
    Sampled,
}

/// Raw outcome counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    source: TallySource,
    racers: Vec<Racer>,
    orders: BTreeMap<FinishOrder, u64>,
    /// `ranks[racer.index()][rank]`
    ranks: [[u64; Racer::COUNT]; Racer::COUNT],
    total: u64,
}

impl Tally {
    /// `racers` are the placed racers; they become the rows of the rank table.
    pub fn new(source: TallySource, mut racers: Vec<Racer>) -> Self {
        racers.sort_unstable();
        Self {
            source,
            racers,
            orders: BTreeMap::new(),
            ranks: [[0; Racer::COUNT]; Racer::COUNT],
            total: 0,
        }
    }

    pub fn source(&self) -> TallySource {
        self.source
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn record(&mut self, order: FinishOrder) {
        for (rank, racer) in order.racers().iter().enumerate() {
            self.ranks[racer.index()][rank] += 1;
        }
        *self.orders.entry(order).or_insert(0) += 1;
        self.total += 1;
    }

    /// Combine two tallies of the same kind.
    pub fn merge(self, other: Tally) -> Result<Tally, EngineError> {
        if self.source != other.source {
            return Err(EngineError::MixedCoverage);
        }
        Ok(self.absorb(other))
    }

    fn absorb(mut self, other: Tally) -> Tally {
        for (order, n) in other.orders {
            *self.orders.entry(order).or_insert(0) += n;
        }
        for (mine, theirs) in self.ranks.iter_mut().zip(other.ranks.iter()) {
            for (a, b) in mine.iter_mut().zip(theirs.iter()) {
                *a += b;
            }
        }
        self.total += other.total;
        self
    }

    pub fn into_table(self, coverage: Coverage) -> ProbabilityTable {
        let total = self.total;
        let pct = |n: u64| {
            if total == 0 {
                0.0
            } else {
                n as f64 * 100.0 / total as f64
            }
        };

        let mut orders: Vec<OrderProbability> = self
            .orders
            .into_iter()
            .map(|(order, count)| OrderProbability {
                order,
                count,
                percent: pct(count),
            })
            .collect();
        // BTreeMap order breaks ties; the sort is stable.
        orders.sort_by(|a, b| b.count.cmp(&a.count));

        let n = self.racers.len();
        let ranks = self
            .racers
            .iter()
            .map(|&racer| {
                let counts = self.ranks[racer.index()][..n].to_vec();
                let percent = counts.iter().map(|&c| pct(c)).collect();
                RankRow {
                    racer,
                    counts,
                    percent,
                }
            })
            .collect();

        ProbabilityTable {
            coverage,
            combinations: total,
            orders,
            ranks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderProbability {
    pub order: FinishOrder,
    pub count: u64,
    pub percent: f64,
}

/// One racer's chances of finishing at each rank (index 0 = first place).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankRow {
    pub racer: Racer,
    pub counts: Vec<u64>,
    pub percent: Vec<f64>,
}

/// Finishing-order and per-rank probabilities, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityTable {
    pub coverage: Coverage,
    /// Number of combinations (or trials) behind the counts.
    pub combinations: u64,
    /// Sorted by probability, most likely first.
    pub orders: Vec<OrderProbability>,
    /// One row per placed racer, canonical racer order.
    pub ranks: Vec<RankRow>,
}

impl ProbabilityTable {
    pub fn rank_percent(&self, racer: Racer, rank: usize) -> Option<f64> {
        self.ranks
            .iter()
            .find(|row| row.racer == racer)
            .and_then(|row| row.percent.get(rank).copied())
    }

    pub fn order_percent(&self, order: &FinishOrder) -> Option<f64> {
        self.orders
            .iter()
            .find(|o| &o.order == order)
            .map(|o| o.percent)
    }

    pub fn most_likely(&self) -> Option<&OrderProbability> {
        self.orders.first()
    }
}

/// Per-combination detail: the rolls, where everyone ended up, and the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinationRecord {
    pub index: u64,
    pub moves: Vec<Move>,
    pub finals: Vec<Placement>,
    pub order: FinishOrder,
}

/// Exact, single-threaded aggregation.
pub fn aggregate(
    initial: &BoardState,
    enumerator: &Enumerator,
) -> Result<ProbabilityTable, ApplyError> {
    run(initial, enumerator, None, false)
}

/// Exact aggregation over rayon; each task owns its tally until the reduce.
pub fn aggregate_par(
    initial: &BoardState,
    enumerator: &Enumerator,
) -> Result<ProbabilityTable, ApplyError> {
    run(initial, enumerator, None, true)
}

/// Aggregate until `deadline`. If the deadline cuts enumeration short the
/// table is tagged [`Coverage::Partial`].
pub fn aggregate_with_deadline(
    initial: &BoardState,
    enumerator: &Enumerator,
    deadline: Instant,
    parallel: bool,
) -> Result<ProbabilityTable, ApplyError> {
    run(initial, enumerator, Some(deadline), parallel)
}

/// Lazily play out every combination and report the details.
pub fn records<'a>(
    initial: &'a BoardState,
    enumerator: &'a Enumerator,
) -> impl Iterator<Item = Result<CombinationRecord, ApplyError>> + 'a {
    (0..enumerator.total()).map(move |index| {
        let moves = enumerator.get(index);
        let board = apply_all(initial, &moves)?;
        Ok(CombinationRecord {
            index,
            finals: board.placements(),
            order: finish_order(&board),
            moves,
        })
    })
}

fn run(
    initial: &BoardState,
    enumerator: &Enumerator,
    deadline: Option<Instant>,
    parallel: bool,
) -> Result<ProbabilityTable, ApplyError> {
    let total = enumerator.total();
    let tally = if parallel {
        let shards = total.div_ceil(SHARD_SIZE);
        debug!(total, shards, "aggregating in parallel");
        (0..shards)
            .into_par_iter()
            .map(|s| {
                let start = s * SHARD_SIZE;
                let end = (start + SHARD_SIZE).min(total);
                tally_range(initial, enumerator, start..end, deadline)
            })
            .try_reduce(
                || Tally::new(TallySource::Enumerated, initial.racers()),
                |a, b| Ok(a.absorb(b)),
            )?
    } else {
        debug!(total, "aggregating sequentially");
        tally_range(initial, enumerator, 0..total, deadline)?
    };

    let processed = tally.total();
    let coverage = if processed == total {
        Coverage::Exact
    } else {
        Coverage::Partial { processed, total }
    };
    Ok(tally.into_table(coverage))
}

fn tally_range(
    initial: &BoardState,
    enumerator: &Enumerator,
    range: Range<u64>,
    deadline: Option<Instant>,
) -> Result<Tally, ApplyError> {
    let mut tally = Tally::new(TallySource::Enumerated, initial.racers());
    for index in range {
        if let Some(deadline) = deadline {
            if index % DEADLINE_POLL == 0 && Instant::now() >= deadline {
                break;
            }
        }
        let mut board = initial.clone();
        for mv in enumerator.get(index) {
            apply_in_place(&mut board, mv)?;
        }
        tally.record(finish_order(&board));
    }
    Ok(tally)
}
