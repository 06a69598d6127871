//! Sampled estimates: random roll orders and faces instead of enumeration.
//!
//! Only for callers that opt in explicitly. Results are tagged
//! [`Coverage::Sampled`] and their tallies refuse to merge with exact ones.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use crate::aggregate::{Coverage, ProbabilityTable, Tally, TallySource};
use crate::board::{BoardState, Racer};
use crate::rank::finish_order;
use crate::resolve::{apply_in_place, ApplyError, Move, DIE_FACES};

/// Draw one combination: a uniform shuffle of `remaining` and a uniform face per roll.
pub fn draw(rng: &mut ChaCha8Rng, remaining: &[Racer]) -> Vec<Move> {
    let mut order = remaining.to_vec();
    order.shuffle(rng);
    order
        .into_iter()
        .map(|racer| Move {
            racer,
            die: DIE_FACES[rng.gen_range(0..DIE_FACES.len())],
        })
        .collect()
}

/// Play out `trials` random combinations from a seeded stream.
pub fn sample(
    initial: &BoardState,
    remaining: &[Racer],
    trials: u64,
    seed: u64,
) -> Result<ProbabilityTable, ApplyError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tally = Tally::new(TallySource::Sampled, initial.racers());
    for _ in 0..trials {
        let mut board = initial.clone();
        for mv in draw(&mut rng, remaining) {
            apply_in_place(&mut board, mv)?;
        }
        tally.record(finish_order(&board));
    }
    Ok(tally.into_table(Coverage::Sampled { trials, seed }))
}
