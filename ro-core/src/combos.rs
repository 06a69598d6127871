//! Exact enumeration of roll-order × die-face combinations.
//!
//! For `k` remaining racers there are `k! · 3^k` equally likely combinations.
//! Index `i` decodes as `(perm, faces) = (i / 3^k, i % 3^k)`: permutations in
//! lexicographic order over the canonically sorted racers, faces as base-3
//! digits with the last roll varying fastest. Random access by index lets
//! workers split the range without sharing an iterator.

use thiserror::Error;

use crate::board::Racer;
use crate::resolve::{Move, DIE_FACES};

/// One full assignment of roll order and die faces, in rolling order.
pub type Combination = Vec<Move>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnumerateError {
    #[error("racer {racer} is listed twice in the remaining set")]
    DuplicateRacer { racer: Racer },
    #[error("{remaining} remaining racers exceed the exact enumeration limit of {limit} combinations")]
    Capacity { remaining: usize, limit: u64 },
}

/// `k! · 3^k`, or `None` on overflow.
pub fn combination_count(k: usize) -> Option<u64> {
    let faces = DIE_FACES.len() as u64;
    let mut total: u64 = 1;
    for i in 1..=k as u64 {
        total = total.checked_mul(i)?.checked_mul(faces)?;
    }
    Some(total)
}

/// Enumerator over every combination for a fixed remaining set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    racers: Vec<Racer>,
    faces_total: u64,
    total: u64,
}

impl Enumerator {
    /// `limit` caps the number of combinations; callers wanting more must
    /// switch to sampling explicitly.
    pub fn new(remaining: &[Racer], limit: u64) -> Result<Self, EnumerateError> {
        let mut racers = remaining.to_vec();
        racers.sort_unstable();
        if let Some(w) = racers.windows(2).find(|w| w[0] == w[1]) {
            return Err(EnumerateError::DuplicateRacer { racer: w[0] });
        }

        let k = racers.len();
        let total = match combination_count(k) {
            Some(total) if total <= limit => total,
            _ => {
                return Err(EnumerateError::Capacity {
                    remaining: k,
                    limit,
                })
            }
        };
        let faces_total = (DIE_FACES.len() as u64).pow(k as u32);

        Ok(Self {
            racers,
            faces_total,
            total,
        })
    }

    /// Remaining racers in canonical order.
    pub fn racers(&self) -> &[Racer] {
        &self.racers
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Decode combination `index`. Panics if `index >= total()`.
    pub fn get(&self, index: u64) -> Combination {
        assert!(
            index < self.total,
            "combination index {index} out of range (total {})",
            self.total
        );
        let k = self.racers.len();
        let mut perm_rank = index / self.faces_total;
        let mut face_code = index % self.faces_total;

        let mut pool = self.racers.clone();
        let mut order = Vec::with_capacity(k);
        for i in 0..k {
            let block = factorial((k - 1 - i) as u64);
            let pick = (perm_rank / block) as usize;
            perm_rank %= block;
            order.push(pool.remove(pick));
        }

        let faces = DIE_FACES.len() as u64;
        let mut dice = vec![0u8; k];
        for d in dice.iter_mut().rev() {
            *d = DIE_FACES[(face_code % faces) as usize];
            face_code /= faces;
        }

        order
            .into_iter()
            .zip(dice)
            .map(|(racer, die)| Move { racer, die })
            .collect()
    }

    /// Lazy iterator over all combinations, in index order.
    pub fn iter(&self) -> Combinations<'_> {
        Combinations {
            enumerator: self,
            next: 0,
            end: self.total,
        }
    }
}

impl<'a> IntoIterator for &'a Enumerator {
    type Item = Combination;
    type IntoIter = Combinations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Combinations<'a> {
    enumerator: &'a Enumerator,
    next: u64,
    end: u64,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let c = self.enumerator.get(self.next);
        self.next += 1;
        Some(c)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.end - self.next) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

fn factorial(n: u64) -> u64 {
    (1..=n).product()
}
