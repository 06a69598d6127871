//! Calculation entry point: validate a request, pick exact or sampled mode,
//! and run the aggregation under the configured pool and time budget.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::aggregate::{
    aggregate, aggregate_par, aggregate_with_deadline, Coverage, ProbabilityTable,
};
use crate::board::{BoardState, Racer};
use crate::combos::{EnumerateError, Enumerator};
use crate::config::Config;
use crate::error::EngineError;
use crate::sample::sample;

/// Board plus the racers still owed a roll this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcRequest {
    pub board: BoardState,
    pub remaining: Vec<Racer>,
}

pub struct Calculator {
    config: Config,
}

impl Calculator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check the remaining set against the board and size the enumeration.
    ///
    /// Runs no simulation; every configuration error surfaces here.
    pub fn validate(&self, req: &CalcRequest) -> Result<Enumerator, EngineError> {
        check_remaining(req)?;
        Ok(Enumerator::new(
            &req.remaining,
            self.config.engine.max_exact_combinations,
        )?)
    }

    /// Run the calculation the config asks for.
    pub fn calculate(&self, req: &CalcRequest) -> Result<ProbabilityTable, EngineError> {
        if self.config.sampling.enabled {
            return self.sample(req);
        }
        self.exact(req)
    }

    /// Exact enumeration. A capacity error is returned rather than falling
    /// back to sampling.
    pub fn exact(&self, req: &CalcRequest) -> Result<ProbabilityTable, EngineError> {
        let enumerator = self.validate(req)?;
        let engine = &self.config.engine;
        let started = Instant::now();
        info!(
            remaining = enumerator.racers().len(),
            combinations = enumerator.total(),
            parallel = engine.parallel,
            "exact enumeration started"
        );

        let deadline = engine
            .time_budget_ms
            .map(|ms| started + Duration::from_millis(ms));
        let run = || match deadline {
            Some(d) => aggregate_with_deadline(&req.board, &enumerator, d, engine.parallel),
            None if engine.parallel => aggregate_par(&req.board, &enumerator),
            None => aggregate(&req.board, &enumerator),
        };
        let table = match engine.threads {
            Some(n) if engine.parallel => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()?
                .install(run)?,
            _ => run()?,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Coverage::Partial { processed, total } = table.coverage {
            warn!(processed, total, elapsed_ms, "time budget exhausted, report is partial");
        } else {
            info!(combinations = table.combinations, elapsed_ms, "exact enumeration finished");
        }
        Ok(table)
    }

    /// Sampled estimate using the configured trial count and seed.
    pub fn sample(&self, req: &CalcRequest) -> Result<ProbabilityTable, EngineError> {
        let s = &self.config.sampling;
        self.sample_with(req, s.trials, s.seed)
    }

    pub fn sample_with(
        &self,
        req: &CalcRequest,
        trials: u64,
        seed: u64,
    ) -> Result<ProbabilityTable, EngineError> {
        check_remaining(req)?;
        if trials == 0 {
            return Err(EngineError::NoTrials);
        }
        let started = Instant::now();
        let table = sample(&req.board, &req.remaining, trials, seed)?;
        info!(
            trials,
            seed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sampling finished"
        );
        Ok(table)
    }
}

fn check_remaining(req: &CalcRequest) -> Result<(), EngineError> {
    let mut seen = [false; Racer::COUNT];
    for &racer in &req.remaining {
        if !req.board.contains(racer) {
            return Err(EngineError::UnknownRemaining { racer });
        }
        if std::mem::replace(&mut seen[racer.index()], true) {
            return Err(EnumerateError::DuplicateRacer { racer }.into());
        }
    }
    Ok(())
}
