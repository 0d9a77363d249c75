//! Elo estimation with Monte Carlo folds
//!
//! Sequential Elo depends on game order, so the outcomes of each bucket are
//! replayed under many random orderings. Ratings start from scratch in every
//! fold; the spread across folds is reported next to the mean.

use std::collections::BTreeMap;
use std::fmt;

use chess_core::ResourceBudget;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Serialize, Serializer};

use crate::game::GameRecord;
use crate::stats;

/// Starting rating in every fold.
pub const INITIAL_ELO: f64 = 1000.0;

/// K-factor for Elo updates (higher = more volatile)
pub const K_FACTOR: f64 = 32.0;

pub const DEFAULT_FOLDS: usize = 10;

/// One budget level, or every budget together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Budget(ResourceBudget),
    All,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Budget(b) => write!(f, "{b}"),
            Bucket::All => f.write_str("all"),
        }
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of one finished game from `a`'s side.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub a: String,
    pub b: String,
    /// 1, 0.5 or 0; `b` scored the rest.
    pub score_a: f64,
    pub budget: ResourceBudget,
}

impl Outcome {
    /// White's view of a game; None when it was aborted.
    pub fn from_record(record: &GameRecord) -> Option<Self> {
        Some(Self {
            a: record.white.clone(),
            b: record.black.clone(),
            score_a: record.result.white_score()?,
            budget: record.budget,
        })
    }
}

pub fn outcomes(records: &[GameRecord]) -> Vec<Outcome> {
    records.iter().filter_map(Outcome::from_record).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub initial: f64,
    pub k: f64,
    pub folds: usize,
    pub seed: u64,
    /// Off replays every bucket in input order, once per fold.
    pub shuffle: bool,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            initial: INITIAL_ELO,
            k: K_FACTOR,
            folds: DEFAULT_FOLDS,
            seed: 0,
            shuffle: true,
        }
    }
}

/// Calculate expected score for a player rated `ra` against `rb`
pub fn expected_score(ra: f64, rb: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((rb - ra) / 400.0))
}

/// Both new ratings after one game, computed from the old ones.
pub fn update_pair(ra: f64, rb: f64, score_a: f64, k: f64) -> (f64, f64) {
    let ea = expected_score(ra, rb);
    let eb = expected_score(rb, ra);
    (ra + k * (score_a - ea), rb + k * ((1.0 - score_a) - eb))
}

/// Ratings after playing `outcomes` in order from `initial`.
pub fn replay<'a>(
    outcomes: impl IntoIterator<Item = &'a Outcome>,
    initial: f64,
    k: f64,
) -> BTreeMap<String, f64> {
    let mut ratings: BTreeMap<String, f64> = BTreeMap::new();
    for o in outcomes {
        let ra = *ratings.entry(o.a.clone()).or_insert(initial);
        let rb = *ratings.entry(o.b.clone()).or_insert(initial);
        let (na, nb) = update_pair(ra, rb, o.score_a, k);
        ratings.insert(o.a.clone(), na);
        ratings.insert(o.b.clone(), nb);
    }
    ratings
}

/// Groups outcomes per budget, plus everything under [`Bucket::All`].
pub fn bucket_outcomes(outcomes: &[Outcome]) -> BTreeMap<Bucket, Vec<&Outcome>> {
    let mut buckets: BTreeMap<Bucket, Vec<&Outcome>> = BTreeMap::new();
    for o in outcomes {
        buckets.entry(Bucket::Budget(o.budget)).or_default().push(o);
        buckets.entry(Bucket::All).or_default().push(o);
    }
    buckets
}

/// One competitor's rating spread in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EloSummary {
    pub bucket: Bucket,
    pub competitor: String,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub folds: usize,
}

/// Runs every fold over every bucket and summarises the final ratings.
///
/// Rows are ordered by bucket, then by mean rating, best first.
pub fn estimate(outcomes: &[Outcome], cfg: &EloConfig) -> Vec<EloSummary> {
    let mut buckets = bucket_outcomes(outcomes);
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut samples: BTreeMap<(Bucket, String), Vec<f64>> = BTreeMap::new();

    for _ in 0..cfg.folds.max(1) {
        for (bucket, list) in buckets.iter_mut() {
            if cfg.shuffle {
                list.shuffle(&mut rng);
            }
            for (name, rating) in replay(list.iter().copied(), cfg.initial, cfg.k) {
                samples.entry((*bucket, name)).or_default().push(rating);
            }
        }
    }

    let mut rows: Vec<EloSummary> = samples
        .into_iter()
        .filter_map(|((bucket, competitor), ratings)| {
            let s = stats::describe(&ratings)?;
            Some(EloSummary {
                bucket,
                competitor,
                mean: s.mean,
                std: s.std,
                min: s.min,
                max: s.max,
                folds: s.count,
            })
        })
        .collect();

    rows.sort_by(|x, y| {
        x.bucket
            .cmp(&y.bucket)
            .then(y.mean.total_cmp(&x.mean))
            .then_with(|| x.competitor.cmp(&y.competitor))
    });
    rows
}

#[cfg(test)]
#[path = "elo_tests.rs"]
mod elo_tests;
