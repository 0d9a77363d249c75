//! Average centipawn loss
//!
//! Each recorded game is replayed through a fixed-depth analysis policy.
//! For every half-move the positions before and after it are scored from
//! the mover's side; the absolute swing is that move's loss. A game's ACPL
//! is the mean loss over the moves that could be scored.

use std::collections::BTreeMap;
use std::fmt;
use std::thread;

use chess_core::{Color, PolicyError, Position, PositionAnalyzer, Score, Termination, termination};
use crossbeam_channel as chan;
use serde::Serialize;
use thiserror::Error;

use crate::elo::Bucket;
use crate::game::GameRecord;
use crate::stats::{self, Summary};

/// Why a half-move has no loss sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisFailure {
    #[error("analysis failed: {0}")]
    Policy(#[from] PolicyError),
    #[error("mate score")]
    MateScore,
}

/// Centipawn loss of one half-move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveLoss {
    pub ply: usize,
    pub mover: Color,
    pub loss: f64,
}

/// Per-move losses of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameAccuracy {
    pub game_id: u64,
    pub white: String,
    pub black: String,
    pub bucket: Bucket,
    pub samples: Vec<MoveLoss>,
    /// Half-moves that produced no sample.
    pub skipped: usize,
}

impl GameAccuracy {
    /// Mean loss of `color`'s moves, None if none were scored.
    pub fn acpl(&self, color: Color) -> Option<f64> {
        let losses: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.mover == color)
            .map(|s| s.loss)
            .collect();
        stats::describe(&losses).map(|s| s.mean)
    }
}

/// Source of analyzers for the worker pool; each worker builds one.
pub trait AnalyzerFactory: Sync {
    fn build(&self) -> Result<Box<dyn PositionAnalyzer>, PolicyError>;
}

impl<F> AnalyzerFactory for F
where
    F: Fn() -> Result<Box<dyn PositionAnalyzer>, PolicyError> + Sync,
{
    fn build(&self) -> Result<Box<dyn PositionAnalyzer>, PolicyError> {
        self()
    }
}

fn centipawns(score: Result<Score, PolicyError>) -> Result<f64, AnalysisFailure> {
    match score? {
        Score::Centipawns(cp) => Ok(f64::from(cp)),
        Score::Mate(_) => Err(AnalysisFailure::MateScore),
    }
}

/// Replays one game. Unscorable half-moves are skipped, never fatal.
pub fn analyse_game(
    record: &GameRecord,
    analyzer: &mut dyn PositionAnalyzer,
    depth: u8,
) -> GameAccuracy {
    replay(record, analyzer, depth).accuracy
}

struct Replay {
    accuracy: GameAccuracy,
    /// The analyzer gave up during the game and must be rebuilt.
    analyzer_lost: bool,
}

fn replay(record: &GameRecord, analyzer: &mut dyn PositionAnalyzer, depth: u8) -> Replay {
    let mut pos = Position::startpos();
    let mut history = vec![pos.position_hash()];
    let mut samples = Vec::new();
    let mut skipped = 0;
    let mut analyzer_lost = false;

    let mut score = |pos: &Position| {
        let result = analyzer.analyse(pos, depth);
        if let Err(PolicyError::EngineUnavailable { .. }) = &result {
            analyzer_lost = true;
        }
        centipawns(result)
    };

    // Score of the current position for its side to move, carried over from
    // the previous half-move's "after" analysis.
    let mut before = score(&pos);

    for (ply, &mv) in record.moves.iter().enumerate() {
        let mover = pos.side_to_move;
        pos.make_move(mv);
        history.push(pos.position_hash());

        // Drawn endings are worth exactly zero; mate has no centipawn value.
        let after = match termination(&pos, &history) {
            Some(Termination::Checkmate(_)) => Err(AnalysisFailure::MateScore),
            Some(_) => Ok(0.0),
            None => score(&pos),
        };

        match (&before, &after) {
            (Ok(b), Ok(a)) => samples.push(MoveLoss {
                ply: ply + 1,
                mover,
                // `a` is the opponent's view.
                loss: (b - (-a)).abs(),
            }),
            (Err(e), _) | (_, Err(e)) => {
                log::debug!("game {} ply {}: {e}", record.id, ply + 1);
                skipped += 1;
            }
        }
        before = after;
    }

    Replay {
        accuracy: GameAccuracy {
            game_id: record.id,
            white: record.white.clone(),
            black: record.black.clone(),
            bucket: Bucket::Budget(record.budget),
            samples,
            skipped,
        },
        analyzer_lost,
    }
}

/// Analyses every non-aborted record on `workers` threads, one analyzer per
/// worker. A worker whose analyzer became unavailable during a game builds
/// a fresh one before its next game. Results come back in record order.
///
/// Fails only if games were left unanalysed because no analyzer could be
/// built for them.
pub fn analyse_records(
    records: &[GameRecord],
    factory: &dyn AnalyzerFactory,
    depth: u8,
    workers: usize,
) -> Result<Vec<GameAccuracy>, PolicyError> {
    let jobs: Vec<(usize, &GameRecord)> = records
        .iter()
        .filter(|r| !r.is_aborted())
        .enumerate()
        .collect();
    let total = jobs.len();

    let (job_tx, job_rx) = chan::unbounded();
    for job in jobs {
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let (res_tx, res_rx) = chan::unbounded::<Result<(usize, GameAccuracy), PolicyError>>();

    thread::scope(|s| {
        for _ in 0..workers.max(1) {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            s.spawn(move || {
                let mut analyzer = match factory.build() {
                    Ok(a) => a,
                    Err(e) => {
                        log::error!("analyzer failed to start: {e}");
                        let _ = res_tx.send(Err(e));
                        return;
                    }
                };
                for (idx, record) in job_rx.iter() {
                    let Replay {
                        accuracy,
                        analyzer_lost,
                    } = replay(record, analyzer.as_mut(), depth);
                    log::info!(
                        "analysed game {} ({} vs {}): {} samples",
                        record.id,
                        record.white,
                        record.black,
                        accuracy.samples.len()
                    );
                    if res_tx.send(Ok((idx, accuracy))).is_err() {
                        break;
                    }

                    if analyzer_lost {
                        log::warn!("analyzer {} unavailable; rebuilding it", analyzer.name());
                        drop(analyzer);
                        analyzer = match factory.build() {
                            Ok(a) => a,
                            Err(e) => {
                                log::error!("analyzer failed to restart: {e}");
                                let _ = res_tx.send(Err(e));
                                return;
                            }
                        };
                    }
                }
            });
        }
    });
    drop(res_tx);

    let mut done: Vec<(usize, GameAccuracy)> = Vec::with_capacity(total);
    let mut launch_error = None;
    for msg in res_rx.iter() {
        match msg {
            Ok(item) => done.push(item),
            Err(e) => launch_error = Some(e),
        }
    }

    if done.len() < total
        && let Some(e) = launch_error
    {
        return Err(e);
    }
    done.sort_by_key(|(idx, _)| *idx);
    Ok(done.into_iter().map(|(_, acc)| acc).collect())
}

/// Which of a competitor's games a summary row covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Total,
    White,
    Black,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Total => "total",
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Side {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Distribution of per-game ACPL for one competitor, side and bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcplSummary {
    pub bucket: Bucket,
    pub competitor: String,
    pub side: Side,
    #[serde(flatten)]
    pub stats: Summary,
}

/// Aggregates per-game ACPL by bucket (each budget and "all"), competitor
/// and side. Games where a side has no scored move do not count for it.
pub fn summarize(games: &[GameAccuracy]) -> Vec<AcplSummary> {
    let mut groups: BTreeMap<(Bucket, String, Side), Vec<f64>> = BTreeMap::new();

    for game in games {
        for color in [Color::White, Color::Black] {
            let Some(value) = game.acpl(color) else {
                continue;
            };
            let (name, side) = match color {
                Color::White => (&game.white, Side::White),
                Color::Black => (&game.black, Side::Black),
            };
            for bucket in [game.bucket, Bucket::All] {
                for s in [side, Side::Total] {
                    groups
                        .entry((bucket, name.clone(), s))
                        .or_default()
                        .push(value);
                }
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|((bucket, competitor, side), values)| {
            Some(AcplSummary {
                bucket,
                competitor,
                side,
                stats: stats::describe(&values)?,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "acpl_tests.rs"]
mod acpl_tests;
