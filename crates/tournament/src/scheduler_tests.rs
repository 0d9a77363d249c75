use super::*;
use crate::game::GameResult;
use crate::opening::NoBook;
use chess_core::{Move, Position, legal_moves};
use rand::seq::SliceRandom;
use std::sync::atomic::AtomicUsize;

struct RandomMover {
    name: String,
    rng: StdRng,
}

impl MovePolicy for RandomMover {
    fn name(&self) -> &str {
        &self.name
    }

    fn propose_move(&mut self, pos: &Position, _budget: ResourceBudget) -> Result<Move, PolicyError> {
        legal_moves(pos)
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| PolicyError::IllegalMoveProposed {
                policy: self.name.clone(),
                text: "(none)".to_string(),
                fen: pos.to_fen(),
            })
    }
}

/// Dies on its first move request, like an engine that keeps crashing.
struct Flaky;

impl MovePolicy for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    fn propose_move(&mut self, _pos: &Position, _budget: ResourceBudget) -> Result<Move, PolicyError> {
        Err(PolicyError::EngineUnavailable {
            engine: "flaky".to_string(),
            restarts: 1,
            reason: "exited".to_string(),
        })
    }
}

/// Competitor names decide behaviour: "broken" never launches, "flaky"
/// always crashes, anything else moves at random.
struct TestFactory {
    names: Vec<String>,
    builds: Vec<AtomicUsize>,
}

impl TestFactory {
    fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            builds: names.iter().map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    fn builds(&self, idx: usize) -> usize {
        self.builds[idx].load(Ordering::SeqCst)
    }
}

impl PolicyFactory for TestFactory {
    fn competitor_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn build(&self, competitor: usize, seed: u64) -> Result<Box<dyn MovePolicy>, PolicyError> {
        self.builds[competitor].fetch_add(1, Ordering::SeqCst);
        let name = self.names[competitor].clone();
        match name.as_str() {
            "broken" => Err(PolicyError::Launch {
                engine: name,
                reason: "no such file".to_string(),
            }),
            "flaky" => Ok(Box::new(Flaky)),
            _ => Ok(Box::new(RandomMover {
                name,
                rng: StdRng::seed_from_u64(seed ^ competitor as u64),
            })),
        }
    }
}

fn budgets() -> Vec<ResourceBudget> {
    vec![ResourceBudget::Depth(1), ResourceBudget::Depth(2)]
}

#[test]
fn test_schedule_covers_pairs_colors_reps_and_budgets() {
    let tasks = schedule(3, &budgets(), 2);
    assert_eq!(tasks.len(), 3 * 2 * 2 * 2);

    let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, (0..24).collect::<Vec<u64>>());
    assert!(tasks.iter().all(|t| t.white != t.black));

    let a_white_vs_b = tasks
        .iter()
        .filter(|t| t.white == 0 && t.black == 1 && t.budget == ResourceBudget::Depth(2))
        .count();
    assert_eq!(a_white_vs_b, 2);
}

#[test]
fn test_launch_failure_fails_only_dependent_tasks() {
    let factory = TestFactory::new(&["alpha", "beta", "broken"]);
    let settings = SchedulerSettings {
        workers: 3,
        seed: 11,
        ..SchedulerSettings::default()
    };
    let scheduler = Scheduler::new(&factory, &NoBook, settings);

    let mut seen = 0;
    let reports = scheduler.run(schedule(3, &budgets(), 2), |_| seen += 1);
    assert_eq!(seen, 24);
    assert_eq!(reports.len(), 24);

    let mut played = 0;
    let mut failed = 0;
    for report in &reports {
        match report {
            TaskReport::Played(game) => {
                played += 1;
                assert_ne!(game.record.result, GameResult::Aborted);
                assert!(game.record.white != "broken" && game.record.black != "broken");
            }
            TaskReport::Failed {
                competitor, error, ..
            } => {
                failed += 1;
                assert_eq!(competitor, "broken");
                assert!(matches!(error, PolicyError::Launch { .. }));
            }
        }
    }
    assert_eq!((played, failed), (8, 16));
}

#[test]
fn test_unavailable_policy_is_rebuilt_for_next_task() {
    let factory = TestFactory::new(&["steady", "flaky"]);
    let scheduler = Scheduler::new(&factory, &NoBook, SchedulerSettings::default());

    let reports = scheduler.run(schedule(2, &[ResourceBudget::Depth(1)], 2), |_| {});
    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| matches!(
        r,
        TaskReport::Played(g) if g.record.result == GameResult::Aborted
    )));
    assert_eq!(factory.builds(0), 1);
    assert_eq!(factory.builds(1), 4);
}
