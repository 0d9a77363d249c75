//! Round-robin scheduling onto a worker pool
//!
//! Every unordered pair of competitors meets once per budget, repetition
//! and color. Tasks go through a crossbeam channel to `workers` threads;
//! each worker lazily builds its own policy instances and keeps them for
//! later tasks. Reports flow back over a second channel to the calling
//! thread, which is the only one that sees them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chess_core::{MovePolicy, PolicyError, ResourceBudget};
use crossbeam_channel as chan;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::game::{GameMeta, GameSettings, PlayedGame, run_game};
use crate::opening::OpeningSource;

/// Builds fresh policy instances for competitors by index.
pub trait PolicyFactory: Sync {
    fn competitor_names(&self) -> Vec<String>;

    /// A new, started policy. `seed` differs per worker.
    fn build(&self, competitor: usize, seed: u64) -> Result<Box<dyn MovePolicy>, PolicyError>;
}

/// One game to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub white: usize,
    pub black: usize,
    pub budget: ResourceBudget,
    pub round: u32,
}

/// Pairs x budgets x repetitions x both colors.
pub fn schedule(competitors: usize, budgets: &[ResourceBudget], repetitions: u32) -> Vec<Task> {
    let mut tasks = Vec::new();
    for &budget in budgets {
        for round in 0..repetitions {
            for i in 0..competitors {
                for j in (i + 1)..competitors {
                    for (white, black) in [(i, j), (j, i)] {
                        tasks.push(Task {
                            id: tasks.len() as u64,
                            white,
                            black,
                            budget,
                            round,
                        });
                    }
                }
            }
        }
    }
    tasks
}

#[derive(Debug)]
pub enum TaskReport {
    Played(PlayedGame),
    /// Not played because a competitor could not be launched.
    Failed {
        task: Task,
        competitor: String,
        error: PolicyError,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub workers: usize,
    pub seed: u64,
    pub game: GameSettings,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            seed: 0,
            game: GameSettings::default(),
        }
    }
}

/// Competitors whose launch failed, shared by all workers.
struct FailedSet {
    flags: Vec<AtomicBool>,
    errors: Mutex<HashMap<usize, PolicyError>>,
}

impl FailedSet {
    fn new(n: usize) -> Self {
        Self {
            flags: (0..n).map(|_| AtomicBool::new(false)).collect(),
            errors: Mutex::new(HashMap::new()),
        }
    }

    fn mark(&self, competitor: usize, error: PolicyError) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.entry(competitor).or_insert(error);
        }
        self.flags[competitor].store(true, Ordering::SeqCst);
    }

    fn error(&self, competitor: usize) -> Option<PolicyError> {
        if !self.flags[competitor].load(Ordering::SeqCst) {
            return None;
        }
        self.errors
            .lock()
            .ok()
            .and_then(|errors| errors.get(&competitor).cloned())
    }
}

pub struct Scheduler<'a> {
    factory: &'a dyn PolicyFactory,
    book: &'a dyn OpeningSource,
    settings: SchedulerSettings,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        factory: &'a dyn PolicyFactory,
        book: &'a dyn OpeningSource,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            factory,
            book,
            settings,
        }
    }

    /// Plays every task; `on_report` runs on the calling thread as each
    /// report arrives, in completion order.
    pub fn run(&self, tasks: Vec<Task>, mut on_report: impl FnMut(&TaskReport)) -> Vec<TaskReport> {
        let names = self.factory.competitor_names();
        let failed = FailedSet::new(names.len());
        let total = tasks.len();

        let (task_tx, task_rx) = chan::unbounded::<Task>();
        for task in tasks {
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let (report_tx, report_rx) = chan::unbounded::<TaskReport>();
        let mut reports = Vec::with_capacity(total);

        thread::scope(|s| {
            for worker in 0..self.settings.workers.max(1) {
                let task_rx = task_rx.clone();
                let report_tx = report_tx.clone();
                let failed = &failed;
                let names = &names;
                s.spawn(move || self.worker_main(worker, names, failed, task_rx, report_tx));
            }
            drop(report_tx);

            for report in report_rx.iter() {
                on_report(&report);
                reports.push(report);
            }
        });

        log::info!("{} of {} tasks reported", reports.len(), total);
        reports
    }

    fn worker_main(
        &self,
        worker: usize,
        names: &[String],
        failed: &FailedSet,
        rx: chan::Receiver<Task>,
        tx: chan::Sender<TaskReport>,
    ) {
        let seed = self.settings.seed.wrapping_add(worker as u64);
        let mut policies: HashMap<usize, Box<dyn MovePolicy>> = HashMap::new();

        for task in rx.iter() {
            let report = self.play_task(task, seed, names, failed, &mut policies);
            if tx.send(report).is_err() {
                break;
            }
        }
    }

    /// Takes the worker's instance of `idx` out of the cache, building it
    /// on first use.
    fn take_policy(
        &self,
        idx: usize,
        seed: u64,
        names: &[String],
        failed: &FailedSet,
        policies: &mut HashMap<usize, Box<dyn MovePolicy>>,
    ) -> Result<Box<dyn MovePolicy>, PolicyError> {
        if let Some(error) = failed.error(idx) {
            return Err(error);
        }
        if let Some(policy) = policies.remove(&idx) {
            return Ok(policy);
        }
        self.factory.build(idx, seed).map_err(|error| {
            log::error!("{} failed to launch: {error}", names[idx]);
            failed.mark(idx, error.clone());
            error
        })
    }

    fn play_task(
        &self,
        task: Task,
        seed: u64,
        names: &[String],
        failed: &FailedSet,
        policies: &mut HashMap<usize, Box<dyn MovePolicy>>,
    ) -> TaskReport {
        let fail = |competitor: usize, error: PolicyError| TaskReport::Failed {
            task,
            competitor: names[competitor].clone(),
            error,
        };

        let mut white = match self.take_policy(task.white, seed, names, failed, policies) {
            Ok(policy) => policy,
            Err(error) => return fail(task.white, error),
        };
        let mut black = match self.take_policy(task.black, seed, names, failed, policies) {
            Ok(policy) => policy,
            Err(error) => {
                policies.insert(task.white, white);
                return fail(task.black, error);
            }
        };

        let mut rng = StdRng::seed_from_u64(self.settings.seed ^ task.id.rotate_left(17));
        let played = run_game(
            white.as_mut(),
            black.as_mut(),
            self.book,
            task.budget,
            &self.settings.game,
            GameMeta {
                id: task.id,
                round: task.round,
            },
            &mut rng,
        );

        let broken = played.failure.as_ref().and_then(|f| {
            let idx = match f.side {
                chess_core::Color::White => task.white,
                chess_core::Color::Black => task.black,
            };
            match &f.error {
                PolicyError::Launch { .. } => {
                    failed.mark(idx, f.error.clone());
                    Some(idx)
                }
                // Terminated handles are rebuilt for the next task.
                PolicyError::EngineUnavailable { .. } => Some(idx),
                _ => None,
            }
        });

        for (idx, policy) in [(task.white, white), (task.black, black)] {
            if broken != Some(idx) {
                policies.insert(idx, policy);
            }
        }

        log::info!(
            "game {} {} vs {} ({}): {}",
            task.id,
            names[task.white],
            names[task.black],
            task.budget,
            played.record.result.token()
        );
        TaskReport::Played(played)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
