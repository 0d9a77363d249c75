//! Resource budgets and the clock that enforces them.
//!
//! Every move in a tournament is produced under exactly one
//! [`ResourceBudget`]: either a fixed search depth or a fixed wall-clock
//! allowance. In-process searches poll a [`TimeControl`] to honor the
//! latter; external engines receive the budget as `go depth` / `go movetime`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Per-move resource limit. Ordering puts all depth budgets before all time
/// budgets, which is the order summary tables are printed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceBudget {
    /// Search exactly this many plies.
    Depth(u8),
    /// Think for at most this long.
    Time(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid budget {0:?}: expected `d<plies>`, `<seconds>s` or `<millis>ms`")]
pub struct BudgetParseError(pub String);

impl ResourceBudget {
    pub fn depth(&self) -> Option<u8> {
        match self {
            ResourceBudget::Depth(d) => Some(*d),
            ResourceBudget::Time(_) => None,
        }
    }

    pub fn move_time(&self) -> Option<Duration> {
        match self {
            ResourceBudget::Depth(_) => None,
            ResourceBudget::Time(t) => Some(*t),
        }
    }
}

impl fmt::Display for ResourceBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceBudget::Depth(d) => write!(f, "d{d}"),
            ResourceBudget::Time(t) => write!(f, "{}s", t.as_secs_f64()),
        }
    }
}

impl FromStr for ResourceBudget {
    type Err = BudgetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let txt = s.trim();
        let err = || BudgetParseError(s.to_string());

        if let Some(d) = txt.strip_prefix('d') {
            return d.parse::<u8>().map(ResourceBudget::Depth).map_err(|_| err());
        }
        if let Some(ms) = txt.strip_suffix("ms") {
            return ms
                .parse::<u64>()
                .map(|ms| ResourceBudget::Time(Duration::from_millis(ms)))
                .map_err(|_| err());
        }
        if let Some(secs) = txt.strip_suffix('s') {
            let secs: f64 = secs.parse().map_err(|_| err())?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(err());
            }
            // Whole microseconds, so "0.3s" means 300ms and not 299.999999ms.
            let micros = (secs * 1e6).round() as u64;
            return Ok(ResourceBudget::Time(Duration::from_micros(micros)));
        }
        Err(err())
    }
}

impl TryFrom<String> for ResourceBudget {
    type Error = BudgetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceBudget> for String {
    fn from(value: ResourceBudget) -> Self {
        value.to_string()
    }
}

/// Nodes searched between clock reads.
pub const CHECK_INTERVAL: u64 = 64;

/// Wall-clock controller for one move's search.
///
/// The clock starts when the controller is created. `is_stopped()` is a
/// single atomic load so it can be called from the innermost search loop;
/// the actual clock read happens in `check_time()` every `CHECK_INTERVAL`
/// nodes.
#[derive(Debug)]
pub struct TimeControl {
    stopped: AtomicBool,
    start_time: Instant,
    /// None = no wall-clock limit
    time_limit: Option<Duration>,
}

impl TimeControl {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            stopped: AtomicBool::new(false),
            start_time: Instant::now(),
            time_limit,
        }
    }

    pub fn for_budget(budget: ResourceBudget) -> Self {
        Self::new(budget.move_time())
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Reads the clock and latches the stop flag once the limit has passed.
    pub fn check_time(&self) -> bool {
        if self.is_stopped() {
            return true;
        }

        if let Some(limit) = self.time_limit
            && self.start_time.elapsed() >= limit
        {
            self.stop();
            return true;
        }

        false
    }

    #[inline]
    pub fn should_check_time(&self, nodes: u64) -> bool {
        nodes.is_multiple_of(CHECK_INTERVAL)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// None when there is no wall-clock limit.
    pub fn remaining(&self) -> Option<Duration> {
        let limit = self.time_limit?;
        Some(limit.saturating_sub(self.elapsed()))
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
