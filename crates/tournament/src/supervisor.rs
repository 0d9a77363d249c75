//! Engine process supervision
//!
//! One [`EngineSupervisor`] owns one engine subprocess speaking UCI over its
//! stdin/stdout. A background thread forwards stdout lines into a channel so
//! every read can carry a timeout. When the process dies or stops answering,
//! the supervisor respawns it with the same configuration and retries the
//! request, at most `max_restarts` times per request.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use chess_core::{PolicyError, Position, ResourceBudget, Score, go_command, position_command};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

fn default_depth_timeout_ms() -> u64 {
    60_000
}

fn default_time_margin_ms() -> u64 {
    1_000
}

fn default_quit_timeout_ms() -> u64 {
    300
}

fn default_max_restarts() -> u32 {
    1
}

/// How to launch one engine. Immutable for the lifetime of a supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Competitor name used in records and tables.
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Sent as `setoption name K value V` after the handshake.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Limit for `uciok` and `readyok`.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Limit for a `go depth N` answer.
    #[serde(default = "default_depth_timeout_ms")]
    pub depth_timeout_ms: u64,
    /// Grace added to `go movetime` before the engine counts as hung.
    #[serde(default = "default_time_margin_ms")]
    pub time_margin_ms: u64,
    /// How long `quit` may take before the process is killed.
    #[serde(default = "default_quit_timeout_ms")]
    pub quit_timeout_ms: u64,
    /// Respawns allowed per request before the engine is given up on.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
}

impl EngineConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            args: Vec::new(),
            options: BTreeMap::new(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            depth_timeout_ms: default_depth_timeout_ms(),
            time_margin_ms: default_time_margin_ms(),
            quit_timeout_ms: default_quit_timeout_ms(),
            max_restarts: default_max_restarts(),
        }
    }

    /// How long to wait for `bestmove` under `budget`.
    pub fn reply_timeout(&self, budget: ResourceBudget) -> Duration {
        match budget {
            ResourceBudget::Depth(_) => Duration::from_millis(self.depth_timeout_ms),
            ResourceBudget::Time(t) => t + Duration::from_millis(self.time_margin_ms),
        }
    }

    fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Liveness of a supervised engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Running,
    Crashed,
    Restarting,
    Terminated,
}

/// Low-level failure talking to the child process.
#[derive(Debug, Error)]
enum ChannelError {
    #[error("engine process exited")]
    Exited,
    #[error("no answer within {0:?}")]
    Timeout(Duration),
    #[error("pipe error: {0}")]
    Io(#[from] io::Error),
}

/// Pipes to one running child.
struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    label: String,
}

impl EngineProcess {
    /// Spawns the child and runs the handshake: `uci`, options, `isready`.
    fn spawn(cfg: &EngineConfig) -> Result<Self, String> {
        let mut child = Command::new(&cfg.path)
            .args(&cfg.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("cannot spawn {}: {e}", cfg.path.display()))?;

        let stdin = child.stdin.take().ok_or("no stdin pipe")?;
        let stdout = child.stdout.take().ok_or("no stdout pipe")?;
        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let mut proc = Self {
            child,
            stdin: BufWriter::new(stdin),
            rx,
            label: cfg.name.clone(),
        };
        if let Err(e) = proc.handshake(cfg) {
            proc.shutdown(Duration::ZERO);
            return Err(format!("handshake failed: {e}"));
        }
        Ok(proc)
    }

    fn handshake(&mut self, cfg: &EngineConfig) -> Result<(), ChannelError> {
        self.write_line("uci")?;
        self.wait_for("uciok", cfg.handshake_timeout())?;
        for (name, value) in &cfg.options {
            self.write_line(&format!("setoption name {name} value {value}"))?;
        }
        self.sync_ready(cfg.handshake_timeout())
    }

    fn sync_ready(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.write_line("isready")?;
        self.wait_for("readyok", timeout)
    }

    fn wait_for(&self, token: &str, timeout: Duration) -> Result<(), ChannelError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.recv_line(deadline)?.trim() == token {
                return Ok(());
            }
        }
    }

    fn recv_line(&self, deadline: Instant) -> Result<String, ChannelError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(remaining) {
            Ok(line) => {
                log::debug!("{} > {}", self.label, line);
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::Timeout(remaining)),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::Exited),
        }
    }

    fn write_line(&mut self, msg: &str) -> Result<(), ChannelError> {
        log::debug!("{} < {}", self.label, msg);
        self.stdin.write_all(msg.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Exit-status probe.
    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    /// Sends `position` and `go`, then reads until `bestmove`. Returns the
    /// move text and the last score seen in `info` lines.
    fn search(
        &mut self,
        pos: &Position,
        budget: ResourceBudget,
        timeout: Duration,
    ) -> Result<(String, Option<Score>), ChannelError> {
        self.write_line(&position_command(pos))?;
        self.write_line(&go_command(budget))?;

        let deadline = Instant::now() + timeout;
        let mut score = None;
        loop {
            let line = self.recv_line(deadline)?;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("info") => {
                    if let Some(s) = parse_info_score(&line) {
                        score = Some(s);
                    }
                }
                Some("bestmove") => {
                    let mv = tokens.next().unwrap_or_default().to_string();
                    return Ok((mv, score));
                }
                _ => {}
            }
        }
    }

    /// `quit`, then a bounded wait, then kill.
    fn shutdown(&mut self, grace: Duration) {
        let _ = self.write_line("quit");
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            thread::sleep(QUIT_POLL_INTERVAL);
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Extracts `score cp X` or `score mate Y` from an `info` line.
pub fn parse_info_score(line: &str) -> Option<Score> {
    let mut tokens = line.split_whitespace();
    while let Some(tok) = tokens.next() {
        if tok == "score" {
            return match (tokens.next(), tokens.next().and_then(|v| v.parse().ok())) {
                (Some("cp"), Some(v)) => Some(Score::Centipawns(v)),
                (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                _ => None,
            };
        }
    }
    None
}

/// Lifecycle owner of one engine subprocess.
pub struct EngineSupervisor {
    config: EngineConfig,
    state: EngineState,
    process: Option<EngineProcess>,
    restarts: u32,
}

impl EngineSupervisor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: EngineState::NotStarted,
            process: None,
            restarts: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Respawns performed over the supervisor's lifetime.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Spawns the engine and completes the handshake.
    pub fn start(&mut self) -> Result<(), PolicyError> {
        if self.state == EngineState::Running {
            return Ok(());
        }

        match EngineProcess::spawn(&self.config) {
            Ok(proc) => {
                log::debug!("{}: started", self.config.name);
                self.process = Some(proc);
                self.state = EngineState::Running;
                Ok(())
            }
            Err(reason) => {
                self.state = EngineState::Terminated;
                Err(PolicyError::Launch {
                    engine: self.config.name.clone(),
                    reason,
                })
            }
        }
    }

    /// Sends `ucinewgame` and waits for the engine to be ready.
    pub fn new_game(&mut self) -> Result<(), PolicyError> {
        let timeout = self.config.handshake_timeout();
        self.with_retry(|proc| {
            proc.write_line("ucinewgame")?;
            proc.sync_ready(timeout)
        })
    }

    /// Asks for a move and returns the raw `bestmove` text.
    pub fn request_move(
        &mut self,
        pos: &Position,
        budget: ResourceBudget,
    ) -> Result<String, PolicyError> {
        let timeout = self.config.reply_timeout(budget);
        self.with_retry(|proc| proc.search(pos, budget, timeout).map(|(mv, _)| mv))
    }

    /// Fixed-depth analysis; the score is relative to the side to move.
    pub fn analyse(&mut self, pos: &Position, depth: u8) -> Result<Score, PolicyError> {
        let budget = ResourceBudget::Depth(depth);
        let timeout = self.config.reply_timeout(budget);
        let score = self.with_retry(|proc| proc.search(pos, budget, timeout).map(|(_, s)| s))?;
        score.ok_or_else(|| PolicyError::MissingScore {
            engine: self.config.name.clone(),
        })
    }

    /// Quits (or kills) the engine. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(mut proc) = self.process.take() {
            proc.shutdown(Duration::from_millis(self.config.quit_timeout_ms));
            log::debug!("{}: stopped", self.config.name);
        }
        self.state = EngineState::Terminated;
    }

    /// Runs one request, restarting the engine after a crash or hang and
    /// retrying, up to `max_restarts` times.
    fn with_retry<T>(
        &mut self,
        mut op: impl FnMut(&mut EngineProcess) -> Result<T, ChannelError>,
    ) -> Result<T, PolicyError> {
        match self.state {
            EngineState::NotStarted => self.start()?,
            EngineState::Terminated => return Err(self.unavailable("engine is not running")),
            _ => {}
        }

        let mut retries_left = self.config.max_restarts;
        loop {
            let result = match self.process.as_mut() {
                Some(proc) => {
                    if proc.has_exited() {
                        Err(ChannelError::Exited)
                    } else {
                        op(proc)
                    }
                }
                None => Err(ChannelError::Exited),
            };

            let err = match result {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };

            self.state = EngineState::Crashed;
            if let Some(mut dead) = self.process.take() {
                dead.shutdown(Duration::ZERO);
            }

            if retries_left == 0 {
                log::warn!("{}: giving up after {err}", self.config.name);
                self.state = EngineState::Terminated;
                return Err(self.unavailable(&err.to_string()));
            }
            retries_left -= 1;

            log::warn!("{}: {err}; restarting", self.config.name);
            self.state = EngineState::Restarting;
            match EngineProcess::spawn(&self.config) {
                Ok(proc) => {
                    self.restarts += 1;
                    self.process = Some(proc);
                    self.state = EngineState::Running;
                }
                Err(reason) => {
                    self.state = EngineState::Terminated;
                    return Err(self.unavailable(&reason));
                }
            }
        }
    }

    fn unavailable(&self, reason: &str) -> PolicyError {
        PolicyError::EngineUnavailable {
            engine: self.config.name.clone(),
            restarts: self.restarts,
            reason: reason.to_string(),
        }
    }
}

impl Drop for EngineSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod supervisor_tests;
