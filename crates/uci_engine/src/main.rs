//! UCI front end for the built-in searcher, so it can play or analyse as an
//! external engine.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chess_core::{
    MovePolicy, Position, ResourceBudget, Score, TimeControl, move_to_uci, set_position_from_uci,
};
use neural_engine::NetworkEvaluator;
use search_engine::{MaterialEvaluator, SearchEvaluator, to_score};

const ENGINE_NAME: &str = "ChessLabRust 0.2";
const DEFAULT_DEPTH: u8 = 4;
const MAX_DEPTH: u8 = 32;

struct Engine {
    search: SearchEvaluator,
    pos: Position,
    depth: u8,
}

impl Engine {
    fn new() -> Self {
        Self {
            search: SearchEvaluator::new("search", Box::new(MaterialEvaluator), 0),
            pos: Position::startpos(),
            depth: DEFAULT_DEPTH,
        }
    }

    fn set_option(&mut self, name: &str, value: &str) {
        match name {
            "Depth" => match value.parse::<u8>() {
                Ok(d) => self.depth = d.clamp(1, MAX_DEPTH),
                Err(_) => log::warn!("bad Depth value {value:?}"),
            },
            "EvalFile" if value.is_empty() || value == "<empty>" => {
                self.search = SearchEvaluator::new("search", Box::new(MaterialEvaluator), 0);
            }
            "EvalFile" => match NetworkEvaluator::load(Path::new(value)) {
                Ok(net) => {
                    log::info!("loaded network {value}");
                    self.search = SearchEvaluator::new("search", Box::new(net), 0);
                }
                Err(e) => log::error!("cannot load {value}: {e}"),
            },
            _ => log::debug!("ignoring option {name}"),
        }
    }

    fn budget(&self, args: &[&str]) -> ResourceBudget {
        let value = |key: &str| {
            args.iter()
                .position(|&a| a == key)
                .and_then(|i| args.get(i + 1))
                .and_then(|v| v.parse::<u64>().ok())
        };
        if let Some(ms) = value("movetime") {
            ResourceBudget::Time(Duration::from_millis(ms))
        } else if let Some(d) = value("depth") {
            ResourceBudget::Depth(d.clamp(1, u64::from(MAX_DEPTH)) as u8)
        } else {
            ResourceBudget::Depth(self.depth)
        }
    }

    fn go(&mut self, args: &[&str], out: &mut impl Write) -> io::Result<()> {
        let budget = self.budget(args);
        let tc = TimeControl::for_budget(budget);
        let mut infos = Vec::new();
        let outcome = self.search.search_with(&self.pos, budget, &tc, |it| {
            let score = match to_score(it.score) {
                Score::Centipawns(cp) => format!("cp {cp}"),
                Score::Mate(m) => format!("mate {m}"),
            };
            infos.push(format!(
                "info depth {} score {score} nodes {} pv {}",
                it.depth,
                it.nodes,
                move_to_uci(it.best_move)
            ));
        });
        for info in infos {
            writeln!(out, "{info}")?;
        }
        let best = outcome.best_move.map_or_else(|| "0000".to_string(), move_to_uci);
        writeln!(out, "bestmove {best}")?;
        out.flush()
    }

    /// Handles one command line; false on `quit`.
    fn handle(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = parts.split_first() else {
            return Ok(true);
        };
        match cmd {
            "uci" => {
                writeln!(out, "id name {ENGINE_NAME}")?;
                writeln!(out, "id author ML-chess")?;
                writeln!(
                    out,
                    "option name Depth type spin default {DEFAULT_DEPTH} min 1 max {MAX_DEPTH}"
                )?;
                writeln!(out, "option name EvalFile type string default <empty>")?;
                writeln!(out, "uciok")?;
                out.flush()?;
            }
            "isready" => {
                writeln!(out, "readyok")?;
                out.flush()?;
            }
            "setoption" => {
                let name_at = args.iter().position(|&a| a == "name");
                let value_at = args.iter().position(|&a| a == "value");
                if let Some(n) = name_at {
                    let name_end = value_at.unwrap_or(args.len());
                    let name = args.get(n + 1..name_end).unwrap_or_default().join(" ");
                    let value = value_at
                        .map(|v| args[v + 1..].join(" "))
                        .unwrap_or_default();
                    self.set_option(&name, &value);
                }
            }
            "ucinewgame" => {
                self.pos = Position::startpos();
                let _ = self.search.new_game();
            }
            "position" => {
                if let Err(e) = set_position_from_uci(&mut self.pos, args) {
                    log::warn!("bad position command: {e}");
                }
            }
            "go" => self.go(args, out)?,
            "quit" => return Ok(false),
            _ => log::debug!("ignoring {line:?}"),
        }
        Ok(true)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if !engine
            .handle(line.trim(), &mut out)
            .context("Failed to write to stdout")?
        {
            break;
        }
    }
    Ok(())
}
