//! PGN-like game export and import.
//!
//! Movetext uses coordinate notation (`e2e4`, `e7e8q`) numbered by full
//! move. The budget goes into a `Depth` tag (plies) or a `Time` tag
//! (seconds per move).

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chess_core::{Position, ResourceBudget, move_to_uci, parse_uci_move};
use thiserror::Error;

use crate::game::{GameRecord, GameResult};

pub const EVENT: &str = "Engine benchmark";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("game {game}: missing tag {tag}")]
    MissingTag { game: usize, tag: &'static str },
    #[error("game {game}: bad {tag} value {value:?}")]
    BadTag {
        game: usize,
        tag: &'static str,
        value: String,
    },
    #[error("game {game}: move {ply} {text:?} is illegal")]
    IllegalMove {
        game: usize,
        ply: usize,
        text: String,
    },
}

/// Renders one game.
pub fn write_record(record: &GameRecord) -> String {
    let mut out = String::new();
    let mut tag = |name: &str, value: &str| {
        let _ = writeln!(out, "[{name} \"{}\"]", value.replace('"', "'"));
    };
    tag("Event", EVENT);
    tag("Site", "local");
    tag("Date", &record.date);
    tag("Round", &record.round.to_string());
    tag("White", &record.white);
    tag("Black", &record.black);
    tag("Result", record.result.token());
    match record.budget {
        ResourceBudget::Depth(d) => tag("Depth", &d.to_string()),
        ResourceBudget::Time(t) => tag("Time", &t.as_secs_f64().to_string()),
    }
    tag("Termination", &record.termination);
    tag("BookPlies", &record.book_plies.to_string());
    tag("GameId", &record.id.to_string());
    out.push('\n');

    let mut line = String::new();
    for (ply, mv) in record.moves.iter().enumerate() {
        let token = if ply % 2 == 0 {
            format!("{}. {}", ply / 2 + 1, move_to_uci(*mv))
        } else {
            move_to_uci(*mv)
        };
        if !line.is_empty() && line.len() + token.len() + 1 > 79 {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(record.result.token());
    out.push_str(&line);
    out.push_str("\n\n");
    out
}

/// Appends one game to `path`, creating the file if needed.
pub fn append_record(path: &Path, record: &GameRecord) -> Result<(), RecordError> {
    let io_err = |source| RecordError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(write_record(record).as_bytes())
        .map_err(io_err)
}

/// Parses every game in `text`, replaying the moves so each one is known
/// to be legal.
pub fn parse_records(text: &str) -> Result<Vec<GameRecord>, RecordError> {
    let mut records = Vec::new();
    let mut tags: HashMap<String, String> = HashMap::new();
    let mut movetext = String::new();

    for line in text.lines().map(str::trim) {
        if line.starts_with('[') {
            if !movetext.trim().is_empty() {
                records.push(parse_game(records.len() + 1, &tags, &movetext)?);
                tags.clear();
                movetext.clear();
            }
            if let Some((name, value)) = parse_tag(line) {
                tags.insert(name, value);
            }
        } else if !line.is_empty() {
            movetext.push_str(line);
            movetext.push(' ');
        }
    }
    if !tags.is_empty() || !movetext.trim().is_empty() {
        records.push(parse_game(records.len() + 1, &tags, &movetext)?);
    }
    Ok(records)
}

pub fn read_records(path: &Path) -> Result<Vec<GameRecord>, RecordError> {
    let text = fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_records(&text)
}

fn parse_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (name, rest) = inner.split_once(' ')?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.to_string()))
}

/// A numeric tag parsed into its field's type; absent tags are zero.
fn numeric_tag<T: FromStr + Default>(
    game: usize,
    tags: &HashMap<String, String>,
    tag: &'static str,
) -> Result<T, RecordError> {
    match tags.get(tag) {
        Some(v) => v.parse().map_err(|_| RecordError::BadTag {
            game,
            tag,
            value: v.clone(),
        }),
        None => Ok(T::default()),
    }
}

fn parse_game(
    game: usize,
    tags: &HashMap<String, String>,
    movetext: &str,
) -> Result<GameRecord, RecordError> {
    let get = |tag: &'static str| {
        tags.get(tag)
            .map(String::as_str)
            .ok_or(RecordError::MissingTag { game, tag })
    };
    let bad = |tag: &'static str, value: &str| RecordError::BadTag {
        game,
        tag,
        value: value.to_string(),
    };

    let result_tag = get("Result")?;
    let result = GameResult::from_token(result_tag).ok_or_else(|| bad("Result", result_tag))?;

    let budget = if let Some(d) = tags.get("Depth") {
        ResourceBudget::Depth(d.parse().map_err(|_| bad("Depth", d))?)
    } else if let Some(t) = tags.get("Time") {
        let secs: f64 = t.parse().map_err(|_| bad("Time", t))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(bad("Time", t));
        }
        ResourceBudget::Time(Duration::from_micros((secs * 1e6).round() as u64))
    } else {
        return Err(RecordError::MissingTag { game, tag: "Depth" });
    };


    let mut pos = Position::startpos();
    let mut moves = Vec::new();
    for token in movetext.split_whitespace() {
        if token.ends_with('.') || GameResult::from_token(token).is_some() {
            continue;
        }
        let mv = parse_uci_move(&pos, token).ok_or_else(|| RecordError::IllegalMove {
            game,
            ply: moves.len() + 1,
            text: token.to_string(),
        })?;
        pos.make_move(mv);
        moves.push(mv);
    }

    Ok(GameRecord {
        id: numeric_tag(game, tags, "GameId")?,
        round: numeric_tag(game, tags, "Round")?,
        white: get("White")?.to_string(),
        black: get("Black")?.to_string(),
        budget,
        moves,
        result,
        termination: tags.get("Termination").cloned().unwrap_or_default(),
        date: tags.get("Date").cloned().unwrap_or_default(),
        book_plies: numeric_tag(game, tags, "BookPlies")?,
    })
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
