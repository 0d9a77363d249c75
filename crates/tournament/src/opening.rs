//! Opening move sources.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chess_core::{Move, Position, parse_uci_move};
use thiserror::Error;

/// Read-only source of book moves, shared by every worker.
pub trait OpeningSource: Send + Sync {
    /// Book continuations from `pos`; empty when out of book.
    fn lookup_moves(&self, pos: &Position) -> Vec<Move>;
}

/// Never has a book move.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBook;

impl OpeningSource for NoBook {
    fn lookup_moves(&self, _pos: &Position) -> Vec<Move> {
        Vec::new()
    }
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("cannot read book {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {text:?} is not a legal move here")]
    IllegalMove { line: usize, text: String },
}

/// Book of move lines played from the start position.
///
/// ```text
/// # Ruy Lopez
/// e2e4 e7e5 g1f3 b8c6 f1b5
/// d2d4 d7d5 c2c4
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    /// Position hash -> distinct continuations, in first-seen order.
    index: HashMap<u64, Vec<Move>>,
    lines: usize,
}

impl OpeningBook {
    pub fn from_text(text: &str) -> Result<Self, BookError> {
        let mut book = Self::default();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let mut pos = Position::startpos();
            for token in line.split_whitespace() {
                let mv = parse_uci_move(&pos, token).ok_or_else(|| BookError::IllegalMove {
                    line: i + 1,
                    text: token.to_string(),
                })?;
                let entry = book.index.entry(pos.position_hash()).or_default();
                if !entry.contains(&mv) {
                    entry.push(mv);
                }
                pos.make_move(mv);
            }
            book.lines += 1;
        }
        Ok(book)
    }

    pub fn load(path: &Path) -> Result<Self, BookError> {
        let text = fs::read_to_string(path).map_err(|source| BookError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_text(&text)
    }

    /// Number of opening lines read.
    pub fn len(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

impl OpeningSource for OpeningBook {
    fn lookup_moves(&self, pos: &Position) -> Vec<Move> {
        self.index
            .get(&pos.position_hash())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "opening_tests.rs"]
mod opening_tests;
