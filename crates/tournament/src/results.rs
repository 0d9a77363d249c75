//! Tournament results tables and reporting
//!
//! Every table is written once as CSV and printed once as aligned text
//! for the terminal. The JSON report carries the Elo and ACPL summaries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::acpl::{AcplSummary, GameAccuracy};
use crate::elo::{Bucket, EloSummary};
use crate::game::GameRecord;
use chess_core::Color;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// A header plus rows of already formatted cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Left-aligned columns padded to their widest cell.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        let line = |cells: Vec<&str>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}"))
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut out = line(self.header.clone());
        out.push('\n');
        out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row.iter().map(String::as_str).collect()));
            out.push('\n');
        }
        out
    }
}

/// One row per game: White, Black, Result, Limit.
pub fn raw_table(records: &[GameRecord]) -> Table {
    Table {
        header: vec!["White", "Black", "Result", "Limit"],
        rows: records
            .iter()
            .map(|r| {
                vec![
                    r.white.clone(),
                    r.black.clone(),
                    r.result.token().to_string(),
                    r.budget.to_string(),
                ]
            })
            .collect(),
    }
}

/// Points per competitor and bucket; aborted games count for nobody.
pub fn score_table(records: &[GameRecord]) -> Table {
    let mut points: BTreeMap<(Bucket, String), f64> = BTreeMap::new();
    for r in records {
        let Some(white) = r.result.white_score() else {
            continue;
        };
        for bucket in [Bucket::Budget(r.budget), Bucket::All] {
            *points.entry((bucket, r.white.clone())).or_default() += white;
            *points.entry((bucket, r.black.clone())).or_default() += 1.0 - white;
        }
    }
    Table {
        header: vec!["Engine", "Score", "Limit"],
        rows: points
            .into_iter()
            .map(|((bucket, name), score)| vec![name, format!("{score:.1}"), bucket.to_string()])
            .collect(),
    }
}

fn acpl_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Per-game ACPL, `-` where a side had no scored move.
pub fn game_acpl_table(games: &[GameAccuracy]) -> Table {
    Table {
        header: vec!["GameIndex", "White", "Black", "White_ACPL", "Black_ACPL", "Limit"],
        rows: games
            .iter()
            .map(|g| {
                vec![
                    g.game_id.to_string(),
                    g.white.clone(),
                    g.black.clone(),
                    acpl_cell(g.acpl(Color::White)),
                    acpl_cell(g.acpl(Color::Black)),
                    g.bucket.to_string(),
                ]
            })
            .collect(),
    }
}

pub fn elo_table(rows: &[EloSummary]) -> Table {
    Table {
        header: vec!["Engine", "Limit", "Mean_Elo", "Std_Elo", "Min_Elo", "Max_Elo"],
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    r.competitor.clone(),
                    r.bucket.to_string(),
                    format!("{:.2}", r.mean),
                    format!("{:.2}", r.std),
                    format!("{:.2}", r.min),
                    format!("{:.2}", r.max),
                ]
            })
            .collect(),
    }
}

pub fn acpl_summary_table(rows: &[AcplSummary]) -> Table {
    Table {
        header: vec![
            "Engine", "Limit", "Side", "Games", "Mean", "Std", "Min", "Q25", "Median", "Q75",
            "Max",
        ],
        rows: rows
            .iter()
            .map(|r| {
                let s = &r.stats;
                vec![
                    r.competitor.clone(),
                    r.bucket.to_string(),
                    r.side.to_string(),
                    s.count.to_string(),
                    format!("{:.2}", s.mean),
                    format!("{:.2}", s.std),
                    format!("{:.2}", s.min),
                    format!("{:.2}", s.q25),
                    format!("{:.2}", s.median),
                    format!("{:.2}", s.q75),
                    format!("{:.2}", s.max),
                ]
            })
            .collect(),
    }
}

/// Summaries written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub games: usize,
    pub aborted: usize,
    pub elo: &'a [EloSummary],
    pub acpl: &'a [AcplSummary],
}

impl Report<'_> {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Where the games of one bucket are appended.
pub fn pgn_path(dir: &Path, bucket: Bucket) -> PathBuf {
    dir.join(format!("games_{bucket}.pgn"))
}

/// Writes `contents` to `dir/name`, creating `dir` first.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, ReportError> {
    let path = dir.join(name);
    let io_err = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    fs::write(&path, contents).map_err(io_err)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Writes `table` as CSV to `dir/name`, creating `dir` first.
pub fn write_csv(dir: &Path, name: &str, table: &Table) -> Result<PathBuf, ReportError> {
    let path = dir.join(name);
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let csv_err = |source| ReportError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut w = csv::Writer::from_path(&path).map_err(csv_err)?;
    w.write_record(&table.header).map_err(csv_err)?;
    for row in &table.rows {
        w.write_record(row).map_err(csv_err)?;
    }
    w.flush().map_err(|e| csv_err(e.into()))?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Print a titled table to stdout
pub fn print_table(title: &str, table: &Table) {
    println!("=== {title} ===");
    if table.rows.is_empty() {
        println!("(no data)");
    } else {
        print!("{}", table.to_text());
    }
    println!();
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod results_tests;
