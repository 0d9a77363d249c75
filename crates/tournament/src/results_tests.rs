use super::*;
use crate::acpl::{MoveLoss, summarize};
use crate::game::GameResult;
use chess_core::ResourceBudget;
use std::time::Duration;
use tempfile::TempDir;

fn game(white: &str, black: &str, result: GameResult, budget: ResourceBudget) -> GameRecord {
    GameRecord {
        id: 0,
        round: 0,
        white: white.to_string(),
        black: black.to_string(),
        budget,
        moves: Vec::new(),
        result,
        termination: String::new(),
        date: "2026.10.16".to_string(),
        book_plies: 0,
    }
}

/// Writes `table` through the CSV writer and reads the file back.
fn csv_text(table: &Table) -> String {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "table.csv", table).unwrap();
    fs::read_to_string(path).unwrap()
}

fn games() -> Vec<GameRecord> {
    let d1 = ResourceBudget::Depth(1);
    let fast = ResourceBudget::Time(Duration::from_millis(100));
    vec![
        game("a", "b", GameResult::WhiteWin, d1),
        game("b", "a", GameResult::Draw, d1),
        game("a", "b", GameResult::BlackWin, fast),
        game("b", "a", GameResult::Aborted, fast),
    ]
}

#[test]
fn test_raw_table_lists_every_game() {
    let csv = csv_text(&raw_table(&games()));
    assert_eq!(
        csv,
        "White,Black,Result,Limit\n\
         a,b,1-0,d1\n\
         b,a,1/2-1/2,d1\n\
         a,b,0-1,0.1s\n\
         b,a,*,0.1s\n"
    );
}

#[test]
fn test_score_table_skips_aborted_games() {
    let table = score_table(&games());
    assert_eq!(
        table.rows,
        vec![
            vec!["a", "1.5", "d1"],
            vec!["b", "0.5", "d1"],
            vec!["a", "0.0", "0.1s"],
            vec!["b", "1.0", "0.1s"],
            vec!["a", "1.5", "all"],
            vec!["b", "1.5", "all"],
        ]
    );
}

#[test]
fn test_game_acpl_table_marks_missing_side() {
    let acc = GameAccuracy {
        game_id: 4,
        white: "a".to_string(),
        black: "b".to_string(),
        bucket: Bucket::Budget(ResourceBudget::Depth(2)),
        samples: vec![
            MoveLoss {
                ply: 1,
                mover: Color::White,
                loss: 10.0,
            },
            MoveLoss {
                ply: 3,
                mover: Color::White,
                loss: 25.0,
            },
        ],
        skipped: 1,
    };
    let csv = csv_text(&game_acpl_table(&[acc.clone()]));
    assert_eq!(
        csv,
        "GameIndex,White,Black,White_ACPL,Black_ACPL,Limit\n4,a,b,17.50,-,d2\n"
    );

    let summary = acpl_summary_table(&summarize(&[acc]));
    assert_eq!(summary.rows.len(), 4);
    assert!(summary.rows.iter().all(|r| r[0] == "a" && r[4] == "17.50"));
}

#[test]
fn test_elo_table_formats_ratings() {
    let rows = vec![EloSummary {
        bucket: Bucket::All,
        competitor: "a".to_string(),
        mean: 1010.666,
        std: 0.0,
        min: 1010.666,
        max: 1010.666,
        folds: 1,
    }];
    assert_eq!(
        csv_text(&elo_table(&rows)),
        "Engine,Limit,Mean_Elo,Std_Elo,Min_Elo,Max_Elo\na,all,1010.67,0.00,1010.67,1010.67\n"
    );
}

#[test]
fn test_csv_quotes_awkward_cells() {
    let table = Table {
        header: vec!["Engine"],
        rows: vec![vec!["say \"hi\", ok".to_string()]],
    };
    assert_eq!(csv_text(&table), "Engine\n\"say \"\"hi\"\", ok\"\n");
}

#[test]
fn test_text_table_aligns_columns() {
    let table = Table {
        header: vec!["Engine", "Score"],
        rows: vec![
            vec!["a".to_string(), "1.5".to_string()],
            vec!["longer".to_string(), "0.5".to_string()],
        ],
    };
    let text = table.to_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Engine  Score");
    assert_eq!(lines[1], "-".repeat(13));
    assert_eq!(lines[2], "a       1.5");
    assert_eq!(lines[3], "longer  0.5");
}

#[test]
fn test_report_json_and_files() {
    let dir = TempDir::new().unwrap();
    let report = Report {
        games: 4,
        aborted: 1,
        elo: &[],
        acpl: &[],
    };
    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["games"], 4);
    assert_eq!(value["aborted"], 1);

    let out = dir.path().join("nested");
    let path = write_file(&out, "summary.json", &json).unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), json);

    assert_eq!(
        pgn_path(&out, Bucket::Budget(ResourceBudget::Depth(3))),
        out.join("games_d3.pgn")
    );
}
