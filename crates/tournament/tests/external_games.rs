//! Games against scripted UCI subprocesses.
#![cfg(unix)]

use std::collections::VecDeque;
use std::fs;

use chess_core::{Move, MovePolicy, PolicyError, Position, ResourceBudget, parse_uci_move};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;
use tournament::game::{GameMeta, GameResult, GameSettings, run_game};
use tournament::{EngineConfig, ExternalEnginePolicy, NoBook};

/// A `/bin/sh` engine that answers the n-th `go` with the n-th reply.
fn scripted_engine(dir: &TempDir, name: &str, replies: &[&str]) -> EngineConfig {
    let mut arms = String::new();
    for (i, reply) in replies.iter().enumerate() {
        arms.push_str(&format!("      {}) echo \"bestmove {reply}\" ;;\n", i + 1));
    }
    let script = format!(
        r#"n=0
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "id name {name}"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go)
      n=$((n+1))
      case "$n" in
{arms}      esac ;;
    quit) exit 0 ;;
  esac
done
"#
    );
    let path = dir.path().join(format!("{name}.sh"));
    fs::write(&path, script).unwrap();

    let mut cfg = EngineConfig::new(name, "sh");
    cfg.args = vec![path.display().to_string()];
    cfg.handshake_timeout_ms = 2_000;
    cfg.depth_timeout_ms = 2_000;
    cfg
}

struct Scripted(VecDeque<&'static str>);

impl MovePolicy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn propose_move(&mut self, pos: &Position, _budget: ResourceBudget) -> Result<Move, PolicyError> {
        let text = self.0.pop_front().unwrap_or("0000");
        parse_uci_move(pos, text).ok_or_else(|| PolicyError::IllegalMoveProposed {
            policy: "scripted".to_string(),
            text: text.to_string(),
            fen: pos.to_fen(),
        })
    }
}

#[test]
fn test_external_engine_mates_as_black() {
    let dir = TempDir::new().unwrap();
    let mut black =
        ExternalEnginePolicy::start(scripted_engine(&dir, "mater", &["e7e5", "d8h4"])).unwrap();
    let mut white = Scripted(VecDeque::from(["f2f3", "g2g4"]));

    let played = run_game(
        &mut white,
        &mut black,
        &NoBook,
        ResourceBudget::Depth(1),
        &GameSettings::default(),
        GameMeta::default(),
        &mut StdRng::seed_from_u64(0),
    );

    assert_eq!(played.record.result, GameResult::BlackWin);
    assert_eq!(played.record.termination, "checkmate");
    assert_eq!(played.record.black, "mater");
    assert_eq!(played.record.moves.len(), 4);
    assert!(played.failure.is_none());
    assert_eq!(black.supervisor().restarts(), 0);
}

#[test]
fn test_illegal_bestmove_aborts_game() {
    let dir = TempDir::new().unwrap();
    let mut white =
        ExternalEnginePolicy::start(scripted_engine(&dir, "liar", &["e2e5"])).unwrap();
    let mut black = Scripted(VecDeque::new());

    let played = run_game(
        &mut white,
        &mut black,
        &NoBook,
        ResourceBudget::Depth(1),
        &GameSettings::default(),
        GameMeta::default(),
        &mut StdRng::seed_from_u64(0),
    );

    assert_eq!(played.record.result, GameResult::Aborted);
    assert!(played.record.moves.is_empty());
    let failure = played.failure.unwrap();
    assert!(matches!(
        failure.error,
        PolicyError::IllegalMoveProposed { ref text, .. } if text == "e2e5"
    ));
}
