//! Tournament CLI
//!
//! Play engine tournaments, then rate and analyse the recorded games.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tournament::acpl::{self, AcplSummary, GameAccuracy};
use tournament::config::{AcplConfig, CompetitorConfig, EvaluatorKind, TournamentConfig};
use tournament::elo::{self, Bucket, EloConfig, EloSummary};
use tournament::game::{GameRecord, GameSettings};
use tournament::opening::{NoBook, OpeningBook, OpeningSource};
use tournament::record::{RecordError, append_record, read_records};
use tournament::results::{self, Report};
use tournament::scheduler::{Scheduler, SchedulerSettings, TaskReport, schedule};
use tournament::supervisor::EngineConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the tournament described by a TOML file
    Run(RunArgs),
    /// Estimate Elo from recorded games
    Elo(EloArgs),
    /// Measure average centipawn loss of recorded games
    Acpl(AcplArgs),
    /// Print and write the per-game and score tables of recorded games
    Results(ResultsArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Tournament configuration file
    config: PathBuf,

    /// Override the number of game workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Override the random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip ACPL analysis even if configured
    #[arg(long)]
    no_acpl: bool,
}

#[derive(Args, Debug)]
struct EloArgs {
    /// Recorded games (PGN)
    #[arg(required = true)]
    games: Vec<PathBuf>,

    /// Number of Monte Carlo folds
    #[arg(short, long, default_value_t = elo::DEFAULT_FOLDS)]
    folds: usize,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = elo::INITIAL_ELO)]
    initial: f64,

    #[arg(short, long, default_value_t = elo::K_FACTOR)]
    k: f64,

    /// Replay games in file order instead of shuffling
    #[arg(long)]
    no_shuffle: bool,

    /// Write elo.csv and summary.json here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AcplArgs {
    /// Recorded games (PGN)
    #[arg(required = true)]
    games: Vec<PathBuf>,

    /// Analysis depth in plies
    #[arg(short, long, default_value_t = 8)]
    depth: u8,

    /// Analysis workers
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// UCI engine to analyse with instead of the built-in searcher
    #[arg(long, conflicts_with = "weights")]
    engine: Option<PathBuf>,

    /// Network weights for the built-in searcher
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Write acpl_games.csv and acpl.csv here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResultsArgs {
    /// Recorded games (PGN)
    #[arg(required = true)]
    games: Vec<PathBuf>,

    /// Write raw.csv and scores.csv here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Elo(args) => elo_command(args),
        Command::Acpl(args) => acpl_command(args),
        Command::Results(args) => results_command(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = TournamentConfig::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.no_acpl {
        config.acpl = None;
    }
    config.validate()?;

    let book: Box<dyn OpeningSource> = match &config.book {
        Some(path) => {
            let book = OpeningBook::load(path)
                .with_context(|| format!("Failed to load opening book: {}", path.display()))?;
            log::info!("opening book {}: {} lines", path.display(), book.len());
            Box::new(book)
        }
        None => Box::new(NoBook),
    };

    let dir = config.output_dir.clone();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output dir: {}", dir.display()))?;
    for &budget in &config.budgets {
        let path = results::pgn_path(&dir, Bucket::Budget(budget));
        fs::write(&path, "").with_context(|| format!("Failed to reset {}", path.display()))?;
    }

    let tasks = schedule(config.competitors.len(), &config.budgets, config.repetitions);
    log::info!(
        "{} competitors, {} budgets, {} games on {} workers",
        config.competitors.len(),
        config.budgets.len(),
        tasks.len(),
        config.workers
    );

    let settings = SchedulerSettings {
        workers: config.workers,
        seed: config.seed,
        game: GameSettings {
            book_ply_limit: config.book_plies,
        },
    };
    let scheduler = Scheduler::new(&config, book.as_ref(), settings);

    let mut write_error: Option<RecordError> = None;
    let reports = scheduler.run(tasks, |report| match report {
        TaskReport::Played(game) => {
            let path = results::pgn_path(&dir, Bucket::Budget(game.record.budget));
            if let Err(e) = append_record(&path, &game.record) {
                log::error!("{e}");
                write_error.get_or_insert(e);
            }
        }
        TaskReport::Failed {
            task, competitor, ..
        } => log::warn!("game {} not played: {competitor} is unavailable", task.id),
    });
    if let Some(e) = write_error {
        return Err(e).context("Failed to record games");
    }

    let mut records: Vec<GameRecord> = reports
        .into_iter()
        .filter_map(|r| match r {
            TaskReport::Played(game) => Some(game.record),
            TaskReport::Failed { .. } => None,
        })
        .collect();
    records.sort_by_key(|r| r.id);

    let elo_rows = elo::estimate(&elo::outcomes(&records), &config.elo_config());
    let accuracy = match &config.acpl {
        Some(acpl) => Some(analyse(&records, acpl, config.seed)?),
        None => None,
    };

    write_report(&dir, &records, &elo_rows, accuracy.as_deref())
}

fn analyse(records: &[GameRecord], cfg: &AcplConfig, seed: u64) -> Result<Vec<GameAccuracy>> {
    log::info!(
        "analysing {} games at depth {} with {}",
        records.len(),
        cfg.depth,
        cfg.analyzer.name()
    );
    let factory = || cfg.analyzer.build_analyzer(seed);
    acpl::analyse_records(records, &factory, cfg.depth, cfg.workers)
        .context("Failed to start the analyzer")
}

fn write_report(
    dir: &Path,
    records: &[GameRecord],
    elo_rows: &[EloSummary],
    accuracy: Option<&[GameAccuracy]>,
) -> Result<()> {
    let raw = results::raw_table(records);
    let scores = results::score_table(records);
    let elo_table = results::elo_table(elo_rows);
    results::write_csv(dir, "raw.csv", &raw)?;
    results::write_csv(dir, "scores.csv", &scores)?;
    results::write_csv(dir, "elo.csv", &elo_table)?;
    results::print_table("Scores", &scores);
    results::print_table("Elo", &elo_table);

    let acpl_rows: Vec<AcplSummary> = match accuracy {
        Some(games) => {
            let rows = acpl::summarize(games);
            let summary = results::acpl_summary_table(&rows);
            results::write_csv(dir, "acpl_games.csv", &results::game_acpl_table(games))?;
            results::write_csv(dir, "acpl.csv", &summary)?;
            results::print_table("ACPL", &summary);
            rows
        }
        None => Vec::new(),
    };

    let report = Report {
        games: records.len(),
        aborted: records.iter().filter(|r| r.is_aborted()).count(),
        elo: elo_rows,
        acpl: &acpl_rows,
    };
    results::write_file(dir, "summary.json", &report.to_json()?)?;
    Ok(())
}

fn load_games(paths: &[PathBuf]) -> Result<Vec<GameRecord>> {
    let mut records = Vec::new();
    for path in paths {
        let mut games = read_records(path)
            .with_context(|| format!("Failed to read games: {}", path.display()))?;
        log::info!("{}: {} games", path.display(), games.len());
        records.append(&mut games);
    }
    Ok(records)
}

fn elo_command(args: EloArgs) -> Result<()> {
    if args.folds == 0 {
        bail!("--folds must be at least 1");
    }
    let records = load_games(&args.games)?;
    let cfg = EloConfig {
        initial: args.initial,
        k: args.k,
        folds: args.folds,
        seed: args.seed,
        shuffle: !args.no_shuffle,
    };
    let rows = elo::estimate(&elo::outcomes(&records), &cfg);
    let table = results::elo_table(&rows);
    results::print_table("Elo", &table);

    if let Some(dir) = args.output {
        results::write_csv(&dir, "elo.csv", &table)?;
        let report = Report {
            games: records.len(),
            aborted: records.iter().filter(|r| r.is_aborted()).count(),
            elo: &rows,
            acpl: &[],
        };
        results::write_file(&dir, "summary.json", &report.to_json()?)?;
    }
    Ok(())
}

fn acpl_command(args: AcplArgs) -> Result<()> {
    let records = load_games(&args.games)?;
    let analyzer = match (args.engine, args.weights) {
        (Some(path), _) => CompetitorConfig::External(EngineConfig::new("analyzer", path)),
        (None, weights) => CompetitorConfig::Search {
            name: "analyzer".to_string(),
            evaluator: if weights.is_some() {
                EvaluatorKind::Network
            } else {
                EvaluatorKind::Material
            },
            weights,
        },
    };
    let cfg = AcplConfig {
        depth: args.depth.max(1),
        workers: args.workers.max(1),
        analyzer,
    };

    let games = analyse(&records, &cfg, 0)?;
    let rows = acpl::summarize(&games);
    let summary = results::acpl_summary_table(&rows);
    results::print_table("ACPL", &summary);

    if let Some(dir) = args.output {
        results::write_csv(&dir, "acpl_games.csv", &results::game_acpl_table(&games))?;
        results::write_csv(&dir, "acpl.csv", &summary)?;
    }
    Ok(())
}

fn results_command(args: ResultsArgs) -> Result<()> {
    let records = load_games(&args.games)?;
    let raw = results::raw_table(&records);
    let scores = results::score_table(&records);
    results::print_table("Games", &raw);
    results::print_table("Scores", &scores);

    if let Some(dir) = args.output {
        results::write_csv(&dir, "raw.csv", &raw)?;
        results::write_csv(&dir, "scores.csv", &scores)?;
    }
    Ok(())
}
