//! `duty-board`: show and update the duty rota from the command line.
//!
//! usage: duty-board [--config <path>] [--log <path>]
//!                   [queue|schedule|done|absent|import-legacy <json>|verify]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use duty_rotation_kernel::RotationEngine;
use duty_rotation_runtime::convergence::{verify_determinism, ConvergenceError};
use duty_rotation_runtime::legacy::import_legacy;
use duty_rotation_runtime::settings::{DEFAULT_LOG_PATH, DEFAULT_SETTINGS_PATH};
use duty_rotation_runtime::{
    BoardError, DutyBoard, EventLog, FileEventLog, ImportError, LogError, Settings,
    SettingsError, SystemClock,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Queue,
    Schedule,
    Done,
    Absent,
    ImportLegacy(PathBuf),
    Verify,
    Help,
}

#[derive(Debug)]
struct Cli {
    config: PathBuf,
    log: PathBuf,
    command: Command,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = parse_args(&args).and_then(run) {
        eprintln!("duty-board failed: {e}");
        if matches!(e, CliError::Usage(_)) {
            print_usage();
        }
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Cli, CliError> {
    let mut config = PathBuf::from(DEFAULT_SETTINGS_PATH);
    let mut log = PathBuf::from(DEFAULT_LOG_PATH);
    let mut words = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = flag_value(&mut iter, "--config")?,
            "--log" => log = flag_value(&mut iter, "--log")?,
            _ => words.push(arg.as_str()),
        }
    }

    let command = match words.as_slice() {
        [] | ["queue"] => Command::Queue,
        ["schedule"] => Command::Schedule,
        ["done"] => Command::Done,
        ["absent"] => Command::Absent,
        ["import-legacy", path] => Command::ImportLegacy(PathBuf::from(*path)),
        ["import-legacy"] => {
            return Err(CliError::Usage(
                "import-legacy requires a JSON file path".to_owned(),
            ))
        }
        ["verify"] => Command::Verify,
        ["help"] | ["--help"] | ["-h"] => Command::Help,
        [other, ..] => {
            return Err(CliError::Usage(format!(
                "unknown command `{other}` (use queue|schedule|done|absent|import-legacy|verify)"
            )))
        }
    };

    Ok(Cli {
        config,
        log,
        command,
    })
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<PathBuf, CliError> {
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| CliError::Usage(format!("{flag} requires a path")))
}

fn run(cli: Cli) -> Result<(), CliError> {
    if cli.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = Settings::load_or_default(&cli.config)?.into_config()?;
    let engine = RotationEngine::new(config);
    let log: Arc<dyn EventLog> = Arc::new(FileEventLog::open(&cli.log)?);

    match cli.command {
        Command::ImportLegacy(path) => {
            let json = fs::read_to_string(&path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            let report = import_legacy(&*log, &json)?;
            println!(
                "imported {} completions and {} absences, skipped {} rows, realigned {} slot ids",
                report.completions, report.absences, report.skipped, report.realigned
            );
            Ok(())
        }
        Command::Verify => {
            let events = log.list_all()?;
            let hash = verify_determinism(&engine, &events)?;
            println!("{} events, canonical hash {hash}", events.len());
            Ok(())
        }
        command => {
            let mut board = DutyBoard::open(engine, log, Arc::new(SystemClock))?;
            match command {
                Command::Done => {
                    let envelope = board.complete_current_turn()?;
                    println!("recorded: {} did the duty", envelope.event.participant());
                }
                Command::Absent => {
                    let envelope = board.report_current_absence()?;
                    println!("recorded: {} is absent", envelope.event.participant());
                }
                Command::Schedule => {
                    print_schedule(&board);
                    return Ok(());
                }
                _ => {}
            }
            print_queue(&board);
            Ok(())
        }
    }
}

fn print_queue(board: &DutyBoard) {
    let queue = board.active_queue();
    if queue.is_empty() {
        println!("no pending turns from {}", board.today());
        return;
    }
    for (i, slot) in queue.iter().enumerate() {
        let marker = if i == 0 { "->" } else { "  " };
        let note = if slot.is_reassigned() {
            format!(" (covering for {})", slot.nominal_assignee)
        } else {
            String::new()
        };
        println!(
            "{marker} {}  {}{note}",
            slot.date.format("%d/%m"),
            slot.effective_assignee
        );
    }
}

fn print_schedule(board: &DutyBoard) {
    let today = board.today();
    for slot in &board.view().slots {
        let status = if slot.completed {
            "done"
        } else if slot.date < today {
            "missed"
        } else {
            "pending"
        };
        println!(
            "{}  {:<12} {:<12} {:<8} absences={}",
            slot.date, slot.nominal_assignee, slot.effective_assignee, status, slot.absences
        );
    }
}

fn print_usage() {
    println!(
        "usage: duty-board [--config <path>] [--log <path>] \
         <queue|schedule|done|absent|import-legacy <json>|verify>"
    );
}
