//! Command-line entry point for translation-merge.

use std::fs::OpenOptions;
use std::io::{
    self,
    Write as _,
};
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use clap::{
    Parser,
    Subcommand,
};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use translation_merge::config::{
    ConfigError,
    MergeSettings,
    load_settings,
};
use translation_merge::input::{
    Table,
    TableError,
};
use translation_merge::inspect::{
    InspectError,
    inspect_overlap,
};
use translation_merge::run::{
    discover_beside,
    parent_directory,
};
use translation_merge::{
    MergeRequest,
    RunError,
    RunSummary,
    run_merge,
};

/// Merge translated survey responses into the main dataset
#[derive(Parser, Debug)]
#[command(name = "translation-merge")]
#[command(version)]
struct Cli {
    /// Also write diagnostics to this file
    #[arg(long, global = true, env = "TRANSLATION_MERGE_TRACE_FILE")]
    trace_file: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Merge translated columns into the main dataset
    Merge {
        /// Main dataset (.xlsx or .xls)
        main: PathBuf,

        /// Column to merge (repeatable; defaults to `columns` in .translation-merge.json)
        #[arg(short, long = "column")]
        columns: Vec<String>,

        /// Translation file (repeatable; discovered beside the main file when omitted)
        #[arg(short, long = "translation")]
        translations: Vec<PathBuf>,

        /// Respondent identifier column
        #[arg(long)]
        id_column: Option<String>,

        /// Output file (defaults to `<main stem>_Merged.xlsx`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the columns of the main dataset
    Columns {
        /// Main dataset (.xlsx or .xls)
        main: PathBuf,
    },

    /// List translation files found beside the main dataset
    Discover {
        /// Main dataset (.xlsx or .xls)
        main: PathBuf,
    },

    /// Compare identifiers and columns of a main and a translation file
    Inspect {
        /// Main dataset (.xlsx or .xls)
        main: PathBuf,

        /// Translation file to compare against
        translation: PathBuf,

        /// Count non-blank values of this column among overlapping rows
        #[arg(long)]
        column: Option<String>,

        /// Respondent identifier column
        #[arg(long)]
        id_column: Option<String>,
    },
}

/// Errors that end a command
#[derive(Error, Debug)]
enum CliError {
    /// Settings file unreadable or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Merge run failed
    #[error(transparent)]
    Run(#[from] RunError),

    /// Main dataset unreadable
    #[error(transparent)]
    Table(#[from] TableError),

    /// Overlap inspection failed
    #[error(transparent)]
    Inspect(#[from] InspectError),
}

/// stderr (and optionally a file) subscriber filtered by `RUST_LOG`
fn init_tracing(trace_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    let Some(path) = trace_file else {
        tracing_subscriber::registry().with(filter).with(stderr_layer).init();
        return Ok(None);
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();
    Ok(Some(guard))
}

/// Settings from the main file's directory
fn settings_for(main: &Path) -> Result<MergeSettings, ConfigError> {
    load_settings(&parent_directory(main))
}

/// Runs a subcommand and returns what to print
fn run_command(command: Command) -> Result<String, CliError> {
    match command {
        Command::Merge { main, columns, translations, id_column, output } => {
            let settings = settings_for(&main)?;
            let request = MergeRequest {
                main_path: main,
                translation_paths: (!translations.is_empty()).then_some(translations),
                columns,
                id_column,
                output_path: output,
            };
            let summary = run_merge(&request, &settings)?;
            Ok(render_summary(&summary))
        }
        Command::Columns { main } => {
            let table = Table::load(&main)?;
            Ok(table.column_names().join("\n"))
        }
        Command::Discover { main } => Ok(discover_beside(&main)
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        Command::Inspect { main, translation, column, id_column } => {
            let id_column = match id_column {
                Some(id_column) => id_column,
                None => settings_for(&main)?.id_column,
            };
            let report = inspect_overlap(&main, &translation, &id_column, column.as_deref())?;
            Ok(report.to_string())
        }
    }
}

/// Human-readable summary of a finished merge
fn render_summary(summary: &RunSummary) -> String {
    let mut lines = vec![format!("Merged file: {}", summary.destination.display())];

    for tally in &summary.outcome.tallies {
        lines.push(format!("  {} - {} found, {} not found", tally.column, tally.found, tally.not_found));
    }
    for failure in &summary.outcome.coverage.failures {
        lines.push(format!("Skipped {}: {}", failure.path.display(), failure.message));
    }
    if summary.outcome.is_no_op() {
        lines.push("No translation files were used; merged columns are empty".to_string());
    }
    match &summary.log_error {
        Some(error) => lines.push(format!("Warning: {error}")),
        None => lines.push(format!("Log: {}", summary.log_path.display())),
    }

    lines.join("\n")
}

/// Entry point
fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_tracing(cli.trace_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = writeln!(io::stderr().lock(), "Failed to open trace file: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_command(cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                let _ = writeln!(io::stdout().lock(), "{output}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
