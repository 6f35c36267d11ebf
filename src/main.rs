use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use sheet_config_tools::config::{DEFAULT_CONFIG_FILE, Excludes, RunConfig};
use sheet_config_tools::convert::{Leniency, ShorthandGroups};
use sheet_config_tools::io::export::ExportFormat;
use sheet_config_tools::run::{self, ErrorPolicy, RunReport};
use sheet_config_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let started = Instant::now();
    let mut config = load_config(cli.config.as_deref())?;

    let (args, write) = match cli.command {
        Command::Export(args) => (args, true),
        Command::Check(args) => (args, false),
    };
    args.apply(&mut config);

    let report = run::run_config(&config, write)?;
    print_summary(&report, started.elapsed());
    Ok(())
}

/// An explicit `--config` must exist; otherwise `conf.yaml` is used when
/// present and the defaults when not.
fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                RunConfig::load(default_path)
            } else {
                Ok(RunConfig::default())
            }
        }
    }
}

fn print_summary(report: &RunReport, elapsed: Duration) {
    println!(
        "workbooks: {} read, {} excluded",
        report.files_scanned, report.files_excluded
    );
    println!(
        "sheets: {}/{} converted, {} ignored",
        report.sheets_completed, report.sheets_attempted, report.sheets_ignored
    );
    for failure in &report.failures {
        match &failure.sheet {
            Some(sheet) => println!(
                "skipped {} [{}]: {}",
                failure.file.display(),
                sheet,
                failure.message
            ),
            None => println!("skipped {}: {}", failure.file.display(), failure.message),
        }
    }
    println!("finished in {elapsed:.2?}");
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert configuration workbooks into client and server records."
)]
struct Cli {
    /// YAML run configuration. Defaults to ./conf.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every workbook and write the record files.
    Export(RunArgs),
    /// Convert every workbook without writing anything.
    Check(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory scanned for workbooks.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output serialisation.
    #[arg(long, value_enum)]
    format: Option<FormatKind>,

    /// Directory receiving client records.
    #[arg(long)]
    client: Option<PathBuf>,

    /// Directory receiving server records.
    #[arg(long)]
    server: Option<PathBuf>,

    /// Skip workbooks whose path contains this text. Repeatable.
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// What to do when a sheet fails to convert.
    #[arg(long, value_enum)]
    on_error: Option<OnErrorKind>,

    /// Fail on malformed int, long, float, bool and date cells.
    #[arg(long)]
    strict: bool,

    /// Fail when a pair or triple cell holds more than one group.
    #[arg(long)]
    reject_multiple_groups: bool,
}

impl RunArgs {
    fn apply(self, config: &mut RunConfig) {
        if let Some(input) = self.input {
            config.config.input = input;
        }
        if let Some(format) = self.format {
            config.config.format = format.into();
        }
        if let Some(client) = self.client {
            config.output.client = client;
        }
        if let Some(server) = self.server {
            config.output.server = server;
        }
        if !self.excludes.is_empty() {
            let mut patterns = config.config.excludes.patterns();
            patterns.extend(self.excludes);
            config.config.excludes = Excludes::List(patterns);
        }
        if let Some(on_error) = self.on_error {
            config.engine.on_error = on_error.into();
        }
        if self.strict {
            config.engine.leniency = Leniency::Strict;
        }
        if self.reject_multiple_groups {
            config.engine.shorthand_groups = ShorthandGroups::Reject;
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatKind {
    Json,
    Csv,
    Sql,
}

impl From<FormatKind> for ExportFormat {
    fn from(kind: FormatKind) -> Self {
        match kind {
            FormatKind::Json => ExportFormat::Json,
            FormatKind::Csv => ExportFormat::Csv,
            FormatKind::Sql => ExportFormat::Sql,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OnErrorKind {
    Abort,
    SkipSheet,
}

impl From<OnErrorKind> for ErrorPolicy {
    fn from(kind: OnErrorKind) -> Self {
        match kind {
            OnErrorKind::Abort => ErrorPolicy::Abort,
            OnErrorKind::SkipSheet => ErrorPolicy::SkipSheet,
        }
    }
}
