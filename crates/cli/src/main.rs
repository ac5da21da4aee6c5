// volsync - two-sensor cumulative volume monitor
// Fetches both sources' readings, aligns them in time, and flags discrepancies.

mod exit_codes;
mod monitor;
mod present;
mod render;
mod util;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use volsync_align::AlignStrategy;
use volsync_config::{ConfigError, Settings};
use volsync_source::{FileSource, HttpSource, SampleSource};

use exit_codes::{
    config_exit_code, cycle_exit_code, EXIT_ALERT, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};
use monitor::{CycleError, Monitor};

#[derive(Parser)]
#[command(name = "volsync")]
#[command(about = "Align two volume sensors in time and flag discrepancies")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: $VOLSYNC_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every fetch and dropped record
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

/// Output options shared by the one-shot commands
#[derive(clap::Args)]
struct OutputArgs {
    /// Print the full result (rows, summary, chart series) as JSON
    #[arg(long)]
    json: bool,

    /// Also write the table to a CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Exit with code 3 when the discrepancy alert fires
    #[arg(long)]
    fail_on_alert: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the configured endpoint once and print the aligned table
    #[command(after_help = "\
Examples:
  volsync run
  volsync run --url https://script.google.com/macros/s/XYZ/exec --json
  volsync run --csv volumes.csv --fail-on-alert")]
    Run {
        /// Endpoint URL (overrides [source].url)
        #[arg(long, env = "VOLSYNC_URL")]
        url: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Poll the endpoint and redraw on every cycle
    #[command(after_help = "\
Examples:
  volsync watch
  volsync watch --interval 60
  volsync watch --cycles 3 --url http://localhost:8080/exec")]
    Watch {
        /// Endpoint URL (overrides [source].url)
        #[arg(long, env = "VOLSYNC_URL")]
        url: Option<String>,

        /// Seconds between cycles (overrides [poll].interval_secs)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Stop after N cycles (default: run until interrupted)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        cycles: Option<u64>,
    },

    /// Align a snapshot saved as a local JSON file
    #[command(after_help = "\
Examples:
  volsync align snapshot.json
  volsync align snapshot.json --strategy forward_fill
  volsync align snapshot.json --strategy nearest_symmetric --tolerance 30 --json")]
    Align {
        /// JSON file holding an array of sample records
        file: PathBuf,

        /// nearest_forward, nearest_symmetric or forward_fill
        #[arg(long)]
        strategy: Option<AlignStrategy>,

        /// Matching window in seconds for the nearest strategies
        #[arg(long)]
        tolerance: Option<u32>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check the settings file without fetching anything
    Validate,

    /// Write a commented default settings file
    #[command(after_help = "\
Examples:
  volsync init
  volsync init ./volsync.toml")]
    Init {
        /// Destination (default: --config, then $VOLSYNC_CONFIG, then the user config dir)
        path: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  volsync-align ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  volsync-align ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run { url, output } => cmd_run(config, url, output),
        Commands::Watch { url, interval, cycles } => cmd_watch(config, url, interval, cycles),
        Commands::Align {
            file,
            strategy,
            tolerance,
            output,
        } => cmd_align(config, file, strategy, tolerance, output),
        Commands::Validate => cmd_validate(config),
        Commands::Init { path } => cmd_init(config, path),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Io(_) => Some("run `volsync init` to create a settings file".to_string()),
            ConfigError::Parse(_) | ConfigError::Invalid(_) => {
                Some("run `volsync validate` after editing the settings file".to_string())
            }
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }

    fn cycle(err: CycleError) -> Self {
        Self { code: cycle_exit_code(&err), message: err.to_string(), hint: None }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn load_settings(config: Option<&Path>) -> Result<Settings, CliError> {
    let (settings, path) = Settings::load(config).map_err(CliError::config)?;
    match path {
        Some(path) => log::debug!("using settings from {}", path.display()),
        None => log::debug!("using built-in settings"),
    }
    Ok(settings)
}

fn http_source(settings: &Settings, url: Option<String>) -> Result<HttpSource, CliError> {
    let url = match url {
        Some(url) => url,
        None => settings
            .source_url()
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::args("no source URL configured")
                    .with_hint("set [source].url in the settings file, or pass --url")
            })?,
    };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CliError::args(format!("URL must start with http:// or https://, got '{}'", url)));
    }

    let timeout = Duration::from_secs(settings.source.timeout_secs);
    HttpSource::with_timeout(url, timeout).map_err(|e| CliError::io(e.to_string()))
}

fn cmd_run(config: Option<&Path>, url: Option<String>, output: OutputArgs) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let source = http_source(&settings, url)?;
    one_shot(source, &settings, &output)
}

fn cmd_align(
    config: Option<&Path>,
    file: PathBuf,
    strategy: Option<AlignStrategy>,
    tolerance: Option<u32>,
    output: OutputArgs,
) -> Result<(), CliError> {
    let mut settings = load_settings(config)?;
    if let Some(strategy) = strategy {
        settings.align.strategy = strategy;
    }
    if let Some(tolerance) = tolerance {
        settings.align.tolerance_seconds = tolerance;
    }

    if !file.exists() {
        return Err(CliError::args(format!("file not found: {}", file.display())));
    }
    one_shot(FileSource::new(file), &settings, &output)
}

/// One cycle, printed once. Shared by `run` and `align`.
fn one_shot<S: SampleSource>(
    source: S,
    settings: &Settings,
    output: &OutputArgs,
) -> Result<(), CliError> {
    let mut monitor = Monitor::new(source, settings.align.clone());
    let snapshot = match monitor.refresh() {
        Ok(snapshot) => snapshot.clone(),
        Err(e) => return Err(CliError::cycle(e)),
    };
    let result = &snapshot.result;

    if let Some(path) = &output.csv {
        let file = File::create(path)
            .map_err(|e| CliError::io(format!("cannot create {}: {}", path.display(), e)))?;
        let rows = present::table_rows(&result.rows, settings.display.decimals);
        render::write_csv(BufWriter::new(file), &rows, &settings.display)
            .map_err(|e| CliError::io(format!("CSV write error: {}", e)))?;
        log::info!("wrote {} rows to {}", rows.len(), path.display());
    }

    if output.json {
        let doc = render::JsonOutput::new(result, monitor.status(), &settings.display);
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| CliError::io(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json);
    } else {
        print!("{}", render::human(result, monitor.status(), &settings.display));
    }

    if output.fail_on_alert && result.summary.alert {
        let percent = result.summary.discrepancy_percent().unwrap_or_default();
        return Err(CliError {
            code: EXIT_ALERT,
            message: format!(
                "discrepancy {:.2}% exceeds {}%",
                percent, settings.align.alert_threshold_percent
            ),
            hint: None,
        });
    }
    Ok(())
}

fn cmd_watch(
    config: Option<&Path>,
    url: Option<String>,
    interval: Option<u64>,
    cycles: Option<u64>,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let source = http_source(&settings, url)?;
    let interval = Duration::from_secs(interval.unwrap_or(settings.poll.interval_secs));

    log::info!("watching {} every {}s", source.describe(), interval.as_secs());
    let mut monitor = Monitor::new(source, settings.align.clone());
    monitor::watch(
        &mut monitor,
        interval,
        cycles.map(cycle_limit),
        |m, _err| {
            render::clear_screen();
            match m.snapshot() {
                Some(snapshot) => {
                    print!("{}", render::human(&snapshot.result, m.status(), &settings.display))
                }
                None => println!("{}", m.status()),
            }
        },
    );
    Ok(())
}

/// `--cycles` saturates rather than wrapping on narrow `usize` targets.
fn cycle_limit(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn cmd_validate(config: Option<&Path>) -> Result<(), CliError> {
    let (settings, path) = Settings::load(config).map_err(CliError::config)?;
    let origin = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());

    println!("ok: {}", origin);
    println!("  source:    {}", settings.source_url().unwrap_or("(not set)"));
    println!("  interval:  {}s", settings.poll.interval_secs);
    println!(
        "  align:     {} (tolerance {}s, reference {})",
        settings.align.strategy, settings.align.tolerance_seconds, settings.align.reference_source
    );
    println!("  alert:     > {}%", settings.align.alert_threshold_percent);
    Ok(())
}

fn cmd_init(config: Option<&Path>, path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(|| Settings::init_target(config));

    Settings::write_default_file(&path).map_err(|e| {
        CliError::config(e).with_hint("pass a different path, or edit the existing file")
    })?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
