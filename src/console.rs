use crate::discovery::TestSuite;
use crate::requests::{
    CommandLineOptions, ConsoleFilterFactory, ConsoleTestExecutionRequestFactory,
    TestSessionContext, DISCOVER_TESTS_OPTION_KEY,
};
use crate::runner::reporter::{JsonFormatter, OutputFormat, OutputFormatter, TextFormatter};
use crate::runner::{execute_request, RunnerOptions, SessionOutput};
use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DIAGNOSTIC_ENV: &str = "ATTEST_DIAGNOSTIC";
const DEFAULT_DIAGNOSTIC_DIR: &str = "TestResults";

/// Command line of the console test host.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "attest")]
#[command(about = "Discover and run data-driven unit tests")]
#[command(version)]
pub struct ConsoleOptions {
    /// List discovered tests without running them
    #[arg(long = "list-tests")]
    pub list_tests: bool,

    /// Filter tests by name (exact match or /regex/)
    #[arg(long)]
    pub filter: Option<String>,

    /// Output format
    #[arg(long = "output-format", value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Write a diagnostic log file
    #[arg(long)]
    pub diagnostic: bool,

    /// Directory for diagnostic log files
    #[arg(long = "diagnostic-output-directory", value_name = "DIR")]
    pub diagnostic_output_directory: Option<PathBuf>,
}

impl ConsoleOptions {
    /// Diagnostics are on with `--diagnostic` or a non-empty, non-zero
    /// `ATTEST_DIAGNOSTIC`.
    pub fn diagnostic_enabled(&self) -> bool {
        self.diagnostic
            || std::env::var(DIAGNOSTIC_ENV)
                .map(|v| !v.is_empty() && v != "0")
                .unwrap_or(false)
    }

    pub fn diagnostic_directory(&self) -> PathBuf {
        self.diagnostic_output_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIAGNOSTIC_DIR))
    }
}

impl CommandLineOptions for ConsoleOptions {
    fn is_option_set(&self, key: &str) -> bool {
        match key {
            DISCOVER_TESTS_OPTION_KEY => self.list_tests,
            "filter" => self.filter.is_some(),
            "output-format" => self.output_format != OutputFormat::default(),
            "verbose" => self.verbose,
            "diagnostic" => self.diagnostic_enabled(),
            "diagnostic-output-directory" => self.diagnostic_output_directory.is_some(),
            _ => false,
        }
    }
}

fn diagnostic_file_name() -> String {
    format!(
        "attest_{}.diag",
        chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f")
    )
}

/// Creates `dir` and returns the path of a fresh diagnostic log inside it.
fn prepare_diagnostic_file(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create diagnostic directory: {}", dir.display()))?;
    Ok(dir.join(diagnostic_file_name()))
}

/// Logs to stderr, filtered by `RUST_LOG` (default `warn`). With diagnostics
/// enabled, everything at debug and above also goes to a log file whose path
/// is returned.
pub fn init_logging(options: &ConsoleOptions) -> Result<Option<PathBuf>> {
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let (file_layer, diagnostic_path) = if options.diagnostic_enabled() {
        let path = prepare_diagnostic_file(&options.diagnostic_directory())?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(diagnostic_file_name);
        let appender = tracing_appender::rolling::never(dir, name);
        let layer = fmt::layer()
            .with_writer(appender)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
            .with_filter(LevelFilter::DEBUG);
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        // A subscriber is already installed, e.g. by an embedding host.
        tracing::debug!("Logging already initialized: {}", e);
    }

    if let Some(path) = &diagnostic_path {
        info!(
            "attest v{} diagnostic log: {}",
            env!("CARGO_PKG_VERSION"),
            path.display()
        );
    }
    Ok(diagnostic_path)
}

/// 2 when tests could not be discovered, 1 when any test failed, else 0.
pub fn exit_status(output: &SessionOutput) -> u8 {
    if output.has_discovery_errors() {
        2
    } else if output.has_failures() {
        1
    } else {
        0
    }
}

fn print_output(output: &SessionOutput, options: &ConsoleOptions) {
    let text = TextFormatter {
        verbose: options.verbose,
    };
    match (output, options.output_format) {
        (SessionOutput::Discovered(listing), OutputFormat::Json) => {
            println!("{}", JsonFormatter.format(listing))
        }
        (SessionOutput::Discovered(listing), OutputFormat::Text) => {
            println!("{}", text.format(listing))
        }
        (SessionOutput::Ran(run), OutputFormat::Json) => println!("{}", JsonFormatter.format(run)),
        (SessionOutput::Ran(run), OutputFormat::Text) => {
            println!();
            println!("{}", text.format(run));
        }
    }
}

/// Parses the process arguments and runs the suite.
pub async fn run_console(suite: TestSuite) -> Result<ExitCode> {
    run_console_with(suite, ConsoleOptions::parse()).await
}

pub async fn run_console_with(suite: TestSuite, options: ConsoleOptions) -> Result<ExitCode> {
    run_session(suite, options).await.map(ExitCode::from)
}

async fn run_session(suite: TestSuite, options: ConsoleOptions) -> Result<u8> {
    init_logging(&options).context("Failed to initialize logging")?;

    let session = TestSessionContext::new();
    info!(
        "Starting session {} at {}",
        session.session_id,
        session.started_at.to_rfc3339()
    );

    let filters = ConsoleFilterFactory::new(options.filter.clone());
    let factory = ConsoleTestExecutionRequestFactory::new(&options, &filters);
    let request = match factory.create_request(session) {
        Ok(request) => request,
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", "Error:".red(), e);
            return Ok(2);
        }
    };

    let runner_options = RunnerOptions {
        verbose: options.verbose,
        output_format: options.output_format,
    };
    let output = execute_request(&suite, &request, &runner_options).await;
    print_output(&output, &options);

    Ok(exit_status(&output))
}
