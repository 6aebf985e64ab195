use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lockaudit::{
    config::Config,
    pipeline::{self, AuditOptions},
    registry::{AdvisoryStrategy, RegistryClient},
    report::{print_table, ReportFormat},
    SecurityFlag,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const ADVISORIES_FOUND: u8 = 2;
}

#[derive(Parser)]
#[command(name = "lockaudit")]
#[command(
    author,
    version,
    about = "Audit yarn lockfiles for outdated and vulnerable dependencies"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a lockfile, query the registry and write a report
    Analyze {
        /// yarn.lock to parse; omit to analyze an existing manifest
        lockfile: Option<PathBuf>,

        /// Intermediate manifest path
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Report output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format (csv, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Advisory lookup strategy (bulk, per-package)
        #[arg(long)]
        strategy: Option<String>,

        /// Registry base URL
        #[arg(long)]
        registry: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Delay between version lookups in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Also print the report as a table
        #[arg(long)]
        print: bool,

        /// Exit with code 2 if any dependency has open advisories
        #[arg(long)]
        fail_on_advisory: bool,
    },

    /// Parse a lockfile and write the dependency manifest only
    Manifest {
        /// yarn.lock to parse
        lockfile: PathBuf,

        /// Manifest output path
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Settings for an analyze run after applying flag overrides.
struct AnalyzeArgs {
    lockfile: Option<PathBuf>,
    manifest: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
    strategy: Option<String>,
    registry: Option<String>,
    timeout: Option<u64>,
    delay_ms: Option<u64>,
    print: bool,
    fail_on_advisory: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            lockfile,
            manifest,
            output,
            format,
            strategy,
            registry,
            timeout,
            delay_ms,
            print,
            fail_on_advisory,
        } => {
            let config = Config::load()?;
            run_analyze(
                config,
                AnalyzeArgs {
                    lockfile,
                    manifest,
                    output,
                    format,
                    strategy,
                    registry,
                    timeout,
                    delay_ms,
                    print,
                    fail_on_advisory,
                },
            )
            .await
        }
        Commands::Manifest { lockfile, manifest } => {
            let config = Config::load()?;
            let manifest_path = manifest.unwrap_or(config.manifest_path);
            let count = pipeline::generate_manifest(&lockfile, &manifest_path)?;
            println!("Generated {}", manifest_path.display());
            info!(dependencies = count, "manifest written");
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

async fn run_analyze(mut config: Config, args: AnalyzeArgs) -> Result<u8> {
    if let Some(format) = args.format {
        config.report_format = ReportFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(strategy) = args.strategy {
        config.advisory_strategy =
            AdvisoryStrategy::from_str(&strategy).map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(registry) = args.registry {
        config.registry_url = registry;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.rate_limit_ms = delay_ms;
    }

    let options = AuditOptions {
        lockfile: args.lockfile,
        manifest_path: args.manifest.unwrap_or(config.manifest_path.clone()),
        output_path: args.output.unwrap_or(config.output_path.clone()),
        format: config.report_format,
    };

    let client = RegistryClient::new(config.registry_config())?;
    let progress = lookup_progress();

    let outcome = pipeline::run_audit(&options, &client, &progress).await?;

    if args.print {
        print_table(&outcome.rows);
        println!();
    }
    println!(
        "Analysis complete. Results saved to {}",
        outcome.output_path.display()
    );

    let has_advisories = outcome
        .rows
        .iter()
        .any(|row| row.security_issues == SecurityFlag::Yes);
    if args.fail_on_advisory && has_advisories {
        return Ok(exit_codes::ADVISORIES_FOUND);
    }
    Ok(exit_codes::SUCCESS)
}

/// Progress bar for registry lookups; hidden when stderr is not a terminal.
fn lookup_progress() -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let path = Config::config_path();
    if show_path {
        println!("{}", path.display());
    } else if init {
        init_config(&path)?;
    } else {
        show_effective_config(&path)?;
    }
    Ok(())
}

/// Writes the default settings unless a config file is already there.
fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Leaving existing settings in {} untouched", path.display());
        return Ok(());
    }

    let config = Config::default();
    config.save_to(path)?;
    println!("Wrote default settings to {}", path.display());
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Prints the settings an `analyze` run would start from, before flag
/// overrides.
fn show_effective_config(path: &Path) -> Result<()> {
    let config = Config::load_from(path)?;
    if path.exists() {
        println!("# settings loaded from {}", path.display());
    } else {
        println!("# built-in defaults; `lockaudit config --init` writes them to");
        println!("# {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
