//! SpendScope - federal agency spending explorer
//!
//! A CLI tool that pulls yearly, sub-agency and breakdown spending for
//! federal agencies from the USAspending API and renders reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, unknown agency, etc.)
//!   2 - No data was found for the request

mod analysis;
mod api;
mod cli;
mod commands;
mod config;
mod directory;
mod error;
mod models;
mod purchases;
mod report;

use anyhow::{Context, Result};
use api::{HttpSource, SpendingService};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use directory::{load_agencies, DirectorySource};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general] verbose applies
    let (mut config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("SpendScope v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_origin);
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Request failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .spendscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change the API URL, fiscal years, directory source, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run one command. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let command = args
        .command
        .clone()
        .context("A command is required (try --help)")?;

    let settings = config
        .api
        .service_settings()
        .context("Invalid [api] settings")?;
    let source = HttpSource::new(&config.api.base_url, config.api.timeout())
        .context("Failed to build HTTP client")?;
    info!(
        "Using {} for FY{} (breakdowns FY{})",
        source.base_url(),
        settings.years,
        settings.breakdown_year
    );

    let spinner = if args.quiet {
        None
    } else {
        Some(create_spinner())
    };

    let directory = if matches!(command, Command::Items) {
        directory::AgencyDirectory::default()
    } else {
        let directory_source = DirectorySource::parse(&config.directory.source);
        if let Some(ref spinner) = spinner {
            spinner.set_message(format!("Loading agency directory from {}...", directory_source));
        }
        load_agencies(&directory_source, source.client(), source.base_url())
            .await
            .context("Failed to load the agency directory")?
    };

    if let Some(ref spinner) = spinner {
        spinner.set_message("Fetching spending data...");
    }
    let service = SpendingService::new(source, settings);
    let outcome = commands::build_report(&command, &directory, &service).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let report = match outcome {
        Ok(report) => report,
        Err(e) if e.is_no_data() => {
            warn!("{}", e);
            eprintln!("{}", e);
            return Ok(2);
        }
        Err(e) => return Err(e.into()),
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.general.output {
        Some(ref path) => {
            report::write_report(&output, Path::new(path))?;
            if !args.quiet {
                println!("✅ Report saved to: {}", path);
                println!("   Rows: {}", report.table.len());
                println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
            }
        }
        None => print!("{}", output),
    }

    if report.table.is_empty() && commands::expects_data(&command) {
        eprintln!("{}", report.empty_message);
        return Ok(2);
    }

    Ok(0)
}

fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so it reports where the settings
/// came from instead of logging.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, CONFIG_FILE_NAME.to_string())),
        Ok(None) => Ok((Config::default(), "defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), "defaults".to_string()))
        }
    }
}
