//! nano-wait - adaptive wait from the command line
//!
//! # Usage
//!
//! ```bash
//! # Wait "about 2 seconds", sized from current system load
//! nano-wait 2
//!
//! # Fast CI profile, Wi-Fi aware, with a decision breakdown
//! nano-wait 4 --speed fast --profile ci --wifi wlan0 --explain
//!
//! # Minimal adaptive wait
//! nano-wait auto --smart
//!
//! # Forget what was learned for a profile
//! nano-wait --reset-learning --profile rpa
//! ```
//!
//! # Environment Variables
//!
//! - `NANO_WAIT_CONFIG`: Path to a TOML config file
//! - `NANO_WAIT_TELEMETRY`: Set to `0` to disable the local usage log
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use nano_wait::{ProfileRegistry, WaitConfig, WaitEngine, WaitOptions, WaitRequest, WaitResult};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "nano-wait")]
#[command(about = "Adaptive wait sized from live system context")]
#[command(version)]
struct CliArgs {
    /// Requested time in seconds, or "auto" for the minimal adaptive wait
    #[arg(value_name = "TIME")]
    time: Option<String>,

    /// Network (SSID or interface) whose link quality should be considered
    #[arg(long)]
    wifi: Option<String>,

    /// Speed: slow, normal, fast, ultra or a positive number
    #[arg(long)]
    speed: Option<String>,

    /// Derive speed from current context instead of --speed
    #[arg(long)]
    smart: bool,

    /// Execution profile: ci, testing, rpa, default
    #[arg(long)]
    profile: Option<String>,

    /// Print the decision breakdown
    #[arg(long)]
    explain: bool,

    /// Print the explain report as JSON (implies --explain)
    #[arg(long)]
    json: bool,

    /// Collect and print a telemetry summary
    #[arg(long)]
    telemetry: bool,

    /// Log the decision at info level
    #[arg(short, long)]
    verbose: bool,

    /// Forget the learned bias for the selected profile
    #[arg(long)]
    reset_learning: bool,

    /// Config file (overrides NANO_WAIT_CONFIG and ./nano_wait.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(args: &CliArgs) -> Result<()> {
    let writer = match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer);

    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<WaitConfig> {
    let config = match path {
        Some(path) => WaitConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => WaitConfig::load(),
    };
    config.validate().context("Invalid wait configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args)?;

    let config = load_config(args.config.as_ref())?;
    let engine = WaitEngine::from_config(&config);

    let mut options = WaitOptions::from_config(&config)
        .with_smart(args.smart)
        .with_verbose(args.verbose)
        .with_explain(args.explain || args.json);
    options.telemetry |= args.telemetry;
    if let Some(wifi) = &args.wifi {
        options = options.with_wifi(wifi.as_str());
    }
    if let Some(speed) = &args.speed {
        options.speed = speed.parse().unwrap_or_default();
    }
    if let Some(profile) = &args.profile {
        options = options.with_profile(profile.as_str());
    }

    if args.reset_learning {
        let profile = ProfileRegistry.resolve(options.profile.as_deref()).name;
        let existed = engine
            .learning()
            .reset(profile)
            .with_context(|| format!("Failed to reset learning for '{profile}'"))?;
        if existed {
            info!(profile, "Learning state reset");
        } else {
            info!(profile, "No learning state to reset");
        }
        if args.time.is_none() {
            return Ok(());
        }
    }

    let time = args
        .time
        .as_deref()
        .context("Missing TIME argument (seconds or 'auto')")?;
    let request: WaitRequest = time.parse()?;

    let cancel = CancellationToken::new();
    options = options.with_cancel(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, interrupting wait");
            cancel.cancel();
        }
    });

    let outcome = engine.wait(request, &options).await?;

    if let Some(report) = &outcome.report {
        if args.json {
            println!("{}", report.to_json()?);
        } else {
            println!("{report}");
        }
    }
    if let Some(summary) = &outcome.telemetry {
        println!("{}", serde_json::to_string(summary)?);
    }
    if let WaitResult::Waited(seconds) = outcome.result {
        info!(
            waited = seconds,
            elapsed = ?outcome.elapsed,
            profile = %outcome.decision.profile,
            "Wait complete"
        );
    }

    Ok(())
}
