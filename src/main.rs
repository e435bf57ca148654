//! Command-line front end for the raid-queue estimator
//!
//! Each invocation restores saved state, applies one action, saves, and
//! prints the resulting status.
//!
//! Usage:
//!   raid-queue start --size 42 --boss "Mewtwo"
//!   raid-queue update --size 30
//!   raid-queue watch
//!   raid-queue stats --boss "Mewtwo"
//!   raid-queue leave

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use raid_queue::config::AppConfig;
use raid_queue::service::{spawn_status_refresh, QueueService};
use raid_queue::types::{BossStats, QueueStatus, UpdateOutcome};
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Raid Queue - estimate when a raid boss queue reaches you
#[derive(Parser)]
#[command(
    name = "raid-queue",
    version,
    about = "Estimate completion time for a shrinking raid boss queue",
    long_about = "Raid Queue tracks the queue sizes you report, derives a damped \
                 per-person service time, projects when you will reach the front, \
                 and keeps per-boss averages across runs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Data directory override
    #[arg(long, value_name = "DIR", help = "Override directory for saved state")]
    data_dir: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a queue
    Start {
        /// People ahead of you
        #[arg(short, long, allow_hyphen_values = true)]
        size: String,
        /// Boss you are queueing for
        #[arg(short, long)]
        boss: String,
    },
    /// Report the current queue size
    Update {
        /// People ahead of you
        #[arg(short, long, allow_hyphen_values = true)]
        size: String,
    },
    /// Show the current status
    Status,
    /// Show historical averages for a boss
    Stats {
        /// Boss name (defaults to the current queue's boss)
        #[arg(short, long)]
        boss: Option<String>,
    },
    /// Leave the current queue (boss history is kept)
    Leave,
    /// Refresh the status every interval until the queue is no longer active
    Watch,
    /// Delete all saved state, including boss history
    Forget,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file, environment and CLI arguments
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    // Apply CLI overrides
    if let Some(log_level) = &cli.log_level {
        config.service.log_level = log_level.clone();
    }

    if cli.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = Some(data_dir.clone());
    }

    raid_queue::config::validate_config(&config)?;
    Ok(config)
}

fn print_status(status: &QueueStatus) {
    match status {
        QueueStatus::Idle { .. } => {
            println!("💤 No active queue");
        }
        QueueStatus::Completed {
            finish_time_display,
            boss_id,
            ..
        } => {
            println!("✅ Queue completed at {} for {}", finish_time_display, boss_id);
        }
        QueueStatus::Active(active) => {
            println!("⏳ {}", status.message());
            println!("   Raid boss:        {}", active.boss_id);
            println!("   Current size:     {} people", active.current_size);
            println!("   Initial size:     {} people", active.initial_size);
            println!("   Queue started:    {}", active.start_time_display);
            println!("   Current time:     {}", active.now_display);
            println!("   Elapsed:          {}", active.elapsed_display);
            println!(
                "   Time per person:  {} ({} seconds)",
                active.per_unit_estimate_display, active.per_unit_estimate_rounded
            );
            println!("   Remaining:        {}", active.remaining_display);
        }
    }
}

fn print_boss_stats(stats: &BossStats) {
    println!("📊 Previous {} queues", stats.boss_id);
    println!("   Average time per person: {}", stats.average_per_unit_display);
    println!(
        "   Data from {} completed queues ({} started)",
        stats.completed_run_count, stats.total_runs_started
    );
}

/// Refresh the time fields until the queue stops being active or Ctrl+C
async fn watch(service: QueueService, config: &AppConfig) -> Result<()> {
    if !service.status().is_active() {
        print_status(&service.status());
        return Ok(());
    }

    let service = Arc::new(Mutex::new(service));
    let refresh = spawn_status_refresh(service, config.refresh_interval(), |status| {
        match status.as_active() {
            Some(active) => {
                print!(
                    "\r⏳ {} | elapsed {} | remaining {} | {} people  ",
                    status.message(),
                    active.elapsed_display,
                    active.remaining_display,
                    active.current_size
                );
                if let Err(e) = std::io::stdout().flush() {
                    debug!("Failed to flush status line: {}", e);
                }
            }
            None => {
                println!();
                print_status(status);
            }
        }
    });

    tokio::select! {
        result = refresh => {
            let ticks = result?;
            debug!("Status refresh finished after {} ticks", ticks);
        }
        _ = signal::ctrl_c() => {
            println!();
            info!("Stopped watching");
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let mut service = QueueService::from_config(&config)?;

    match cli.command {
        Commands::Start { size, boss } => match service.start_from_input(&size, &boss) {
            Ok(status) => {
                print_status(&status);
                if let Some(stats) = service.boss_stats(None) {
                    print_boss_stats(&stats);
                }
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        },

        Commands::Update { size } => match service.update_from_input(&size) {
            Ok(UpdateOutcome::Status(status)) => print_status(&status),
            Ok(UpdateOutcome::NotActive) => {
                eprintln!("❌ No active queue. Use 'start' first.");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        },

        Commands::Status => print_status(&service.status()),

        Commands::Stats { boss } => match service.boss_stats(boss.as_deref()) {
            Some(stats) => print_boss_stats(&stats),
            None => println!("No completed queues recorded yet."),
        },

        Commands::Leave => {
            service.leave();
            println!("👋 Left the queue");
        }

        Commands::Watch => watch(service, &config).await?,

        Commands::Forget => {
            service.clear_saved_state()?;
            println!("🧹 Saved state cleared");
        }
    }

    Ok(())
}
