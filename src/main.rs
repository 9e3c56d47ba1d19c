//! herakles-system-monitor
//!
//! Headless live sampler with tracing logging. This is the main entry point
//! that runs the sampling loop and handles subcommands.

use clap::Parser;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};

use herakles_system_monitor::cli::{Args, Commands, LogLevel};
use herakles_system_monitor::commands::{
    command_check, command_config, command_sample, render_summary,
};
use herakles_system_monitor::console::spawn_console;
use herakles_system_monitor::config::{
    resolve_config, show_config, validate_effective_config, Config,
};
use herakles_system_monitor::{Monitor, ProcSources, SnapshotCell, UiCommand};

/// Processes listed by the console renderer.
const RENDER_TOP: usize = 10;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let level = match config.logging.level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {:?}", config.logging.level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}

/// Drives the monitor at the configured frame rate and publishes a snapshot
/// after every frame in which a timeline ticked.
async fn run_sampler(
    mut monitor: Monitor<ProcSources>,
    cell: Arc<SnapshotCell>,
    mut commands: mpsc::UnboundedReceiver<UiCommand>,
    frame_rate: u32,
) {
    let mut ticker = time::interval(Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last);
        last = now;

        while let Ok(cmd) = commands.try_recv() {
            monitor.apply(cmd);
        }

        // counter reads are small blocking file reads
        let plan = tokio::task::block_in_place(|| monitor.frame(dt));
        if plan.data || plan.graph {
            cell.publish(monitor.snapshot());
        }
    }
}

/// Prints the latest snapshot once per data interval.
async fn run_renderer(cell: Arc<SnapshotCell>, every: Duration) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seen = u64::MAX;

    loop {
        ticker.tick().await;
        let snapshot = cell.load();
        if snapshot.data_ticks == seen {
            continue;
        }
        seen = snapshot.data_ticks;
        println!("{}", render_summary(&snapshot, RENDER_TOP));
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Config generation does not need a valid effective config
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), *format, *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    if let Some(command) = &args.command {
        let result = match command {
            Commands::Check { proc, sensors, all } => command_check(*proc, *sensors, *all, &config),
            Commands::Sample {
                iterations,
                interval_ms,
                top,
                format,
                verbose,
            } => command_sample(*iterations, *interval_ms, *top, *format, *verbose, &config),
            Commands::Config { .. } => Ok(()),
        };
        if let Err(e) = result {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting herakles-system-monitor");

    let sources = match ProcSources::open(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("❌ Startup failed: {}", e);
            return Err(e.into());
        }
    };
    let monitor = match Monitor::new(sources, &config) {
        Ok(m) => m,
        Err(e) => {
            error!("❌ Startup failed: {}", e);
            return Err(e.into());
        }
    };

    let cell = Arc::new(SnapshotCell::new(monitor.snapshot()));
    let (tx, rx) = mpsc::unbounded_channel();

    let sampler = tokio::spawn(run_sampler(monitor, cell.clone(), rx, config.refresh.frame_rate));
    let renderer = tokio::spawn(run_renderer(
        cell,
        Duration::from_millis(config.refresh.data_interval_ms),
    ));
    // stdin reads block; a detached thread never holds up runtime shutdown
    if let Err(e) = spawn_console(io::BufReader::new(io::stdin()), tx) {
        warn!("Console commands disabled: {}", e);
    }

    info!(
        "Sampling at {} frames/s, data every {}ms; type 'filter <text>', 'select <pid>', 'clear', 'animate on|off', 'fps <n>' or 'yscale <n>'",
        config.refresh.frame_rate, config.refresh.data_interval_ms
    );

    shutdown_signal().await;

    sampler.abort();
    renderer.abort();
    info!("Shutdown complete");
    Ok(())
}
