mod config;
mod db;
mod launcher;
mod probe;
mod sink;
mod state;
mod watchdog;

use clap::Parser;
use config::ResurfaceConfig;
use launcher::CommandLauncher;
use probe::PidFileProbe;
use sink::{DbSink, ErrorSink, LogSink};
use state::FileStateSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use watchdog::Watchdog;

/// A supervisor daemon that keeps a monitored app visible: polls once a
/// second whether the app is in the foreground, and once the recorded
/// session state hits the terminal marker, relaunches the app whenever it
/// drops to the background.
#[derive(Parser, Debug)]
#[command(name = "resurface", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "resurface.toml")]
    config: PathBuf,

    /// Pid file of the supervised app (overrides config)
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// Session state file (overrides config)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Poll interval in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Launch command (overrides config)
    #[arg(long)]
    launch_command: Option<String>,

    /// Validate config and print resolved settings, don't run
    #[arg(long)]
    dry_run: bool,

    /// Print recorded scheduling errors from the error database and exit
    #[arg(long)]
    show_errors: bool,

    /// Extra logging (per-tick polling decisions)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "resurface=debug"
    } else {
        "resurface=info"
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.parse().unwrap()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Merge CLI overrides on top of the loaded config.
fn apply_overrides(cli: &Cli, mut config: ResurfaceConfig) -> ResurfaceConfig {
    if let Some(pid_file) = &cli.pid_file {
        config.app.pid_file = pid_file.clone();
    }
    if let Some(state_file) = &cli.state_file {
        config.state.state_file = state_file.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.watchdog.poll_interval_ms = interval_ms;
    }
    if let Some(command) = &cli.launch_command {
        config.app.launch_command = command.clone();
    }
    config
}

/// Handle `resurface --show-errors`.
fn show_errors(config: &ResurfaceConfig) -> Result<(), String> {
    let Some(path) = &config.errors.db_path else {
        println!("No error database configured.");
        return Ok(());
    };
    let conn = db::open_or_create(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let rows = db::list_errors(&conn).map_err(|e| format!("Failed to list errors: {e}"))?;

    if rows.is_empty() {
        println!("No scheduling errors recorded.");
        return Ok(());
    }
    println!("{:<6} {:<22} {:<22} DETAIL", "ID", "CREATED", "KIND");
    println!("{}", "-".repeat(80));
    for row in rows {
        println!("{:<6} {:<22} {:<22} {}", row.id, row.created, row.kind, row.detail);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = config::load(&cli.config)?;
    let config = apply_overrides(&cli, config);

    if cli.show_errors {
        return show_errors(&config);
    }

    if cli.dry_run {
        println!("resurface v{}", env!("CARGO_PKG_VERSION"));
        println!("Config file:     {}", cli.config.display());
        println!("Poll interval:   {}ms", config.watchdog.poll_interval_ms);
        println!("Initial delay:   {}ms", config.watchdog.initial_delay_ms);
        println!("Pid file:        {}", config.app.pid_file.display());
        println!("State file:      {}", config.state.state_file.display());
        println!("Terminal marker: {}", config.state.terminal_marker);
        println!(
            "Launch command:  {} {}",
            config.app.launch_command,
            config.app.launch_args.join(" ")
        );
        match &config.errors.db_path {
            Some(path) => println!("Error database:  {}", path.display()),
            None => println!("Error database:  (log only)"),
        }
        println!("Dry run mode — config validated, not running.");
        return Ok(());
    }

    let probe = Arc::new(PidFileProbe::new(&config.app.pid_file));
    let states = Arc::new(FileStateSource::new(&config.state.state_file));
    let launcher = Arc::new(CommandLauncher::new(
        &config.app.launch_command,
        config.app.launch_args.clone(),
    ));
    let sink: Arc<dyn ErrorSink> = match &config.errors.db_path {
        Some(path) => Arc::new(DbSink::new(path)),
        None => Arc::new(LogSink),
    };

    let mut dog = Watchdog::new(
        Duration::from_millis(config.watchdog.poll_interval_ms),
        Duration::from_millis(config.watchdog.initial_delay_ms),
        config.state.terminal_marker.clone(),
        probe,
        states,
        launcher,
        sink,
    );

    dog.start();
    tracing::info!("resurface running, Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to wait for shutdown signal: {e}"))?;

    tracing::info!("shutdown signal received");
    dog.stop();
    Ok(())
}
