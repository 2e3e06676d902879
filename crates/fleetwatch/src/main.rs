//! `fleetwatch` - CLI for the fleet flight aggregator
//!
//! This binary is a thin terminal front-end over the fetch pipeline: it
//! triggers refreshes, and prints whatever records and metrics were last
//! published.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use fleetwatch::cli::{
    Cli, Command, ConfigCommand, FetchCommand, FleetCommand, WatchCommand, WatchInput,
};
use fleetwatch::{
    init_logging, Config, DashboardSnapshot, OpenSkySource, RateSetting, RefreshController,
    RefreshOutcome, Scheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config commands load the file themselves so `validate` can report on it
    match cli.command {
        Command::Fetch(fetch_cmd) => handle_fetch(&load_config(cli.config)?, &fetch_cmd).await,
        Command::Watch(watch_cmd) => handle_watch(&load_config(cli.config)?, &watch_cmd).await,
        Command::Fleet(fleet_cmd) => handle_fleet(&load_config(cli.config)?, &fleet_cmd),
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(path).context("loading configuration")
}

fn build_controller(config: &Config, rate_override: Option<&str>) -> anyhow::Result<RefreshController> {
    let source = OpenSkySource::new(&config.source_settings())?;
    let scheduler = Scheduler::new(Arc::new(source))
        .with_spacing(config.request_spacing())
        .with_window_span(config.window_span());

    let rate = Arc::new(RateSetting::new(config.revenue.per_flight));
    if let Some(input) = rate_override {
        if !rate.set_from_str(input) {
            warn!("Ignoring invalid --rate '{input}', using {}", rate.get());
        }
    }

    Ok(RefreshController::new(scheduler, config.registry(), rate))
}

async fn handle_fetch(config: &Config, cmd: &FetchCommand) -> anyhow::Result<()> {
    let controller = build_controller(config, cmd.rate.as_deref())?;

    if let RefreshOutcome::Failed(reason) = controller.refresh().await {
        bail!("refresh failed: {reason}");
    }

    let snapshot = controller.snapshot(Local::now());
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_dashboard(&snapshot);
    }
    Ok(())
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let controller = build_controller(config, cmd.rate.as_deref())?;
    let ticker = controller.start_clock(config.clock_tick());
    let mut clock = ticker.subscribe();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Commands: <enter> or r = refresh, rate <amount>, q = quit");
    spawn_refresh(&controller, &done_tx);
    println!("Fetching...");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match WatchInput::parse(&line) {
                    WatchInput::Refresh => {
                        spawn_refresh(&controller, &done_tx);
                    }
                    WatchInput::Rate(input) => {
                        if controller.set_rate(&input) {
                            print_dashboard(&controller.snapshot(ticker.now()));
                        } else {
                            println!("Invalid rate '{input}', keeping {}", controller.rate());
                        }
                    }
                    WatchInput::Quit => break,
                    WatchInput::Unknown(other) => {
                        println!("Unknown command '{other}'");
                    }
                }
            }
            Some(outcome) = done_rx.recv() => match outcome {
                RefreshOutcome::Completed(_) => print_dashboard(&controller.snapshot(ticker.now())),
                RefreshOutcome::Ignored => println!("A refresh is already running."),
                RefreshOutcome::Failed(reason) => {
                    println!("Refresh failed ({reason}); showing previous results.");
                }
            },
            Ok(()) = clock.changed() => {
                let now = *clock.borrow_and_update();
                let status = if controller.is_fetching() { "fetching" } else { "idle" };
                println!("[{}] {status}", now.format("%H:%M"));
            }
        }
    }

    ticker.stop();
    Ok(())
}

fn spawn_refresh(controller: &RefreshController, done: &mpsc::UnboundedSender<RefreshOutcome>) {
    let controller = controller.clone();
    let done = done.clone();
    tokio::spawn(async move {
        let outcome = controller.refresh().await;
        let _ = done.send(outcome);
    });
}

fn print_dashboard(snapshot: &DashboardSnapshot) {
    println!();
    println!("Fleet activity at {}", snapshot.current_time.format("%Y-%m-%d %H:%M"));
    println!("Last updated:  {}", format_updated(snapshot.last_updated));
    if snapshot.fetching {
        println!("Status:        fetching...");
    }
    println!();

    if snapshot.records.is_empty() {
        println!("No flights in the last window.");
    } else {
        println!(
            "{:<8} {:<9} {:<5} {:<5} {:<10} {:<5} {:>9}",
            "TAIL", "CALLSIGN", "FROM", "TO", "DATE", "TIME", "DURATION"
        );
        for record in &snapshot.records {
            println!(
                "{:<8} {:<9} {:<5} {:<5} {:<10} {:<5} {:>9}",
                record.tail_number,
                record.callsign_label(),
                record.departure_label(),
                record.arrival_label(),
                record.departure_date(),
                record.departure_time(),
                record.duration().to_string(),
            );
        }
    }

    println!();
    println!("Flights:             {}", snapshot.metrics.flight_count);
    println!("Revenue per flight:  {}", snapshot.metrics.revenue_per_flight);
    println!(
        "Estimated revenue:   {}",
        snapshot.metrics.total_revenue.round_dp(2)
    );

    for source in snapshot.sources.iter().filter(|s| s.outcome.is_failure()) {
        println!("  ! {} ({}): {}", source.tail_number, source.tracker_id, source.outcome);
    }
}

fn format_updated(last_updated: Option<DateTime<Utc>>) -> String {
    last_updated.map_or_else(
        || "never".to_string(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn handle_fleet(config: &Config, cmd: &FleetCommand) -> anyhow::Result<()> {
    let registry = config.registry();
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(registry.entries())?);
    } else {
        println!("{:<8} TRACKER ID", "TAIL");
        for entry in registry.entries() {
            println!("{:<8} {}", entry.tail_number, entry.tracker_id);
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = &load_config(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Upstream]");
                println!("  Base URL:           {}", config.upstream.base_url);
                println!(
                    "  Request timeout:    {}",
                    config
                        .upstream
                        .request_timeout_secs
                        .map_or_else(|| "client default".to_string(), |s| format!("{s}s"))
                );
                println!();
                println!("[Schedule]");
                println!("  Request spacing:    {}ms", config.schedule.request_spacing_ms);
                println!("  Window (hours):     {}", config.schedule.window_hours);
                println!("  Clock tick (secs):  {}", config.schedule.clock_tick_secs);
                println!();
                println!("[Revenue]");
                println!("  Per flight:         {}", config.revenue.per_flight);
                println!();
                println!("[Fleet]");
                println!("  Aircraft:           {}", config.registry().len());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_file(&path)
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
