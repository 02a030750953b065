// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fleetd: runs the Deacon patrol loop. Typically started once per machine
//! and left running; `--once` runs a single patrol tick and exits, for
//! cron-style invocation or manual inspection.

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use fleetd::{build_deacon, rotate_log_if_needed, setup_logging, Config, DaemonLock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("fleetd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--once" => {
                return run_once().await;
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: fleetd [--once | --help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config.log_path)?;

    let _lock = match DaemonLock::acquire(&config.lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("fleetd is already running: {e}");
            std::process::exit(1);
        }
    };

    info!(root = %config.paths.root().display(), "starting fleetd");

    let prompts = fleetd::default_role_prompts();
    let deacon = build_deacon(config.paths.clone(), &prompts)?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut patrol_tick = tokio::time::interval(std::time::Duration::from_millis(
        config.deacon.patrol_interval_ms,
    ));

    loop {
        tokio::select! {
            _ = patrol_tick.tick() => {
                match deacon.patrol_once(&config.deacon).await {
                    Ok(report) => {
                        if report.mass_death_alert
                            || !report.force_killed.is_empty()
                            || !report.initialized.is_empty()
                            || !report.suspended.is_empty()
                        {
                            info!(?report, "patrol tick");
                        }
                    }
                    Err(e) => error!(error = %e, "patrol tick failed"),
                }
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    info!("fleetd stopped");
    Ok(())
}

/// Runs a single patrol tick against a config merged the same way the
/// long-running loop does, then exits. No daemon lock is taken since this
/// mode is meant to run alongside (or instead of) a long-running fleetd.
async fn run_once() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let prompts = fleetd::default_role_prompts();
    let deacon = build_deacon(config.paths.clone(), &prompts)?;
    let report = deacon.patrol_once(&config.deacon).await?;
    println!("{}", serde_json::to_string_pretty(&PatrolReportJson::from(&report))?);
    Ok(())
}

/// Serializable mirror of `fleet_engine::deacon::PatrolReport` for
/// `--once`'s stdout output.
#[derive(serde::Serialize)]
struct PatrolReportJson {
    force_killed: Vec<String>,
    initialized: Vec<String>,
    drained: Vec<String>,
    suspended: Vec<String>,
    mass_death_alert: bool,
}

impl From<&fleet_engine::deacon::PatrolReport> for PatrolReportJson {
    fn from(r: &fleet_engine::deacon::PatrolReport) -> Self {
        Self {
            force_killed: r.force_killed.iter().map(|s| s.as_str().to_string()).collect(),
            initialized: r.initialized.iter().map(|s| s.as_str().to_string()).collect(),
            drained: r.drained.iter().map(|s| s.as_str().to_string()).collect(),
            suspended: r.suspended.iter().map(|a| a.as_str().to_string()).collect(),
            mass_death_alert: r.mass_death_alert,
        }
    }
}

fn print_help() {
    println!("fleetd {}", env!("CARGO_PKG_VERSION"));
    println!("Deacon health-patrol daemon for the fleet control plane");
    println!();
    println!("USAGE:");
    println!("    fleetd             run the patrol loop until SIGTERM/SIGINT");
    println!("    fleetd --once      run a single patrol tick, print the report, exit");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
    println!();
    println!("Configuration is read from $FLEET_HOME/deacon/config.json (or");
    println!("~/.fleet if FLEET_HOME is unset), merged over built-in defaults.");
}
