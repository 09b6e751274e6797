//! auto-sweep: run the full characterization sweep.
//!
//! Takes no arguments. Reads `auto_sweep.json` from the working directory if
//! present, otherwise sweeps the default full-unit catalogue. `RUST_LOG`
//! controls verbosity (default `info`).
//!
//! Exit status: 0 on completion, 130 on interrupt, 1 on an unrecoverable
//! error. Both abnormal exits kill running tool processes and delete the
//! scratch tree first.

use anyhow::{Context, Result};
use auto_sweep::config::{SweepConfig, CONFIG_FILE_NAME};
use auto_sweep::pipeline::{emergency_cleanup, Dispatcher, ProcessLauncher, SweepCancel};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_INTERRUPTED: u8 = 130;

fn load_config(cwd: &Path) -> Result<SweepConfig> {
    let file = cwd.join(CONFIG_FILE_NAME);
    let config = if file.exists() {
        info!(config = %file.display(), "loading sweep configuration");
        SweepConfig::from_json_file(&file)
            .with_context(|| format!("invalid configuration in {}", file.display()))?
    } else {
        info!("no {CONFIG_FILE_NAME} found, using the default sweep");
        SweepConfig::default()
    };
    let config = config.resolve_paths(cwd);
    config.validate().context("invalid sweep configuration")?;
    Ok(config)
}

/// Resolves on the first interrupt. Never resolves if the handler cannot be
/// installed, so the sweep then runs to completion.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for interrupt");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::current_dir()
        .context("cannot determine working directory")
        .and_then(|cwd| load_config(&cwd))
    {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = SweepCancel::new();
    let sweep_config = config.clone();
    let sweep_cancel = cancel.clone();
    let sweep = tokio::task::spawn_blocking(move || {
        let launcher = ProcessLauncher::new();
        Dispatcher::new(&sweep_config, &launcher)
            .with_cancel(sweep_cancel)
            .run()
    });

    tokio::select! {
        joined = sweep => match joined {
            Ok(Ok(summary)) => {
                info!(
                    elapsed_secs = summary.elapsed_secs,
                    breakdowns = summary.breakdowns.len(),
                    failures = summary.failures.len(),
                    "done"
                );
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!(error = %e, "sweep aborted");
                let _ = emergency_cleanup(&config);
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(error = %e, "sweep task panicked");
                let _ = emergency_cleanup(&config);
                ExitCode::FAILURE
            }
        },
        () = interrupted() => {
            warn!("interrupted, cleaning up");
            // raise first so no worker starts a tool after the kill
            cancel.cancel();
            let _ = emergency_cleanup(&config);
            // pool workers are blocked on tool children; don't wait for them
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    }
}
