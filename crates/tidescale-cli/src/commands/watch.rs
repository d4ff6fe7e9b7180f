//! `tidescale watch`: repeat evaluation rounds until Ctrl-C.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{info, warn};

use super::{PassOptions, prepare, run_round};

pub async fn watch(state: &Path, config: &Path, interval: u64, options: &PassOptions) -> Result<()> {
    if interval == 0 {
        bail!("--interval must be at least one second");
    }
    let (evaluator, specs) = prepare(state, config, options)?;

    let (shutdown_tx, mut shutdown) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(interval_secs = interval, metrics = specs.len(), "watch started");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    let mut round: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                round += 1;
                let failed = run_round(&evaluator, &specs).await;
                if failed > 0 {
                    warn!(round, failed, "round finished with failed passes");
                }
            }
            _ = shutdown.changed() => {
                info!(rounds = round, "watch stopped");
                break;
            }
        }
    }
    Ok(())
}
