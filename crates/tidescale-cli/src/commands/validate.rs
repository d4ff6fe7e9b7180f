//! `tidescale validate`: report config findings without running a pass.

use std::path::Path;

use anyhow::{Result, bail};

use tidescale_core::ScalerConfig;

pub fn validate(path: &Path) -> Result<()> {
    let config = ScalerConfig::from_file(path)?;

    for spec in &config.metrics {
        for warning in spec.warnings() {
            println!("warning: {warning}");
        }
    }

    let findings = config.validate();
    for finding in &findings {
        println!("error: {finding}");
    }
    if !findings.is_empty() {
        bail!("{} fatal finding(s) in {}", findings.len(), path.display());
    }

    println!("{}: {} metric(s) ok", path.display(), config.metrics.len());
    Ok(())
}
