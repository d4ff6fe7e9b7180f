//! `tidescale evaluate`: one round of evaluation passes.

use std::path::Path;

use anyhow::{Result, bail};

use super::{PassOptions, prepare, run_round};

pub async fn evaluate(state: &Path, config: &Path, options: &PassOptions) -> Result<()> {
    let (evaluator, specs) = prepare(state, config, options)?;
    let failed = run_round(&evaluator, &specs).await;
    if failed > 0 {
        bail!("{failed} of {} evaluation passes failed", specs.len());
    }
    Ok(())
}
