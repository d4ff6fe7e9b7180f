//! `tidescale series`: feed samples into the local metric store.

use std::path::Path;

use anyhow::Result;

use tidescale_core::DataPoint;

use super::{epoch_secs, open_store};

pub fn push(state: &Path, query: &str, value: f64, timestamp: Option<u64>) -> Result<()> {
    let point = DataPoint::new(timestamp.unwrap_or_else(epoch_secs), value);
    open_store(state)?.push_point(query, point)?;
    println!("{query} @ {} = {value}", point.timestamp);
    Ok(())
}
