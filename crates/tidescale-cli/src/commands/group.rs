//! `tidescale group`: manage local group records.

use std::path::Path;

use anyhow::{Result, bail};

use tidescale_core::TargetGroup;
use tidescale_state::GroupRecord;

use super::open_store;

pub fn put(
    state: &Path,
    name: &str,
    region: &str,
    desired: i64,
    min: i64,
    max: i64,
    cooldown: u64,
) -> Result<()> {
    let store = open_store(state)?;
    let group = TargetGroup::new(name, region);
    // Keep the cooldown clock running across a redefinition.
    let last_scaled_at = store.get_group(&group)?.and_then(|r| r.last_scaled_at);
    let mut record = GroupRecord::new(&group, desired, min, max).with_cooldown(cooldown);
    record.last_scaled_at = last_scaled_at;
    store.put_group(&record)?;
    println!("{group}: desired {desired} in [{min}, {max}], cooldown {cooldown}s");
    Ok(())
}

pub fn show(state: &Path, name: Option<&str>, region: &str) -> Result<()> {
    let store = open_store(state)?;
    let records = match name {
        Some(name) => {
            let group = TargetGroup::new(name, region);
            match store.get_group(&group)? {
                Some(record) => vec![record],
                None => bail!("group {group} not found"),
            }
        }
        None => store.list_groups()?,
    };
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

pub fn activity(state: &Path, name: &str, region: &str) -> Result<()> {
    let store = open_store(state)?;
    let activities = store.list_activities(&TargetGroup::new(name, region))?;
    println!("{}", serde_json::to_string_pretty(&activities)?);
    Ok(())
}
