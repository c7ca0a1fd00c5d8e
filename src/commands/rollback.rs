use crate::config::Policy;
use anyhow::Result;
use std::path::PathBuf;

pub fn run(path: PathBuf, backup_id: Option<String>) -> Result<()> {
    let policy = Policy::load(&path)?;
    let report = crate::api::rollback(&path, &policy, backup_id.as_deref())?;
    println!(
        "rolled back {}: {} file(s) restored, {} deleted",
        report.backup_id, report.restored, report.deleted
    );
    Ok(())
}
