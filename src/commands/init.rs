use crate::config::{Policy, CONFIG_FILE_NAME};
use anyhow::{bail, Result};
use std::path::Path;

pub fn run(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!("{CONFIG_FILE_NAME} already exists (use --force to overwrite)");
    }
    std::fs::write(path, Policy::default_toml())?;
    println!("wrote {CONFIG_FILE_NAME}");
    Ok(())
}
