use crate::cli::OutputFormat;
use crate::config::Policy;
use crate::io::output;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(file: PathBuf, format: OutputFormat) -> Result<()> {
    let root = file
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let policy = Policy::load(&root)?;
    let analysis = crate::api::analyze_file(&file, &policy)
        .with_context(|| format!("failed to analyze {}", file.display()))?;
    print!("{}", output::render_analysis(&analysis, format.into())?);
    Ok(())
}
