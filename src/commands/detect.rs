use crate::cli::OutputFormat;
use crate::config::Policy;
use crate::io::output;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct DetectConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub max_lines: Option<usize>,
    pub max_complexity: Option<u32>,
    pub show_progress: bool,
}

pub fn run(config: DetectConfig) -> Result<()> {
    let policy = load_policy(&config.path, config.max_lines, config.max_complexity)?;
    let report = crate::api::detect(&config.path, &policy, config.show_progress)?;
    let rendered = output::render_detect_report(&report, config.format.into())?;
    emit(&rendered, config.output.as_deref())
}

pub fn load_policy(
    root: &Path,
    max_lines: Option<usize>,
    max_complexity: Option<u32>,
) -> Result<Policy> {
    let mut policy = Policy::load(root)?;
    if let Some(lines) = max_lines {
        policy.thresholds.max_lines = lines;
    }
    if let Some(complexity) = max_complexity {
        policy.thresholds.max_complexity = complexity;
    }
    Ok(policy)
}

pub fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            log::info!("report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
