use crate::cli::OutputFormat;
use crate::io::output;
use crate::workflow::{ExecuteOptions, Selection, WorkflowState};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub struct SplitConfig {
    pub path: PathBuf,
    pub only: Vec<PathBuf>,
    pub top: Option<usize>,
    pub dry_run: bool,
    pub continue_on_error: bool,
    pub test_command: Option<String>,
    pub timeout_secs: u64,
    pub no_rollback: bool,
    pub format: OutputFormat,
}

pub fn run(config: SplitConfig) -> Result<()> {
    let policy = super::detect::load_policy(&config.path, None, None)?;
    let report = crate::api::detect(&config.path, &policy, true)?;
    if report.recommendations.is_empty() {
        println!("nothing to split: no recommendations above the confidence floor");
        return Ok(());
    }

    let selection = Selection {
        paths: config.only.clone(),
        top: config.top,
    };
    let plan = crate::api::build_plan(&report.recommendations, &selection)?;
    if plan.operations.is_empty() {
        bail!("selection matched no recommendations");
    }

    if config.dry_run {
        println!("plan: {} operation(s)", plan.operations.len());
        for op in &plan.operations {
            println!(
                "  {} {:?} {} -> {}",
                op.id,
                op.kind,
                op.source.display(),
                op.targets
                    .first()
                    .map(|t| t.display().to_string())
                    .unwrap_or_default()
            );
        }
        return Ok(());
    }

    let options = ExecuteOptions {
        continue_on_error: config.continue_on_error,
        test_command: config.test_command.clone(),
        test_timeout: Duration::from_secs(config.timeout_secs),
        rollback_enabled: !config.no_rollback,
        ..ExecuteOptions::default()
    };
    let result = crate::api::execute(&config.path, &plan, &options, &policy)?;
    print!("{}", output::render_workflow_result(&result, config.format.into())?);

    if result.final_state != WorkflowState::Succeeded {
        bail!("workflow ended in {:?}", result.final_state);
    }
    Ok(())
}
