use anyhow::Result;
use clap::Parser;
use splitmap::cli::{Cli, Commands};
use splitmap::commands;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            path,
            format,
            output,
            max_lines,
            max_complexity,
            no_progress,
        } => commands::detect::run(commands::detect::DetectConfig {
            path,
            format,
            output,
            max_lines,
            max_complexity,
            show_progress: !no_progress,
        }),
        Commands::Analyze { file, format } => commands::analyze::run(file, format),
        Commands::Split {
            path,
            only,
            top,
            dry_run,
            continue_on_error,
            test_command,
            timeout_secs,
            no_rollback,
            format,
        } => commands::split::run(commands::split::SplitConfig {
            path,
            only,
            top,
            dry_run,
            continue_on_error,
            test_command,
            timeout_secs,
            no_rollback,
            format,
        }),
        Commands::Rollback { path, backup_id } => commands::rollback::run(path, backup_id),
        Commands::Init { force } => commands::init::run(force),
    }
}
