use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "splitmap")]
#[command(about = "Large-file detection and module decomposition for Rust code trees", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect oversized files and print decomposition recommendations
    Detect {
        /// Path to analyze
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the physical-line threshold
        #[arg(long)]
        max_lines: Option<usize>,

        /// Override the complexity threshold
        #[arg(long)]
        max_complexity: Option<u32>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Analyze a single file: metrics and responsibility groups
    Analyze {
        /// File to analyze
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Plan and execute splits for detected files
    Split {
        /// Path to analyze and transform
        path: PathBuf,

        /// Only split these files (relative or absolute)
        #[arg(long = "only", value_delimiter = ',')]
        only: Vec<PathBuf>,

        /// Act on at most the top N recommendations
        #[arg(long)]
        top: Option<usize>,

        /// Print the plan without executing it
        #[arg(long)]
        dry_run: bool,

        /// Complete independent operations after a failure
        #[arg(long)]
        continue_on_error: bool,

        /// Test command run as the final validation gate
        #[arg(long)]
        test_command: Option<String>,

        /// Timeout for the test command, in seconds
        #[arg(long, default_value = "300")]
        timeout_secs: u64,

        /// Leave the tree as-is on failure instead of rolling back
        #[arg(long)]
        no_rollback: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Restore a backup taken by a previous run
    Rollback {
        /// The analyzed root the backup belongs to
        path: PathBuf,

        /// Backup id (defaults to the most recent)
        #[arg(long)]
        backup_id: Option<String>,
    },

    /// Write a default .splitmap.toml
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
    Markdown,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::output::OutputFormat::Markdown,
        }
    }
}
