use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::vcs::DiffMode;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "adx")]
#[command(
    about = "Git-driven delta and impacted-test resolution for Salesforce DX source trees"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print test classes impacted by changed classes, comma-separated
    Tests(TestsArgs),

    /// List or package files changed under the base directory
    Delta(DeltaArgs),

    /// Show which classes mention a class name
    Scan(ScanArgs),

    /// Initialize an apexdelta.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Diff selection shared by `tests` and `delta`
#[derive(Debug, Clone, clap::Args)]
pub struct DiffArgs {
    /// Comparison strategy (defaults to config, then `commit`)
    #[arg(long, value_enum)]
    pub mode: Option<DiffModeArg>,

    /// Commit, branch/ref, or tag prefix depending on --mode
    #[arg(long, short)]
    pub key: Option<String>,

    /// Repository root used for git queries and relative paths
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Source directory that changed files must live under
    #[arg(long)]
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiffModeArg {
    /// Files changed in a single commit
    Commit,
    /// Working tree compared against a branch or ref
    Branch,
    /// Most recent (matching) tag compared against HEAD
    Tags,
}

impl From<DiffModeArg> for DiffMode {
    fn from(mode: DiffModeArg) -> Self {
        match mode {
            DiffModeArg::Commit => DiffMode::Commit,
            DiffModeArg::Branch => DiffMode::Branch,
            DiffModeArg::Tags => DiffMode::Tags,
        }
    }
}

#[derive(Debug, Parser)]
pub struct TestsArgs {
    #[command(flatten)]
    pub diff: DiffArgs,

    /// Metadata-type subdirectories to scan (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub meta_types: Vec<String>,

    /// Naming suffix that marks a test class
    #[arg(long)]
    pub test_suffix: Option<String>,

    /// Also include each changed class's own test when it exists
    #[arg(long)]
    pub include_changed_tests: bool,

    /// Emit JSON output (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct DeltaArgs {
    #[command(flatten)]
    pub diff: DiffArgs,

    /// Copy changed files into this directory instead of listing them
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit JSON output (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Class name to look for
    pub class_name: String,

    /// Directory holding class sources (defaults to <base-dir>/classes)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Naming suffix that marks a test class
    #[arg(long)]
    pub test_suffix: Option<String>,

    /// Emit JSON output (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
