use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vista_status::UntrackedMode;

#[derive(Parser)]
#[command(
    name = "vista",
    about = "Vista: working tree status for git repositories",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository to inspect (any directory inside it)
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// TOML status configuration replacing the one read from git
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show how the working tree and index differ from HEAD
    Status(StatusArgs),
    /// Show the status flags of a single file
    File(FileArgs),
    /// Report which paths are ignored
    CheckIgnore(CheckIgnoreArgs),
}

#[derive(Args)]
pub struct StatusArgs {
    /// Two-column machine-readable output
    #[arg(long, conflicts_with = "json")]
    pub porcelain: bool,

    /// One JSON object per line
    #[arg(long)]
    pub json: bool,

    /// Also list ignored paths
    #[arg(long)]
    pub ignored: bool,

    /// How untracked files are listed (defaults to the repository setting)
    #[arg(long, value_name = "MODE")]
    pub untracked: Option<UntrackedArg>,

    /// Stop after this many entries
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Restrict the scan to a directory or file (relative to the repository root)
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct FileArgs {
    /// Path relative to the repository root
    pub path: String,
}

#[derive(Args)]
pub struct CheckIgnoreArgs {
    /// Print the rule that decided each path
    #[arg(short = 'v', long)]
    pub show_rule: bool,

    /// Paths relative to the repository root
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum UntrackedArg {
    No,
    Normal,
    All,
}

impl From<UntrackedArg> for UntrackedMode {
    fn from(arg: UntrackedArg) -> Self {
        match arg {
            UntrackedArg::No => UntrackedMode::No,
            UntrackedArg::Normal => UntrackedMode::Normal,
            UntrackedArg::All => UntrackedMode::All,
        }
    }
}
