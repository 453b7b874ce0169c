use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ustibb")]
#[command(about = "Turns git history into USTIBB billing reports")]
#[command(version)]
pub struct Cli {
    /// Verbose output (per-repository progress)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding ustibb.toml and the category rules (default: current directory)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every project report and the final report
    Run {
        /// Only commits after this date (overrides config)
        #[arg(long)]
        since: Option<String>,

        /// Only commits before this date (overrides config)
        #[arg(long)]
        until: Option<String>,

        /// Author id, repeatable (overrides config)
        #[arg(short, long)]
        author: Vec<String>,

        /// Bill each file at most once per category
        #[arg(long)]
        no_duplicates: bool,

        /// Card number printed under the extra categories
        #[arg(long)]
        card: Option<String>,

        /// Directory searched for git repositories
        #[arg(long)]
        repos_dir: Option<PathBuf>,

        /// Directory reports are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Rebuild the final report from the project reports already written
    Merge {
        /// Directory holding the project reports
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Card number printed under the extra categories
        #[arg(long)]
        card: Option<String>,
    },

    /// Show which category a file change is billed under
    Classify {
        /// File path (e.g., src/forms/Main.ui)
        path: String,

        /// Change status letter (A = added, M = modified, D = deleted, ...)
        #[arg(short, long, default_value = "M")]
        status: String,
    },

    /// List category rules in precedence order
    Categories,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., allow_duplicates)
        key: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Create config file with defaults
    Init,
}
