//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Track completion of a discipline taxonomy stored as nested directories
#[derive(Parser, Debug)]
#[command(name = "distrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Root of the discipline directories (default from config)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub base_dir: Option<PathBuf>,

    /// Snapshot file (default from config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the next incomplete discipline and offer to complete it (default)
    Next {
        /// Only report, do not ask
        #[arg(long)]
        no_prompt: bool,
    },

    /// List leaf disciplines with their status
    List {
        /// Only incomplete disciplines
        #[arg(short, long)]
        incomplete: bool,
    },

    /// Print the discipline hierarchy
    Tree,

    /// Mark disciplines incomplete again
    Reset {
        /// Slash-delimited paths, e.g. 人文学科/哲学/道家哲学 (default: reset_paths from config)
        paths: Vec<String>,
    },

    /// Mark one discipline complete
    Done {
        /// Slash-delimited path
        path: String,
    },

    /// Pick an incomplete discipline interactively and mark it complete
    Select,

    /// Rescan the base directory and rewrite the snapshot
    Scan,

    /// Show progress counts and the next discipline
    Status,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings as TOML
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}
