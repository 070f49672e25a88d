//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands and override the config file:
//! - `--owner`, `--repo`, `--branch`, `--api-base`: which branch to mount
//! - `--token`: bearer token (also read from `GITHUB_TOKEN`)
//! - `--config <path>`: use this config file instead of searching
//! - `--debug`: enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ghfs - read and write a GitHub branch like a filesystem
#[derive(Parser, Debug)]
#[command(name = "ghfs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository owner (user or organization)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Branch to mount
    #[arg(short, long, global = true)]
    pub branch: Option<String>,

    /// API base URL, for GitHub Enterprise
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file to load
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory
    Ls {
        /// Directory to list
        #[arg(default_value = "/")]
        path: String,

        /// Show kind, size and object id
        #[arg(short, long)]
        long: bool,
    },

    /// Print a file to stdout
    Cat {
        /// File to print
        path: String,
    },

    /// Replace a file with stdin, creating it if needed
    Write {
        /// File to write
        path: String,

        /// Create missing parent directories in the same commit
        #[arg(short, long)]
        parents: bool,
    },

    /// Append stdin to a file, creating it if needed
    Append {
        /// File to append to
        path: String,

        /// Create missing parent directories in the same commit
        #[arg(short, long)]
        parents: bool,
    },

    /// Remove a file or empty directory
    Rm {
        /// Path to remove
        path: String,

        /// Remove a directory and everything in it, one commit per file
        #[arg(short, long)]
        recursive: bool,
    },

    /// Move a file or directory
    Mv {
        /// Current path
        from: String,

        /// New path
        to: String,
    },

    /// Show metadata for a path
    Stat {
        /// Path to inspect
        path: String,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ghfs", "ls", "docs", "--owner", "octocat", "--repo", "site", "-b", "pages",
        ])
        .unwrap();
        assert_eq!(cli.owner.as_deref(), Some("octocat"));
        assert_eq!(cli.branch.as_deref(), Some("pages"));
        assert!(matches!(cli.command, Command::Ls { ref path, long: false } if path == "docs"));
    }

    #[test]
    fn ls_defaults_to_root() {
        let cli = Cli::try_parse_from(["ghfs", "ls"]).unwrap();
        assert!(matches!(cli.command, Command::Ls { ref path, .. } if path == "/"));
    }

    #[test]
    fn rm_recursive() {
        let cli = Cli::try_parse_from(["ghfs", "rm", "-r", "old"]).unwrap();
        assert!(matches!(cli.command, Command::Rm { recursive: true, .. }));
    }

    #[test]
    fn write_parents_flag() {
        let cli = Cli::try_parse_from(["ghfs", "write", "-p", "docs/new/a.md"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Write { ref path, parents: true } if path == "docs/new/a.md"
        ));
        let cli = Cli::try_parse_from(["ghfs", "append", "log.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Append { parents: false, .. }));
    }

    #[test]
    fn mv_requires_two_paths() {
        assert!(Cli::try_parse_from(["ghfs", "mv", "a"]).is_err());
    }
}
