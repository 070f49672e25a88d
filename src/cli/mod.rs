//! cli
//!
//! Command-line interface layer for ghfs.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Merge flags over the config file
//! - Mount the branch and delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Every command maps onto one or two calls on
//! [`crate::fs::GitHubFs`]; all remote state changes flow through it.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};

use crate::auth::StaticToken;
use crate::core::config::Config;
use crate::core::types::BranchName;
use crate::forge::github::GitHubForge;
use crate::fs::GitHubFs;

/// Resolved settings for one invocation: flags over config over defaults.
#[derive(Clone)]
pub struct Context {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: String,
    pub api_base: String,
    pub token: Option<String>,
    pub debug: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .finish()
    }
}

impl Context {
    /// Merge parsed flags over a loaded config.
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            owner: cli.owner.clone().or_else(|| config.owner().map(String::from)),
            repo: cli.repo.clone().or_else(|| config.repo().map(String::from)),
            branch: cli
                .branch
                .clone()
                .unwrap_or_else(|| config.branch().to_string()),
            api_base: cli
                .api_base
                .clone()
                .unwrap_or_else(|| config.api_base().to_string()),
            token: cli.token.clone(),
            debug: cli.debug,
        }
    }

    /// Mount the configured branch over the GitHub API.
    pub async fn mount(&self) -> Result<GitHubFs> {
        let Some(owner) = &self.owner else {
            bail!("no repository owner; pass --owner or set remote.owner in the config file");
        };
        let Some(repo) = &self.repo else {
            bail!("no repository name; pass --repo or set remote.repo in the config file");
        };
        let Some(token) = &self.token else {
            bail!("no token; pass --token or set GITHUB_TOKEN");
        };
        let branch = BranchName::new(&self.branch)
            .with_context(|| format!("invalid branch name '{}'", self.branch))?;

        let forge = GitHubForge::with_api_base(
            Arc::new(StaticToken::new(token.clone())),
            owner,
            repo,
            &self.api_base,
        );
        GitHubFs::mount(Arc::new(forge), branch)
            .await
            .with_context(|| format!("failed to mount {}/{}@{}", owner, repo, self.branch))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    crate::logging::init_logging(config.log_level(), cli.debug);

    let ctx = Context::resolve(&cli, &config);
    commands::dispatch(cli.command, &ctx)
}
