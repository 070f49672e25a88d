//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each handler takes a mounted [`GitHubFs`](crate::fs::GitHubFs) and an output writer, so it can
//! be driven against the mock forge in tests. `dispatch` owns the tokio
//! runtime and the mount; handlers never build either.

mod cat;
mod completion;
mod ls;
mod mv;
mod rm;
mod stat;
mod write;

pub use cat::cat;
pub use completion::completion;
pub use ls::ls;
pub use mv::mv;
pub use rm::rm;
pub use stat::stat;
pub use write::{append, write};

use std::io::{self, Read};

use anyhow::{Context as _, Result};

use super::args::Command;
use super::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    if let Command::Completion { shell } = command {
        return completion(shell);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(dispatch_async(command, ctx))
}

async fn dispatch_async(command: Command, ctx: &Context) -> Result<()> {
    let fs = ctx.mount().await?;
    let mut out = io::stdout().lock();

    match command {
        Command::Ls { path, long } => ls(&fs, &path, long, &mut out).await,
        Command::Cat { path } => cat(&fs, &path, &mut out).await,
        Command::Write { path, parents } => write(&fs, &path, &read_stdin()?, parents).await,
        Command::Append { path, parents } => append(&fs, &path, &read_stdin()?, parents).await,
        Command::Rm { path, recursive } => rm(&fs, &path, recursive).await,
        Command::Mv { from, to } => mv(&fs, &from, &to).await,
        Command::Stat { path } => stat(&fs, &path, &mut out).await,
        Command::Completion { shell } => completion(shell),
    }
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

/// Mount a mock branch for handler tests.
#[cfg(test)]
pub(crate) async fn mock_fs(
    files: &[(&str, &[u8])],
) -> (std::sync::Arc<crate::forge::mock::MockForge>, crate::fs::GitHubFs) {
    use crate::core::types::BranchName;
    use crate::forge::mock::MockForge;
    use crate::fs::GitHubFs;

    let forge = std::sync::Arc::new(MockForge::with_files(files));
    let fs = GitHubFs::mount(forge.clone(), BranchName::new("main").unwrap())
        .await
        .unwrap();
    (forge, fs)
}
