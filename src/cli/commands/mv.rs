//! mv command - Move a path

use anyhow::Result;

use crate::fs::GitHubFs;

/// Move `from` to `to` in one commit.
pub async fn mv(fs: &GitHubFs, from: &str, to: &str) -> Result<()> {
    fs.rename(from, to).await?;
    Ok(())
}
