//! rm command - Remove a path

use anyhow::Result;

use crate::fs::GitHubFs;

/// Remove `path`. With `recursive`, a directory and everything in it.
pub async fn rm(fs: &GitHubFs, path: &str, recursive: bool) -> Result<()> {
    if recursive {
        fs.remove_all(path).await?;
    } else {
        fs.remove(path).await?;
    }
    Ok(())
}
