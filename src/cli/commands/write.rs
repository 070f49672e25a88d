//! write and append commands - Store stdin in a file

use std::io::Write;

use anyhow::Result;

use crate::core::paths;
use crate::fs::{GitHubFs, OpenOptions};

/// Replace the content of `path`, creating it if needed.
///
/// With `parents`, missing directories above `path` are created first and
/// land in the same commit as the file.
pub async fn write(fs: &GitHubFs, path: &str, content: &[u8], parents: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).truncate(true);
    store(fs, path, content, parents, &options).await
}

/// Add `content` to the end of `path`, creating it if needed.
pub async fn append(fs: &GitHubFs, path: &str, content: &[u8], parents: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    store(fs, path, content, parents, &options).await
}

async fn store(
    fs: &GitHubFs,
    path: &str,
    content: &[u8],
    parents: bool,
    options: &OpenOptions,
) -> Result<()> {
    let path = paths::normalize(path)?;
    if parents {
        fs.mkdir_all(paths::parent(&path)).await?;
    }
    let mut file = fs.open_with(&path, options).await?.into_file()?;
    file.write_all(content)?;
    file.close().await?;
    Ok(())
}
