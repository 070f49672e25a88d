//! cat command - Print a file

use std::io::{Read, Write};

use anyhow::Result;

use crate::fs::GitHubFs;

/// Copy the content of `path` to `out`.
pub async fn cat(fs: &GitHubFs, path: &str, out: &mut impl Write) -> Result<()> {
    let mut file = fs.open(path).await?.into_file()?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    out.write_all(&content)?;
    Ok(())
}
