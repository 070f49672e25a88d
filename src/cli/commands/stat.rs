//! stat command - Show metadata for a path

use std::io::Write;

use anyhow::Result;

use crate::fs::GitHubFs;

/// Print kind, mode, size and object id of `path`.
pub async fn stat(fs: &GitHubFs, path: &str, out: &mut impl Write) -> Result<()> {
    let meta = fs.stat(path).await?;
    let display_path = if meta.path.is_empty() { "/" } else { meta.path.as_str() };

    writeln!(out, "path: {}", display_path)?;
    writeln!(out, "kind: {}", meta.kind)?;
    writeln!(out, "mode: {}", meta.mode)?;
    match meta.size {
        Some(size) => writeln!(out, "size: {}", size)?,
        None => writeln!(out, "size: -")?,
    }
    match &meta.oid {
        Some(oid) => writeln!(out, "oid:  {}", oid)?,
        None => writeln!(out, "oid:  (not yet materialized)")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::mock_fs;

    #[tokio::test]
    async fn file_stat() {
        let (_, fs) = mock_fs(&[("a.txt", b"abc".as_slice())]).await;
        let mut out = Vec::new();
        stat(&fs, "a.txt", &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("kind: blob"));
        assert!(text.contains("mode: 100644"));
        assert!(text.contains("size: 3"));
    }

    #[tokio::test]
    async fn root_stat() {
        let (_, fs) = mock_fs(&[]).await;
        let mut out = Vec::new();
        stat(&fs, "/", &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("path: /\n"));
        assert!(text.contains("kind: tree"));
    }
}
