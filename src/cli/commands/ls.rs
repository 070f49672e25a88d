//! ls command - List a directory

use std::io::Write;

use anyhow::Result;

use crate::fs::GitHubFs;

/// Print the children of `path`, one per line. Directories get a trailing
/// `/`. With `long`, kind, size and short object id come first.
pub async fn ls(fs: &GitHubFs, path: &str, long: bool, out: &mut impl Write) -> Result<()> {
    let view = fs.read_dir(path).await?;

    for child in view.entries() {
        let suffix = if child.is_dir() { "/" } else { "" };
        if long {
            let size = child
                .size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let oid = child
                .oid
                .as_ref()
                .map(|o| o.short(7).to_string())
                .unwrap_or_else(|| "-------".to_string());
            writeln!(
                out,
                "{} {:>8} {} {}{}",
                child.kind, size, oid, child.name, suffix
            )?;
        } else {
            writeln!(out, "{}{}", child.name, suffix)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::mock_fs;

    #[tokio::test]
    async fn short_listing() {
        let (_, fs) = mock_fs(&[("a/b.txt", b"b".as_slice()), ("c.txt", b"cc".as_slice())]).await;
        let mut out = Vec::new();
        ls(&fs, "/", false, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a/\nc.txt\n");
    }

    #[tokio::test]
    async fn long_listing_shows_size() {
        let (_, fs) = mock_fs(&[("c.txt", b"cc".as_slice())]).await;
        let mut out = Vec::new();
        ls(&fs, "", true, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("blob "));
        assert!(text.contains("       2 "));
        assert!(text.trim_end().ends_with("c.txt"));
    }

    #[tokio::test]
    async fn listing_a_file_fails() {
        let (_, fs) = mock_fs(&[("c.txt", b"cc".as_slice())]).await;
        let mut out = Vec::new();
        assert!(ls(&fs, "c.txt", false, &mut out).await.is_err());
    }
}
