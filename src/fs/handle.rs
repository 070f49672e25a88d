//! fs::handle
//!
//! Buffered file handles.
//!
//! A handle owns a private copy of the file's bytes, fetched when it was
//! opened. Reads, writes and seeks work on that buffer through the standard
//! `std::io` traits. Nothing reaches the remote until [`FileHandle::close`]
//! (or [`FileHandle::sync`]) uploads the buffer, rebuilds the enclosing
//! trees and commits.
//!
//! Dropping a handle with unsynced writes discards them.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use tracing::warn;

use super::{FsError, GitHubFs};
use crate::core::paths;

/// An open file on the branch.
pub struct FileHandle {
    fs: GitHubFs,
    path: String,
    buffer: Cursor<Vec<u8>>,
    dirty: bool,
}

impl FileHandle {
    pub(crate) fn new(fs: GitHubFs, path: String, content: Vec<u8>) -> Self {
        Self {
            fs,
            path,
            buffer: Cursor::new(content),
            dirty: false,
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        paths::file_name(&self.path)
    }

    /// Current buffer length in bytes.
    pub fn len(&self) -> u64 {
        self.buffer.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.get_ref().is_empty()
    }

    /// Whether the buffer has writes the remote has not seen.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The whole buffer, regardless of cursor position.
    pub fn contents(&self) -> &[u8] {
        self.buffer.get_ref()
    }

    /// Empty the buffer and rewind.
    pub fn truncate(&mut self) {
        self.buffer.get_mut().clear();
        self.buffer.set_position(0);
        self.dirty = true;
    }

    pub(crate) fn seek_end(&mut self) {
        let end = self.len();
        self.buffer.set_position(end);
    }

    /// Upload the buffer and commit it, keeping the handle open.
    ///
    /// A clean handle makes no remote calls.
    pub async fn sync(&mut self) -> Result<(), FsError> {
        if !self.dirty {
            return Ok(());
        }
        self.fs.flush_file(&self.path, self.buffer.get_ref()).await?;
        self.dirty = false;
        Ok(())
    }

    /// Upload the buffer if it is dirty, commit, and release the handle.
    ///
    /// # Errors
    ///
    /// `NotFound` if the file was removed or renamed while open, `Conflict`
    /// if the branch moved, or `Remote`. The buffer is discarded either way.
    pub async fn close(mut self) -> Result<(), FsError> {
        let result = self.sync().await;
        // the caller has seen the outcome, don't warn again on drop
        self.dirty = false;
        result
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("position", &self.buffer.position())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.buffer.write(buf)?;
        if written > 0 {
            self.dirty = true;
        }
        Ok(written)
    }

    /// Buffered only; use [`FileHandle::sync`] to reach the remote.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if self.dirty {
            warn!(
                path = %self.path,
                bytes = self.len(),
                "file handle dropped without close, discarding writes"
            );
        }
    }
}
