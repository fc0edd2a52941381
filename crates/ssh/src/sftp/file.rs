//! SFTP file and directory handles.

use super::client::ErrorSlot;
use super::types::Attributes;
use coil_platform::CoilResult;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

/// libssh2 reports the end of a directory listing as a session-level FILE error.
const LIBSSH2_ERROR_FILE: i32 = libssh2_sys::LIBSSH2_ERROR_FILE;

/// An open remote file.
pub struct SftpFile {
    inner: ssh2::File,
    last_error: ErrorSlot,
}

impl SftpFile {
    pub(crate) fn new(inner: ssh2::File, last_error: ErrorSlot) -> Self {
        Self { inner, last_error }
    }

    /// Reads into `buf` and returns the number of bytes read. Zero means EOF.
    pub fn read(&mut self, buf: &mut [u8]) -> CoilResult<usize> {
        self.inner.read(buf).map_err(|e| self.last_error.record(e))
    }

    /// Reads from the current position to the end of the file.
    pub fn read_to_end(&mut self) -> CoilResult<Vec<u8>> {
        let mut data = Vec::new();
        self.inner
            .read_to_end(&mut data)
            .map_err(|e| self.last_error.record(e))?;
        Ok(data)
    }

    /// Writes `data` and returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> CoilResult<usize> {
        self.inner.write(data).map_err(|e| self.last_error.record(e))
    }

    /// Writes all of `data`.
    pub fn write_all(&mut self, data: &[u8]) -> CoilResult<()> {
        self.inner
            .write_all(data)
            .map_err(|e| self.last_error.record(e))
    }

    /// Asks the server to flush the file to disk.
    pub fn sync(&mut self) -> CoilResult<()> {
        self.inner.fsync().map_err(|e| self.last_error.record(e))
    }

    /// Moves to an absolute byte offset.
    pub fn seek(&mut self, offset: u64) -> CoilResult<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.last_error.record(e))?;
        Ok(())
    }

    /// Moves back to the start of the file.
    pub fn rewind(&mut self) -> CoilResult<()> {
        self.seek(0)
    }

    /// Current byte offset.
    pub fn position(&mut self) -> CoilResult<u64> {
        self.inner
            .seek(SeekFrom::Current(0))
            .map_err(|e| self.last_error.record(e))
    }

    /// Attributes of the open file.
    pub fn status(&mut self) -> CoilResult<Attributes> {
        let stat = self
            .inner
            .stat()
            .map_err(|e| self.last_error.record(e))?;
        Ok(stat.into())
    }

    /// Changes attributes of the open file.
    pub fn set_status(&mut self, attrs: &Attributes) -> CoilResult<()> {
        self.inner
            .setstat(attrs.into())
            .map_err(|e| self.last_error.record(e))
    }

    /// Closes the file, reporting any error the server returns.
    pub fn close(mut self) -> CoilResult<()> {
        self.inner.close().map_err(|e| self.last_error.record(e))?;
        debug!("SFTP file closed");
        Ok(())
    }
}

impl std::fmt::Debug for SftpFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpFile").finish_non_exhaustive()
    }
}

/// An open remote directory.
pub struct SftpDirectory {
    inner: ssh2::File,
    last_error: ErrorSlot,
    done: bool,
}

impl SftpDirectory {
    pub(crate) fn new(inner: ssh2::File, last_error: ErrorSlot) -> Self {
        Self {
            inner,
            last_error,
            done: false,
        }
    }

    /// Returns the next entry name and its attributes, or `None` at the end.
    ///
    /// Entries come in server order and include `.` and `..`.
    pub fn read_entry(&mut self) -> CoilResult<Option<(String, Attributes)>> {
        if self.done {
            return Ok(None);
        }
        match self.inner.readdir() {
            Ok((name, stat)) => Ok(Some((name.to_string_lossy().into_owned(), stat.into()))),
            Err(e) if matches!(e.code(), ssh2::ErrorCode::Session(LIBSSH2_ERROR_FILE)) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => Err(self.last_error.record(e)),
        }
    }

    /// Reads every remaining entry, skipping `.` and `..`.
    pub fn entries(&mut self) -> CoilResult<Vec<(String, Attributes)>> {
        let mut entries = Vec::new();
        while let Some((name, attrs)) = self.read_entry()? {
            if name == "." || name == ".." {
                continue;
            }
            entries.push((name, attrs));
        }
        Ok(entries)
    }

    /// Closes the directory.
    pub fn close(mut self) -> CoilResult<()> {
        self.inner.close().map_err(|e| self.last_error.record(e))?;
        debug!("SFTP directory closed");
        Ok(())
    }
}

impl std::fmt::Debug for SftpDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpDirectory")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
