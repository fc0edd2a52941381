//! SCP transfers.
//!
//! SCP is a one-shot transfer: [`Session::scp_send`] returns a channel to
//! write the file body into, and [`Session::scp_receive`] returns a channel to
//! read it from together with the remote file's [`FileInfo`].

use crate::channel::Channel;
use crate::session::Session;
use coil_platform::{CoilError, CoilResult, Status};
use std::path::Path;
use tracing::debug;

/// Metadata of a file received over SCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    size: u64,
    permissions: i32,
}

impl FileInfo {
    /// File size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Mode bits, including the file type bits.
    pub fn permissions(&self) -> i32 {
        self.permissions
    }

    /// Returns true for a directory.
    pub fn is_dir(&self) -> bool {
        self.permissions & mode_bits::S_IFMT == mode_bits::S_IFDIR
    }

    /// Returns true for a regular file.
    pub fn is_file(&self) -> bool {
        self.permissions & mode_bits::S_IFMT == mode_bits::S_IFREG
    }
}

impl From<&ssh2::ScpFileStat> for FileInfo {
    fn from(stat: &ssh2::ScpFileStat) -> Self {
        Self {
            size: stat.size(),
            permissions: stat.mode(),
        }
    }
}

mod mode_bits {
    pub const S_IFMT: i32 = 0o170000;
    pub const S_IFDIR: i32 = 0o040000;
    pub const S_IFREG: i32 = 0o100000;
}

fn require_path(path: &Path) -> CoilResult<()> {
    if path.as_os_str().is_empty() {
        return Err(CoilError::argument(Status::MissingValue, "path is empty"));
    }
    Ok(())
}

impl Session {
    /// Starts sending a file of `size` bytes to `path`.
    ///
    /// `mode` holds the permission bits. `times` is `(mtime, atime)` in
    /// seconds since the epoch. The caller writes exactly `size` bytes to the
    /// returned channel, then sends EOF.
    pub fn scp_send(
        &self,
        path: &Path,
        mode: i32,
        size: u64,
        times: Option<(u64, u64)>,
    ) -> CoilResult<Channel> {
        require_path(path)?;
        let channel = self.inner.scp_send(path, mode & 0o777, size, times)?;
        debug!(path = %path.display(), size, mode = %format!("{:o}", mode), "SCP send started");
        Ok(Channel::new(channel))
    }

    /// Starts receiving the file at `path`.
    pub fn scp_receive(&self, path: &Path) -> CoilResult<(Channel, FileInfo)> {
        require_path(path)?;
        let (channel, stat) = self.inner.scp_recv(path)?;
        let info = FileInfo::from(&stat);
        debug!(path = %path.display(), size = info.size, "SCP receive started");
        Ok((Channel::new(channel), info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_info_type_bits() {
        let file = FileInfo {
            size: 12,
            permissions: 0o100644,
        };
        assert!(file.is_file());
        assert!(!file.is_dir());
        assert_eq!(file.permissions() & 0o777, 0o644);

        let dir = FileInfo {
            size: 0,
            permissions: 0o040755,
        };
        assert!(dir.is_dir());
        assert!(!dir.is_file());
    }

    #[test]
    fn test_empty_path_rejected() {
        let session = Session::new().unwrap();
        let err = session.scp_receive(Path::new("")).unwrap_err();
        assert_eq!(err.status(), Status::MissingValue);
        let err = session.scp_send(Path::new(""), 0o644, 0, None).unwrap_err();
        assert_eq!(err.status(), Status::MissingValue);
    }
}
