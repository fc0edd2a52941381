//! SFTP session handle and path operations.

use super::file::{SftpDirectory, SftpFile};
use super::types::{Attributes, FileMode, OpenFlags, SftpErrorCode};
use crate::session::Session;
use coil_platform::{CoilError, CoilResult, Status};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Last SFTP status code seen by an [`Sftp`] handle and its files.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorSlot(Arc<AtomicU32>);

impl ErrorSlot {
    /// Converts `err`, remembering its SFTP code if it has one.
    pub(crate) fn record(&self, err: impl Into<CoilError>) -> CoilError {
        let err = err.into();
        if let Some(code) = err.sftp_code() {
            self.0.store(code, Ordering::Relaxed);
            if let Some(known) = SftpErrorCode::from_u32(code) {
                debug!(code, reason = known.message(), "SFTP request failed");
            }
        }
        err
    }

    fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    fn code(&self) -> Option<SftpErrorCode> {
        match SftpErrorCode::from_u32(self.get()) {
            Some(SftpErrorCode::Ok) | None => None,
            known => known,
        }
    }
}

/// An SFTP session.
pub struct Sftp {
    inner: ssh2::Sftp,
    last_error: ErrorSlot,
}

fn require_path(path: &Path) -> CoilResult<()> {
    if path.as_os_str().is_empty() {
        return Err(CoilError::argument(Status::MissingValue, "path is empty"));
    }
    Ok(())
}

impl Sftp {
    /// SFTP status code of the last failure on this handle, or 0.
    pub fn last_error(&self) -> u32 {
        self.last_error.get()
    }

    /// Typed form of [`last_error`](Self::last_error).
    ///
    /// `None` when nothing has failed yet or the server sent a code outside
    /// the SSH_FX range.
    pub fn last_error_code(&self) -> Option<SftpErrorCode> {
        self.last_error.code()
    }

    /// Shuts the SFTP subsystem down.
    pub fn shutdown(mut self) -> CoilResult<()> {
        self.inner
            .shutdown()
            .map_err(|e| self.last_error.record(e))?;
        debug!("SFTP session shut down");
        Ok(())
    }

    /// Opens a file.
    ///
    /// `mode` only matters when the file is created.
    pub fn open_file(&self, path: &Path, flags: OpenFlags, mode: FileMode) -> CoilResult<SftpFile> {
        require_path(path)?;
        let file = self
            .inner
            .open_mode(
                path,
                flags.to_ssh2(),
                mode.permissions() as i32,
                ssh2::OpenType::File,
            )
            .map_err(|e| self.last_error.record(e))?;
        debug!(path = %path.display(), flags = flags.0, "SFTP file opened");
        Ok(SftpFile::new(file, self.last_error.clone()))
    }

    /// Opens a directory for listing.
    pub fn open_directory(&self, path: &Path) -> CoilResult<SftpDirectory> {
        require_path(path)?;
        let dir = self
            .inner
            .opendir(path)
            .map_err(|e| self.last_error.record(e))?;
        debug!(path = %path.display(), "SFTP directory opened");
        Ok(SftpDirectory::new(dir, self.last_error.clone()))
    }

    /// Attributes of `path`, following symbolic links.
    pub fn status(&self, path: &Path) -> CoilResult<Attributes> {
        require_path(path)?;
        let stat = self
            .inner
            .stat(path)
            .map_err(|e| self.last_error.record(e))?;
        Ok(stat.into())
    }

    /// Attributes of `path` itself, without following a symbolic link.
    pub fn link_status(&self, path: &Path) -> CoilResult<Attributes> {
        require_path(path)?;
        let stat = self
            .inner
            .lstat(path)
            .map_err(|e| self.last_error.record(e))?;
        Ok(stat.into())
    }

    /// Changes the attributes of `path`. Only the fields that are set are sent.
    pub fn set_status(&self, path: &Path, attrs: &Attributes) -> CoilResult<()> {
        require_path(path)?;
        self.inner
            .setstat(path, attrs.into())
            .map_err(|e| self.last_error.record(e))?;
        debug!(path = %path.display(), flags = attrs.flags().0, "SFTP attributes set");
        Ok(())
    }

    /// Renames `src` to `dst`, overwriting `dst` where the server allows it.
    pub fn rename(&self, src: &Path, dst: &Path) -> CoilResult<()> {
        require_path(src)?;
        require_path(dst)?;
        self.inner
            .rename(src, dst, None)
            .map_err(|e| self.last_error.record(e))?;
        debug!(src = %src.display(), dst = %dst.display(), "SFTP rename");
        Ok(())
    }

    /// Removes a file.
    pub fn delete_file(&self, path: &Path) -> CoilResult<()> {
        require_path(path)?;
        self.inner
            .unlink(path)
            .map_err(|e| self.last_error.record(e))?;
        debug!(path = %path.display(), "SFTP file deleted");
        Ok(())
    }

    /// Creates a directory.
    pub fn create_directory(&self, path: &Path, mode: FileMode) -> CoilResult<()> {
        require_path(path)?;
        self.inner
            .mkdir(path, mode.permissions() as i32)
            .map_err(|e| self.last_error.record(e))?;
        debug!(path = %path.display(), "SFTP directory created");
        Ok(())
    }

    /// Removes an empty directory.
    pub fn remove_directory(&self, path: &Path) -> CoilResult<()> {
        require_path(path)?;
        self.inner
            .rmdir(path)
            .map_err(|e| self.last_error.record(e))?;
        debug!(path = %path.display(), "SFTP directory removed");
        Ok(())
    }

    /// Creates a symbolic link.
    ///
    /// Arguments are passed to libssh2 in its order; some servers (OpenSSH
    /// among them) swap the two.
    pub fn create_link(&self, path: &Path, target: &Path) -> CoilResult<()> {
        require_path(path)?;
        require_path(target)?;
        self.inner
            .symlink(path, target)
            .map_err(|e| self.last_error.record(e))?;
        Ok(())
    }

    /// Target of a symbolic link.
    pub fn resolve_symbolic_link(&self, path: &Path) -> CoilResult<PathBuf> {
        require_path(path)?;
        self.inner
            .readlink(path)
            .map_err(|e| self.last_error.record(e))
    }

    /// Canonical absolute form of `path`.
    pub fn resolve_real_link(&self, path: &Path) -> CoilResult<PathBuf> {
        require_path(path)?;
        self.inner.realpath(path).map_err(|e| {
            let err = self.last_error.record(e);
            warn!(path = %path.display(), error = %err, "SFTP realpath failed");
            err
        })
    }
}

impl std::fmt::Debug for Sftp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sftp")
            .field("last_error", &self.last_error_code())
            .finish()
    }
}

impl Session {
    /// Starts the SFTP subsystem.
    pub fn sftp(&self) -> CoilResult<Sftp> {
        let inner = self.inner.sftp()?;
        debug!("SFTP session started");
        Ok(Sftp {
            inner,
            last_error: ErrorSlot::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_slot_records_sftp_codes() {
        let slot = ErrorSlot::default();
        assert_eq!(slot.get(), 0);

        let err = slot.record(ssh2::Error::new(
            ssh2::ErrorCode::SFTP(SftpErrorCode::PermissionDenied as i32),
            "denied",
        ));
        assert_eq!(err.status(), Status::SftpProtocol);
        assert_eq!(slot.get(), 3);
        assert_eq!(slot.code(), Some(SftpErrorCode::PermissionDenied));

        // Session-level failures leave the SFTP code alone.
        slot.record(ssh2::Error::new(ssh2::ErrorCode::Session(-13), "disconnect"));
        assert_eq!(slot.get(), 3);
    }

    #[test]
    fn test_error_slot_code_none_until_failure() {
        let slot = ErrorSlot::default();
        assert_eq!(slot.code(), None);

        slot.record(ssh2::Error::new(ssh2::ErrorCode::SFTP(99), "vendor specific"));
        assert_eq!(slot.get(), 99);
        assert_eq!(slot.code(), None);

        slot.record(ssh2::Error::new(ssh2::ErrorCode::SFTP(18), "not empty"));
        let code = slot.code().unwrap();
        assert_eq!(code, SftpErrorCode::DirNotEmpty);
        assert_eq!(code.to_string(), "Directory not empty (18)");
    }

    #[test]
    fn test_error_slot_shared_between_clones() {
        let slot = ErrorSlot::default();
        let file_slot = slot.clone();
        file_slot.record(ssh2::Error::new(ssh2::ErrorCode::SFTP(2), "no such file"));
        assert_eq!(slot.get(), 2);
    }

    #[test]
    fn test_empty_path_rejected() {
        assert_eq!(
            require_path(Path::new("")).unwrap_err().status(),
            Status::MissingValue
        );
        assert!(require_path(Path::new("/tmp")).is_ok());
    }
}
