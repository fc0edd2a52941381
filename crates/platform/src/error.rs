//! Error types for coil

use crate::status::Status;
use std::fmt;

/// Unified error type for all coil operations
#[derive(Debug)]
pub enum CoilError {
    /// libssh2 session-level failure
    Ssh {
        /// Translated status
        status: Status,
        /// Raw libssh2 return code
        code: i32,
        /// Message reported by libssh2
        message: String,
    },

    /// SFTP-layer failure
    Sftp {
        /// SFTP status code (SSH_FX_*)
        code: u32,
        /// Message reported by libssh2
        message: String,
    },

    /// Argument rejected before reaching libssh2
    Argument {
        /// Status describing the rejected argument
        status: Status,
        /// What was wrong
        message: String,
    },

    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Config(String),
}

impl CoilError {
    /// Creates an argument error.
    pub fn argument(status: Status, message: impl Into<String>) -> Self {
        CoilError::Argument {
            status,
            message: message.into(),
        }
    }

    /// Creates an error from a raw libssh2 return code.
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        CoilError::Ssh {
            status: Status::from_result(code),
            code,
            message: message.into(),
        }
    }

    /// Status carried by this error.
    pub fn status(&self) -> Status {
        match self {
            CoilError::Ssh { status, .. } => *status,
            CoilError::Sftp { code, .. } => Status::from_sftp(*code),
            CoilError::Argument { status, .. } => *status,
            CoilError::Io(e) => match embedded_ssh2(e) {
                Some(inner) => CoilError::from_ssh2_ref(inner).status(),
                None => Status::Generic,
            },
            CoilError::Config(_) => Status::Invalid,
        }
    }

    /// SFTP status code, if this is an SFTP failure.
    pub fn sftp_code(&self) -> Option<u32> {
        match self {
            CoilError::Sftp { code, .. } => Some(*code),
            CoilError::Io(e) => match embedded_ssh2(e).map(|inner| inner.code()) {
                Some(ssh2::ErrorCode::SFTP(code)) => Some(code as u32),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns true if a non-blocking call should be repeated.
    pub fn would_block(&self) -> bool {
        self.status() == Status::ExecuteAgain
            || matches!(self, CoilError::Io(e) if e.kind() == std::io::ErrorKind::WouldBlock)
    }

    fn from_ssh2_ref(err: &ssh2::Error) -> Self {
        match err.code() {
            ssh2::ErrorCode::Session(code) => CoilError::from_code(code, err.message()),
            ssh2::ErrorCode::SFTP(code) => CoilError::Sftp {
                code: code as u32,
                message: err.message().to_string(),
            },
        }
    }
}

fn embedded_ssh2(err: &std::io::Error) -> Option<&ssh2::Error> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<ssh2::Error>())
}

impl fmt::Display for CoilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoilError::Ssh {
                status,
                code,
                message,
            } => write!(f, "{} ({}): {}", status, code, message),
            CoilError::Sftp { code, message } => write!(f, "SFTP error {}: {}", code, message),
            CoilError::Argument { status, message } => {
                write!(f, "Invalid argument ({}): {}", status, message)
            }
            CoilError::Io(e) => write!(f, "IO error: {}", e),
            CoilError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CoilError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoilError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ssh2::Error> for CoilError {
    fn from(err: ssh2::Error) -> Self {
        CoilError::from_ssh2_ref(&err)
    }
}

impl From<std::io::Error> for CoilError {
    fn from(err: std::io::Error) -> Self {
        match embedded_ssh2(&err) {
            Some(inner) => CoilError::from_ssh2_ref(inner),
            None => CoilError::Io(err),
        }
    }
}

/// Result type for coil operations
pub type CoilResult<T> = Result<T, CoilError>;
