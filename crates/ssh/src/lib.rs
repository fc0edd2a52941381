//! Safe, handle-owning bindings over libssh2.
//!
//! Every libssh2 object is wrapped in a handle that owns it and releases it
//! on drop:
//!
//! - [`Session`] - connection, handshake, host key and algorithm settings
//! - [`Channel`] and [`Listener`] - command execution, shells, forwarding
//! - [`sftp::Sftp`] - remote file access
//! - [`KnownHosts`] - OpenSSH `known_hosts` checking
//! - [`Agent`] - authentication through a running SSH agent
//! - [`TraceQueue`] - captured libssh2 debug output
//!
//! Every failing call returns a [`CoilError`] whose [`Status`] is the
//! translated libssh2 result code.
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::{CheckResult, KnownHosts, Session, SessionConfig};
//! use std::net::TcpStream;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! coil_ssh::init()?;
//!
//! let stream = TcpStream::connect("example.com:22")?;
//! let session = Session::connect_with(stream, &SessionConfig::default().with_timeout_ms(10_000))?;
//!
//! let mut known_hosts = session.known_hosts()?;
//! known_hosts.read_file(Path::new("/home/deploy/.ssh/known_hosts"))?;
//! let (key, _) = session.hostkey()?;
//! if known_hosts.check("example.com", 22, &key, KnownHosts::default_mask())? != CheckResult::Match {
//!     return Err("host key not trusted".into());
//! }
//!
//! session.userauth_agent("deploy")?;
//! let mut channel = session.channel()?;
//! channel.exec("uptime")?;
//! println!("{}", String::from_utf8_lossy(&channel.read_to_end()?));
//! channel.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The crate logs through `tracing` and installs no subscriber. Captured
//! libssh2 trace output is re-emitted at TRACE level under the
//! `coil_ssh::trace` target.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod agent;
pub mod channel;
pub mod config;
mod ffi;
pub mod known_hosts;
pub mod scp;
pub mod session;
pub mod sftp;
pub mod trace;
pub mod userauth;

pub use agent::{Agent, AgentIdentity};
pub use channel::{Channel, ChannelState, IgnoreMode, Listener};
pub use coil_platform::{CoilError, CoilResult, Status};
pub use config::{KeepaliveConfig, SessionConfig};
pub use known_hosts::{
    CheckResult, KeyAlgorithm, KeyEncoding, KnownHost, KnownHosts, NameType, TypeMask,
};
pub use scp::FileInfo;
pub use session::{
    BlockDirections, HashType, HostKeyType, Method, Mode, Session, SessionOption,
};
pub use sftp::{Attributes, Sftp, SftpDirectory, SftpFile};
pub use trace::{TraceFlags, TraceQueue};
pub use userauth::Credential;

use tracing::debug;

/// Initializes libssh2's global state.
///
/// Creating a [`Session`] does this implicitly; call it explicitly to
/// control when crypto backends are initialized.
pub fn init() -> CoilResult<()> {
    let rc = ffi::global_init();
    if rc != 0 {
        return Err(CoilError::from_code(rc, "libssh2 global initialization failed"));
    }
    debug!("libssh2 initialized");
    Ok(())
}

/// Releases libssh2's global state.
///
/// No handle may be used afterwards.
pub fn shutdown() {
    ffi::global_exit();
    debug!("libssh2 shut down");
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Major component of the crate version.
pub fn version_major() -> u32 {
    env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
}

/// Minor component of the crate version.
pub fn version_minor() -> u32 {
    env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
}

/// Patch component of the crate version.
pub fn version_patch() -> u32 {
    env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0)
}

/// Version of the linked libssh2.
pub fn libssh2_version() -> CoilResult<String> {
    ffi::runtime_version().ok_or_else(|| {
        CoilError::argument(
            Status::VersionTooOld,
            "linked libssh2 does not report its version",
        )
    })
}
