//! Session configuration.
//!
//! [`SessionConfig`] collects the settings applied by
//! [`Session::connect_with`](crate::Session::connect_with).
//!
//! # Example
//!
//! ```rust
//! use coil_ssh::{Method, Mode, SessionConfig};
//!
//! let config = SessionConfig::default()
//!     .with_timeout_ms(10_000)
//!     .with_method_pref(Method::HostKey, "ssh-ed25519,rsa-sha2-256")
//!     .with_keepalive(30, false);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.mode, Mode::Blocking);
//! ```

use crate::session::{Method, Mode};
use crate::trace::TraceFlags;
use coil_platform::{CoilError, CoilResult};

/// Keepalive settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeepaliveConfig {
    /// Send keepalive messages
    pub enabled: bool,
    /// Seconds between keepalives
    pub interval_secs: u32,
    /// Ask the server to reply
    pub want_reply: bool,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 60,
            want_reply: false,
        }
    }
}

/// Settings applied to a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// I/O mode after the handshake.
    pub mode: Mode,
    /// Blocking timeout in milliseconds. Zero waits forever.
    pub timeout_ms: u32,
    /// Local banner sent during the handshake.
    pub banner: Option<String>,
    /// Negotiate compression.
    pub compress: bool,
    /// Allow SIGPIPE from socket writes.
    pub sigpipe: bool,
    /// Algorithm preferences, applied in order before the handshake.
    pub method_prefs: Vec<(Method, String)>,
    /// Keepalive settings.
    pub keepalive: KeepaliveConfig,
    /// Raw libssh2 trace bitmask. Zero disables trace capture.
    pub trace: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Blocking,
            timeout_ms: 0,
            banner: None,
            compress: false,
            sigpipe: false,
            method_prefs: Vec::new(),
            keepalive: KeepaliveConfig::default(),
            trace: 0,
        }
    }
}

impl SessionConfig {
    /// Sets the I/O mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the blocking timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the local banner.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Enables or disables compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Allows or suppresses SIGPIPE.
    pub fn with_sigpipe(mut self, sigpipe: bool) -> Self {
        self.sigpipe = sigpipe;
        self
    }

    /// Adds an algorithm preference list for a method.
    pub fn with_method_pref(mut self, method: Method, prefs: impl Into<String>) -> Self {
        self.method_prefs.push((method, prefs.into()));
        self
    }

    /// Enables keepalives.
    pub fn with_keepalive(mut self, interval_secs: u32, want_reply: bool) -> Self {
        self.keepalive = KeepaliveConfig {
            enabled: true,
            interval_secs,
            want_reply,
        };
        self
    }

    /// Captures libssh2 trace output for the given categories.
    pub fn with_trace(mut self, flags: TraceFlags) -> Self {
        self.trace = flags.bits();
        self
    }

    /// Trace categories to capture, if any.
    pub fn trace_flags(&self) -> Option<TraceFlags> {
        if self.trace == 0 {
            None
        } else {
            Some(TraceFlags::from_bits_truncate(self.trace))
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CoilResult<()> {
        if let Some(banner) = &self.banner {
            if banner.is_empty() {
                return Err(CoilError::Config("banner cannot be empty".into()));
            }
            if banner.contains('\r') || banner.contains('\n') {
                return Err(CoilError::Config(
                    "banner cannot contain line breaks".into(),
                ));
            }
        }
        for (method, prefs) in &self.method_prefs {
            if prefs.trim().is_empty() {
                return Err(CoilError::Config(format!(
                    "{:?} preference list cannot be empty",
                    method
                )));
            }
        }
        if self.keepalive.enabled && self.keepalive.interval_secs == 0 {
            return Err(CoilError::Config(
                "keepalive interval must be at least one second".into(),
            ));
        }
        Ok(())
    }
}
