//! SSH session handle.
//!
//! A [`Session`] owns one libssh2 session. Every other handle in this crate
//! (channels, SFTP, known hosts, agent) is created from a session and keeps
//! the underlying libssh2 session alive for as long as it exists, so dropping
//! the session before its children is safe.
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::{HashType, Session};
//! use std::net::TcpStream;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = TcpStream::connect("example.com:22")?;
//! let session = Session::connect(stream)?;
//!
//! let fingerprint = session.hostkey_fingerprint(HashType::Sha256)?;
//! println!("host key: {}", fingerprint);
//!
//! session.userauth_password("user", "password")?;
//! assert!(session.authenticated());
//! # Ok(())
//! # }
//! ```

use crate::config::SessionConfig;
use crate::trace::{self, TraceFlags, TraceQueue};
use coil_platform::{CoilError, CoilResult, Status};
use std::net::TcpStream;
use tracing::{debug, info};

/// Host key hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HashType {
    /// MD5 (16 bytes)
    Md5,
    /// SHA-1 (20 bytes)
    Sha1,
    /// SHA-256 (32 bytes)
    Sha256,
}

impl HashType {
    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashType::Md5 => 16,
            HashType::Sha1 => 20,
            HashType::Sha256 => 32,
        }
    }

    fn to_ssh2(self) -> ssh2::HashType {
        match self {
            HashType::Md5 => ssh2::HashType::Md5,
            HashType::Sha1 => ssh2::HashType::Sha1,
            HashType::Sha256 => ssh2::HashType::Sha256,
        }
    }
}

/// Remote host key algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKeyType {
    /// Unrecognized key type
    Unknown,
    /// ssh-rsa
    Rsa,
    /// ssh-dss
    Dss,
    /// ecdsa-sha2-nistp256
    Ecdsa256,
    /// ecdsa-sha2-nistp384
    Ecdsa384,
    /// ecdsa-sha2-nistp521
    Ecdsa521,
    /// ssh-ed25519
    Ed25519,
}

impl From<ssh2::HostKeyType> for HostKeyType {
    fn from(kind: ssh2::HostKeyType) -> Self {
        match kind {
            ssh2::HostKeyType::Unknown => HostKeyType::Unknown,
            ssh2::HostKeyType::Rsa => HostKeyType::Rsa,
            ssh2::HostKeyType::Dss => HostKeyType::Dss,
            ssh2::HostKeyType::Ecdsa256 => HostKeyType::Ecdsa256,
            ssh2::HostKeyType::Ecdsa384 => HostKeyType::Ecdsa384,
            ssh2::HostKeyType::Ecdsa521 => HostKeyType::Ecdsa521,
            ssh2::HostKeyType::Ed25519 => HostKeyType::Ed25519,
        }
    }
}

/// Session I/O mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Calls return [`Status::ExecuteAgain`] instead of blocking
    NonBlocking = 0,
    /// Calls block until complete or timed out
    Blocking = 1,
}

impl Mode {
    /// Converts a raw mode value.
    pub fn from_raw(value: i32) -> CoilResult<Self> {
        match value {
            0 => Ok(Mode::NonBlocking),
            1 => Ok(Mode::Blocking),
            other => Err(CoilError::argument(
                Status::UnknownMode,
                format!("unknown session mode {}", other),
            )),
        }
    }
}

/// Directions a non-blocking session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDirections {
    /// Waiting to read from the socket
    Read,
    /// Waiting to write to the socket
    Write,
    /// Waiting on both
    Both,
}

/// Boolean session options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionOption {
    /// Allow SIGPIPE to be raised by socket writes
    Sigpipe,
    /// Negotiate compression
    Compress,
}

/// Method categories negotiated during key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// Key exchange
    Kex,
    /// Host key algorithm
    HostKey,
    /// Client to server cipher
    CryptCs,
    /// Server to client cipher
    CryptSc,
    /// Client to server MAC
    MacCs,
    /// Server to client MAC
    MacSc,
    /// Client to server compression
    CompCs,
    /// Server to client compression
    CompSc,
    /// Client to server language
    LangCs,
    /// Server to client language
    LangSc,
}

impl Method {
    /// All method categories.
    pub const ALL: [Method; 10] = [
        Method::Kex,
        Method::HostKey,
        Method::CryptCs,
        Method::CryptSc,
        Method::MacCs,
        Method::MacSc,
        Method::CompCs,
        Method::CompSc,
        Method::LangCs,
        Method::LangSc,
    ];

    fn to_ssh2(self) -> ssh2::MethodType {
        match self {
            Method::Kex => ssh2::MethodType::Kex,
            Method::HostKey => ssh2::MethodType::HostKey,
            Method::CryptCs => ssh2::MethodType::CryptCs,
            Method::CryptSc => ssh2::MethodType::CryptSc,
            Method::MacCs => ssh2::MethodType::MacCs,
            Method::MacSc => ssh2::MethodType::MacSc,
            Method::CompCs => ssh2::MethodType::CompCs,
            Method::CompSc => ssh2::MethodType::CompSc,
            Method::LangCs => ssh2::MethodType::LangCs,
            Method::LangSc => ssh2::MethodType::LangSc,
        }
    }
}

/// An SSH session.
pub struct Session {
    pub(crate) inner: ssh2::Session,
    trace: Option<TraceQueue>,
}

impl Session {
    /// Creates a session that is not yet connected.
    pub fn new() -> CoilResult<Self> {
        let inner = ssh2::Session::new()?;
        debug!("Session created");
        Ok(Self { inner, trace: None })
    }

    /// Creates a session and performs the handshake on a connected stream.
    pub fn connect(stream: TcpStream) -> CoilResult<Self> {
        Self::connect_with(stream, &SessionConfig::default())
    }

    /// Creates a session configured by `config` and performs the handshake.
    ///
    /// Banner, compression, method preferences and tracing are applied before
    /// the handshake. The I/O mode and keepalive settings are applied after
    /// it, so a non-blocking configuration does not interrupt key exchange.
    pub fn connect_with(stream: TcpStream, config: &SessionConfig) -> CoilResult<Self> {
        config.validate()?;

        let peer = stream.peer_addr().ok();
        let mut session = Self::new()?;

        if let Some(banner) = &config.banner {
            session.set_banner(banner)?;
        }
        session.set_option(SessionOption::Compress, config.compress);
        session.set_option(SessionOption::Sigpipe, config.sigpipe);
        for (method, prefs) in &config.method_prefs {
            session.set_method_pref(*method, prefs)?;
        }
        if let Some(flags) = config.trace_flags() {
            session.trace_begin(flags);
        }
        session.set_timeout(config.timeout_ms);

        session.set_tcp_stream(stream);
        session.handshake()?;

        session.set_mode(config.mode);
        if config.keepalive.enabled {
            session.set_keepalive(config.keepalive.want_reply, config.keepalive.interval_secs);
        }

        match peer {
            Some(addr) => info!(peer = %addr, "SSH session established"),
            None => info!("SSH session established"),
        }
        Ok(session)
    }

    /// Attaches a connected TCP stream without starting the handshake.
    pub fn set_tcp_stream(&mut self, stream: TcpStream) {
        self.inner.set_tcp_stream(stream);
    }

    /// Performs the SSH handshake on the attached stream.
    pub fn handshake(&mut self) -> CoilResult<()> {
        self.inner.handshake()?;
        debug!(
            kex = self.inner.methods(ssh2::MethodType::Kex).unwrap_or("-"),
            hostkey = self.inner.methods(ssh2::MethodType::HostKey).unwrap_or("-"),
            "Handshake complete"
        );
        Ok(())
    }

    /// Sends a disconnect message to the remote host.
    pub fn disconnect(&self, description: &str) -> CoilResult<()> {
        self.inner.set_blocking(true);
        self.inner.disconnect(
            Some(ssh2::DisconnectCode::ByApplication),
            description,
            Some(""),
        )?;
        debug!(description, "Session disconnected");
        Ok(())
    }

    /// Returns the remote host key and its algorithm.
    pub fn hostkey(&self) -> CoilResult<(Vec<u8>, HostKeyType)> {
        self.inner
            .host_key()
            .map(|(key, kind)| (key.to_vec(), kind.into()))
            .ok_or_else(|| {
                CoilError::argument(Status::SessionNotStarted, "no host key before handshake")
            })
    }

    /// Length in bytes of a host key hash of the given type.
    pub fn hostkey_hash_len(&self, hash: HashType) -> usize {
        hash.digest_len()
    }

    /// Returns the hash of the remote host key.
    ///
    /// Fails with [`Status::HashUnavailable`] before the handshake or when
    /// libssh2 was built without the requested algorithm.
    pub fn hostkey_hash(&self, hash: HashType) -> CoilResult<Vec<u8>> {
        self.inner
            .host_key_hash(hash.to_ssh2())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                CoilError::argument(
                    Status::HashUnavailable,
                    format!("{:?} host key hash unavailable", hash),
                )
            })
    }

    /// Returns the host key hash as colon-separated hex.
    pub fn hostkey_fingerprint(&self, hash: HashType) -> CoilResult<String> {
        let digest = self.hostkey_hash(hash)?;
        let hex = hex::encode(digest);
        let pairs: Vec<&str> = (0..hex.len())
            .step_by(2)
            .map(|i| &hex[i..i + 2])
            .collect();
        Ok(pairs.join(":"))
    }

    /// Sets the I/O mode.
    pub fn set_mode(&self, mode: Mode) {
        self.inner.set_blocking(mode == Mode::Blocking);
    }

    /// Returns the current I/O mode.
    pub fn mode(&self) -> Mode {
        if self.inner.is_blocking() {
            Mode::Blocking
        } else {
            Mode::NonBlocking
        }
    }

    /// Sets the blocking timeout in milliseconds. Zero disables it.
    pub fn set_timeout(&self, timeout_ms: u32) {
        self.inner.set_timeout(timeout_ms);
    }

    /// Returns the blocking timeout in milliseconds.
    pub fn timeout(&self) -> u32 {
        self.inner.timeout()
    }

    /// Sets the banner sent to the remote host during the handshake.
    pub fn set_banner(&self, banner: &str) -> CoilResult<()> {
        if banner.is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "banner is empty"));
        }
        self.inner.set_banner(banner)?;
        Ok(())
    }

    /// Returns the banner sent by the remote host.
    pub fn banner(&self) -> Option<String> {
        self.inner.banner().map(str::to_string)
    }

    /// Turns an option on.
    pub fn enable_option(&self, option: SessionOption) {
        self.set_option(option, true);
    }

    /// Turns an option off.
    pub fn disable_option(&self, option: SessionOption) {
        self.set_option(option, false);
    }

    fn set_option(&self, option: SessionOption, enabled: bool) {
        match option {
            SessionOption::Sigpipe => self.inner.set_allow_sigpipe(enabled),
            SessionOption::Compress => self.inner.set_compress(enabled),
        }
    }

    /// Sets the preferred algorithms for a method, as a comma-separated list.
    ///
    /// Must be called before the handshake.
    pub fn set_method_pref(&self, method: Method, prefs: &str) -> CoilResult<()> {
        if prefs.is_empty() {
            return Err(CoilError::argument(
                Status::MissingValue,
                "method preference list is empty",
            ));
        }
        self.inner.method_pref(method.to_ssh2(), prefs)?;
        Ok(())
    }

    /// Returns the negotiated algorithm for a method.
    pub fn method(&self, method: Method) -> CoilResult<String> {
        self.inner
            .methods(method.to_ssh2())
            .map(str::to_string)
            .ok_or_else(|| {
                CoilError::argument(
                    Status::SessionNotStarted,
                    format!("{:?} has not been negotiated", method),
                )
            })
    }

    /// Lists the algorithms libssh2 supports for a method.
    pub fn supported_algorithms(&self, method: Method) -> CoilResult<Vec<&'static str>> {
        Ok(self.inner.supported_algs(method.to_ssh2())?)
    }

    /// Configures keepalive messages; an interval of zero disables them.
    pub fn set_keepalive(&self, want_reply: bool, interval_secs: u32) {
        self.inner.set_keepalive(want_reply, interval_secs);
    }

    /// Sends a keepalive if one is due and returns seconds until the next.
    pub fn keepalive_send(&self) -> CoilResult<u32> {
        Ok(self.inner.keepalive_send()?)
    }

    /// Returns the directions a non-blocking call is waiting on.
    pub fn block_directions(&self) -> CoilResult<BlockDirections> {
        match self.inner.block_directions() {
            ssh2::BlockDirections::Inbound => Ok(BlockDirections::Read),
            ssh2::BlockDirections::Outbound => Ok(BlockDirections::Write),
            ssh2::BlockDirections::Both => Ok(BlockDirections::Both),
            ssh2::BlockDirections::None => Err(CoilError::argument(
                Status::UnknownBlockDirection,
                "session is not blocked",
            )),
        }
    }

    /// Returns the last error recorded by libssh2 for this session.
    pub fn last_error(&self) -> Option<CoilError> {
        ssh2::Error::last_session_error(&self.inner).map(CoilError::from)
    }

    /// Status of the last error recorded by libssh2, or `Ok` if none.
    pub fn last_error_code(&self) -> Status {
        self.last_error()
            .map(|e| e.status())
            .unwrap_or(Status::Ok)
    }

    /// Starts capturing libssh2 trace output into a queue.
    ///
    /// Replaces any queue attached by an earlier call.
    pub fn trace_begin(&mut self, flags: TraceFlags) -> TraceQueue {
        self.trace_end();
        let queue = trace::attach(&self.inner, flags);
        self.trace = Some(queue.clone());
        queue
    }

    /// Stops trace capture. Messages already queued remain readable.
    pub fn trace_end(&mut self) {
        if let Some(queue) = self.trace.take() {
            trace::detach(&self.inner, &queue);
        }
    }

    /// Returns the attached trace queue, if any.
    pub fn trace_queue(&self) -> Option<&TraceQueue> {
        self.trace.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode())
            .field("timeout", &self.timeout())
            .field("authenticated", &self.inner.authenticated())
            .field("tracing", &self.trace.is_some())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // libssh2 frees a non-blocking session without flushing pending writes.
        self.inner.set_blocking(true);
        self.trace_end();
        debug!("Session dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_lengths() {
        assert_eq!(HashType::Md5.digest_len(), 16);
        assert_eq!(HashType::Sha1.digest_len(), 20);
        assert_eq!(HashType::Sha256.digest_len(), 32);
    }

    #[test]
    fn test_hostkey_hash_before_handshake() {
        let session = Session::new().unwrap();
        session.set_mode(Mode::Blocking);
        assert_eq!(session.mode(), Mode::Blocking);

        assert_eq!(session.hostkey_hash_len(HashType::Sha1), 20);

        let err = session.hostkey_hash(HashType::Sha1).unwrap_err();
        assert_eq!(err.status(), Status::HashUnavailable);
    }

    #[test]
    fn test_hostkey_before_handshake() {
        let session = Session::new().unwrap();
        let err = session.hostkey().unwrap_err();
        assert_eq!(err.status(), Status::SessionNotStarted);
    }

    #[test]
    fn test_method_before_handshake() {
        let session = Session::new().unwrap();
        let err = session.method(Method::Kex).unwrap_err();
        assert_eq!(err.status(), Status::SessionNotStarted);
    }

    #[test]
    fn test_mode_round_trip() {
        let session = Session::new().unwrap();
        session.set_mode(Mode::NonBlocking);
        assert_eq!(session.mode(), Mode::NonBlocking);
        session.set_mode(Mode::Blocking);
        assert_eq!(session.mode(), Mode::Blocking);
    }

    #[test]
    fn test_mode_from_raw() {
        assert_eq!(Mode::from_raw(0).unwrap(), Mode::NonBlocking);
        assert_eq!(Mode::from_raw(1).unwrap(), Mode::Blocking);
        assert_eq!(
            Mode::from_raw(7).unwrap_err().status(),
            Status::UnknownMode
        );
    }

    #[test]
    fn test_timeout() {
        let session = Session::new().unwrap();
        session.set_timeout(1500);
        assert_eq!(session.timeout(), 1500);
    }

    #[test]
    fn test_banner_rejects_empty() {
        let session = Session::new().unwrap();
        assert_eq!(
            session.set_banner("").unwrap_err().status(),
            Status::MissingValue
        );
        session.set_banner("SSH-2.0-coil").unwrap();
        // Remote banner is only known after the handshake.
        assert!(session.banner().is_none());
    }

    #[test]
    fn test_method_pref_rejects_empty() {
        let session = Session::new().unwrap();
        assert_eq!(
            session.set_method_pref(Method::Kex, "").unwrap_err().status(),
            Status::MissingValue
        );
    }

    #[test]
    fn test_supported_algorithms() {
        let session = Session::new().unwrap();
        let ciphers = session.supported_algorithms(Method::CryptCs).unwrap();
        assert!(!ciphers.is_empty());
    }

    #[test]
    fn test_block_directions_idle() {
        let session = Session::new().unwrap();
        assert_eq!(
            session.block_directions().unwrap_err().status(),
            Status::UnknownBlockDirection
        );
    }

    #[test]
    fn test_child_outlives_session() {
        let session = Session::new().unwrap();
        let known_hosts = session.known_hosts().unwrap();
        drop(session);
        assert_eq!(known_hosts.len().unwrap(), 0);
    }
}
