//! SSH channels.
//!
//! A [`Channel`] is one logical stream over a session: a command execution,
//! an interactive shell, a subsystem, an SCP transfer or a forwarded TCP
//! connection.
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::Session;
//! use std::net::TcpStream;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(TcpStream::connect("example.com:22")?)?;
//! session.userauth_agent("deploy")?;
//!
//! let mut channel = session.channel()?;
//! channel.exec("uname -a")?;
//! let output = channel.read_to_end()?;
//! channel.close()?;
//! println!("{} -> {}", String::from_utf8_lossy(&output), channel.exit_status()?);
//! # Ok(())
//! # }
//! ```

use crate::session::Session;
use coil_platform::{CoilError, CoilResult, Status};
use std::io::{Read, Write};
use tracing::debug;

/// Channel state as seen by this side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Channel is open in both directions
    Open,
    /// We have sent EOF; reads are still possible
    EofSent,
    /// Channel is closed
    Closed,
}

/// What to do with extended data (stderr) arriving on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreMode {
    /// Keep stderr separate
    Normal = 0,
    /// Merge stderr into stdout
    Merge = 1,
    /// Discard stderr
    Ignore = 3,
}

impl IgnoreMode {
    /// Converts a raw ignore mode value.
    pub fn from_raw(value: i32) -> CoilResult<Self> {
        match value {
            0 => Ok(IgnoreMode::Normal),
            1 => Ok(IgnoreMode::Merge),
            3 => Ok(IgnoreMode::Ignore),
            other => Err(CoilError::argument(
                Status::UnknownIgnoreMode,
                format!("unknown ignore mode {}", other),
            )),
        }
    }

    fn to_ssh2(self) -> ssh2::ExtendedData {
        match self {
            IgnoreMode::Normal => ssh2::ExtendedData::Normal,
            IgnoreMode::Merge => ssh2::ExtendedData::Merge,
            IgnoreMode::Ignore => ssh2::ExtendedData::Ignore,
        }
    }
}

/// An SSH channel.
pub struct Channel {
    inner: ssh2::Channel,
    state: ChannelState,
}

impl Channel {
    pub(crate) fn new(inner: ssh2::Channel) -> Self {
        Self {
            inner,
            state: ChannelState::Open,
        }
    }

    /// Current state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    fn ensure_writable(&self) -> CoilResult<()> {
        match self.state {
            ChannelState::Open => Ok(()),
            ChannelState::EofSent => Err(CoilError::argument(
                Status::ChannelEofSent,
                "EOF already sent on channel",
            )),
            ChannelState::Closed => Err(CoilError::argument(
                Status::ChannelClosed,
                "channel is closed",
            )),
        }
    }

    fn ensure_open(&self) -> CoilResult<()> {
        if self.state == ChannelState::Closed {
            return Err(CoilError::argument(
                Status::ChannelClosed,
                "channel is closed",
            ));
        }
        Ok(())
    }

    /// Runs a command.
    pub fn exec(&mut self, command: &str) -> CoilResult<()> {
        self.ensure_writable()?;
        if command.is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "command is empty"));
        }
        self.inner.exec(command)?;
        debug!(command, "Channel exec started");
        Ok(())
    }

    /// Starts the user's login shell.
    pub fn shell(&mut self) -> CoilResult<()> {
        self.ensure_writable()?;
        self.inner.shell()?;
        debug!("Channel shell started");
        Ok(())
    }

    /// Starts a subsystem such as `sftp`.
    pub fn subsystem(&mut self, name: &str) -> CoilResult<()> {
        self.ensure_writable()?;
        if name.is_empty() {
            return Err(CoilError::argument(
                Status::MissingValue,
                "subsystem name is empty",
            ));
        }
        self.inner.subsystem(name)?;
        debug!(subsystem = name, "Channel subsystem started");
        Ok(())
    }

    /// Requests a pseudo-terminal.
    pub fn request_pty(&mut self, term: &str) -> CoilResult<()> {
        self.ensure_writable()?;
        self.inner.request_pty(term, None, None)?;
        Ok(())
    }

    /// Reads stdout into `buf` and returns the number of bytes read.
    ///
    /// Zero means end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> CoilResult<usize> {
        self.ensure_open()?;
        Ok(self.inner.read(buf)?)
    }

    /// Reads stderr into `buf` and returns the number of bytes read.
    pub fn read_stderr(&mut self, buf: &mut [u8]) -> CoilResult<usize> {
        self.ensure_open()?;
        Ok(self.inner.stderr().read(buf)?)
    }

    /// Reads stdout until the remote end sends EOF.
    pub fn read_to_end(&mut self) -> CoilResult<Vec<u8>> {
        self.ensure_open()?;
        let mut data = Vec::new();
        self.inner.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Reads stderr until the remote end sends EOF.
    pub fn read_stderr_to_end(&mut self) -> CoilResult<Vec<u8>> {
        self.ensure_open()?;
        let mut data = Vec::new();
        self.inner.stderr().read_to_end(&mut data)?;
        Ok(data)
    }

    /// Writes `data` to stdin and returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> CoilResult<usize> {
        self.ensure_writable()?;
        Ok(self.inner.write(data)?)
    }

    /// Writes all of `data` to stdin.
    pub fn write_all(&mut self, data: &[u8]) -> CoilResult<()> {
        self.ensure_writable()?;
        self.inner.write_all(data)?;
        Ok(())
    }

    /// Flushes pending stdout data.
    pub fn flush(&mut self) -> CoilResult<()> {
        self.ensure_open()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Returns true if the remote end has sent EOF.
    pub fn eof(&self) -> bool {
        self.inner.eof()
    }

    /// Tells the remote end no more data will be sent.
    pub fn send_eof(&mut self) -> CoilResult<()> {
        self.ensure_writable()?;
        self.inner.send_eof()?;
        self.state = ChannelState::EofSent;
        Ok(())
    }

    /// Waits for the remote end to send EOF.
    pub fn wait_eof(&mut self) -> CoilResult<()> {
        self.inner.wait_eof()?;
        Ok(())
    }

    /// Closes the channel.
    pub fn close(&mut self) -> CoilResult<()> {
        if self.state == ChannelState::Closed {
            return Ok(());
        }
        self.inner.close()?;
        self.state = ChannelState::Closed;
        debug!("Channel closed");
        Ok(())
    }

    /// Waits for the remote end to acknowledge the close.
    pub fn wait_close(&mut self) -> CoilResult<()> {
        self.inner.wait_close()?;
        self.state = ChannelState::Closed;
        Ok(())
    }

    /// Exit status of the remote command. Only meaningful after close.
    pub fn exit_status(&self) -> CoilResult<i32> {
        Ok(self.inner.exit_status()?)
    }

    /// Chooses how stderr is handled.
    pub fn set_ignore_mode(&mut self, mode: IgnoreMode) -> CoilResult<()> {
        self.ensure_open()?;
        self.inner.handle_extended_data(mode.to_ssh2())?;
        Ok(())
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("state", &self.state)
            .field("eof", &self.inner.eof())
            .finish()
    }
}

/// Remote port forwarding listener.
///
/// Dropping the listener cancels the forward.
pub struct Listener {
    inner: ssh2::Listener,
    port: u16,
}

impl Listener {
    /// Port bound on the remote host.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for a forwarded connection.
    pub fn accept(&mut self) -> CoilResult<Channel> {
        let channel = self.inner.accept()?;
        debug!(port = self.port, "Accepted forwarded connection");
        Ok(Channel::new(channel))
    }

    /// Cancels the forward.
    pub fn cancel(self) {
        debug!(port = self.port, "Forward cancelled");
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("port", &self.port).finish()
    }
}

impl Session {
    /// Opens a session channel.
    pub fn channel(&self) -> CoilResult<Channel> {
        let channel = self.inner.channel_session()?;
        debug!("Session channel opened");
        Ok(Channel::new(channel))
    }

    /// Opens a channel tunnelled to `host:port` from the remote host.
    ///
    /// `source` is the originating address reported to the server and
    /// defaults to `127.0.0.1:22`.
    pub fn direct_tcpip(
        &self,
        host: &str,
        port: u16,
        source: Option<(&str, u16)>,
    ) -> CoilResult<Channel> {
        if host.is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "host is empty"));
        }
        let channel = self.inner.channel_direct_tcpip(host, port, source)?;
        debug!(host, port, "Direct TCP/IP channel opened");
        Ok(Channel::new(channel))
    }

    /// Asks the remote host to listen on `port` and forward connections.
    ///
    /// A `port` of zero lets the server pick; the chosen port is available
    /// through [`Listener::port`].
    pub fn forward_listen(
        &self,
        port: u16,
        host: Option<&str>,
        queue_max: Option<u32>,
    ) -> CoilResult<Listener> {
        let (inner, bound) = self.inner.channel_forward_listen(port, host, queue_max)?;
        debug!(requested = port, bound, "Remote forward listening");
        Ok(Listener { inner, port: bound })
    }
}
