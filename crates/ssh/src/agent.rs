//! SSH agent client.
//!
//! Identities are returned as [`AgentIdentity`] snapshots. As with known
//! hosts, the walk is stateless: [`Agent::next_identity`] takes the previous
//! identity as its cursor.

use crate::known_hosts::fingerprint_sha256;
use crate::session::Session;
use coil_platform::{CoilError, CoilResult, Status};
use tracing::{debug, warn};

/// A public key offered by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    index: usize,
    blob: Vec<u8>,
    comment: String,
}

impl AgentIdentity {
    /// Public key blob in SSH wire format.
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Comment the key was loaded with, usually a file name.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// OpenSSH-style fingerprint of the key.
    pub fn fingerprint_sha256(&self) -> String {
        fingerprint_sha256(&self.blob)
    }
}

/// Connection to the SSH agent named by `SSH_AUTH_SOCK`.
pub struct Agent {
    inner: ssh2::Agent,
    connected: bool,
}

impl Agent {
    /// Connects to the agent.
    pub fn connect(&mut self) -> CoilResult<()> {
        self.inner.connect()?;
        self.connected = true;
        debug!("Connected to SSH agent");
        Ok(())
    }

    /// Disconnects from the agent.
    pub fn disconnect(&mut self) -> CoilResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.inner.disconnect()?;
        self.connected = false;
        debug!("Disconnected from SSH agent");
        Ok(())
    }

    /// Fetches the current identity list from the agent.
    pub fn request_identities(&mut self) -> CoilResult<()> {
        self.inner.list_identities()?;
        Ok(())
    }

    /// Every identity fetched by the last [`request_identities`](Self::request_identities).
    pub fn identities(&self) -> CoilResult<Vec<AgentIdentity>> {
        Ok(self
            .inner
            .identities()?
            .iter()
            .enumerate()
            .map(|(index, key)| AgentIdentity {
                index,
                blob: key.blob().to_vec(),
                comment: key.comment().to_string(),
            })
            .collect())
    }

    /// First identity, or `None` if the agent holds none.
    pub fn first_identity(&self) -> CoilResult<Option<AgentIdentity>> {
        Ok(self.identities()?.into_iter().next())
    }

    /// Identity after `previous`, or `None` at the end.
    pub fn next_identity(&self, previous: &AgentIdentity) -> CoilResult<Option<AgentIdentity>> {
        Ok(self.identities()?.into_iter().nth(previous.index + 1))
    }

    /// Authenticates `username` with one identity.
    pub fn authenticate(&self, username: &str, identity: &AgentIdentity) -> CoilResult<()> {
        if username.is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "username is empty"));
        }
        let key = self
            .inner
            .identities()?
            .into_iter()
            .find(|key| key.blob() == identity.blob.as_slice())
            .ok_or_else(|| {
                CoilError::argument(
                    Status::AgentProtocol,
                    "identity is no longer offered by the agent",
                )
            })?;

        self.inner.userauth(username, &key).map_err(|e| {
            let err = CoilError::from(e);
            warn!(
                user = username,
                key = %identity.fingerprint_sha256(),
                status = %err.status(),
                "Agent authentication failed"
            );
            err
        })?;
        debug!(
            user = username,
            key = %identity.fingerprint_sha256(),
            "Agent authentication succeeded"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("connected", &self.connected)
            .finish()
    }
}

impl Session {
    /// Creates an agent handle. Call [`Agent::connect`] before use.
    pub fn agent(&self) -> CoilResult<Agent> {
        let inner = self.inner.agent()?;
        Ok(Agent {
            inner,
            connected: false,
        })
    }
}
