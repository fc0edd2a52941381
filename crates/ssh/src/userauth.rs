//! User authentication.
//!
//! Authentication methods are called on a [`Session`] after the handshake.
//! Secrets passed in are copied into zeroizing buffers for the duration of the
//! call.
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::{Credential, Session};
//! use std::net::TcpStream;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(TcpStream::connect("example.com:22")?)?;
//!
//! let methods = session.auth_methods("deploy")?;
//! let credential = if methods.iter().any(|m| m == "publickey") {
//!     Credential::public_key_file("/home/deploy/.ssh/id_ed25519", None)
//! } else {
//!     Credential::password("hunter2")
//! };
//! session.authenticate("deploy", &credential)?;
//! # Ok(())
//! # }
//! ```

use crate::session::Session;
use coil_platform::{CoilError, CoilResult, Status};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Credentials for [`Session::authenticate`].
pub enum Credential {
    /// Password authentication
    Password(Zeroizing<String>),
    /// Key pair read from files
    PublicKeyFile {
        /// Public key path; derived from the private key when absent
        public: Option<PathBuf>,
        /// Private key path
        private: PathBuf,
        /// Private key passphrase
        passphrase: Option<Zeroizing<String>>,
    },
    /// Key pair held in memory
    PublicKeyMemory {
        /// Public key data
        public: Option<String>,
        /// Private key data
        private: Zeroizing<String>,
        /// Private key passphrase
        passphrase: Option<Zeroizing<String>>,
    },
    /// First identity accepted from the running SSH agent
    Agent,
}

impl Credential {
    /// Password credential.
    pub fn password(password: impl Into<String>) -> Self {
        Credential::Password(Zeroizing::new(password.into()))
    }

    /// Private key file, with the public key next to it.
    pub fn public_key_file(private: impl Into<PathBuf>, passphrase: Option<&str>) -> Self {
        Credential::PublicKeyFile {
            public: None,
            private: private.into(),
            passphrase: passphrase.map(|p| Zeroizing::new(p.to_string())),
        }
    }

    /// In-memory private key.
    pub fn public_key_memory(private: impl Into<String>, passphrase: Option<&str>) -> Self {
        Credential::PublicKeyMemory {
            public: None,
            private: Zeroizing::new(private.into()),
            passphrase: passphrase.map(|p| Zeroizing::new(p.to_string())),
        }
    }

    fn method_name(&self) -> &'static str {
        match self {
            Credential::Password(_) => "password",
            Credential::PublicKeyFile { .. } | Credential::PublicKeyMemory { .. } => "publickey",
            Credential::Agent => "agent",
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Password(_) => f.debug_tuple("Password").field(&"<redacted>").finish(),
            Credential::PublicKeyFile {
                public, private, ..
            } => f
                .debug_struct("PublicKeyFile")
                .field("public", public)
                .field("private", private)
                .finish_non_exhaustive(),
            Credential::PublicKeyMemory { .. } => {
                f.debug_struct("PublicKeyMemory").finish_non_exhaustive()
            }
            Credential::Agent => f.write_str("Agent"),
        }
    }
}

fn require(value: &str, what: &str) -> CoilResult<()> {
    if value.is_empty() {
        return Err(CoilError::argument(
            Status::MissingValue,
            format!("{} is empty", what),
        ));
    }
    Ok(())
}

impl Session {
    /// Lists the authentication methods the server accepts for `username`.
    pub fn auth_methods(&self, username: &str) -> CoilResult<Vec<String>> {
        require(username, "username")?;
        let methods = self.inner.auth_methods(username)?;
        Ok(methods
            .split(',')
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Returns true once the session is authenticated.
    pub fn authenticated(&self) -> bool {
        self.inner.authenticated()
    }

    /// Authenticates with a password.
    pub fn userauth_password(&self, username: &str, password: &str) -> CoilResult<()> {
        require(username, "username")?;
        let password = Zeroizing::new(password.to_string());
        self.inner
            .userauth_password(username, &password)
            .map_err(|e| auth_failed(username, "password", e))?;
        debug!(user = username, "Password authentication succeeded");
        Ok(())
    }

    /// Authenticates with a key pair read from files.
    pub fn userauth_publickey_from_file(
        &self,
        username: &str,
        public_key: Option<&Path>,
        private_key: &Path,
        passphrase: Option<&str>,
    ) -> CoilResult<()> {
        require(username, "username")?;
        let passphrase = passphrase.map(|p| Zeroizing::new(p.to_string()));
        self.inner
            .userauth_pubkey_file(
                username,
                public_key,
                private_key,
                passphrase.as_deref().map(String::as_str),
            )
            .map_err(|e| auth_failed(username, "publickey", e))?;
        debug!(
            user = username,
            key = %private_key.display(),
            "Public key authentication succeeded"
        );
        Ok(())
    }

    /// Authenticates with a key pair held in memory.
    pub fn userauth_publickey_from_memory(
        &self,
        username: &str,
        public_key: Option<&str>,
        private_key: &str,
        passphrase: Option<&str>,
    ) -> CoilResult<()> {
        require(username, "username")?;
        require(private_key, "private key")?;
        let private_key = Zeroizing::new(private_key.to_string());
        let passphrase = passphrase.map(|p| Zeroizing::new(p.to_string()));
        self.inner
            .userauth_pubkey_memory(
                username,
                public_key,
                &private_key,
                passphrase.as_deref().map(String::as_str),
            )
            .map_err(|e| auth_failed(username, "publickey", e))?;
        debug!(user = username, "Public key authentication succeeded");
        Ok(())
    }

    /// Authenticates with a host key pair.
    pub fn userauth_hostbased_from_file(
        &self,
        username: &str,
        public_key: &Path,
        private_key: &Path,
        passphrase: Option<&str>,
        hostname: &str,
        local_username: Option<&str>,
    ) -> CoilResult<()> {
        require(username, "username")?;
        require(hostname, "hostname")?;
        let passphrase = passphrase.map(|p| Zeroizing::new(p.to_string()));
        self.inner
            .userauth_hostbased_file(
                username,
                public_key,
                private_key,
                passphrase.as_deref().map(String::as_str),
                hostname,
                local_username,
            )
            .map_err(|e| auth_failed(username, "hostbased", e))?;
        debug!(user = username, hostname, "Host-based authentication succeeded");
        Ok(())
    }

    /// Authenticates with the first agent identity the server accepts.
    pub fn userauth_agent(&self, username: &str) -> CoilResult<()> {
        require(username, "username")?;
        self.inner
            .userauth_agent(username)
            .map_err(|e| auth_failed(username, "agent", e))?;
        debug!(user = username, "Agent authentication succeeded");
        Ok(())
    }

    /// Authenticates with any [`Credential`].
    pub fn authenticate(&self, username: &str, credential: &Credential) -> CoilResult<()> {
        debug!(user = username, method = credential.method_name(), "Authenticating");
        match credential {
            Credential::Password(password) => self.userauth_password(username, password),
            Credential::PublicKeyFile {
                public,
                private,
                passphrase,
            } => self.userauth_publickey_from_file(
                username,
                public.as_deref(),
                private,
                passphrase.as_deref().map(String::as_str),
            ),
            Credential::PublicKeyMemory {
                public,
                private,
                passphrase,
            } => self.userauth_publickey_from_memory(
                username,
                public.as_deref(),
                private,
                passphrase.as_deref().map(String::as_str),
            ),
            Credential::Agent => self.userauth_agent(username),
        }
    }
}

fn auth_failed(username: &str, method: &str, err: ssh2::Error) -> CoilError {
    let err = CoilError::from(err);
    warn!(user = username, method, status = %err.status(), "Authentication failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let credential = Credential::password("hunter2");
        let text = format!("{:?}", credential);
        assert!(!text.contains("hunter2"));

        let credential = Credential::public_key_memory("-----BEGIN KEY-----", Some("pass"));
        let text = format!("{:?}", credential);
        assert!(!text.contains("BEGIN"));
        assert!(!text.contains("pass\""));
    }

    #[test]
    fn test_credential_method_names() {
        assert_eq!(Credential::password("x").method_name(), "password");
        assert_eq!(
            Credential::public_key_file("/tmp/id_ed25519", None).method_name(),
            "publickey"
        );
        assert_eq!(Credential::Agent.method_name(), "agent");
    }

    #[test]
    fn test_empty_username_rejected_locally() {
        let session = Session::new().unwrap();
        let err = session.userauth_password("", "secret").unwrap_err();
        assert_eq!(err.status(), Status::MissingValue);

        let err = session.auth_methods("").unwrap_err();
        assert_eq!(err.status(), Status::MissingValue);
    }

    #[test]
    fn test_not_authenticated_before_handshake() {
        let session = Session::new().unwrap();
        assert!(!session.authenticated());
    }
}
