//! Known hosts (OpenSSH `known_hosts` format).
//!
//! A [`KnownHosts`] collection is created from a [`Session`] and backed by
//! libssh2's known-host store. Entries are handed out as [`KnownHost`]
//! snapshots; walking the collection is stateless, each call takes the
//! previous snapshot as its cursor.
//!
//! Hostnames can be:
//! - Standard: `example.com` or `[example.com]:2222`
//! - Hashed: `|1|salt|hash` (HMAC-SHA1 hashed hostname)
//! - Wildcard: `*.example.com`
//! - Multiple: `host1,host2,host3`
//! - Negated: `*.example.com,!bad.example.com`
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::known_hosts::CheckResult;
//! use coil_ssh::{KnownHosts, Session};
//! use std::net::TcpStream;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(TcpStream::connect("example.com:22")?)?;
//! let mut known_hosts = session.known_hosts()?;
//! known_hosts.read_file(Path::new("/home/deploy/.ssh/known_hosts"))?;
//!
//! let (key, _) = session.hostkey()?;
//! match known_hosts.check("example.com", 22, &key, KnownHosts::default_mask())? {
//!     CheckResult::Match => println!("Host key verified"),
//!     CheckResult::Mismatch => println!("WARNING: Host key changed!"),
//!     CheckResult::NotFound => println!("Unknown host"),
//!     CheckResult::Failure => println!("Check failed"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::session::Session;
use base64::Engine;
use coil_platform::{CoilError, CoilResult, Status};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::Path;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

type HmacSha1 = Hmac<Sha1>;

const TYPE_MASK: i32 = 0xffff;
const KEYENC_MASK: i32 = 3 << 16;
const KEY_MASK: i32 = 15 << 18;

/// Length of a generated hostname salt, as OpenSSH uses.
const SALT_LEN: usize = 20;

/// How a hostname is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameType {
    /// Stored as given
    Plain,
    /// Hashed with HMAC-SHA1 (`|1|salt|hash`)
    Sha1,
    /// Custom hashing, not supported by libssh2
    Custom,
}

impl NameType {
    fn bits(self) -> i32 {
        match self {
            NameType::Plain => libssh2_sys::LIBSSH2_KNOWNHOST_TYPE_PLAIN,
            NameType::Sha1 => libssh2_sys::LIBSSH2_KNOWNHOST_TYPE_SHA1,
            NameType::Custom => libssh2_sys::LIBSSH2_KNOWNHOST_TYPE_CUSTOM,
        }
    }

    fn from_bits(bits: i32) -> CoilResult<Self> {
        match bits & TYPE_MASK {
            libssh2_sys::LIBSSH2_KNOWNHOST_TYPE_PLAIN => Ok(NameType::Plain),
            libssh2_sys::LIBSSH2_KNOWNHOST_TYPE_SHA1 => Ok(NameType::Sha1),
            libssh2_sys::LIBSSH2_KNOWNHOST_TYPE_CUSTOM => Ok(NameType::Custom),
            other => Err(CoilError::argument(
                Status::UnknownNameType,
                format!("unknown name type {}", other),
            )),
        }
    }
}

/// How a key is passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Raw SSH wire-format blob
    Raw,
    /// Base64 text of the blob
    Base64,
}

impl KeyEncoding {
    fn bits(self) -> i32 {
        match self {
            KeyEncoding::Raw => libssh2_sys::LIBSSH2_KNOWNHOST_KEYENC_RAW,
            KeyEncoding::Base64 => libssh2_sys::LIBSSH2_KNOWNHOST_KEYENC_BASE64,
        }
    }

    fn from_bits(bits: i32) -> CoilResult<Self> {
        match bits & KEYENC_MASK {
            libssh2_sys::LIBSSH2_KNOWNHOST_KEYENC_RAW => Ok(KeyEncoding::Raw),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEYENC_BASE64 => Ok(KeyEncoding::Base64),
            other => Err(CoilError::argument(
                Status::UnknownKeyEncoding,
                format!("unknown key encoding {:#x}", other),
            )),
        }
    }
}

/// Host key algorithm of a known-host entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// SSH-1 RSA
    Rsa1,
    /// ssh-rsa
    SshRsa,
    /// ssh-dss
    SshDss,
    /// ecdsa-sha2-nistp256
    Ecdsa256,
    /// ecdsa-sha2-nistp384
    Ecdsa384,
    /// ecdsa-sha2-nistp521
    Ecdsa521,
    /// ssh-ed25519
    Ed25519,
    /// Anything else
    Unknown,
}

impl KeyAlgorithm {
    /// Looks up an algorithm by its SSH name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ssh-rsa" => KeyAlgorithm::SshRsa,
            "ssh-dss" => KeyAlgorithm::SshDss,
            "ecdsa-sha2-nistp256" => KeyAlgorithm::Ecdsa256,
            "ecdsa-sha2-nistp384" => KeyAlgorithm::Ecdsa384,
            "ecdsa-sha2-nistp521" => KeyAlgorithm::Ecdsa521,
            "ssh-ed25519" => KeyAlgorithm::Ed25519,
            _ => KeyAlgorithm::Unknown,
        }
    }

    /// SSH name of the algorithm, if it has one.
    pub fn name(self) -> Option<&'static str> {
        match self {
            KeyAlgorithm::SshRsa => Some("ssh-rsa"),
            KeyAlgorithm::SshDss => Some("ssh-dss"),
            KeyAlgorithm::Ecdsa256 => Some("ecdsa-sha2-nistp256"),
            KeyAlgorithm::Ecdsa384 => Some("ecdsa-sha2-nistp384"),
            KeyAlgorithm::Ecdsa521 => Some("ecdsa-sha2-nistp521"),
            KeyAlgorithm::Ed25519 => Some("ssh-ed25519"),
            KeyAlgorithm::Rsa1 | KeyAlgorithm::Unknown => None,
        }
    }

    fn bits(self) -> i32 {
        match self {
            KeyAlgorithm::Rsa1 => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_RSA1,
            KeyAlgorithm::SshRsa => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_SSHRSA,
            KeyAlgorithm::SshDss => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_SSHDSS,
            KeyAlgorithm::Ecdsa256 => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ECDSA_256,
            KeyAlgorithm::Ecdsa384 => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ECDSA_384,
            KeyAlgorithm::Ecdsa521 => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ECDSA_521,
            KeyAlgorithm::Ed25519 => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ED25519,
            KeyAlgorithm::Unknown => libssh2_sys::LIBSSH2_KNOWNHOST_KEY_UNKNOWN,
        }
    }

    fn from_bits(bits: i32) -> CoilResult<Self> {
        match bits & KEY_MASK {
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_RSA1 => Ok(KeyAlgorithm::Rsa1),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_SSHRSA => Ok(KeyAlgorithm::SshRsa),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_SSHDSS => Ok(KeyAlgorithm::SshDss),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ECDSA_256 => Ok(KeyAlgorithm::Ecdsa256),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ECDSA_384 => Ok(KeyAlgorithm::Ecdsa384),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ECDSA_521 => Ok(KeyAlgorithm::Ecdsa521),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_ED25519 => Ok(KeyAlgorithm::Ed25519),
            libssh2_sys::LIBSSH2_KNOWNHOST_KEY_UNKNOWN => Ok(KeyAlgorithm::Unknown),
            other => Err(CoilError::argument(
                Status::UnknownKeyAlgorithm,
                format!("unknown key algorithm {:#x}", other),
            )),
        }
    }

    fn to_ssh2(self) -> ssh2::KnownHostKeyFormat {
        match self {
            KeyAlgorithm::Rsa1 => ssh2::KnownHostKeyFormat::Rsa1,
            KeyAlgorithm::SshRsa => ssh2::KnownHostKeyFormat::SshRsa,
            KeyAlgorithm::SshDss => ssh2::KnownHostKeyFormat::SshDss,
            KeyAlgorithm::Ecdsa256 => ssh2::KnownHostKeyFormat::Ecdsa256,
            KeyAlgorithm::Ecdsa384 => ssh2::KnownHostKeyFormat::Ecdsa384,
            KeyAlgorithm::Ecdsa521 => ssh2::KnownHostKeyFormat::Ecdsa521,
            KeyAlgorithm::Ed25519 => ssh2::KnownHostKeyFormat::Ed25519,
            KeyAlgorithm::Unknown => ssh2::KnownHostKeyFormat::Unknown,
        }
    }
}

/// Name type, key encoding and key algorithm packed into libssh2's bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMask {
    /// How the hostname is stored
    pub name_type: NameType,
    /// How the key is passed in
    pub encoding: KeyEncoding,
    /// Key algorithm
    pub algorithm: KeyAlgorithm,
}

impl TypeMask {
    /// Packed libssh2 bitmask.
    pub fn bits(&self) -> i32 {
        self.name_type.bits() | self.encoding.bits() | self.algorithm.bits()
    }

    /// Unpacks a libssh2 bitmask, rejecting unknown bit patterns.
    pub fn from_bits(bits: i32) -> CoilResult<Self> {
        Ok(Self {
            name_type: NameType::from_bits(bits)?,
            encoding: KeyEncoding::from_bits(bits)?,
            algorithm: KeyAlgorithm::from_bits(bits)?,
        })
    }
}

/// Outcome of a host key check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// The check itself failed
    Failure,
    /// No entry for the host
    NotFound,
    /// Host found and key matches
    Match,
    /// Host found but key differs
    Mismatch,
}

impl CheckResult {
    /// Status matching this outcome.
    pub fn status(self) -> Status {
        match self {
            CheckResult::Failure => Status::KnownHosts,
            CheckResult::NotFound => Status::NotFound,
            CheckResult::Match => Status::Match,
            CheckResult::Mismatch => Status::Mismatch,
        }
    }
}

impl From<ssh2::CheckResult> for CheckResult {
    fn from(result: ssh2::CheckResult) -> Self {
        match result {
            ssh2::CheckResult::Match => CheckResult::Match,
            ssh2::CheckResult::Mismatch => CheckResult::Mismatch,
            ssh2::CheckResult::NotFound => CheckResult::NotFound,
            ssh2::CheckResult::Failure => CheckResult::Failure,
        }
    }
}

/// Snapshot of one known-host entry.
///
/// Also serves as the cursor for [`KnownHosts::next`]. A snapshot goes stale
/// once the collection changes; [`KnownHosts::delete`] detects that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownHost {
    index: usize,
    line: String,
    hostname_pattern: String,
    key_type: String,
    algorithm: KeyAlgorithm,
    key_text: String,
    key_data: Vec<u8>,
    comment: String,
}

impl KnownHost {
    /// Parses a single line in `known_hosts` format.
    ///
    /// Format: `hostname keytype base64-key [comment]`, or the SSH-1
    /// `hostname bits exponent modulus [comment]`.
    pub fn parse_line(line: &str) -> CoilResult<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Err(CoilError::argument(
                Status::KnownHosts,
                "empty or comment line",
            ));
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(CoilError::argument(
                Status::KnownHosts,
                "invalid known_hosts line: too few fields (need at least 3)",
            ));
        }

        if is_rsa1_key(&parts[1..]) {
            return Ok(Self {
                index: 0,
                line: line.to_string(),
                hostname_pattern: parts[0].to_string(),
                key_type: String::new(),
                algorithm: KeyAlgorithm::Rsa1,
                key_text: parts[1..4].join(" "),
                key_data: Vec::new(),
                comment: parts[4..].join(" "),
            });
        }

        let key_data = base64::engine::general_purpose::STANDARD
            .decode(parts[2])
            .map_err(|e| {
                CoilError::argument(Status::KnownHosts, format!("invalid base64 key data: {}", e))
            })?;

        Ok(Self {
            index: 0,
            line: line.to_string(),
            hostname_pattern: parts[0].to_string(),
            key_type: parts[1].to_string(),
            algorithm: KeyAlgorithm::from_name(parts[1]),
            key_text: parts[2].to_string(),
            key_data,
            comment: parts[3..].join(" "),
        })
    }

    /// Position in the collection when the snapshot was taken.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Host pattern; the `|1|salt|hash` form for hashed entries.
    pub fn name(&self) -> &str {
        &self.hostname_pattern
    }

    /// Key text: base64 for SSH-2 keys, `bits exponent modulus` for SSH-1 RSA.
    pub fn key(&self) -> &str {
        &self.key_text
    }

    /// Decoded key blob; empty for SSH-1 RSA entries.
    pub fn key_data(&self) -> &[u8] {
        &self.key_data
    }

    /// Key algorithm name, e.g. `ssh-ed25519`. SSH-1 RSA entries have none.
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// Comment, empty when there is none.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Line in `known_hosts` format, without the trailing newline.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Type mask describing this entry.
    pub fn type_mask(&self) -> TypeMask {
        let name_type = if self.hostname_pattern.starts_with("|1|") {
            NameType::Sha1
        } else {
            NameType::Plain
        };
        TypeMask {
            name_type,
            encoding: KeyEncoding::Base64,
            algorithm: self.algorithm,
        }
    }

    /// OpenSSH-style fingerprint, `SHA256:` followed by unpadded base64.
    ///
    /// Computed over [`key_data`](Self::key_data).
    pub fn fingerprint_sha256(&self) -> String {
        fingerprint_sha256(&self.key_data)
    }

    /// Checks if this entry matches a hostname and port.
    ///
    /// Supports:
    /// - Standard matching: `example.com`
    /// - Hashed matching: `|1|salt|hash`
    /// - Wildcard matching: `*.example.com`
    /// - Port matching: `[example.com]:2222`
    pub fn matches(&self, hostname: &str, port: u16) -> CoilResult<bool> {
        let full_host = host_key_name(hostname, port);

        let mut matched = false;
        for pattern in self.hostname_pattern.split(',') {
            let pattern = pattern.trim();

            // A negated match vetoes the entry.
            if let Some(negated) = pattern.strip_prefix('!') {
                if matches_pattern(negated, &full_host)? {
                    return Ok(false);
                }
                continue;
            }

            if matches_pattern(pattern, &full_host)? {
                matched = true;
            }
        }

        Ok(matched)
    }
}

/// `bits exponent modulus`, all decimal.
fn is_rsa1_key(fields: &[&str]) -> bool {
    fields.len() >= 3
        && fields[..3]
            .iter()
            .all(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// `host` for port 22, `[host]:port` otherwise.
fn host_key_name(hostname: &str, port: u16) -> String {
    if port == 22 {
        hostname.to_string()
    } else {
        format!("[{}]:{}", hostname, port)
    }
}

fn matches_pattern(pattern: &str, hostname: &str) -> CoilResult<bool> {
    if pattern.starts_with("|1|") {
        return verify_hashed_hostname(pattern, hostname);
    }

    if pattern.contains('*') || pattern.contains('?') {
        return Ok(wildcard_match(pattern, hostname));
    }

    Ok(pattern == hostname)
}

/// Verifies a hashed hostname `|1|salt|hash`, where
/// hash = Base64(HMAC-SHA1(salt, hostname)).
fn verify_hashed_hostname(hashed: &str, hostname: &str) -> CoilResult<bool> {
    let parts: Vec<&str> = hashed.split('|').collect();
    if parts.len() != 4 || !parts[0].is_empty() || parts[1] != "1" {
        return Ok(false);
    }

    let salt = decode_b64(parts[2], "salt")?;
    let expected = decode_b64(parts[3], "hash")?;
    let computed = hmac_sha1(&salt, hostname)?;

    Ok(computed.ct_eq(&expected[..]).into())
}

fn hmac_sha1(salt: &[u8], hostname: &str) -> CoilResult<Vec<u8>> {
    let mut mac = HmacSha1::new_from_slice(salt).map_err(|e| {
        CoilError::argument(Status::KnownHosts, format!("HMAC creation failed: {}", e))
    })?;
    mac.update(hostname.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn decode_b64(text: &str, what: &str) -> CoilResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| CoilError::argument(Status::KnownHosts, format!("invalid base64 {}: {}", what, e)))
}

/// `*` matches any run of characters, `?` exactly one.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

/// Algorithm name carried in the leading string of an SSH key blob.
fn blob_key_type(blob: &[u8]) -> Option<&str> {
    let len_bytes: [u8; 4] = blob.get(..4)?.try_into().ok()?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    let name = blob.get(4..4usize.checked_add(len)?)?;
    std::str::from_utf8(name).ok()
}

pub(crate) fn fingerprint_sha256(blob: &[u8]) -> String {
    let digest = Sha256::digest(blob);
    format!(
        "SHA256:{}",
        base64::engine::general_purpose::STANDARD_NO_PAD.encode(digest)
    )
}

/// A known-hosts collection.
pub struct KnownHosts {
    inner: ssh2::KnownHosts,
}

impl KnownHosts {
    /// Packs a type mask.
    pub fn type_mask(
        name_type: NameType,
        encoding: KeyEncoding,
        algorithm: KeyAlgorithm,
    ) -> TypeMask {
        TypeMask {
            name_type,
            encoding,
            algorithm,
        }
    }

    /// Plain hostname with a raw key; the usual mask for checks.
    pub fn default_mask() -> TypeMask {
        Self::type_mask(NameType::Plain, KeyEncoding::Raw, KeyAlgorithm::Unknown)
    }

    /// Loads entries from an OpenSSH `known_hosts` file and returns how many
    /// were read.
    pub fn read_file(&mut self, path: &Path) -> CoilResult<usize> {
        let count = self
            .inner
            .read_file(path, ssh2::KnownHostFileKind::OpenSSH)?;
        debug!(path = %path.display(), count, "Known hosts loaded");
        Ok(count as usize)
    }

    /// Adds one entry given as a `known_hosts` line.
    pub fn read_line(&mut self, line: &str) -> CoilResult<()> {
        if line.trim().is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "line is empty"));
        }
        self.inner
            .read_str(line, ssh2::KnownHostFileKind::OpenSSH)?;
        Ok(())
    }

    /// Writes every entry to `path` in OpenSSH format.
    pub fn write_file(&self, path: &Path) -> CoilResult<()> {
        self.inner
            .write_file(path, ssh2::KnownHostFileKind::OpenSSH)?;
        debug!(path = %path.display(), "Known hosts written");
        Ok(())
    }

    /// Formats one entry as a `known_hosts` line.
    pub fn write_line(&self, entry: &KnownHost) -> CoilResult<String> {
        let host = self.locate(entry)?;
        let line = self
            .inner
            .write_string(&host, ssh2::KnownHostFileKind::OpenSSH)?;
        Ok(line.trim_end().to_string())
    }

    /// Adds an entry.
    ///
    /// For a `Plain` name type `name` is `host` or `[host]:port` and `salt`
    /// must be `None`.
    ///
    /// For `Sha1`, a given `salt` means the entry is already hashed: `name` is
    /// the base64 HMAC-SHA1 of the host and `salt` its base64 salt, as found in
    /// a `|1|salt|hash` field. Without a salt, `name` is the plain host and is
    /// hashed here with a random salt.
    pub fn add(
        &mut self,
        name: &str,
        salt: Option<&str>,
        key: &[u8],
        comment: &str,
        mask: TypeMask,
    ) -> CoilResult<()> {
        if name.is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "host name is empty"));
        }
        let key = decode_key(key, mask.encoding)?;

        match mask.name_type {
            NameType::Plain => {
                if salt.is_some() {
                    return Err(CoilError::argument(
                        Status::Invalid,
                        "salt given for a plain host name",
                    ));
                }
                // libssh2 refuses an unknown key type without a type name.
                let algorithm = match mask.algorithm {
                    KeyAlgorithm::Unknown => blob_key_type(&key)
                        .map(KeyAlgorithm::from_name)
                        .unwrap_or(KeyAlgorithm::Unknown),
                    known => known,
                };
                self.inner.add(name, &key, comment, algorithm.to_ssh2())?;
            }
            NameType::Sha1 => {
                let hashed = match salt {
                    Some(salt) => {
                        decode_b64(salt, "salt")?;
                        decode_b64(name, "hash")?;
                        format!("|1|{}|{}", salt, name)
                    }
                    None => hash_host_name(name)?,
                };
                let line = hashed_line(&hashed, &key, comment, mask.algorithm)?;
                self.inner
                    .read_str(&line, ssh2::KnownHostFileKind::OpenSSH)?;
            }
            NameType::Custom => {
                return Err(CoilError::argument(
                    Status::UnknownNameType,
                    "custom host name hashing is not supported",
                ));
            }
        }

        debug!(
            name = if mask.name_type == NameType::Plain { name } else { "<hashed>" },
            fingerprint = %fingerprint_sha256(&key),
            "Known host added"
        );
        Ok(())
    }

    /// Removes the entry `entry` was taken from.
    pub fn delete(&mut self, entry: &KnownHost) -> CoilResult<()> {
        let host = self.locate(entry)?;
        self.inner.remove(&host)?;
        debug!(index = entry.index, "Known host removed");
        Ok(())
    }

    /// Checks a host key against the collection.
    pub fn check(&self, host: &str, port: u16, key: &[u8], mask: TypeMask) -> CoilResult<CheckResult> {
        if host.is_empty() {
            return Err(CoilError::argument(Status::MissingValue, "host is empty"));
        }
        if mask.name_type != NameType::Plain {
            return Err(CoilError::argument(
                Status::UnknownNameType,
                "host to check must be a plain name",
            ));
        }
        let key = decode_key(key, mask.encoding)?;
        let result: CheckResult = self.inner.check_port(host, port, &key).into();
        match result {
            CheckResult::Mismatch => warn!(host, port, "Host key mismatch"),
            other => debug!(host, port, result = ?other, "Host key checked"),
        }
        Ok(result)
    }

    /// Checks a host key and returns the entry that decided the result.
    pub fn check_and_get(
        &self,
        host: &str,
        port: u16,
        key: &[u8],
        mask: TypeMask,
    ) -> CoilResult<(CheckResult, Option<KnownHost>)> {
        let result = self.check(host, port, key, mask)?;
        if !matches!(result, CheckResult::Match | CheckResult::Mismatch) {
            return Ok((result, None));
        }

        let key = decode_key(key, mask.encoding)?;
        let mut first_for_host = None;
        for entry in self.iter() {
            let entry = entry?;
            if !entry.matches(host, port)? {
                continue;
            }
            if result == CheckResult::Match && entry.key_data() == key.as_slice() {
                return Ok((result, Some(entry)));
            }
            if first_for_host.is_none() {
                first_for_host = Some(entry);
            }
        }
        Ok((result, first_for_host))
    }

    /// Returns the entry after `previous`, or the first one for `None`.
    ///
    /// `Ok(None)` means the end of the collection. A `previous` taken before
    /// the collection changed is stale and rejected with
    /// [`Status::KnownHosts`].
    pub fn get(&self, previous: Option<&KnownHost>) -> CoilResult<Option<KnownHost>> {
        let hosts = self.inner.hosts()?;
        let index = match previous {
            Some(previous) => {
                let host = hosts.get(previous.index).ok_or_else(|| stale(previous))?;
                self.ensure_current(host, previous)?;
                previous.index + 1
            }
            None => 0,
        };
        match hosts.get(index) {
            Some(host) => Ok(Some(self.snapshot(index, host)?)),
            None => Ok(None),
        }
    }

    /// First entry.
    pub fn first(&self) -> CoilResult<Option<KnownHost>> {
        self.get(None)
    }

    /// Entry after `previous`.
    pub fn next(&self, previous: &KnownHost) -> CoilResult<Option<KnownHost>> {
        self.get(Some(previous))
    }

    /// Iterates over every entry once.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            hosts: self,
            entries: None,
            index: 0,
            done: false,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> CoilResult<usize> {
        Ok(self.inner.hosts()?.len())
    }

    /// Returns true when the collection has no entries.
    pub fn is_empty(&self) -> CoilResult<bool> {
        Ok(self.len()? == 0)
    }

    fn snapshot(&self, index: usize, host: &ssh2::Host) -> CoilResult<KnownHost> {
        let line = self
            .inner
            .write_string(host, ssh2::KnownHostFileKind::OpenSSH)?;
        let mut entry = KnownHost::parse_line(&line)?;
        entry.index = index;
        Ok(entry)
    }

    /// Finds the libssh2 entry a snapshot was taken from.
    fn locate(&self, entry: &KnownHost) -> CoilResult<ssh2::Host> {
        let host = self
            .inner
            .hosts()?
            .into_iter()
            .nth(entry.index)
            .ok_or_else(|| stale(entry))?;
        self.ensure_current(&host, entry)?;
        Ok(host)
    }

    fn ensure_current(&self, host: &ssh2::Host, entry: &KnownHost) -> CoilResult<()> {
        let line = self
            .inner
            .write_string(host, ssh2::KnownHostFileKind::OpenSSH)?;
        if line.trim() != entry.line {
            return Err(stale(entry));
        }
        Ok(())
    }
}

fn stale(entry: &KnownHost) -> CoilError {
    CoilError::argument(
        Status::KnownHosts,
        format!("known host snapshot {} is stale", entry.index),
    )
}

fn decode_key(key: &[u8], encoding: KeyEncoding) -> CoilResult<Vec<u8>> {
    if key.is_empty() {
        return Err(CoilError::argument(Status::MissingValue, "key is empty"));
    }
    match encoding {
        KeyEncoding::Raw => Ok(key.to_vec()),
        KeyEncoding::Base64 => base64::engine::general_purpose::STANDARD
            .decode(key)
            .map_err(|e| CoilError::argument(Status::Invalid, format!("invalid base64 key: {}", e))),
    }
}

/// `|1|salt|hash` for `name` under a fresh random salt.
fn hash_host_name(name: &str) -> CoilResult<String> {
    let engine = base64::engine::general_purpose::STANDARD;
    let mut salt = vec![0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = hmac_sha1(&salt, name)?;
    Ok(format!("|1|{}|{}", engine.encode(&salt), engine.encode(hash)))
}

/// Builds a `hashed-name keytype key comment` line.
fn hashed_line(
    hashed: &str,
    key: &[u8],
    comment: &str,
    algorithm: KeyAlgorithm,
) -> CoilResult<String> {
    let engine = base64::engine::general_purpose::STANDARD;
    let key_type = blob_key_type(key)
        .or_else(|| algorithm.name())
        .ok_or_else(|| {
            CoilError::argument(Status::UnknownKeyAlgorithm, "cannot tell the key algorithm")
        })?;

    let mut line = format!("{} {} {}", hashed, key_type, engine.encode(key));
    if !comment.is_empty() {
        line.push(' ');
        line.push_str(comment);
    }
    Ok(line)
}

/// Iterator over [`KnownHosts`] entries.
///
/// Fetches libssh2's entry list once, on the first call to `next`.
pub struct Iter<'a> {
    hosts: &'a KnownHosts,
    entries: Option<Vec<ssh2::Host>>,
    index: usize,
    done: bool,
}

impl Iterator for Iter<'_> {
    type Item = CoilResult<KnownHost>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.entries.is_none() {
            match self.hosts.inner.hosts() {
                Ok(entries) => self.entries = Some(entries),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }

        let host = self.entries.as_ref()?.get(self.index);
        let Some(host) = host else {
            self.done = true;
            return None;
        };
        let entry = self.hosts.snapshot(self.index, host);
        self.index += 1;
        if entry.is_err() {
            self.done = true;
        }
        Some(entry)
    }
}

impl std::fmt::Debug for KnownHosts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownHosts")
            .field("len", &self.len().ok())
            .finish()
    }
}

impl Session {
    /// Creates an empty known-hosts collection.
    pub fn known_hosts(&self) -> CoilResult<KnownHosts> {
        let inner = self.inner.known_hosts()?;
        Ok(KnownHosts { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ed25519_blob(seed: u8) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&11u32.to_be_bytes());
        blob.extend_from_slice(b"ssh-ed25519");
        blob.extend_from_slice(&32u32.to_be_bytes());
        blob.extend_from_slice(&[seed; 32]);
        blob
    }

    fn ed25519_mask(name_type: NameType) -> TypeMask {
        KnownHosts::type_mask(name_type, KeyEncoding::Raw, KeyAlgorithm::Ed25519)
    }

    fn collection() -> (Session, KnownHosts) {
        let session = Session::new().unwrap();
        let hosts = session.known_hosts().unwrap();
        (session, hosts)
    }

    const RSA1_LINE: &str = "old.example.com 1024 35 \
        135977329468390587236544839374127469836958023125926713473025457913\
        5713924738104597834512389745122308891275364812935612873948574652391 legacy";

    #[test]
    fn test_parse_line() {
        let key = base64::engine::general_purpose::STANDARD.encode(ed25519_blob(1));
        let line = format!("example.com ssh-ed25519 {} user@host", key);
        let entry = KnownHost::parse_line(&line).unwrap();
        assert_eq!(entry.name(), "example.com");
        assert_eq!(entry.key_type(), "ssh-ed25519");
        assert_eq!(entry.key(), key);
        assert_eq!(entry.key_data(), ed25519_blob(1).as_slice());
        assert_eq!(entry.comment(), "user@host");
        assert_eq!(entry.type_mask().algorithm, KeyAlgorithm::Ed25519);
    }

    #[test]
    fn test_parse_invalid_lines() {
        assert!(KnownHost::parse_line("").is_err());
        assert!(KnownHost::parse_line("# comment").is_err());
        assert!(KnownHost::parse_line("example.com ssh-ed25519").is_err());
        let err = KnownHost::parse_line("example.com ssh-ed25519 !!!").unwrap_err();
        assert_eq!(err.status(), Status::KnownHosts);
    }

    #[test]
    fn test_parse_rsa1_line() {
        let entry = KnownHost::parse_line(RSA1_LINE).unwrap();
        assert_eq!(entry.name(), "old.example.com");
        assert_eq!(entry.type_mask().algorithm, KeyAlgorithm::Rsa1);
        assert!(entry.key().starts_with("1024 35 1359"));
        assert!(entry.key_data().is_empty());
        assert_eq!(entry.key_type(), "");
        assert_eq!(entry.comment(), "legacy");
        assert!(entry.matches("old.example.com", 22).unwrap());
    }

    #[test]
    fn test_type_mask_bits() {
        let mask = KnownHosts::type_mask(NameType::Sha1, KeyEncoding::Base64, KeyAlgorithm::SshRsa);
        assert_eq!(mask.bits(), 2 | (2 << 16) | (2 << 18));
        assert_eq!(TypeMask::from_bits(mask.bits()).unwrap(), mask);
    }

    #[test]
    fn test_type_mask_rejects_unknown_bits() {
        let valid = ed25519_mask(NameType::Plain).bits();
        assert_eq!(
            TypeMask::from_bits(valid & !TYPE_MASK | 9).unwrap_err().status(),
            Status::UnknownNameType
        );
        assert_eq!(
            TypeMask::from_bits(valid & !KEYENC_MASK | (3 << 16)).unwrap_err().status(),
            Status::UnknownKeyEncoding
        );
        assert_eq!(
            TypeMask::from_bits(valid & !KEY_MASK | (9 << 18)).unwrap_err().status(),
            Status::UnknownKeyAlgorithm
        );
    }

    #[test]
    fn test_check_result_status() {
        assert_eq!(CheckResult::Failure.status(), Status::KnownHosts);
        assert_eq!(CheckResult::NotFound.status(), Status::NotFound);
        assert_eq!(CheckResult::Match.status(), Status::Match);
        assert_eq!(CheckResult::Mismatch.status(), Status::Mismatch);
    }

    #[test]
    fn test_matches_patterns() {
        let key = base64::engine::general_purpose::STANDARD.encode(ed25519_blob(1));
        let entry =
            KnownHost::parse_line(&format!("*.example.com,!bad.example.com ssh-ed25519 {}", key))
                .unwrap();
        assert!(entry.matches("www.example.com", 22).unwrap());
        assert!(!entry.matches("bad.example.com", 22).unwrap());
        assert!(!entry.matches("example.org", 22).unwrap());

        let entry =
            KnownHost::parse_line(&format!("[example.com]:2222 ssh-ed25519 {}", key)).unwrap();
        assert!(entry.matches("example.com", 2222).unwrap());
        assert!(!entry.matches("example.com", 22).unwrap());
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.example.com", "a.example.com"));
        assert!(wildcard_match("host?", "host1"));
        assert!(!wildcard_match("host?", "host12"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("a*b", "acd"));
    }

    #[test]
    fn test_hashed_hostname_round_trip() {
        let hashed = hash_host_name("example.com").unwrap();
        let line = hashed_line(&hashed, &ed25519_blob(2), "", KeyAlgorithm::Ed25519).unwrap();
        let entry = KnownHost::parse_line(&line).unwrap();
        assert!(entry.name().starts_with("|1|"));
        assert_eq!(entry.type_mask().name_type, NameType::Sha1);
        assert!(entry.matches("example.com", 22).unwrap());
        assert!(!entry.matches("example.org", 22).unwrap());
    }

    #[test]
    fn test_blob_key_type() {
        assert_eq!(blob_key_type(&ed25519_blob(0)), Some("ssh-ed25519"));
        assert_eq!(blob_key_type(&[0, 0, 0, 9, b'a']), None);
        assert_eq!(blob_key_type(&[]), None);
    }

    #[test]
    fn test_fingerprint_format() {
        let fingerprint = fingerprint_sha256(&ed25519_blob(3));
        assert!(fingerprint.starts_with("SHA256:"));
        assert!(!fingerprint.ends_with('='));
        assert_eq!(fingerprint.len(), "SHA256:".len() + 43);
    }

    #[test]
    fn test_iterate_visits_each_entry_once() {
        let (_session, mut hosts) = collection();
        assert!(hosts.first().unwrap().is_none());

        for (i, name) in ["a.example.com", "b.example.com", "c.example.com"].iter().enumerate() {
            hosts
                .add(name, None, &ed25519_blob(i as u8), "", ed25519_mask(NameType::Plain))
                .unwrap();
        }
        assert_eq!(hosts.len().unwrap(), 3);

        let mut seen = Vec::new();
        let mut cursor = hosts.first().unwrap();
        while let Some(entry) = cursor {
            seen.push(entry.name().to_string());
            cursor = hosts.next(&entry).unwrap();
        }
        seen.sort();
        assert_eq!(seen, ["a.example.com", "b.example.com", "c.example.com"]);

        let via_iter: Vec<KnownHost> = hosts.iter().collect::<CoilResult<_>>().unwrap();
        assert_eq!(via_iter.len(), 3);
    }

    #[test]
    fn test_walk_past_rsa1_entry() {
        let (_session, mut hosts) = collection();
        hosts.read_line(RSA1_LINE).unwrap();
        let key = base64::engine::general_purpose::STANDARD.encode(ed25519_blob(4));
        hosts
            .read_line(&format!("new.example.com ssh-ed25519 {}", key))
            .unwrap();
        assert_eq!(hosts.len().unwrap(), 2);

        let entries: Vec<KnownHost> = hosts.iter().collect::<CoilResult<_>>().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].type_mask().algorithm, KeyAlgorithm::Rsa1);
        assert_eq!(entries[1].name(), "new.example.com");

        let first = hosts.first().unwrap().unwrap();
        let second = hosts.next(&first).unwrap().unwrap();
        assert_eq!(second.key_data(), ed25519_blob(4).as_slice());
        assert!(hosts.next(&second).unwrap().is_none());

        let (result, entry) = hosts
            .check_and_get("new.example.com", 22, &ed25519_blob(4), KnownHosts::default_mask())
            .unwrap();
        assert_eq!(result, CheckResult::Match);
        assert_eq!(entry.unwrap().index(), 1);
    }

    #[test]
    fn test_iter_indexes_in_order() {
        let (_session, mut hosts) = collection();
        let mask = ed25519_mask(NameType::Plain);
        for i in 0..200u32 {
            let name = format!("host{}.example.com", i);
            hosts.add(&name, None, &ed25519_blob(i as u8), "", mask).unwrap();
        }

        let indexes: Vec<usize> = hosts.iter().map(|e| e.unwrap().index()).collect();
        assert_eq!(indexes, (0..200).collect::<Vec<_>>());

        let (result, entry) = hosts
            .check_and_get("host150.example.com", 22, &ed25519_blob(0), KnownHosts::default_mask())
            .unwrap();
        assert_eq!(result, CheckResult::Mismatch);
        assert_eq!(entry.unwrap().name(), "host150.example.com");
    }

    #[test]
    fn test_check_outcomes() {
        let (_session, mut hosts) = collection();
        hosts
            .add("example.com", None, &ed25519_blob(7), "", ed25519_mask(NameType::Plain))
            .unwrap();
        let mask = KnownHosts::default_mask();

        assert_eq!(
            hosts.check("example.com", 22, &ed25519_blob(7), mask).unwrap(),
            CheckResult::Match
        );
        assert_eq!(
            hosts.check("example.com", 22, &ed25519_blob(8), mask).unwrap(),
            CheckResult::Mismatch
        );
        assert_eq!(
            hosts.check("other.example.com", 22, &ed25519_blob(7), mask).unwrap(),
            CheckResult::NotFound
        );

        let (result, entry) = hosts
            .check_and_get("example.com", 22, &ed25519_blob(7), mask)
            .unwrap();
        assert_eq!(result, CheckResult::Match);
        assert_eq!(entry.unwrap().name(), "example.com");
    }

    #[test]
    fn test_check_base64_key() {
        let (_session, mut hosts) = collection();
        hosts
            .add("example.com", None, &ed25519_blob(4), "", ed25519_mask(NameType::Plain))
            .unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(ed25519_blob(4));
        let mask = KnownHosts::type_mask(NameType::Plain, KeyEncoding::Base64, KeyAlgorithm::Ed25519);
        assert_eq!(
            hosts.check("example.com", 22, encoded.as_bytes(), mask).unwrap(),
            CheckResult::Match
        );
    }

    #[test]
    fn test_add_infers_algorithm_from_blob() {
        let (_session, mut hosts) = collection();
        hosts
            .add("example.com", None, &ed25519_blob(9), "", KnownHosts::default_mask())
            .unwrap();
        let entry = hosts.first().unwrap().unwrap();
        assert_eq!(entry.key_type(), "ssh-ed25519");
        assert_eq!(entry.type_mask().algorithm, KeyAlgorithm::Ed25519);
    }

    #[test]
    fn test_check_rejects_hashed_name_type() {
        let (_session, hosts) = collection();
        let err = hosts
            .check("example.com", 22, &ed25519_blob(1), ed25519_mask(NameType::Sha1))
            .unwrap_err();
        assert_eq!(err.status(), Status::UnknownNameType);
    }

    #[test]
    fn test_add_hashed_name() {
        let (_session, mut hosts) = collection();
        hosts
            .add("example.com", None, &ed25519_blob(5), "hashed", ed25519_mask(NameType::Sha1))
            .unwrap();

        let entry = hosts.first().unwrap().unwrap();
        assert!(entry.name().starts_with("|1|"));
        assert!(entry.matches("example.com", 22).unwrap());
        assert_eq!(
            hosts
                .check("example.com", 22, &ed25519_blob(5), KnownHosts::default_mask())
                .unwrap(),
            CheckResult::Match
        );
    }

    #[test]
    fn test_add_prehashed_name() {
        let engine = base64::engine::general_purpose::STANDARD;
        let salt = [7u8; 20];
        let hash = engine.encode(hmac_sha1(&salt, "secret.example.com").unwrap());
        let salt = engine.encode(salt);

        let (_session, mut hosts) = collection();
        hosts
            .add(&hash, Some(salt.as_str()), &ed25519_blob(5), "", ed25519_mask(NameType::Sha1))
            .unwrap();

        let entry = hosts.first().unwrap().unwrap();
        assert_eq!(entry.name(), format!("|1|{}|{}", salt, hash));
        assert_eq!(
            hosts
                .check("secret.example.com", 22, &ed25519_blob(5), KnownHosts::default_mask())
                .unwrap(),
            CheckResult::Match
        );

        // With a salt the name must already be the base64 hash.
        let err = hosts
            .add(
                "secret.example.com",
                Some(salt.as_str()),
                &ed25519_blob(5),
                "",
                ed25519_mask(NameType::Sha1),
            )
            .unwrap_err();
        assert_eq!(err.status(), Status::KnownHosts);
        assert_eq!(hosts.len().unwrap(), 1);
    }

    #[test]
    fn test_add_rejects_bad_arguments() {
        let (_session, mut hosts) = collection();
        let key = ed25519_blob(1);

        let err = hosts
            .add("example.com", Some("c2FsdA=="), &key, "", ed25519_mask(NameType::Plain))
            .unwrap_err();
        assert_eq!(err.status(), Status::Invalid);

        let err = hosts
            .add("example.com", None, &key, "", ed25519_mask(NameType::Custom))
            .unwrap_err();
        assert_eq!(err.status(), Status::UnknownNameType);

        let err = hosts
            .add("", None, &key, "", ed25519_mask(NameType::Plain))
            .unwrap_err();
        assert_eq!(err.status(), Status::MissingValue);
        assert_eq!(hosts.len().unwrap(), 0);
    }

    #[test]
    fn test_delete_and_stale_snapshot() {
        let (_session, mut hosts) = collection();
        let mask = ed25519_mask(NameType::Plain);
        hosts.add("a.example.com", None, &ed25519_blob(1), "", mask).unwrap();
        hosts.add("b.example.com", None, &ed25519_blob(2), "", mask).unwrap();

        let first = hosts.first().unwrap().unwrap();
        hosts.delete(&first).unwrap();
        assert_eq!(hosts.len().unwrap(), 1);

        let err = hosts.delete(&first).unwrap_err();
        assert_eq!(err.status(), Status::KnownHosts);
    }

    #[test]
    fn test_next_rejects_stale_cursor() {
        let (_session, mut hosts) = collection();
        let mask = ed25519_mask(NameType::Plain);
        for (i, name) in ["a.example.com", "b.example.com", "c.example.com"].iter().enumerate() {
            hosts.add(name, None, &ed25519_blob(i as u8), "", mask).unwrap();
        }

        let first = hosts.first().unwrap().unwrap();
        hosts.delete(&first).unwrap();
        let err = hosts.next(&first).unwrap_err();
        assert_eq!(err.status(), Status::KnownHosts);

        let fresh = hosts.first().unwrap().unwrap();
        let after = hosts.next(&fresh).unwrap().unwrap();
        assert_ne!(after.name(), fresh.name());
    }

    #[test]
    fn test_write_line_and_read_line() {
        let (_session, mut hosts) = collection();
        hosts
            .add("example.com", None, &ed25519_blob(6), "note", ed25519_mask(NameType::Plain))
            .unwrap();
        let entry = hosts.first().unwrap().unwrap();
        let line = hosts.write_line(&entry).unwrap();
        assert!(line.starts_with("example.com ssh-ed25519 "));

        let (_other_session, mut copy) = collection();
        copy.read_line(&line).unwrap();
        assert_eq!(copy.first().unwrap().unwrap().key(), entry.key());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");

        let (_session, mut hosts) = collection();
        let mask = ed25519_mask(NameType::Plain);
        hosts.add("a.example.com", None, &ed25519_blob(1), "", mask).unwrap();
        hosts.add("[b.example.com]:2222", None, &ed25519_blob(2), "", mask).unwrap();
        hosts.write_file(&path).unwrap();

        let (_other_session, mut loaded) = collection();
        assert_eq!(loaded.read_file(&path).unwrap(), 2);
        assert_eq!(
            loaded
                .check("b.example.com", 2222, &ed25519_blob(2), KnownHosts::default_mask())
                .unwrap(),
            CheckResult::Match
        );
    }
}
