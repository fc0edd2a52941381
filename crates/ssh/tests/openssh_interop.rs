//! OpenSSH interoperability tests.
//!
//! These tests require a running OpenSSH server and are marked as `#[ignore]`
//! by default. To run them:
//!
//! ```bash
//! export SSH_TEST_HOST="127.0.0.1"
//! export SSH_TEST_PORT="22"
//! export SSH_TEST_USER="testuser"
//! export SSH_TEST_PASS="testpass"
//! cargo test --test openssh_interop -- --ignored --nocapture
//! ```

use coil_ssh::sftp::{FileMode, OpenFlags, SftpErrorCode};
use coil_ssh::{
    CheckResult, HashType, KeyAlgorithm, KeyEncoding, KnownHosts, Method, NameType, Session,
    SessionConfig, Status, TraceFlags,
};
use std::net::TcpStream;
use std::path::Path;

struct Target {
    host: String,
    port: u16,
    user: String,
    pass: String,
}

fn target() -> Option<Target> {
    let user = std::env::var("SSH_TEST_USER").unwrap_or_default();
    let pass = std::env::var("SSH_TEST_PASS").unwrap_or_default();
    if user.is_empty() || pass.is_empty() {
        println!("Skipping test: credentials not provided");
        return None;
    }
    Some(Target {
        host: std::env::var("SSH_TEST_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port: std::env::var("SSH_TEST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(22),
        user,
        pass,
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn connect(target: &Target, config: &SessionConfig) -> Result<Session, Box<dyn std::error::Error>> {
    let stream = TcpStream::connect((target.host.as_str(), target.port))?;
    Ok(Session::connect_with(stream, config)?)
}

fn login(target: &Target) -> Result<Session, Box<dyn std::error::Error>> {
    let session = connect(target, &SessionConfig::default().with_timeout_ms(10_000))?;
    session.userauth_password(&target.user, &target.pass)?;
    Ok(session)
}

/// Handshake, host key and negotiated algorithms.
#[test]
#[ignore]
fn test_handshake_with_openssh() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let session = connect(&target, &SessionConfig::default())?;
    let (key, kind) = session.hostkey()?;
    assert!(!key.is_empty());
    println!("  Host key type: {:?}", kind);

    let digest = session.hostkey_hash(HashType::Sha1)?;
    assert_eq!(digest.len(), session.hostkey_hash_len(HashType::Sha1));
    println!("  Fingerprint: {}", session.hostkey_fingerprint(HashType::Sha256)?);

    assert!(!session.method(Method::Kex)?.is_empty());
    assert!(session.banner().is_some());
    session.disconnect("test complete")?;
    Ok(())
}

/// Password authentication and the method list.
#[test]
#[ignore]
fn test_password_auth_with_openssh() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let session = connect(&target, &SessionConfig::default())?;
    let methods = session.auth_methods(&target.user)?;
    println!("  Methods: {:?}", methods);
    assert!(!session.authenticated());

    let err = session
        .userauth_password(&target.user, "definitely-not-the-password")
        .unwrap_err();
    assert!(err.status().is_err());

    session.userauth_password(&target.user, &target.pass)?;
    assert!(session.authenticated());
    Ok(())
}

/// Command execution with exit status.
#[test]
#[ignore]
fn test_execute_command_openssh() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let session = login(&target)?;
    let mut channel = session.channel()?;
    channel.exec("echo hello; echo oops 1>&2; exit 3")?;
    let stdout = channel.read_to_end()?;
    let stderr = channel.read_stderr_to_end()?;
    channel.wait_eof()?;
    channel.close()?;
    channel.wait_close()?;

    assert_eq!(String::from_utf8_lossy(&stdout).trim(), "hello");
    assert_eq!(String::from_utf8_lossy(&stderr).trim(), "oops");
    assert_eq!(channel.exit_status()?, 3);

    let err = channel.write(b"late").unwrap_err();
    assert_eq!(err.status(), Status::ChannelClosed);
    Ok(())
}

/// Trace capture during a handshake.
#[test]
#[ignore]
fn test_trace_capture() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let config = SessionConfig::default().with_trace(TraceFlags::KEX | TraceFlags::TRANS);
    let mut session = connect(&target, &config)?;
    let queue = session.trace_queue().cloned().ok_or("no trace queue")?;
    session.trace_end();

    // Debug builds of libssh2 are required for trace output.
    for line in queue.drain() {
        println!("  trace: {}", line);
    }
    Ok(())
}

/// Known-hosts check against the live host key.
#[test]
#[ignore]
fn test_known_hosts_against_server() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let session = connect(&target, &SessionConfig::default())?;
    let (key, _) = session.hostkey()?;
    let mut known_hosts = session.known_hosts()?;

    let check = KnownHosts::default_mask();
    assert_eq!(
        known_hosts.check(&target.host, target.port, &key, check)?,
        CheckResult::NotFound
    );

    let name = if target.port == 22 {
        target.host.clone()
    } else {
        format!("[{}]:{}", target.host, target.port)
    };
    let add = KnownHosts::type_mask(NameType::Sha1, KeyEncoding::Raw, KeyAlgorithm::Unknown);
    known_hosts.add(&name, None, &key, "test", add)?;

    let (result, entry) = known_hosts.check_and_get(&target.host, target.port, &key, check)?;
    assert_eq!(result, CheckResult::Match);
    println!("  Entry fingerprint: {}", entry.ok_or("no entry")?.fingerprint_sha256());
    Ok(())
}

/// SFTP round trip in the remote temp directory.
#[test]
#[ignore]
fn test_sftp_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let session = login(&target)?;
    let sftp = session.sftp()?;

    let dir = Path::new("/tmp/coil-sftp-test");
    let _ = sftp.remove_directory(dir);
    sftp.create_directory(dir, FileMode(FileMode::DEFAULT_DIR))?;

    let path = dir.join("hello.txt");
    let mut file = sftp.open_file(&path, OpenFlags::write(), FileMode::default())?;
    file.write_all(b"hello sftp")?;
    file.sync().ok();
    file.close()?;

    let mut file = sftp.open_file(&path, OpenFlags::read(), FileMode::default())?;
    assert_eq!(file.read_to_end()?, b"hello sftp");
    file.seek(6)?;
    assert_eq!(file.position()?, 6);
    file.rewind()?;
    assert_eq!(file.status()?.size(), Some(10));
    file.close()?;

    let mut listing = sftp.open_directory(dir)?;
    let names: Vec<String> = listing.entries()?.into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["hello.txt"]);
    listing.close()?;

    let renamed = dir.join("renamed.txt");
    sftp.rename(&path, &renamed)?;
    let err = sftp.status(&path).unwrap_err();
    assert_eq!(err.status(), Status::SftpProtocol);
    assert_eq!(sftp.last_error(), 2);
    assert_eq!(sftp.last_error_code(), Some(SftpErrorCode::NoSuchFile));

    sftp.delete_file(&renamed)?;
    sftp.remove_directory(dir)?;
    Ok(())
}

/// SCP upload and download.
#[test]
#[ignore]
fn test_scp_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let Some(target) = target() else {
        return Ok(());
    };

    let session = login(&target)?;
    let path = Path::new("/tmp/coil-scp-test.txt");
    let body = b"hello scp\n";

    let mut upload = session.scp_send(path, 0o644, body.len() as u64, None)?;
    upload.write_all(body)?;
    upload.send_eof()?;
    upload.wait_eof()?;
    upload.close()?;
    upload.wait_close()?;

    let (mut download, info) = session.scp_receive(path)?;
    assert_eq!(info.size(), body.len() as u64);
    assert!(info.is_file());
    let mut data = vec![0u8; info.size() as usize];
    let mut read = 0;
    while read < data.len() {
        let n = download.read(&mut data[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    assert_eq!(&data[..], body);
    Ok(())
}
