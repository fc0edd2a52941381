//! Non-Interactive Command Execution Example
//!
//! Runs commands on a remote host, similar to `ssh user@host command`, after
//! checking the host key against `~/.ssh/known_hosts`.
//!
//! Usage:
//!   cargo run --example execute_command <host:port> <username> <password> <command1> [command2] [...]
//!
//! Example:
//!   RUST_LOG=coil_ssh=debug cargo run --example execute_command 127.0.0.1:22 admin secret "whoami" "pwd"

use coil_ssh::{CheckResult, CoilResult, HashType, KnownHosts, Session, SessionConfig};
use std::env;
use std::net::TcpStream;
use std::path::PathBuf;

/// Execute a single command and display the result
fn execute_command(session: &Session, command: &str) -> CoilResult<i32> {
    println!("$ {}", command);

    let mut channel = session.channel()?;
    channel.exec(command)?;
    let output = channel.read_to_end()?;
    let errors = channel.read_stderr_to_end()?;
    channel.close()?;
    channel.wait_close()?;

    print!("{}", String::from_utf8_lossy(&output));
    eprint!("{}", String::from_utf8_lossy(&errors));
    channel.exit_status()
}

fn verify_host(session: &Session, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let (key, _) = session.hostkey()?;
    let fingerprint = session.hostkey_fingerprint(HashType::Sha256)?;

    let mut known_hosts = session.known_hosts()?;
    if let Some(home) = env::var_os("HOME") {
        let path = PathBuf::from(home).join(".ssh").join("known_hosts");
        if path.exists() {
            known_hosts.read_file(&path)?;
        }
    }

    match known_hosts.check(host, port, &key, KnownHosts::default_mask())? {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => {
            eprintln!("Warning: {} is not a known host ({})", host, fingerprint);
            Ok(())
        }
        CheckResult::Mismatch => Err(format!("host key for {} has changed ({})", host, fingerprint).into()),
        CheckResult::Failure => Err("known hosts check failed".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "Usage: {} <host:port> <username> <password> <command1> [command2] [...]",
            args[0]
        );
        std::process::exit(1);
    }

    let address = &args[1];
    let username = &args[2];
    let password = &args[3];
    let commands = &args[4..];

    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse()?),
        None => (address.clone(), 22),
    };

    let stream = TcpStream::connect((host.as_str(), port))?;
    let session = Session::connect_with(stream, &SessionConfig::default().with_timeout_ms(10_000))?;
    verify_host(&session, &host, port)?;
    session.userauth_password(username, password)?;

    let mut failures = 0;
    for command in commands {
        match execute_command(&session, command) {
            Ok(0) => {}
            Ok(status) => {
                eprintln!("exit status {}", status);
                failures += 1;
            }
            Err(e) => {
                eprintln!("Error executing command: {} ({})", e, e.status());
                failures += 1;
            }
        }
    }

    session.disconnect("done")?;
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
