//! SFTP client.
//!
//! An [`Sftp`] handle is opened from an authenticated [`Session`](crate::Session)
//! and hands out [`SftpFile`] and [`SftpDirectory`] handles. Every failure is
//! reported through [`CoilError`](crate::CoilError); the last SFTP status code
//! is also kept on the [`Sftp`] handle for callers that poll it.
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::sftp::{FileMode, OpenFlags};
//! use coil_ssh::Session;
//! use std::net::TcpStream;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(TcpStream::connect("example.com:22")?)?;
//! session.userauth_agent("deploy")?;
//!
//! let sftp = session.sftp()?;
//! let mut file = sftp.open_file(Path::new("/tmp/hello.txt"), OpenFlags::write(), FileMode::default())?;
//! file.write(b"hello")?;
//! file.close()?;
//!
//! let mut dir = sftp.open_directory(Path::new("/tmp"))?;
//! while let Some((name, attrs)) = dir.read_entry()? {
//!     println!("{} {:?}", name, attrs.size());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod file;
mod types;

pub use client::Sftp;
pub use file::{SftpDirectory, SftpFile};
pub use types::{AttributeFlags, Attributes, FileMode, FileType, OpenFlags, SftpErrorCode};
