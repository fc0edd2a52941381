//! # Coil Platform
//!
//! Status codes and error types shared by the coil libssh2 bindings.
//!
//! This crate provides:
//! - The status enumeration and libssh2 result-code translator (`Status`)
//! - Unified error types (`CoilError`, `CoilResult`)
//!
//! # Examples
//!
//! ```
//! use coil_platform::{CoilError, CoilResult, Status};
//!
//! fn example_function(code: i32) -> CoilResult<()> {
//!     match Status::from_result(code) {
//!         Status::Ok => Ok(()),
//!         _ => Err(CoilError::from_code(code, "call failed")),
//!     }
//! }
//!
//! assert!(example_function(0).is_ok());
//! let err = example_function(-18).unwrap_err();
//! assert_eq!(err.status(), Status::Authentication);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod error;
pub mod status;

pub use error::{CoilError, CoilResult};
pub use status::Status;

/// Platform version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
