//! libssh2 trace capture.
//!
//! libssh2 reports diagnostic lines through a callback that fires in the
//! middle of other calls. [`TraceQueue`] buffers those lines in arrival order
//! until the caller drains them. Each line is also forwarded to `tracing`
//! under the `coil_ssh::trace` target, so a subscriber sees them without
//! polling.
//!
//! # Example
//!
//! ```rust,no_run
//! use coil_ssh::{Session, TraceFlags};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new()?;
//! let queue = session.trace_begin(TraceFlags::KEX | TraceFlags::AUTH);
//!
//! // ... connect and authenticate ...
//!
//! while let Some(line) = queue.next_message() {
//!     println!("{}", line);
//! }
//! session.trace_end();
//! # Ok(())
//! # }
//! ```

use crate::ffi;
use coil_platform::Status;
use libssh2_sys::LIBSSH2_SESSION;
use std::collections::VecDeque;
use std::os::raw::{c_char, c_void};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

pub use ssh2::TraceFlags;

struct TraceState {
    messages: Mutex<VecDeque<String>>,
    last_result: AtomicI32,
}

impl TraceState {
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A poisoned queue still holds valid strings.
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, status: Status) {
        self.last_result.store(status.code(), Ordering::Relaxed);
    }

    fn push(&self, line: String) {
        self.lock().push_back(line);
        self.record(Status::Ok);
    }
}

/// FIFO of libssh2 trace messages.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct TraceQueue {
    state: Arc<TraceState>,
}

impl TraceQueue {
    /// Creates an empty queue that is not attached to a session.
    pub fn new() -> Self {
        Self {
            state: Arc::new(TraceState {
                messages: Mutex::new(VecDeque::new()),
                last_result: AtomicI32::new(Status::Ok.code()),
            }),
        }
    }

    /// Appends a message to the tail, as the libssh2 handler does.
    #[cfg(test)]
    pub(crate) fn push(&self, message: impl Into<String>) {
        self.state.push(message.into());
    }

    /// Returns true if at least one message is queued.
    pub fn has_messages(&self) -> bool {
        !self.state.lock().is_empty()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        !self.has_messages()
    }

    /// Byte length of the message at the head, or zero if empty.
    pub fn message_len(&self) -> usize {
        self.state.lock().front().map(String::len).unwrap_or(0)
    }

    /// Removes and returns the message at the head.
    pub fn next_message(&self) -> Option<String> {
        self.state.lock().pop_front()
    }

    /// Removes and returns every queued message, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.state.lock().drain(..).collect()
    }

    /// Outcome of the most recent handler invocation.
    pub fn last_handler_result(&self) -> Status {
        Status::from_code(self.state.last_result.load(Ordering::Relaxed)).unwrap_or(Status::Generic)
    }

    fn context(&self) -> *const c_void {
        Arc::as_ptr(&self.state) as *const c_void
    }
}

impl Default for TraceQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TraceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceQueue")
            .field("len", &self.len())
            .field("last_handler_result", &self.last_handler_result())
            .finish()
    }
}

extern "C" fn queue_handler(
    _session: *mut LIBSSH2_SESSION,
    context: *mut c_void,
    message: *const c_char,
    len: usize,
) {
    // SAFETY: the context is the `TraceState` registered in `attach`, which
    // the owning session keeps alive until `detach` swaps in `noop_handler`.
    // libssh2 passes a buffer of exactly `len` bytes.
    #[allow(unsafe_code)]
    let (state, bytes) = unsafe {
        match ffi::context_ref::<TraceState>(context) {
            Some(state) => (state, ffi::trace_message(message, len)),
            None => return,
        }
    };

    let bytes = match bytes {
        Some(bytes) => bytes,
        None => {
            state.record(Status::MissingValue);
            return;
        }
    };

    let line = String::from_utf8_lossy(&bytes)
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .to_string();
    trace!(target: "coil_ssh::trace", "{}", line);

    state.push(line);
}

extern "C" fn noop_handler(
    _session: *mut LIBSSH2_SESSION,
    _context: *mut c_void,
    _message: *const c_char,
    _len: usize,
) {
}

/// Installs a fresh queue as the trace handler of `session`.
pub(crate) fn attach(session: &ssh2::Session, flags: TraceFlags) -> TraceQueue {
    let queue = TraceQueue::new();
    let rc = ffi::set_trace_handler(session, queue.context(), queue_handler);
    if rc != 0 {
        warn!(rc, "Failed to install trace handler");
        queue.state.record(Status::from_result(rc));
    }
    session.trace(flags);
    debug!(flags = flags.bits(), "Trace capture started");
    queue
}

/// Disables tracing and unhooks the queue from `session`.
pub(crate) fn detach(session: &ssh2::Session, queue: &TraceQueue) {
    ffi::set_trace_mask(session, 0);
    ffi::set_trace_handler(session, std::ptr::null(), noop_handler);
    debug!(pending = queue.len(), "Trace capture stopped");
}
