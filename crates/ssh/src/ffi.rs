//! libssh2 entry points not covered by the `ssh2` crate.

#![allow(unsafe_code)]

use libssh2_sys::LIBSSH2_SESSION;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

/// Signature of a libssh2 trace handler.
pub(crate) type TraceHandler =
    extern "C" fn(session: *mut LIBSSH2_SESSION, context: *mut c_void, message: *const c_char, len: usize);

extern "C" {
    fn libssh2_trace_sethandler(
        session: *mut LIBSSH2_SESSION,
        context: *mut c_void,
        callback: TraceHandler,
    ) -> c_int;

    fn libssh2_version(required_version: c_int) -> *const c_char;
}

/// Registers `handler` as the trace callback of `session`.
///
/// `context` is handed back to every invocation of `handler` and must stay
/// valid until another handler is registered.
pub(crate) fn set_trace_handler(
    session: &ssh2::Session,
    context: *const c_void,
    handler: TraceHandler,
) -> c_int {
    let mut raw = session.raw();
    unsafe { libssh2_trace_sethandler(&mut *raw, context as *mut c_void, handler) }
}

/// Enables the trace categories in `bitmask`.
pub(crate) fn set_trace_mask(session: &ssh2::Session, bitmask: c_int) -> c_int {
    let mut raw = session.raw();
    unsafe { libssh2_sys::libssh2_trace(&mut *raw, bitmask) }
}

/// Version string of the linked libssh2, if it reports one.
pub(crate) fn runtime_version() -> Option<String> {
    let ptr = unsafe { libssh2_version(0) };
    if ptr.is_null() {
        return None;
    }
    let version = unsafe { CStr::from_ptr(ptr) };
    Some(version.to_string_lossy().into_owned())
}

pub(crate) fn global_init() -> c_int {
    unsafe { libssh2_sys::libssh2_init(0) }
}

pub(crate) fn global_exit() {
    unsafe { libssh2_sys::libssh2_exit() }
}

/// Copies a trace message out of libssh2's buffer.
///
/// Returns `None` for a null pointer.
///
/// # Safety
///
/// A non-null `message` must point to at least `len` readable bytes.
pub(crate) unsafe fn trace_message(message: *const c_char, len: usize) -> Option<Vec<u8>> {
    if message.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(message as *const u8, len).to_vec())
}

/// Recovers the context registered with [`set_trace_handler`].
///
/// # Safety
///
/// `context` must be null or the pointer registered for a `T` that is still
/// alive.
pub(crate) unsafe fn context_ref<'a, T>(context: *mut c_void) -> Option<&'a T> {
    (context as *const T).as_ref()
}
