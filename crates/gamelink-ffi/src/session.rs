use std::os::raw::c_char;

use gamelink_session::{Session, SessionConfig, SessionError};

use crate::args;
use crate::config;
use crate::error;
use crate::types::{GlConfig, GlResult, GlSessionHandle, SessionHandle};

fn with_session<T>(
    handle: GlSessionHandle,
    on_error: T,
    f: impl FnOnce(&mut Session) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("session handle cannot be null");
        return on_error;
    }

    let session_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut SessionHandle) }
    };

    f(&mut session_handle.session)
}

fn status(result: gamelink_session::Result<()>) -> GlResult {
    match result {
        Ok(()) => GlResult::Ok,
        Err(err) => error::map_session_error(&err),
    }
}

/// Copy one dequeued packet into the caller's buffer.
///
/// # Safety
/// `buf` must be writable for `capacity` bytes (or null with `capacity == 0`);
/// `out_len` must be a valid writable pointer.
unsafe fn dequeue(
    session: GlSessionHandle,
    buf: *mut u8,
    capacity: usize,
    out_len: *mut usize,
    pick: impl FnOnce(&Session, &mut [u8]) -> gamelink_session::Result<usize>,
) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        if out_len.is_null() {
            return error::set_invalid_argument("out_len cannot be null");
        }
        let buf = {
            // SAFETY: We validate pointer/capacity pairing in helper.
            match unsafe { args::out_buffer_arg(buf, capacity, "buf") } {
                Some(v) => v,
                None => return GlResult::InvalidArgument,
            }
        };

        with_session(session, GlResult::InvalidArgument, |session| {
            let (result, len) = match pick(session, buf) {
                Ok(n) => (GlResult::Ok, n),
                Err(err @ SessionError::BufferTooSmall { required, .. }) => {
                    (error::map_session_error(&err), required)
                }
                Err(err) => (error::map_session_error(&err), 0),
            };
            // SAFETY: Pointer was checked for null above.
            unsafe { args::write_out(out_len, len) };
            result
        })
    })
}

/// Create a session that is not yet connected.
#[no_mangle]
pub extern "C" fn gl_session_new() -> GlSessionHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        let handle = SessionHandle {
            session: Session::new(),
        };
        Box::into_raw(Box::new(handle)) as GlSessionHandle
    })
}

/// Release and free a session handle.
///
/// # Safety
/// `session` must be null or a handle returned by `gl_session_new`.
#[no_mangle]
pub unsafe extern "C" fn gl_session_free(session: GlSessionHandle) {
    crate::ffi_boundary((), || {
        if session.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by gl_session_new.
        unsafe {
            drop(Box::from_raw(session as *mut SessionHandle));
        }
    });
}

/// Apply a configuration, reset both queues, and connect to `address`.
///
/// # Safety
/// `session` must be a valid handle. `config` must be null (defaults) or a
/// valid pointer. `address` must be a non-null UTF-8 C string (`host:port`).
#[no_mangle]
pub unsafe extern "C" fn gl_session_initialize(
    session: GlSessionHandle,
    config: *const GlConfig,
    address: *const c_char,
) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        let address = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { args::required_str_arg(address, "address") } {
                Some(v) => v,
                None => return GlResult::InvalidArgument,
            }
        };

        let config = if config.is_null() {
            SessionConfig::default()
        } else {
            // SAFETY: Pointer was checked for null above; system_types is the caller's contract.
            match unsafe { config::session_config(&*config) } {
                Some(v) => v,
                None => return GlResult::InvalidArgument,
            }
        };

        with_session(session, GlResult::InvalidArgument, |session| {
            status(session.initialize(config, address))
        })
    })
}

/// Connect with the current configuration, keeping queued packets.
///
/// # Safety
/// `session` must be a valid handle and `address` a non-null UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn gl_session_connect(
    session: GlSessionHandle,
    address: *const c_char,
) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        let address = {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { args::required_str_arg(address, "address") } {
                Some(v) => v,
                None => return GlResult::InvalidArgument,
            }
        };

        with_session(session, GlResult::InvalidArgument, |session| {
            status(session.connect(address))
        })
    })
}

/// Close the connection and stop the receive thread. Safe to call twice.
///
/// # Safety
/// `session` must be a valid handle.
#[no_mangle]
pub unsafe extern "C" fn gl_session_release(session: GlSessionHandle) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        with_session(session, GlResult::InvalidArgument, |session| {
            session.release();
            GlResult::Ok
        })
    })
}

/// Write pre-framed bytes to the server.
///
/// # Safety
/// `session` must be a valid handle. If `len > 0`, `data` must be readable for
/// `len` bytes. `out_written` may be null.
#[no_mangle]
pub unsafe extern "C" fn gl_session_send(
    session: GlSessionHandle,
    data: *const u8,
    len: usize,
    out_written: *mut usize,
) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        let payload = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(data, len, "data") } {
                Some(v) => v,
                None => return GlResult::InvalidArgument,
            }
        };

        with_session(session, GlResult::InvalidArgument, |session| {
            match session.send(payload) {
                Ok(n) => {
                    // SAFETY: write_out ignores null; otherwise caller guarantees validity.
                    unsafe { args::write_out(out_written, n) };
                    GlResult::Ok
                }
                Err(err) => error::map_session_error(&err),
            }
        })
    })
}

/// Copy the next game packet into `buf`.
///
/// `*out_len` is 0 when no packet is queued. On `GL_ERR_BUFFER_TOO_SMALL` it
/// holds the size required and the packet stays queued.
///
/// # Safety
/// `session` must be a valid handle, `buf` writable for `capacity` bytes, and
/// `out_len` a valid writable pointer.
#[no_mangle]
pub unsafe extern "C" fn gl_session_dequeue_game(
    session: GlSessionHandle,
    buf: *mut u8,
    capacity: usize,
    out_len: *mut usize,
) -> GlResult {
    // SAFETY: Forwarded caller contract.
    unsafe { dequeue(session, buf, capacity, out_len, Session::dequeue_game_packet) }
}

/// Copy the next system packet into `buf`. See `gl_session_dequeue_game`.
///
/// # Safety
/// Same contract as `gl_session_dequeue_game`.
#[no_mangle]
pub unsafe extern "C" fn gl_session_dequeue_system(
    session: GlSessionHandle,
    buf: *mut u8,
    capacity: usize,
    out_len: *mut usize,
) -> GlResult {
    // SAFETY: Forwarded caller contract.
    unsafe {
        dequeue(
            session,
            buf,
            capacity,
            out_len,
            Session::dequeue_system_packet,
        )
    }
}

/// Write the local `ip:port` of the connection as a NUL-terminated string.
///
/// # Safety
/// `session` must be a valid handle and `buf` writable for `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn gl_session_local_address(
    session: GlSessionHandle,
    buf: *mut c_char,
    capacity: usize,
) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        let out = {
            // SAFETY: We validate pointer/capacity pairing in helper.
            match unsafe { args::out_buffer_arg(buf.cast::<u8>(), capacity, "buf") } {
                Some(v) => v,
                None => return GlResult::InvalidArgument,
            }
        };

        with_session(session, GlResult::InvalidArgument, |session| {
            let address = match session.local_address() {
                Ok(address) => address.to_string(),
                Err(err) => return error::map_session_error(&err),
            };

            let bytes = address.as_bytes();
            if bytes.len() >= out.len() {
                return error::map_session_error(&SessionError::BufferTooSmall {
                    required: bytes.len() + 1,
                    capacity: out.len(),
                });
            }
            out[..bytes.len()].copy_from_slice(bytes);
            out[bytes.len()] = 0;
            GlResult::Ok
        })
    })
}
