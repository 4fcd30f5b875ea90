//! gamelink-ffi: C-ABI exports for gamelink sessions.

mod args;
mod config;
mod error;
mod session;
mod types;

use std::panic::AssertUnwindSafe;

pub use config::gl_config_default;
pub use session::{
    gl_session_connect, gl_session_dequeue_game, gl_session_dequeue_system, gl_session_free,
    gl_session_initialize, gl_session_local_address, gl_session_new, gl_session_release,
    gl_session_send,
};
pub use types::{
    GlConfig, GlResult, GlSessionHandle, GL_ERR_ALREADY_INITIALIZED,
    GL_ERR_BUFFER_TOO_SMALL, GL_ERR_FRAME, GL_ERR_INTERNAL, GL_ERR_INVALID_ARGUMENT,
    GL_ERR_NOT_CONNECTED, GL_ERR_SEND_FAILED, GL_ERR_TIMEOUT, GL_ERR_TRANSPORT,
    GL_ERR_UNREACHABLE_HOST, GL_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Message for the most recent failed call on this thread ("" if none).
#[no_mangle]
pub extern "C" fn gl_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn last_error_returns_non_null_pointer() {
        error::clear_error_state();
        let ptr = gl_last_error();
        assert!(!ptr.is_null());

        // SAFETY: gl_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(ptr).to_str().unwrap() };
        assert!(text.is_empty());
    }

    #[test]
    fn panic_is_contained() {
        let result = ffi_boundary(GlResult::Internal, || -> GlResult { panic!("boom") });
        assert_eq!(result, GlResult::Internal);

        // SAFETY: gl_last_error returns a pointer to a thread-local CString.
        let text = unsafe { CStr::from_ptr(gl_last_error()).to_str().unwrap() };
        assert_eq!(text, "panic across FFI boundary");
    }
}
