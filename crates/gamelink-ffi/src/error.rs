use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use gamelink_session::SessionError;

use crate::types::GlResult;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_invalid_argument(message: impl Into<String>) -> GlResult {
    set_error_message(message);
    GlResult::InvalidArgument
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn map_session_error(err: &SessionError) -> GlResult {
    set_error_message(err.to_string());
    match err {
        SessionError::AlreadyInitialized => GlResult::AlreadyInitialized,
        SessionError::UnreachableHost(_) => GlResult::UnreachableHost,
        SessionError::Timeout { .. } => GlResult::Timeout,
        SessionError::NotConnected => GlResult::NotConnected,
        SessionError::SendFailed(_) => GlResult::SendFailed,
        SessionError::BufferTooSmall { .. } => GlResult::BufferTooSmall,
        SessionError::Frame(_) => GlResult::FrameError,
        SessionError::Transport(_) => GlResult::TransportError,
    }
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    fn last_error() -> String {
        // SAFETY: the pointer refers to this thread's LAST_ERROR value.
        unsafe { CStr::from_ptr(last_error_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn interior_nul_is_replaced() {
        set_error_message("bad\0byte");
        assert_eq!(last_error(), "bad?byte");
        clear_error_state();
        assert_eq!(last_error(), "");
    }

    #[test]
    fn session_errors_map_to_codes() {
        let err = SessionError::BufferTooSmall {
            required: 7,
            capacity: 2,
        };
        assert_eq!(map_session_error(&err), GlResult::BufferTooSmall);
        assert!(last_error().contains("next packet needs 7"));

        assert_eq!(
            map_session_error(&SessionError::NotConnected),
            GlResult::NotConnected
        );
        assert_eq!(
            map_session_error(&SessionError::AlreadyInitialized),
            GlResult::AlreadyInitialized
        );
    }
}
