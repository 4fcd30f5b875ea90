use std::time::Duration;

use gamelink_session::SessionConfig;

use crate::args;
use crate::error;
use crate::types::{GlConfig, GlResult};

impl From<&SessionConfig> for GlConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            game_queue_capacity: config.game_queue_capacity,
            system_queue_capacity: config.system_queue_capacity,
            max_packet_size: config.framing.max_packet_size,
            read_chunk_size: config.read_chunk_size,
            connect_timeout_ms: duration_ms(config.connect_timeout),
            write_timeout_ms: config.write_timeout.map_or(0, duration_ms),
            nodelay: config.nodelay,
            keepalive: config.keepalive,
            system_types: std::ptr::null(),
            num_system_types: 0,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Build a `SessionConfig` from its C form.
///
/// # Safety
/// If `config.system_types` is non-null it must be readable for
/// `config.num_system_types` bytes.
pub(crate) unsafe fn session_config(config: &GlConfig) -> Option<SessionConfig> {
    if config.connect_timeout_ms == 0 {
        let _ = error::set_invalid_argument("connect_timeout_ms must be greater than zero");
        return None;
    }

    let mut out = SessionConfig::default();
    if !config.system_types.is_null() {
        // SAFETY: The caller guarantees the pointer/length pairing.
        let types = unsafe {
            args::bytes_arg(config.system_types, config.num_system_types, "system_types")?
        };
        out.system_types = types.to_vec();
    }

    out.game_queue_capacity = config.game_queue_capacity;
    out.system_queue_capacity = config.system_queue_capacity;
    out.framing.max_packet_size = config.max_packet_size;
    out.read_chunk_size = config.read_chunk_size;
    out.connect_timeout = Duration::from_millis(config.connect_timeout_ms);
    out.write_timeout =
        (config.write_timeout_ms > 0).then(|| Duration::from_millis(config.write_timeout_ms));
    out.nodelay = config.nodelay;
    out.keepalive = config.keepalive;
    Some(out)
}

/// Fill `out_config` with the default session configuration.
///
/// # Safety
/// `out_config` must be a valid writable pointer.
#[no_mangle]
pub unsafe extern "C" fn gl_config_default(out_config: *mut GlConfig) -> GlResult {
    crate::ffi_boundary(GlResult::Internal, || {
        error::clear_error_state();

        if out_config.is_null() {
            return error::set_invalid_argument("out_config cannot be null");
        }

        // SAFETY: Pointer was checked for null above.
        unsafe {
            args::write_out(out_config, GlConfig::from(&SessionConfig::default()));
        }
        GlResult::Ok
    })
}

#[cfg(test)]
mod tests {
    use std::mem::MaybeUninit;

    use super::*;

    fn defaults() -> GlConfig {
        let mut slot = MaybeUninit::<GlConfig>::uninit();
        // SAFETY: `slot` is writable and is initialized on success.
        let result = unsafe { gl_config_default(slot.as_mut_ptr()) };
        assert_eq!(result, GlResult::Ok);
        // SAFETY: gl_config_default returned Ok.
        unsafe { slot.assume_init() }
    }

    #[test]
    fn default_matches_session_defaults() {
        let config = defaults();
        let expected = SessionConfig::default();
        assert_eq!(config.game_queue_capacity, expected.game_queue_capacity);
        assert_eq!(config.system_queue_capacity, expected.system_queue_capacity);
        assert_eq!(config.connect_timeout_ms, 5_000);
        assert_eq!(config.write_timeout_ms, 0);
        assert!(config.nodelay);
        assert!(config.system_types.is_null());
    }

    #[test]
    fn null_out_config_is_invalid() {
        // SAFETY: null is rejected before any write.
        let result = unsafe { gl_config_default(std::ptr::null_mut()) };
        assert_eq!(result, GlResult::InvalidArgument);
    }

    #[test]
    fn c_config_converts_back() {
        let types = [0x10u8, 0x11];
        let config = GlConfig {
            game_queue_capacity: 8,
            write_timeout_ms: 250,
            system_types: types.as_ptr(),
            num_system_types: types.len(),
            ..defaults()
        };

        // SAFETY: `types` outlives the call.
        let out = unsafe { session_config(&config) }.unwrap();
        assert_eq!(out.game_queue_capacity, 8);
        assert_eq!(out.write_timeout, Some(Duration::from_millis(250)));
        assert_eq!(out.system_types, vec![0x10, 0x11]);
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let config = GlConfig {
            connect_timeout_ms: 0,
            ..defaults()
        };
        // SAFETY: no system types pointer.
        assert!(unsafe { session_config(&config) }.is_none());
    }
}
