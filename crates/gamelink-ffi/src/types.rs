use std::ffi::c_void;

use gamelink_session::Session;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlResult {
    Ok = 0,
    InvalidArgument = 1,
    AlreadyInitialized = 2,
    UnreachableHost = 4,
    Timeout = 5,
    NotConnected = 6,
    SendFailed = 7,
    BufferTooSmall = 8,
    FrameError = 9,
    TransportError = 10,
    Internal = 99,
}

#[allow(dead_code)]
pub const GL_OK: GlResult = GlResult::Ok;
#[allow(dead_code)]
pub const GL_ERR_INVALID_ARGUMENT: GlResult = GlResult::InvalidArgument;
#[allow(dead_code)]
pub const GL_ERR_ALREADY_INITIALIZED: GlResult = GlResult::AlreadyInitialized;
#[allow(dead_code)]
pub const GL_ERR_UNREACHABLE_HOST: GlResult = GlResult::UnreachableHost;
#[allow(dead_code)]
pub const GL_ERR_TIMEOUT: GlResult = GlResult::Timeout;
#[allow(dead_code)]
pub const GL_ERR_NOT_CONNECTED: GlResult = GlResult::NotConnected;
#[allow(dead_code)]
pub const GL_ERR_SEND_FAILED: GlResult = GlResult::SendFailed;
#[allow(dead_code)]
pub const GL_ERR_BUFFER_TOO_SMALL: GlResult = GlResult::BufferTooSmall;
#[allow(dead_code)]
pub const GL_ERR_FRAME: GlResult = GlResult::FrameError;
#[allow(dead_code)]
pub const GL_ERR_TRANSPORT: GlResult = GlResult::TransportError;
#[allow(dead_code)]
pub const GL_ERR_INTERNAL: GlResult = GlResult::Internal;

/// Session configuration as seen from C.
///
/// Fill with `gl_config_default` and override fields as needed.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GlConfig {
    pub game_queue_capacity: usize,
    pub system_queue_capacity: usize,
    pub max_packet_size: usize,
    pub read_chunk_size: usize,
    pub connect_timeout_ms: u64,
    /// 0 disables the write timeout.
    pub write_timeout_ms: u64,
    pub nodelay: bool,
    pub keepalive: bool,
    /// Null keeps the default system packet types.
    pub system_types: *const u8,
    pub num_system_types: usize,
}

pub type GlSessionHandle = *mut c_void;

pub(crate) struct SessionHandle {
    pub(crate) session: Session,
}
