//! The audio subsystem seen from the playback driver.
//!
//! [`AudioBackend`] mirrors the small slice of a device/context/buffer/source
//! audio API the driver needs. Every call names the handle it acts on; no
//! backend call relies on an implicit "current" object that the caller did
//! not pass in.

use std::fmt::{Display, Formatter};

use crate::format::SampleFormatTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

/// Playback state reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// A single source parameter assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceParam {
    Pitch(f32),
    Gain(f32),
    Position([f32; 3]),
    Velocity([f32; 3]),
    Looping(bool),
    Buffer(BufferId),
}

/// Source parameters applied before playback starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceConfig {
    pub pitch: f32,
    pub gain: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub looping: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            gain: 1.0,
            position: [0.0; 3],
            velocity: [0.0; 3],
            looping: false,
        }
    }
}

impl SourceConfig {
    pub(crate) fn params(&self) -> [SourceParam; 5] {
        [
            SourceParam::Pitch(self.pitch),
            SourceParam::Gain(self.gain),
            SourceParam::Position(self.position),
            SourceParam::Velocity(self.velocity),
            SourceParam::Looping(self.looping),
        ]
    }
}

/// Opaque failure code reported by an audio backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    NoDevice,
    InvalidDevice,
    InvalidContext,
    /// A buffer or source handle that does not exist.
    InvalidName,
    InvalidValue,
    InvalidOperation,
    Backend(String),
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no such device"),
            Self::InvalidDevice => write!(f, "invalid device"),
            Self::InvalidContext => write!(f, "invalid context"),
            Self::InvalidName => write!(f, "invalid name"),
            Self::InvalidValue => write!(f, "invalid value"),
            Self::InvalidOperation => write!(f, "invalid operation"),
            Self::Backend(message) => write!(f, "{}", message),
        }
    }
}

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub call: &'static str,
    pub code: ErrorCode,
}

impl DeviceError {
    pub fn new(call: &'static str, code: ErrorCode) -> Self {
        Self { call, code }
    }
}

impl Display for DeviceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.call, self.code)
    }
}

impl std::error::Error for DeviceError {}

/// Audio output subsystem used by the playback driver.
///
/// Calls take `&self`; implementations keep their bookkeeping behind
/// interior mutability so that scoped handles can share one backend.
pub trait AudioBackend {
    /// Names of the output devices that [`AudioBackend::open_device`] accepts.
    fn output_devices(&self) -> Result<Vec<String>, DeviceError>;
    /// Open the named device, or the system default for `None`.
    fn open_device(&self, name: Option<&str>) -> Result<DeviceId, DeviceError>;
    fn close_device(&self, device: DeviceId) -> Result<(), DeviceError>;

    fn create_context(&self, device: DeviceId) -> Result<ContextId, DeviceError>;
    /// Select the context backend calls are issued against; `None` clears it.
    fn make_context_current(&self, context: Option<ContextId>) -> Result<(), DeviceError>;
    fn destroy_context(&self, context: ContextId) -> Result<(), DeviceError>;

    fn gen_buffer(&self, context: ContextId) -> Result<BufferId, DeviceError>;
    /// Upload the whole payload into `buffer` in one call.
    fn buffer_data(
        &self,
        context: ContextId,
        buffer: BufferId,
        format: SampleFormatTag,
        data: Vec<u8>,
        sample_rate: i32,
    ) -> Result<(), DeviceError>;
    fn delete_buffer(&self, context: ContextId, buffer: BufferId) -> Result<(), DeviceError>;

    fn gen_source(&self, context: ContextId) -> Result<SourceId, DeviceError>;
    fn set_source_param(
        &self,
        context: ContextId,
        source: SourceId,
        param: SourceParam,
    ) -> Result<(), DeviceError>;
    fn play_source(&self, context: ContextId, source: SourceId) -> Result<(), DeviceError>;
    fn source_state(&self, context: ContextId, source: SourceId)
        -> Result<SourceState, DeviceError>;
    fn delete_source(&self, context: ContextId, source: SourceId) -> Result<(), DeviceError>;
}
