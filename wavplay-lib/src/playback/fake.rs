//! Recording backend used by the playback tests.

use std::cell::{Cell, RefCell};

use super::backend::{
    AudioBackend, BufferId, ContextId, DeviceError, DeviceId, ErrorCode, SourceId, SourceParam,
    SourceState,
};
use crate::format::SampleFormatTag;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    OpenDevice,
    CloseDevice(DeviceId),
    CreateContext(DeviceId),
    MakeCurrent(Option<ContextId>),
    DestroyContext(ContextId),
    GenBuffer,
    BufferData {
        buffer: BufferId,
        format: SampleFormatTag,
        len: usize,
        sample_rate: i32,
    },
    DeleteBuffer(BufferId),
    GenSource,
    SetParam(SourceId, SourceParam),
    Play(SourceId),
    State(SourceId),
    DeleteSource(SourceId),
}

/// Backend that records every call and reports `Playing` for a fixed
/// number of state queries before reporting `Stopped`.
pub(crate) struct FakeBackend {
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u32>,
    playing_polls: Cell<usize>,
    fail_call: Option<&'static str>,
}

impl FakeBackend {
    pub(crate) fn new(playing_polls: usize) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            playing_polls: Cell::new(playing_polls),
            fail_call: None,
        }
    }

    /// Make the named backend call fail with `InvalidOperation`.
    pub(crate) fn failing(call: &'static str) -> Self {
        Self {
            fail_call: Some(call),
            ..Self::new(0)
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call_name: &'static str, call: Call) -> Result<(), DeviceError> {
        self.calls.borrow_mut().push(call);
        if self.fail_call == Some(call_name) {
            return Err(DeviceError::new(call_name, ErrorCode::InvalidOperation));
        }
        Ok(())
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl AudioBackend for FakeBackend {
    fn output_devices(&self) -> Result<Vec<String>, DeviceError> {
        Ok(vec!["Fake Output".to_string()])
    }

    fn open_device(&self, _name: Option<&str>) -> Result<DeviceId, DeviceError> {
        self.record("open_device", Call::OpenDevice)?;
        Ok(DeviceId(self.next()))
    }

    fn close_device(&self, device: DeviceId) -> Result<(), DeviceError> {
        self.record("close_device", Call::CloseDevice(device))
    }

    fn create_context(&self, device: DeviceId) -> Result<ContextId, DeviceError> {
        self.record("create_context", Call::CreateContext(device))?;
        Ok(ContextId(self.next()))
    }

    fn make_context_current(&self, context: Option<ContextId>) -> Result<(), DeviceError> {
        self.record("make_context_current", Call::MakeCurrent(context))
    }

    fn destroy_context(&self, context: ContextId) -> Result<(), DeviceError> {
        self.record("destroy_context", Call::DestroyContext(context))
    }

    fn gen_buffer(&self, _context: ContextId) -> Result<BufferId, DeviceError> {
        self.record("gen_buffer", Call::GenBuffer)?;
        Ok(BufferId(self.next()))
    }

    fn buffer_data(
        &self,
        _context: ContextId,
        buffer: BufferId,
        format: SampleFormatTag,
        data: Vec<u8>,
        sample_rate: i32,
    ) -> Result<(), DeviceError> {
        self.record(
            "buffer_data",
            Call::BufferData {
                buffer,
                format,
                len: data.len(),
                sample_rate,
            },
        )
    }

    fn delete_buffer(&self, _context: ContextId, buffer: BufferId) -> Result<(), DeviceError> {
        self.record("delete_buffer", Call::DeleteBuffer(buffer))
    }

    fn gen_source(&self, _context: ContextId) -> Result<SourceId, DeviceError> {
        self.record("gen_source", Call::GenSource)?;
        Ok(SourceId(self.next()))
    }

    fn set_source_param(
        &self,
        _context: ContextId,
        source: SourceId,
        param: SourceParam,
    ) -> Result<(), DeviceError> {
        self.record("set_source_param", Call::SetParam(source, param))
    }

    fn play_source(&self, _context: ContextId, source: SourceId) -> Result<(), DeviceError> {
        self.record("play_source", Call::Play(source))
    }

    fn source_state(
        &self,
        _context: ContextId,
        source: SourceId,
    ) -> Result<SourceState, DeviceError> {
        self.record("source_state", Call::State(source))?;
        match self.playing_polls.get() {
            0 => Ok(SourceState::Stopped),
            remaining => {
                self.playing_polls.set(remaining - 1);
                Ok(SourceState::Playing)
            }
        }
    }

    fn delete_source(&self, _context: ContextId, source: SourceId) -> Result<(), DeviceError> {
        self.record("delete_source", Call::DeleteSource(source))
    }
}
