//! Scoped ownership of backend objects.
//!
//! Each handle releases its backend object on drop. Contexts borrow their
//! device and buffers/sources borrow their context, so release always runs
//! in reverse order of acquisition: source and buffer, then context, then
//! device. Release failures are logged and otherwise ignored.

use log::{debug, warn};

use super::backend::{
    AudioBackend, BufferId, ContextId, DeviceError, DeviceId, SourceConfig, SourceId, SourceParam,
    SourceState,
};
use crate::format::SampleFormatTag;
use crate::wave::AudioPayload;

/// An open output device.
pub struct Device<'a, B: AudioBackend> {
    backend: &'a B,
    id: DeviceId,
}

impl<'a, B: AudioBackend> Device<'a, B> {
    /// Open the named device, or the default one for `None`.
    pub fn open(backend: &'a B, name: Option<&str>) -> Result<Self, DeviceError> {
        let id = backend.open_device(name)?;
        debug!("opened device {:?} ({})", id, name.unwrap_or("default"));
        Ok(Self { backend, id })
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }
}

impl<B: AudioBackend> Drop for Device<'_, B> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.close_device(self.id) {
            warn!("failed to close device {:?}: {}", self.id, err);
        }
    }
}

/// A rendering context made current on creation and released on drop.
pub struct Context<'a, B: AudioBackend> {
    backend: &'a B,
    id: ContextId,
}

impl<'a, B: AudioBackend> Context<'a, B> {
    /// Create a context on `device` and make it the current one.
    pub fn create(device: &'a Device<'_, B>) -> Result<Self, DeviceError> {
        let backend = device.backend;
        let id = backend.create_context(device.id)?;
        if let Err(err) = backend.make_context_current(Some(id)) {
            if let Err(destroy_err) = backend.destroy_context(id) {
                warn!("failed to destroy context {:?}: {}", id, destroy_err);
            }
            return Err(err);
        }
        Ok(Self { backend, id })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn gen_buffer(&self) -> Result<Buffer<'_, B>, DeviceError> {
        let id = self.backend.gen_buffer(self.id)?;
        Ok(Buffer {
            backend: self.backend,
            context: self.id,
            id,
        })
    }

    pub fn gen_source(&self) -> Result<Source<'_, B>, DeviceError> {
        let id = self.backend.gen_source(self.id)?;
        Ok(Source {
            backend: self.backend,
            context: self.id,
            id,
        })
    }
}

impl<B: AudioBackend> Drop for Context<'_, B> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.make_context_current(None) {
            warn!("failed to release current context: {}", err);
        }
        if let Err(err) = self.backend.destroy_context(self.id) {
            warn!("failed to destroy context {:?}: {}", self.id, err);
        }
    }
}

/// A sample buffer owned by a context.
pub struct Buffer<'a, B: AudioBackend> {
    backend: &'a B,
    context: ContextId,
    id: BufferId,
}

impl<B: AudioBackend> Buffer<'_, B> {
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Hand the whole payload to the backend. The payload is consumed.
    pub fn upload(
        &self,
        format: SampleFormatTag,
        payload: AudioPayload,
        sample_rate: i32,
    ) -> Result<(), DeviceError> {
        let len = payload.len();
        self.backend
            .buffer_data(self.context, self.id, format, payload.into_bytes(), sample_rate)?;
        debug!(
            "uploaded {} bytes as {:?} at {} Hz into buffer {:?}",
            len, format, sample_rate, self.id
        );
        Ok(())
    }
}

impl<B: AudioBackend> Drop for Buffer<'_, B> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.delete_buffer(self.context, self.id) {
            warn!("failed to delete buffer {:?}: {}", self.id, err);
        }
    }
}

/// A playback source owned by a context.
pub struct Source<'a, B: AudioBackend> {
    backend: &'a B,
    context: ContextId,
    id: SourceId,
}

impl<B: AudioBackend> Source<'_, B> {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn set(&self, param: SourceParam) -> Result<(), DeviceError> {
        self.backend.set_source_param(self.context, self.id, param)
    }

    pub fn configure(&self, config: &SourceConfig) -> Result<(), DeviceError> {
        config.params().into_iter().try_for_each(|param| self.set(param))
    }

    pub fn attach(&self, buffer: &Buffer<'_, B>) -> Result<(), DeviceError> {
        self.set(SourceParam::Buffer(buffer.id))
    }

    pub fn play(&self) -> Result<(), DeviceError> {
        self.backend.play_source(self.context, self.id)
    }

    pub fn state(&self) -> Result<SourceState, DeviceError> {
        self.backend.source_state(self.context, self.id)
    }
}

impl<B: AudioBackend> Drop for Source<'_, B> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.delete_source(self.context, self.id) {
            warn!("failed to delete source {:?}: {}", self.id, err);
        }
    }
}
