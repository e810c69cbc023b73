//! [`AudioBackend`] implementation on top of `rodio`.
//!
//! Devices are `rodio` output streams, contexts select the stream's mixer,
//! buffers hold decoded `f32` samples and sources are `Sink`s.

use std::cell::RefCell;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rodio::buffer::SamplesBuffer;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::source::Buffered;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};

use super::backend::{
    AudioBackend, BufferId, ContextId, DeviceError, DeviceId, ErrorCode, SourceId, SourceParam,
    SourceState,
};
use crate::constants::{OUTPUT_STREAM_OPEN_RETRIES, OUTPUT_STREAM_OPEN_RETRY_MS};
use crate::format::SampleFormatTag;

type StoredSamples = Buffered<SamplesBuffer>;

struct SourceSlot {
    context: ContextId,
    sink: Sink,
    buffer: Option<BufferId>,
    looping: bool,
    started: bool,
}

struct BufferSlot {
    device: DeviceId,
    samples: Option<StoredSamples>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    devices: HashMap<DeviceId, OutputStream>,
    contexts: HashMap<ContextId, DeviceId>,
    current: Option<ContextId>,
    buffers: HashMap<BufferId, BufferSlot>,
    sources: HashMap<SourceId, SourceSlot>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Resolve the device behind `context`, which must be current.
    fn current_device(
        &self,
        call: &'static str,
        context: ContextId,
    ) -> Result<DeviceId, DeviceError> {
        if self.current != Some(context) {
            return Err(DeviceError::new(call, ErrorCode::InvalidContext));
        }
        self.contexts
            .get(&context)
            .copied()
            .ok_or_else(|| DeviceError::new(call, ErrorCode::InvalidContext))
    }

    fn source_mut(
        &mut self,
        call: &'static str,
        context: ContextId,
        source: SourceId,
    ) -> Result<&mut SourceSlot, DeviceError> {
        self.current_device(call, context)?;
        self.sources
            .get_mut(&source)
            .filter(|slot| slot.context == context)
            .ok_or_else(|| DeviceError::new(call, ErrorCode::InvalidName))
    }
}

/// Audio backend that plays through the system's output devices.
#[derive(Default)]
pub struct RodioBackend {
    state: RefCell<State>,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for RodioBackend {
    fn output_devices(&self) -> Result<Vec<String>, DeviceError> {
        let host = rodio::cpal::default_host();
        let devices = host.output_devices().map_err(|err| {
            DeviceError::new("output_devices", ErrorCode::Backend(err.to_string()))
        })?;
        Ok(devices.filter_map(|device| device.name().ok()).collect())
    }

    fn open_device(&self, name: Option<&str>) -> Result<DeviceId, DeviceError> {
        let mut stream = open_output_stream_with_retry(name)?;
        stream.log_on_drop(false);

        let mut state = self.state.borrow_mut();
        let id = DeviceId(state.next_id());
        state.devices.insert(id, stream);
        Ok(id)
    }

    fn close_device(&self, device: DeviceId) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        if !state.devices.contains_key(&device) {
            return Err(DeviceError::new("close_device", ErrorCode::InvalidDevice));
        }
        if state.contexts.values().any(|owner| *owner == device) {
            return Err(DeviceError::new(
                "close_device",
                ErrorCode::InvalidOperation,
            ));
        }
        state.buffers.retain(|_, slot| slot.device != device);
        state.devices.remove(&device);
        Ok(())
    }

    fn create_context(&self, device: DeviceId) -> Result<ContextId, DeviceError> {
        let mut state = self.state.borrow_mut();
        if !state.devices.contains_key(&device) {
            return Err(DeviceError::new("create_context", ErrorCode::InvalidDevice));
        }
        let id = ContextId(state.next_id());
        state.contexts.insert(id, device);
        Ok(id)
    }

    fn make_context_current(&self, context: Option<ContextId>) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        if let Some(context) = context {
            if !state.contexts.contains_key(&context) {
                return Err(DeviceError::new(
                    "make_context_current",
                    ErrorCode::InvalidContext,
                ));
            }
        }
        state.current = context;
        Ok(())
    }

    fn destroy_context(&self, context: ContextId) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        if state.contexts.remove(&context).is_none() {
            return Err(DeviceError::new("destroy_context", ErrorCode::InvalidContext));
        }
        state.sources.retain(|_, slot| slot.context != context);
        if state.current == Some(context) {
            state.current = None;
        }
        Ok(())
    }

    fn gen_buffer(&self, context: ContextId) -> Result<BufferId, DeviceError> {
        let mut state = self.state.borrow_mut();
        let device = state.current_device("gen_buffer", context)?;
        let id = BufferId(state.next_id());
        state.buffers.insert(
            id,
            BufferSlot {
                device,
                samples: None,
            },
        );
        Ok(id)
    }

    fn buffer_data(
        &self,
        context: ContextId,
        buffer: BufferId,
        format: SampleFormatTag,
        data: Vec<u8>,
        sample_rate: i32,
    ) -> Result<(), DeviceError> {
        const CALL: &str = "buffer_data";
        let mut state = self.state.borrow_mut();
        let device = state.current_device(CALL, context)?;

        let frame_size = format
            .frame_size()
            .ok_or_else(|| DeviceError::new(CALL, ErrorCode::InvalidValue))?;
        let sample_rate = u32::try_from(sample_rate)
            .ok()
            .filter(|rate| *rate > 0)
            .ok_or_else(|| DeviceError::new(CALL, ErrorCode::InvalidValue))?;
        if data.len() % frame_size != 0 {
            return Err(DeviceError::new(CALL, ErrorCode::InvalidValue));
        }
        if state
            .sources
            .values()
            .any(|slot| slot.buffer == Some(buffer))
        {
            return Err(DeviceError::new(CALL, ErrorCode::InvalidOperation));
        }

        let slot = state
            .buffers
            .get_mut(&buffer)
            .filter(|slot| slot.device == device)
            .ok_or_else(|| DeviceError::new(CALL, ErrorCode::InvalidName))?;

        let samples = pcm_to_f32(format, &data);
        drop(data);
        let channels = u16::from(format.channels());
        slot.samples = Some(SamplesBuffer::new(channels, sample_rate, samples).buffered());
        Ok(())
    }

    fn delete_buffer(&self, context: ContextId, buffer: BufferId) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        let device = state.current_device("delete_buffer", context)?;
        if state
            .sources
            .values()
            .any(|slot| slot.buffer == Some(buffer))
        {
            return Err(DeviceError::new(
                "delete_buffer",
                ErrorCode::InvalidOperation,
            ));
        }
        match state.buffers.get(&buffer) {
            Some(slot) if slot.device == device => {
                state.buffers.remove(&buffer);
                Ok(())
            }
            _ => Err(DeviceError::new("delete_buffer", ErrorCode::InvalidName)),
        }
    }

    fn gen_source(&self, context: ContextId) -> Result<SourceId, DeviceError> {
        let mut state = self.state.borrow_mut();
        let device = state.current_device("gen_source", context)?;
        let stream = state
            .devices
            .get(&device)
            .ok_or_else(|| DeviceError::new("gen_source", ErrorCode::InvalidDevice))?;

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        let id = SourceId(state.next_id());
        state.sources.insert(
            id,
            SourceSlot {
                context,
                sink,
                buffer: None,
                looping: false,
                started: false,
            },
        );
        Ok(id)
    }

    fn set_source_param(
        &self,
        context: ContextId,
        source: SourceId,
        param: SourceParam,
    ) -> Result<(), DeviceError> {
        const CALL: &str = "set_source_param";
        let mut state = self.state.borrow_mut();
        if let SourceParam::Buffer(buffer) = param {
            let has_samples = state
                .buffers
                .get(&buffer)
                .map(|slot| slot.samples.is_some());
            match has_samples {
                Some(true) => {}
                Some(false) => return Err(DeviceError::new(CALL, ErrorCode::InvalidOperation)),
                None => return Err(DeviceError::new(CALL, ErrorCode::InvalidName)),
            }
        }

        let slot = state.source_mut(CALL, context, source)?;
        match param {
            SourceParam::Pitch(pitch) if pitch > 0.0 => slot.sink.set_speed(pitch),
            SourceParam::Gain(gain) if gain >= 0.0 => slot.sink.set_volume(gain),
            // Sinks have no spatial placement; only the listener's origin is accepted.
            SourceParam::Position(position) | SourceParam::Velocity(position)
                if position == [0.0; 3] => {}
            SourceParam::Looping(looping) => slot.looping = looping,
            SourceParam::Buffer(buffer) => slot.buffer = Some(buffer),
            _ => return Err(DeviceError::new(CALL, ErrorCode::InvalidValue)),
        }
        Ok(())
    }

    fn play_source(&self, context: ContextId, source: SourceId) -> Result<(), DeviceError> {
        const CALL: &str = "play_source";
        let mut state = self.state.borrow_mut();
        let attached = state.source_mut(CALL, context, source)?.buffer;
        let samples = attached
            .and_then(|buffer| state.buffers.get(&buffer))
            .and_then(|slot| slot.samples.clone());

        let slot = state.source_mut(CALL, context, source)?;
        slot.sink.clear();
        match samples {
            Some(samples) if slot.looping => slot.sink.append(samples.repeat_infinite()),
            Some(samples) => slot.sink.append(samples),
            None => warn!("playing source {:?} with no buffer attached", source),
        }
        slot.sink.play();
        slot.started = true;
        debug!("source {:?} started", source);
        Ok(())
    }

    fn source_state(
        &self,
        context: ContextId,
        source: SourceId,
    ) -> Result<SourceState, DeviceError> {
        let mut state = self.state.borrow_mut();
        let slot = state.source_mut("source_state", context, source)?;
        let source_state = if !slot.started {
            SourceState::Initial
        } else if slot.sink.empty() {
            SourceState::Stopped
        } else if slot.sink.is_paused() {
            SourceState::Paused
        } else {
            SourceState::Playing
        };
        Ok(source_state)
    }

    fn delete_source(&self, context: ContextId, source: SourceId) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        state.source_mut("delete_source", context, source)?;
        if let Some(slot) = state.sources.remove(&source) {
            slot.sink.stop();
        }
        Ok(())
    }
}

/// Open the named (or default) output stream with bounded retry behavior.
fn open_output_stream_with_retry(name: Option<&str>) -> Result<OutputStream, DeviceError> {
    let mut attempt = 1;
    loop {
        match open_output_stream(name) {
            Ok(stream) => return Ok(stream),
            Err(err) if err.code == ErrorCode::NoDevice => return Err(err),
            Err(err) if attempt >= OUTPUT_STREAM_OPEN_RETRIES => return Err(err),
            Err(err) => {
                warn!(
                    "open output stream attempt {}/{} failed: {}",
                    attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                );
                attempt += 1;
                thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
            }
        }
    }
}

fn open_output_stream(name: Option<&str>) -> Result<OutputStream, DeviceError> {
    let backend_error = |err: rodio::StreamError| {
        DeviceError::new("open_device", ErrorCode::Backend(err.to_string()))
    };

    let Some(name) = name else {
        return OutputStreamBuilder::open_default_stream().map_err(backend_error);
    };

    let host = rodio::cpal::default_host();
    let device = host
        .output_devices()
        .map_err(|err| DeviceError::new("open_device", ErrorCode::Backend(err.to_string())))?
        .find(|device| device.name().map(|found| found == name).unwrap_or(false))
        .ok_or_else(|| DeviceError::new("open_device", ErrorCode::NoDevice))?;

    OutputStreamBuilder::from_device(device)
        .and_then(|builder| builder.open_stream_or_fallback())
        .map_err(backend_error)
}

/// Convert interleaved little-endian PCM to normalized `f32` samples.
///
/// 8-bit PCM is unsigned with 128 as silence, 16-bit PCM is signed.
fn pcm_to_f32(format: SampleFormatTag, data: &[u8]) -> Vec<f32> {
    match format.bits_per_sample() {
        8 => data
            .iter()
            .map(|sample| (f32::from(*sample) - 128.0) / 128.0)
            .collect(),
        16 => data
            .chunks_exact(2)
            .map(|bytes| f32::from(i16::from_le_bytes([bytes[0], bytes[1]])) / 32768.0)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_unsigned_8_bit() {
        let samples = pcm_to_f32(SampleFormatTag::Mono8, &[0, 128, 255]);
        assert_eq!(samples, vec![-1.0, 0.0, 0.9921875]);
    }

    #[test]
    fn converts_signed_16_bit_little_endian() {
        let data = [0x00, 0x80, 0x00, 0x00, 0xff, 0x7f, 0x00, 0x40];
        let samples = pcm_to_f32(SampleFormatTag::Stereo16, &data);
        assert_eq!(samples, vec![-1.0, 0.0, 0.999969482421875, 0.5]);
    }

    #[test]
    fn unopened_handles_are_rejected() {
        let backend = RodioBackend::new();

        let err = backend.create_context(DeviceId(7)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDevice);

        let err = backend.make_context_current(Some(ContextId(3))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidContext);

        let err = backend.gen_buffer(ContextId(3)).unwrap_err();
        assert_eq!(err.call, "gen_buffer");
        assert_eq!(err.code, ErrorCode::InvalidContext);

        assert!(backend.make_context_current(None).is_ok());
    }
}
