//! Playback of a parsed WAVE payload through an [`AudioBackend`].

mod backend;
#[cfg(test)]
mod fake;
mod handles;
mod rodio_backend;

use std::fmt::{Display, Formatter};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

pub use backend::{
    AudioBackend, BufferId, ContextId, DeviceError, DeviceId, ErrorCode, SourceConfig, SourceId,
    SourceParam, SourceState,
};
pub use handles::{Buffer, Context, Device, Source};
pub use rodio_backend::RodioBackend;

use crate::constants::{COMPLETION_GRACE, DEFAULT_TIMEOUT, POLL_INTERVAL};
use crate::format::SampleFormatTag;
use crate::wave::{AudioPayload, WaveHeader};

/// Error type for the playback driver.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The header's channel/bit-depth pair has no device sample format.
    UnsupportedFormat { channels: u8, bits: u8 },
    /// The payload does not end on a frame boundary.
    PartialFrame { data_size: usize, frame_size: usize },
    Device(DeviceError),
    /// The source was still playing when the completion wait gave up.
    Timeout { waited: Duration },
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat { channels, bits } => write!(
                f,
                "unrecognised wave format: {} channels, {} bits per sample",
                channels, bits
            ),
            Self::PartialFrame {
                data_size,
                frame_size,
            } => write!(
                f,
                "payload of {} bytes is not a whole number of {}-byte frames",
                data_size, frame_size
            ),
            Self::Device(err) => write!(f, "device error: {}", err),
            Self::Timeout { waited } => write!(
                f,
                "playback did not finish within {:.1}s",
                waited.as_secs_f64()
            ),
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for PlaybackError {
    fn from(value: DeviceError) -> Self {
        Self::Device(value)
    }
}

/// Tuning for a single [`play`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub source: SourceConfig,
    /// Sleep between source state queries.
    pub poll_interval: Duration,
    /// Upper bound on the completion wait.
    pub timeout: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            poll_interval: POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PlaybackSettings {
    /// Settings whose timeout covers the header's playback length plus a
    /// grace period.
    pub fn for_header(header: &WaveHeader) -> Self {
        Self {
            timeout: header.duration() + COMPLETION_GRACE,
            ..Self::default()
        }
    }
}

/// Upload `payload` to a new buffer on `context`, play it once through a
/// new source and block until the source stops.
///
/// The buffer and source are released before returning on every path,
/// including a failed upload and a timed-out wait.
///
/// # Errors
/// * [`PlaybackError::UnsupportedFormat`] before anything is uploaded when
///   the header does not map to a device sample format.
/// * [`PlaybackError::PartialFrame`] before anything is uploaded when the
///   payload ends part-way through a frame.
/// * [`PlaybackError::Device`] for any failed backend call.
/// * [`PlaybackError::Timeout`] when the source is still playing after
///   `settings.timeout`.
pub fn play<B: AudioBackend>(
    header: &WaveHeader,
    payload: AudioPayload,
    context: &Context<'_, B>,
    settings: &PlaybackSettings,
) -> Result<(), PlaybackError> {
    let format = SampleFormatTag::from_parts(header.channel_count, header.bits_per_sample);
    if let SampleFormatTag::Unsupported { channels, bits } = format {
        return Err(PlaybackError::UnsupportedFormat { channels, bits });
    }
    if let Some(frame_size) = format.frame_size() {
        if payload.len() % frame_size != 0 {
            return Err(PlaybackError::PartialFrame {
                data_size: payload.len(),
                frame_size,
            });
        }
    }

    let buffer = context.gen_buffer()?;
    let data_size = payload.len();
    buffer.upload(format, payload, header.sample_rate)?;
    debug!("uploaded {} bytes to buffer {:?}", data_size, buffer.id());

    let source = context.gen_source()?;
    source.configure(&settings.source)?;
    source.attach(&buffer)?;
    source.play()?;
    info!(
        "playing {:.2}s of {:?} audio at {} Hz",
        header.duration().as_secs_f64(),
        format,
        header.sample_rate
    );

    wait_until_stopped(&source, settings)
}

fn wait_until_stopped<B: AudioBackend>(
    source: &Source<'_, B>,
    settings: &PlaybackSettings,
) -> Result<(), PlaybackError> {
    let started = Instant::now();
    let mut polls = 0_u64;
    loop {
        polls += 1;
        if source.state()? != SourceState::Playing {
            debug!(
                "source {:?} stopped after {:?} ({} polls)",
                source.id(),
                started.elapsed(),
                polls
            );
            return Ok(());
        }

        let waited = started.elapsed();
        if waited >= settings.timeout {
            return Err(PlaybackError::Timeout { waited });
        }
        thread::sleep(settings.poll_interval.min(settings.timeout - waited));
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{Call, FakeBackend};
    use super::*;

    fn header(channel_count: u8, bits_per_sample: u8, data_size: usize) -> WaveHeader {
        WaveHeader {
            channel_count,
            sample_rate: 22_050,
            bits_per_sample,
            data_offset: 44,
            data_size,
        }
    }

    fn fast_settings() -> PlaybackSettings {
        PlaybackSettings {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            ..PlaybackSettings::default()
        }
    }

    fn payload(len: usize) -> AudioPayload {
        AudioPayload::from(vec![0_u8; len])
    }

    #[test]
    fn plays_uploads_and_releases_in_order() {
        let backend = FakeBackend::new(3);
        {
            let device = Device::open(&backend, None).unwrap();
            let context = Context::create(&device).unwrap();
            play(&header(2, 16, 64), payload(64), &context, &fast_settings()).unwrap();
        }

        let (buffer, source) = (BufferId(3), SourceId(4));
        assert_eq!(
            backend.calls(),
            vec![
                Call::OpenDevice,
                Call::CreateContext(DeviceId(1)),
                Call::MakeCurrent(Some(ContextId(2))),
                Call::GenBuffer,
                Call::BufferData {
                    buffer,
                    format: SampleFormatTag::Stereo16,
                    len: 64,
                    sample_rate: 22_050,
                },
                Call::GenSource,
                Call::SetParam(source, SourceParam::Pitch(1.0)),
                Call::SetParam(source, SourceParam::Gain(1.0)),
                Call::SetParam(source, SourceParam::Position([0.0; 3])),
                Call::SetParam(source, SourceParam::Velocity([0.0; 3])),
                Call::SetParam(source, SourceParam::Looping(false)),
                Call::SetParam(source, SourceParam::Buffer(buffer)),
                Call::Play(source),
                Call::State(source),
                Call::State(source),
                Call::State(source),
                Call::State(source),
                Call::DeleteSource(source),
                Call::DeleteBuffer(buffer),
                Call::MakeCurrent(None),
                Call::DestroyContext(ContextId(2)),
                Call::CloseDevice(DeviceId(1)),
            ]
        );
    }

    #[test]
    fn unsupported_format_never_reaches_the_device() {
        let backend = FakeBackend::new(0);
        let device = Device::open(&backend, None).unwrap();
        let context = Context::create(&device).unwrap();

        let result = play(&header(2, 24, 60), payload(60), &context, &fast_settings());

        assert_eq!(
            result,
            Err(PlaybackError::UnsupportedFormat {
                channels: 2,
                bits: 24
            })
        );
        assert!(!backend
            .calls()
            .iter()
            .any(|call| matches!(call, Call::GenBuffer | Call::BufferData { .. })));
    }

    #[test]
    fn partial_trailing_frame_is_rejected_before_upload() {
        let backend = FakeBackend::new(0);
        let device = Device::open(&backend, None).unwrap();
        let context = Context::create(&device).unwrap();

        let result = play(&header(2, 16, 7), payload(7), &context, &fast_settings());

        assert_eq!(
            result,
            Err(PlaybackError::PartialFrame {
                data_size: 7,
                frame_size: 4
            })
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a whole number of 4-byte frames"));
        assert!(!backend
            .calls()
            .iter()
            .any(|call| matches!(call, Call::GenBuffer | Call::BufferData { .. })));
    }

    #[test]
    fn timeout_still_releases_source_and_buffer() {
        let backend = FakeBackend::new(usize::MAX);
        let device = Device::open(&backend, None).unwrap();
        let context = Context::create(&device).unwrap();
        let settings = PlaybackSettings {
            timeout: Duration::from_millis(20),
            ..fast_settings()
        };

        let result = play(&header(1, 8, 16), payload(16), &context, &settings);

        match result {
            Err(PlaybackError::Timeout { waited }) => assert!(waited >= settings.timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
        let calls = backend.calls();
        let tail = &calls[calls.len() - 2..];
        assert_eq!(
            tail,
            &[Call::DeleteSource(SourceId(4)), Call::DeleteBuffer(BufferId(3))]
        );
    }

    #[test]
    fn failed_upload_releases_buffer() {
        let backend = FakeBackend::failing("buffer_data");
        let device = Device::open(&backend, None).unwrap();
        let context = Context::create(&device).unwrap();

        let result = play(&header(1, 16, 8), payload(8), &context, &fast_settings());

        match result {
            Err(PlaybackError::Device(err)) => {
                assert_eq!(err.call, "buffer_data");
                assert_eq!(err.code, ErrorCode::InvalidOperation);
            }
            other => panic!("expected device error, got {:?}", other),
        }
        let calls = backend.calls();
        assert_eq!(calls.last(), Some(&Call::DeleteBuffer(BufferId(3))));
        assert!(!calls.iter().any(|call| matches!(call, Call::GenSource)));
    }

    #[test]
    fn failed_state_query_still_tears_down() {
        let backend = FakeBackend::failing("source_state");
        let device = Device::open(&backend, None).unwrap();
        let context = Context::create(&device).unwrap();

        let result = play(&header(2, 8, 8), payload(8), &context, &fast_settings());

        assert!(matches!(result, Err(PlaybackError::Device(_))));
        let calls = backend.calls();
        assert!(calls.contains(&Call::DeleteSource(SourceId(4))));
        assert!(calls.contains(&Call::DeleteBuffer(BufferId(3))));
    }

    #[test]
    fn context_that_cannot_be_made_current_is_destroyed() {
        let backend = FakeBackend::failing("make_context_current");
        {
            let device = Device::open(&backend, None).unwrap();
            let result = Context::create(&device);
            assert!(result.is_err());
        }

        assert_eq!(
            backend.calls(),
            vec![
                Call::OpenDevice,
                Call::CreateContext(DeviceId(1)),
                Call::MakeCurrent(Some(ContextId(2))),
                Call::DestroyContext(ContextId(2)),
                Call::CloseDevice(DeviceId(1)),
            ]
        );
    }

    #[test]
    fn timeout_scales_with_payload_duration() {
        let settings = PlaybackSettings::for_header(&header(1, 16, 44_100));

        assert_eq!(settings.timeout, Duration::from_secs(1) + COMPLETION_GRACE);
        assert_eq!(settings.source, SourceConfig::default());
        assert_eq!(settings.poll_interval, POLL_INTERVAL);
    }
}
