use std::time::Duration;

use serde::Serialize;

/// Header fields of a canonical PCM WAVE stream.
///
/// Only produced by the parser once every mandatory chunk tag has been
/// verified; `data_size` always equals the length of the payload returned
/// alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaveHeader {
    pub channel_count: u8,
    pub sample_rate: i32,
    pub bits_per_sample: u8,
    /// Offset of the first payload byte from the start of the stream.
    pub data_offset: usize,
    /// Payload length in bytes, excluding the header.
    pub data_size: usize,
}

impl WaveHeader {
    /// Bytes per sample frame (one sample for every channel).
    pub fn block_align(&self) -> usize {
        usize::from(self.channel_count) * usize::from(self.bits_per_sample).div_ceil(8)
    }

    pub fn byte_rate(&self) -> u64 {
        self.block_align() as u64 * self.sample_rate.max(0) as u64
    }

    /// Number of complete sample frames in the payload.
    pub fn frame_count(&self) -> usize {
        match self.block_align() {
            0 => 0,
            align => self.data_size / align,
        }
    }

    /// Playback length of the payload at the header's sample rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate <= 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }
}

/// Raw interleaved little-endian PCM bytes exactly `data_size` long.
///
/// Owned by whoever loaded the file; the upload consumes it so no copy of
/// the samples outlives the hand-off to the audio device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload(Vec<u8>);

impl AudioPayload {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for AudioPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Stream parameters used when writing a WAVE file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveSpec {
    pub channel_count: u8,
    pub sample_rate: i32,
    pub bits_per_sample: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(channel_count: u8, bits_per_sample: u8, data_size: usize) -> WaveHeader {
        WaveHeader {
            channel_count,
            sample_rate: 8_000,
            bits_per_sample,
            data_offset: 44,
            data_size,
        }
    }

    #[test]
    fn derives_frame_layout() {
        let stereo16 = header(2, 16, 32_000);
        assert_eq!(stereo16.block_align(), 4);
        assert_eq!(stereo16.byte_rate(), 32_000);
        assert_eq!(stereo16.frame_count(), 8_000);
        assert_eq!(stereo16.duration(), Duration::from_secs(1));

        let mono8 = header(1, 8, 4_000);
        assert_eq!(mono8.block_align(), 1);
        assert_eq!(mono8.duration(), Duration::from_millis(500));
    }

    #[test]
    fn odd_bit_depths_round_up_to_whole_bytes() {
        assert_eq!(header(1, 12, 0).block_align(), 2);
        assert_eq!(header(2, 24, 0).block_align(), 6);
    }

    #[test]
    fn partial_trailing_frame_is_not_counted() {
        assert_eq!(header(2, 16, 7).frame_count(), 1);
    }

    #[test]
    fn serializes_field_names() {
        let json = serde_json::to_value(header(1, 8, 10)).unwrap();

        assert_eq!(json["channel_count"], 1);
        assert_eq!(json["sample_rate"], 8_000);
        assert_eq!(json["bits_per_sample"], 8);
        assert_eq!(json["data_offset"], 44);
        assert_eq!(json["data_size"], 10);
    }
}
