//! Mapping from WAVE header fields to the sample layouts an audio device
//! accepts.

use serde::Serialize;

/// Device-native sample layout for an uploaded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SampleFormatTag {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
    Unsupported { channels: u8, bits: u8 },
}

impl SampleFormatTag {
    /// Select the layout for a channel count and bit depth.
    ///
    /// Total over every input: pairs other than mono/stereo at 8 or 16 bits
    /// map to [`SampleFormatTag::Unsupported`].
    pub fn from_parts(channels: u8, bits: u8) -> Self {
        match (channels, bits) {
            (1, 8) => Self::Mono8,
            (1, 16) => Self::Mono16,
            (2, 8) => Self::Stereo8,
            (2, 16) => Self::Stereo16,
            (channels, bits) => Self::Unsupported { channels, bits },
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }

    pub fn channels(&self) -> u8 {
        match self {
            Self::Mono8 | Self::Mono16 => 1,
            Self::Stereo8 | Self::Stereo16 => 2,
            Self::Unsupported { channels, .. } => *channels,
        }
    }

    pub fn bits_per_sample(&self) -> u8 {
        match self {
            Self::Mono8 | Self::Stereo8 => 8,
            Self::Mono16 | Self::Stereo16 => 16,
            Self::Unsupported { bits, .. } => *bits,
        }
    }

    /// Bytes in one frame, or `None` for unsupported layouts.
    pub fn frame_size(&self) -> Option<usize> {
        if !self.is_supported() {
            return None;
        }
        Some(usize::from(self.channels()) * usize::from(self.bits_per_sample() / 8))
    }
}
