use std::fmt::{Display, Formatter};

use crate::playback::{DeviceError, PlaybackError};
use crate::wave::ParseError;

/// Any failure on the way from a WAVE file to the speakers.
#[derive(Debug)]
pub enum Error {
    /// Writing a WAVE stream failed.
    Io(std::io::Error),
    Parse(ParseError),
    Device(DeviceError),
    Playback(PlaybackError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Parse(err) => write!(f, "could not load wave: {}", err),
            Self::Device(err) => write!(f, "audio device error: {}", err),
            Self::Playback(err) => write!(f, "playback failed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Device(err) => Some(err),
            Self::Playback(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<DeviceError> for Error {
    fn from(value: DeviceError) -> Self {
        Self::Device(value)
    }
}

impl From<PlaybackError> for Error {
    fn from(value: PlaybackError) -> Self {
        match value {
            PlaybackError::Device(err) => Self::Device(err),
            other => Self::Playback(other),
        }
    }
}
