use std::fmt::{Display, Formatter};

/// Reason a structurally valid stream is still rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// `fmt ` chunk size other than the canonical 16 bytes.
    FmtChunkSize(u32),
    /// Audio format code other than 1 (integer PCM).
    FormatCode(u16),
    /// Channel count that does not fit the header's 8-bit field.
    ChannelCount(u16),
    /// Bit depth that does not fit the header's 8-bit field.
    BitDepth(u16),
    /// A RIFF chunk this reader does not skip over (`LIST`, `fact`, ...).
    Chunk([u8; 4]),
}

impl Display for Unsupported {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FmtChunkSize(size) => {
                write!(f, "fmt chunk size {} (only 16-byte PCM headers)", size)
            }
            Self::FormatCode(code) => write!(f, "audio format code {} (only 1 = PCM)", code),
            Self::ChannelCount(count) => write!(f, "{} channels", count),
            Self::BitDepth(bits) => write!(f, "{} bits per sample", bits),
            Self::Chunk(tag) => write!(f, "chunk \"{}\"", tag.escape_ascii()),
        }
    }
}

/// Error type for WAVE container parsing.
#[derive(Debug)]
pub enum ParseError {
    Io(std::io::Error),
    /// A tag or field did not hold what the canonical layout requires.
    MalformedHeader { expected: &'static str },
    UnsupportedFormat(Unsupported),
    /// The stream ended before `needed` bytes could be read.
    TruncatedFile { needed: u64, available: u64 },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::MalformedHeader { expected } => {
                write!(f, "malformed header: expected {}", expected)
            }
            Self::UnsupportedFormat(reason) => write!(f, "unsupported format: {}", reason),
            Self::TruncatedFile { needed, available } => write!(
                f,
                "truncated file: needed {} bytes, {} available",
                needed, available
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<Unsupported> for ParseError {
    fn from(value: Unsupported) -> Self {
        Self::UnsupportedFormat(value)
    }
}
