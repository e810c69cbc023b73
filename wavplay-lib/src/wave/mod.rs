//! Canonical PCM WAVE (RIFF) container reading and writing.
//!
//! Only the 44-byte canonical layout is understood:
//!
//! ```text
//! "RIFF" size "WAVE" "fmt " 16 1 channels rate byte_rate block_align bits "data" size <payload>
//! ```
//!
//! All multi-byte integers are little-endian.

mod error;
mod header;
mod reader;
mod writer;

pub use error::{ParseError, Unsupported};
pub use header::{AudioPayload, WaveHeader, WaveSpec};
pub use reader::{load, parse, parse_bytes};
pub use writer::{encode, write, CANONICAL_HEADER_LEN};

const RIFF_TAG: [u8; 4] = *b"RIFF";
const WAVE_TAG: [u8; 4] = *b"WAVE";
const FMT_TAG: [u8; 4] = *b"fmt ";
const DATA_TAG: [u8; 4] = *b"data";

const PCM_FMT_CHUNK_SIZE: u32 = 16;
const PCM_FORMAT_CODE: u16 = 1;
