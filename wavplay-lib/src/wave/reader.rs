use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, warn};

use super::{
    AudioPayload, ParseError, Unsupported, WaveHeader, DATA_TAG, FMT_TAG, PCM_FMT_CHUNK_SIZE,
    PCM_FORMAT_CODE, RIFF_TAG, WAVE_TAG,
};

/// RIFF chunk ids that may legitimately appear in a WAVE file but that this
/// reader does not skip over.
const UNIMPLEMENTED_CHUNKS: [[u8; 4]; 18] = [
    *b"LIST", *b"fact", *b"JUNK", *b"PAD ", *b"bext", *b"cue ", *b"smpl", *b"inst", *b"id3 ",
    *b"iXML", *b"PEAK", *b"acid", *b"plst", *b"labl", *b"note", *b"ltxt", *b"wavl", *b"slnt",
];

/// Read and parse a WAVE file from disk.
pub fn load(path: impl AsRef<Path>) -> Result<(WaveHeader, AudioPayload), ParseError> {
    let path = path.as_ref();
    debug!("loading wave file {}", path.display());
    let file = File::open(path)?;
    parse(&mut BufReader::new(file))
}

/// Parse an in-memory WAVE stream.
pub fn parse_bytes(bytes: &[u8]) -> Result<(WaveHeader, AudioPayload), ParseError> {
    parse(&mut Cursor::new(bytes))
}

/// Parse a canonical PCM WAVE stream starting at the reader's current
/// position.
///
/// Every tag and size field is checked in stream order and the first
/// failure aborts the parse; a header is never returned without its full
/// payload.
///
/// # Errors
/// * [`ParseError::MalformedHeader`] when a tag or field does not match the
///   canonical layout.
/// * [`ParseError::UnsupportedFormat`] for non-PCM or extended headers and
///   for chunks this reader does not implement.
/// * [`ParseError::TruncatedFile`] when the stream is shorter than its
///   header claims.
pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<(WaveHeader, AudioPayload), ParseError> {
    let mut stream = ChunkReader::new(reader)?;

    stream.expect_tag(RIFF_TAG, "\"RIFF\"")?;
    let riff_size = stream.read_u32()?;
    let declared_len = u64::from(riff_size) + 8;
    if declared_len > stream.len {
        return Err(ParseError::TruncatedFile {
            needed: declared_len,
            available: stream.len,
        });
    }
    stream.expect_tag(WAVE_TAG, "\"WAVE\"")?;

    stream.expect_chunk(FMT_TAG, "\"fmt \"")?;
    let fmt_size = stream.read_u32()?;
    if fmt_size != PCM_FMT_CHUNK_SIZE {
        return Err(Unsupported::FmtChunkSize(fmt_size).into());
    }

    let format_code = stream.read_u16()?;
    if format_code != PCM_FORMAT_CODE {
        return Err(Unsupported::FormatCode(format_code).into());
    }

    let channels = stream.read_u16()?;
    if channels == 0 {
        return Err(ParseError::MalformedHeader {
            expected: "a non-zero channel count",
        });
    }
    let channel_count =
        u8::try_from(channels).map_err(|_| Unsupported::ChannelCount(channels))?;

    let sample_rate = stream.read_i32()?;
    if sample_rate <= 0 {
        return Err(ParseError::MalformedHeader {
            expected: "a positive sample rate",
        });
    }

    let byte_rate = stream.read_u32()?;
    let block_align = stream.read_u16()?;

    let bits = stream.read_u16()?;
    let bits_per_sample = u8::try_from(bits).map_err(|_| Unsupported::BitDepth(bits))?;

    stream.expect_chunk(DATA_TAG, "\"data\"")?;
    let data_size = stream.read_u32()?;
    let data_offset = stream.position;

    let available = stream.remaining();
    if u64::from(data_size) > available {
        return Err(ParseError::TruncatedFile {
            needed: data_offset + u64::from(data_size),
            available: stream.len,
        });
    }
    if data_offset + u64::from(data_size) > declared_len {
        warn!(
            "data chunk ends at byte {} but the RIFF chunk declares {} bytes",
            data_offset + u64::from(data_size),
            declared_len
        );
    }

    let header = WaveHeader {
        channel_count,
        sample_rate,
        bits_per_sample,
        data_offset: data_offset as usize,
        data_size: data_size as usize,
    };
    check_derived_fields(&header, byte_rate, block_align);

    let payload = stream.read_vec(header.data_size)?;
    debug!(
        "parsed wave header: {} ch, {} Hz, {} bits, {} payload bytes at offset {}",
        header.channel_count,
        header.sample_rate,
        header.bits_per_sample,
        header.data_size,
        header.data_offset
    );

    Ok((header, AudioPayload::new(payload)))
}

/// Byte rate and block alignment are redundant with the other fmt fields;
/// writers in the wild get them wrong often enough that a mismatch is only
/// reported.
fn check_derived_fields(header: &WaveHeader, byte_rate: u32, block_align: u16) {
    if usize::from(block_align) != header.block_align() {
        warn!(
            "fmt block align is {} but {} channels at {} bits need {}",
            block_align,
            header.channel_count,
            header.bits_per_sample,
            header.block_align()
        );
    }
    if u64::from(byte_rate) != header.byte_rate() {
        warn!(
            "fmt byte rate is {} but the stream parameters imply {}",
            byte_rate,
            header.byte_rate()
        );
    }
    let frame_size = header.block_align();
    if frame_size != 0 && header.data_size % frame_size != 0 {
        warn!(
            "data chunk holds {} bytes, not a whole number of {}-byte frames",
            header.data_size, frame_size
        );
    }
}

/// Sequential little-endian reader that tracks its offset from the start of
/// the WAVE stream and the total bytes available.
struct ChunkReader<'a, R> {
    reader: &'a mut R,
    position: u64,
    len: u64,
}

impl<'a, R: Read + Seek> ChunkReader<'a, R> {
    fn new(reader: &'a mut R) -> Result<Self, ParseError> {
        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;
        Ok(Self {
            reader,
            position: 0,
            len: end.saturating_sub(start),
        })
    }

    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        let needed = self.position + buf.len() as u64;
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.position = needed;
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(ParseError::TruncatedFile {
                needed,
                available: self.len,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut buf = [0_u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_array().map(u16::from_le_bytes)
    }

    fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Result<i32, ParseError> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        let mut buf = vec![0_u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn expect_tag(&mut self, tag: [u8; 4], expected: &'static str) -> Result<(), ParseError> {
        if self.read_array::<4>()? != tag {
            return Err(ParseError::MalformedHeader { expected });
        }
        Ok(())
    }

    /// Like [`Self::expect_tag`], but a recognised RIFF chunk in place of
    /// the expected one is reported as unsupported rather than malformed.
    fn expect_chunk(&mut self, tag: [u8; 4], expected: &'static str) -> Result<(), ParseError> {
        let found = self.read_array::<4>()?;
        if found == tag {
            return Ok(());
        }
        if UNIMPLEMENTED_CHUNKS.contains(&found) {
            return Err(Unsupported::Chunk(found).into());
        }
        Err(ParseError::MalformedHeader { expected })
    }
}
