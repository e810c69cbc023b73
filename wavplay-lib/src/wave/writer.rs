use std::io::{self, Write};

use super::{WaveSpec, DATA_TAG, FMT_TAG, PCM_FMT_CHUNK_SIZE, PCM_FORMAT_CODE, RIFF_TAG, WAVE_TAG};

/// Size of the canonical header written ahead of the payload.
pub const CANONICAL_HEADER_LEN: usize = 44;

/// Write `payload` as a canonical PCM WAVE stream.
///
/// The header always uses the 16-byte `fmt ` layout immediately followed by
/// the `data` chunk, which is the only layout the parser accepts. Odd-length
/// payloads are followed by the RIFF pad byte.
///
/// # Errors
/// Returns `InvalidInput` if the payload cannot be described by the 32-bit
/// RIFF size fields, otherwise any error from the underlying writer.
pub fn write<W: Write>(writer: &mut W, spec: &WaveSpec, payload: &[u8]) -> io::Result<()> {
    let pad = payload.len() % 2;
    let data_size = u32::try_from(payload.len())
        .ok()
        .filter(|size| size.checked_add((CANONICAL_HEADER_LEN - 8 + pad) as u32).is_some())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "payload exceeds the 32-bit RIFF size limit",
            )
        })?;
    let riff_size = data_size + (CANONICAL_HEADER_LEN - 8 + pad) as u32;

    let channels = u16::from(spec.channel_count);
    let bits = u16::from(spec.bits_per_sample);
    let block_align = channels * bits.div_ceil(8);
    let byte_rate = u32::from(block_align).wrapping_mul(spec.sample_rate as u32);

    writer.write_all(&RIFF_TAG)?;
    writer.write_all(&riff_size.to_le_bytes())?;
    writer.write_all(&WAVE_TAG)?;

    writer.write_all(&FMT_TAG)?;
    writer.write_all(&PCM_FMT_CHUNK_SIZE.to_le_bytes())?;
    writer.write_all(&PCM_FORMAT_CODE.to_le_bytes())?;
    writer.write_all(&channels.to_le_bytes())?;
    writer.write_all(&spec.sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&bits.to_le_bytes())?;

    writer.write_all(&DATA_TAG)?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(payload)?;
    if pad == 1 {
        writer.write_all(&[0])?;
    }
    Ok(())
}

/// Encode `payload` into an in-memory canonical PCM WAVE stream.
pub fn encode(spec: &WaveSpec, payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(CANONICAL_HEADER_LEN + payload.len() + 1);
    write(&mut bytes, spec, payload)?;
    Ok(bytes)
}
