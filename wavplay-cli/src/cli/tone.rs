//! `tone` subcommand: synthesize a sine wave into a canonical WAVE file.

use std::f64::consts::TAU;
use std::fs::File;
use std::io::BufWriter;

use log::info;
use wavplay_lib::wave::{self, WaveSpec};

/// Parameters for a generated tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency: f64,
    pub seconds: f64,
    pub wave: WaveSpec,
}

/// Interleaved PCM bytes for a sine at 80% of full scale.
///
/// 8-bit samples are unsigned with a 128 midpoint; 16-bit samples are
/// signed little-endian. Every channel carries the same signal.
pub fn synthesize(tone: &ToneSpec) -> Vec<u8> {
    let rate = f64::from(tone.wave.sample_rate.max(1));
    let frames = (tone.seconds.max(0.0) * rate).round() as usize;
    let channels = usize::from(tone.wave.channel_count);
    let bytes_per_sample = usize::from(tone.wave.bits_per_sample).div_ceil(8);
    let mut pcm = Vec::with_capacity(frames * channels * bytes_per_sample);

    for frame in 0..frames {
        let value = 0.8 * (TAU * tone.frequency * frame as f64 / rate).sin();
        for _ in 0..channels {
            if tone.wave.bits_per_sample == 8 {
                pcm.push((128.0 + value * 127.0).round() as u8);
            } else {
                let sample = (value * f64::from(i16::MAX)).round() as i16;
                pcm.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }

    pcm
}

/// Write the tone to `path`.
pub fn run_tone(path: &str, tone: &ToneSpec) -> Result<i32, wavplay_lib::Error> {
    let pcm = synthesize(tone);
    let mut writer = BufWriter::new(File::create(path)?);
    wave::write(&mut writer, &tone.wave, &pcm)?;
    writer.into_inner().map_err(|err| err.into_error())?;

    info!(
        "wrote {:.2}s {} Hz tone to {} ({} bytes of PCM)",
        tone.seconds,
        tone.frequency,
        path,
        pcm.len()
    );
    Ok(0)
}
