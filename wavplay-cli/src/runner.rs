use std::time::Duration;

use clap::ArgMatches;
use log::{debug, info};
use wavplay_lib::playback::{
    self, AudioBackend, Context, Device, PlaybackError, PlaybackSettings, RodioBackend,
};
use wavplay_lib::wave::WaveSpec;
use wavplay_lib::Error;

use crate::cli::{
    probe,
    tone::{self, ToneSpec},
};

/// Dispatch the parsed command line. `Ok` carries the process exit code.
pub fn run(args: &ArgMatches) -> Result<i32, Error> {
    if let Some(("tone", tone_args)) = args.subcommand() {
        return run_tone(tone_args);
    }

    let backend = RodioBackend::new();
    if args.get_flag("list-devices") {
        return list_devices(&backend);
    }

    let Some(file_path) = args.get_one::<String>("INPUT") else {
        return Ok(64);
    };

    if args.get_flag("probe-only") {
        return probe::run_probe(file_path, args.get_flag("json"));
    }

    play_file(&backend, file_path, args)
}

/// Open the device, load `file_path` and play it to completion.
///
/// The device and context come up before the file is read so a missing
/// device is reported even for unreadable input.
fn play_file<B: AudioBackend>(
    backend: &B,
    file_path: &str,
    args: &ArgMatches,
) -> Result<i32, Error> {
    let device_name = args.get_one::<String>("device").map(String::as_str);
    let device = Device::open(backend, device_name)?;
    let context = Context::create(&device)?;
    debug!(
        "opened {} as {:?} (context {:?})",
        device_name.unwrap_or("default device"),
        device.id(),
        context.id()
    );

    let (header, payload) = wavplay_lib::wave::load(file_path)?;
    info!(
        "{}: {} channel(s), {} Hz, {} bit, {} bytes",
        file_path, header.channel_count, header.sample_rate, header.bits_per_sample, header.data_size
    );

    let mut settings = PlaybackSettings::for_header(&header);
    apply_overrides(&mut settings, args);
    playback::play(&header, payload, &context, &settings)?;

    Ok(0)
}

fn apply_overrides(settings: &mut PlaybackSettings, args: &ArgMatches) {
    if let Some(gain) = args.get_one::<f32>("GAIN") {
        settings.source.gain = *gain;
    }
    if let Some(poll_ms) = args.get_one::<u64>("poll-ms") {
        settings.poll_interval = Duration::from_millis(*poll_ms);
    }
    if let Some(timeout) = args.get_one::<Duration>("timeout") {
        settings.timeout = *timeout;
    }
}

fn list_devices<B: AudioBackend>(backend: &B) -> Result<i32, Error> {
    let devices = backend.output_devices()?;
    if devices.is_empty() {
        info!("no output devices found");
    }
    for name in devices {
        println!("{}", name);
    }
    Ok(0)
}

fn run_tone(args: &ArgMatches) -> Result<i32, Error> {
    let path = args
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("tone.wav");
    let bits = args
        .get_one::<String>("bits")
        .and_then(|bits| bits.parse().ok())
        .unwrap_or(16);

    let spec = ToneSpec {
        frequency: args.get_one::<f64>("frequency").copied().unwrap_or(440.0),
        seconds: args.get_one::<f64>("seconds").copied().unwrap_or(1.0),
        wave: WaveSpec {
            channel_count: args.get_one::<u8>("channels").copied().unwrap_or(2),
            sample_rate: args.get_one::<i32>("sample-rate").copied().unwrap_or(44_100),
            bits_per_sample: bits,
        },
    };
    tone::run_tone(path, &spec)
}

/// Process exit code for a failed run.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Device(_) => 1,
        Error::Parse(_) | Error::Io(_) => 2,
        Error::Playback(
            PlaybackError::UnsupportedFormat { .. } | PlaybackError::PartialFrame { .. },
        ) => 3,
        Error::Playback(PlaybackError::Timeout { .. }) => 4,
        Error::Playback(PlaybackError::Device(_)) => 1,
    }
}
