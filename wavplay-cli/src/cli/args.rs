//! CLI argument definitions for `wavplay`.

use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    // Build the CLI definition in one place to keep main.rs slim.
    Command::new("wavplay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play canonical PCM WAVE files")
        .arg_required_else_help(true)
        .subcommand_negates_reqs(true)
        .arg(
            Arg::new("device")
                .long("device")
                .short('D')
                .value_name("NAME")
                .env("WAVPLAY_DEVICE")
                .help("Output device name (see --list-devices); defaults to the system device"),
        )
        .arg(
            Arg::new("list-devices")
                .long("list-devices")
                .short('l')
                .action(ArgAction::SetTrue)
                .conflicts_with("probe-only")
                .help("Print the available output devices and exit"),
        )
        .arg(
            Arg::new("probe-only")
                .long("probe-only")
                .action(ArgAction::SetTrue)
                .help("Only parse the input and print its header, do not play it"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .requires("probe-only")
                .help("Print the probed header as JSON"),
        )
        .arg(
            Arg::new("GAIN")
                .long("gain")
                .short('g')
                .value_name("GAIN")
                .value_parser(value_parser!(f32))
                .default_value("1.0")
                .help("The playback gain (1.0 = full volume)"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .env("WAVPLAY_TIMEOUT_SECS")
                .value_parser(parse_seconds)
                .help("Give up waiting for playback to finish after this many seconds"),
        )
        .arg(
            Arg::new("poll-ms")
                .long("poll-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10")
                .help("Interval between playback state checks"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .conflicts_with("debug")
                .help("Only log errors"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Show debug output"),
        )
        .arg(
            Arg::new("INPUT")
                .help("The WAVE file to play")
                .required_unless_present("list-devices")
                .index(1),
        )
        .subcommand(
            Command::new("tone")
                .about("Write a sine tone as a canonical PCM WAVE file")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("PATH")
                        .required(true)
                        .help("Destination file"),
                )
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .short('f')
                        .value_name("HZ")
                        .value_parser(value_parser!(f64))
                        .default_value("440"),
                )
                .arg(
                    Arg::new("seconds")
                        .long("seconds")
                        .short('s')
                        .value_name("SECONDS")
                        .value_parser(value_parser!(f64))
                        .default_value("1.0"),
                )
                .arg(
                    Arg::new("sample-rate")
                        .long("sample-rate")
                        .short('r')
                        .value_name("HZ")
                        .value_parser(value_parser!(i32).range(1..))
                        .default_value("44100"),
                )
                .arg(
                    Arg::new("channels")
                        .long("channels")
                        .short('c')
                        .value_parser(value_parser!(u8).range(1..=2))
                        .default_value("2"),
                )
                .arg(
                    Arg::new("bits")
                        .long("bits")
                        .short('b')
                        .value_parser(["8", "16"])
                        .default_value("16"),
                ),
        )
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number of seconds", value))?;
    Duration::try_from_secs_f64(seconds).map_err(|err| err.to_string())
}
