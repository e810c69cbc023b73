//! # wavplay
//!
//! Play a canonical PCM WAVE file on an output device and exit once it has
//! finished.

use log::{error, LevelFilter};

mod cli;
mod logging;
mod runner;

/// Exit code for malformed command lines.
const USAGE_EXIT_CODE: i32 = 64;

fn main() {
    dotenv::dotenv().ok();

    let args = match cli::args::build_cli().try_get_matches() {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    let level = if args.get_flag("quiet") {
        LevelFilter::Error
    } else if args.get_flag("debug") {
        LevelFilter::Debug
    } else {
        logging::level_from_env(LevelFilter::Info)
    };
    logging::init(level);

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            runner::exit_code(&err)
        }
    };

    std::process::exit(code)
}
