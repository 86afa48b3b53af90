//! `hdzc` — the Hadzik compiler's command-line entry point.

use hadzik::cli::Cli;
use hadzik::driver;
use log::LevelFilter;

fn main() {
    let cli = Cli::init();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    simple_logger::SimpleLogger::new().with_level(level).init().unwrap();

    std::process::exit(driver::run(&cli));
}
