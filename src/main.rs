//! Entry point for the batch driver. Parses the command line, installs
//! logging, and delegates all real work to [`order_stat_btree::driver`].

use std::process::ExitCode;

use clap::Parser;
use order_stat_btree::driver::{self, Cli};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match driver::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
