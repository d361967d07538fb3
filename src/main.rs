mod rsa;

pub use crate::rsa::*;

use std::process::ExitCode;
use clap::Parser;
use log::LevelFilter;

fn main() -> ExitCode {
    let rsa = RSA::parse();
    env_logger::builder()
        .filter_level(if rsa.verbose { LevelFilter::Info } else { LevelFilter::Warn })
        .parse_default_env()
        .init();
    log::debug!("Run args: {:?}", rsa);
    match rsa.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
