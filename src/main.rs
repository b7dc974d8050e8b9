use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use log::error;

use polms_ppm2png::{convert, ConvertOptions};

#[derive(Debug, Parser)]
#[command(version, about = "Converts a plain text P3 pixmap into a PNG image")]
struct Args {
    /// Text image to read
    source: PathBuf,

    /// PNG file to create
    dest: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    match convert(&args.source, &args.dest, &ConvertOptions::default()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("conversion failed: {:?}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
