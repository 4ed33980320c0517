use clap::Parser;
use log::LevelFilter;
use snafu::ErrorCompat;

mod args;
mod count;

use crate::args::Args;

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::builder().filter_level(LevelFilter::Debug).init();
    } else {
        env_logger::init();
    }

    if let Err(e) = count::run_count(&args) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
