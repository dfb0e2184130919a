//! The main entry point to the program.
use anyhow::Result;
use human_panic::setup_panic;
use surgecast::cli::run_cli;

fn main() -> Result<()> {
    // Friendlier messages for the end user if the program panics
    setup_panic!();

    run_cli()
}
