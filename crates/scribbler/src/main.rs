//! scribbler - text operations from plugin modules
//!
//! A thin host over the plugin subsystem: lists the operations found in the
//! operations directory, toggles them, and runs them on files or stdin.

use clap::Parser;

mod commands;
mod host;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
