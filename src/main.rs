mod app;
mod config;
mod geom;
mod input;
mod model;
mod render;
mod sim;
mod spawn;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // Initialize logging before the terminal enters raw mode; opt in with
    // RUST_LOG and redirect stderr to a file to keep the screen clean.
    env_logger::init();
    let args = app::Args::parse();
    app::run(args)
}
