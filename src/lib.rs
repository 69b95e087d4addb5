pub mod cli;
mod console;
pub mod detection;
pub mod game_options;
pub mod host;
pub mod settings;
mod utils;

use clap::Parser;

use cli::Args;

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (RUST_LOG still wins over the default level)
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("AutoFisher starting up...");

    console::run_session(args).await
}
