use std::path::PathBuf;

use clap::Parser;

/// Watches the fishing bobber and reels in whenever it dips.
#[derive(Debug, Parser)]
#[command(name = "autofisher", version)]
pub struct Args {
    /// Where chosen settings are remembered between runs.
    #[arg(long, default_value = "autofisher-settings.json")]
    pub settings: PathBuf,
    /// Game folder holding options.txt. Skips the folder prompt.
    #[arg(long)]
    pub game_dir: Option<PathBuf>,
    /// Milliseconds between bobber checks (200-850). Skips the prompt.
    #[arg(long)]
    pub interval: Option<u64>,
    /// Never terminate the game when the bobber looks out of position.
    #[arg(long)]
    pub no_safety_net: bool,
    /// Capture the primary monitor instead of the game window.
    #[arg(long)]
    pub monitor: bool,
    /// Accept every default without prompting.
    #[arg(long, short = 'y')]
    pub yes: bool,
    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}
