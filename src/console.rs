use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::cli::Args;
use crate::detection::config::{MAX_SCAN_INTERVAL_MS, MIN_SCAN_INTERVAL_MS};
use crate::detection::{DetectionLoop, DetectorConfig, DetectorError, StopReason};
use crate::game_options::GameOptions;
use crate::host::{CaptureTarget, Host, ProcessControl, SystemProcesses};
use crate::settings::{SettingsStore, UserSettings};

const COUNTDOWN_SECS: u64 = 5;
const REEL_OUT_AT_SECS: u64 = 2;

const INSTRUCTIONS: &str = "\
Ready to start AutoFisher? A few things to keep in mind.
\t1. Once started, do not use the mouse or keyboard. Background tasks are fine as long as they don't move or cover the game window.
\t2. Keep the game visible at all times. Once calibrated, do NOT move the game window.
\t3. Press Ctrl-C in this console to stop AutoFisher.
\t4. Keep this console next to the game window so you can read its output.
\t5. If you plan on being away for a long time, build a glass box around yourself, big enough to fish in a 5 x 4 x 5 space.
\t6. Scanning uses a fair amount of CPU.
\t7. If you play on a server, you are responsible for anything that happens to your account.
\t8. You will be told when to reel out your fishing rod. After that, do NOT touch your mouse.
When you are ready, press [Enter]. You will then have 5 seconds to prepare your rod.";

/// Line-based prompts on stdin. With `assume_yes` every question takes its
/// default without reading.
struct Prompter {
    lines: Lines<BufReader<Stdin>>,
    assume_yes: bool,
}

impl Prompter {
    fn new(assume_yes: bool) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            assume_yes,
        }
    }

    /// Prints the question and returns the trimmed answer, or `None` for an
    /// empty line.
    async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        println!("{question}");
        if self.assume_yes {
            return Ok(None);
        }
        std::io::stdout().flush().context("Failed to flush stdout")?;
        let line = self
            .lines
            .next_line()
            .await
            .context("Failed to read from stdin")?;
        Ok(line
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty()))
    }

    async fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[y]/n" } else { "y/[n]" };
        let answer = self.ask(&format!("{question} {hint}")).await?;
        Ok(parse_yes_no(answer.as_deref(), default))
    }
}

/// The interactive session: gather settings, calibrate, fish until the loop
/// stops or Ctrl-C.
pub async fn run_session(args: Args) -> Result<()> {
    let store = SettingsStore::new(args.settings.clone())?;
    let saved = store.settings();
    let mut config = saved.detector.clone();
    let mut prompter = Prompter::new(args.yes);

    let game_dir = match args.game_dir.clone() {
        Some(dir) => dir,
        None => {
            let fallback = saved.game_dir.clone().unwrap_or_else(default_game_dir);
            let answer = prompter
                .ask(&format!(
                    "What game folder do you want to use? [{}]",
                    fallback.display()
                ))
                .await?;
            answer.map(PathBuf::from).unwrap_or(fallback)
        }
    };

    let mut options = GameOptions::load(&game_dir)?;
    let gui_scale = options.gui_scale()?;
    let needs_full_bright = options.needs_full_bright()?;
    if gui_scale > 0 {
        config.exclusion_band = DetectorConfig::exclusion_band_for_gui_scale(gui_scale);
    }

    let target = if args.monitor {
        CaptureTarget::PrimaryMonitor
    } else {
        discover_host(&SystemProcesses::new(), &config.safety_net.host_process)?
    };

    if needs_full_bright {
        let question = format!(
            "Your \"gamma\" property is set to {}. For best results the game should be at full \
             brightness no matter how dark it is. Change it for you?",
            options.gamma()?
        );
        if prompter.confirm(&question, true).await? {
            options.set_full_bright();
            options.save()?;
            info!("Changed \"gamma\" successfully. You can change it back from the game's video settings.");
        }
    }

    config.scan_interval_ms = match args.interval {
        Some(interval) => interval,
        None => {
            let answer = prompter
                .ask(&format!(
                    "What should the delay between bobber checks be? Minimum is {MIN_SCAN_INTERVAL_MS} ms \
                     and maximum is {MAX_SCAN_INTERVAL_MS} ms. [{}]",
                    config.scan_interval_ms
                ))
                .await?;
            parse_interval(answer.as_deref(), config.scan_interval_ms)
        }
    };

    config.safety_net.enabled = if args.no_safety_net {
        false
    } else {
        prompter
            .confirm(
                "Do you want to automatically close the game when you are out of position for too long?",
                config.safety_net.enabled,
            )
            .await?
    };

    let config = config.sanitized();
    store.update(UserSettings {
        game_dir: Some(game_dir),
        detector: config.clone(),
    })?;

    prompter.ask(INSTRUCTIONS).await?;
    countdown().await;

    let host = Host::system(target)?;
    let mut detector = DetectionLoop::new(config, host);
    if !detector.calibrate().await? {
        bail!("Failed to calibrate. Are you sure you reeled your rod out?");
    }
    detector.start()?;

    let finished = tokio::select! {
        result = detector.wait() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(result) => result,
        None => {
            info!("Stopping AutoFisher...");
            detector.stop().await;
            detector.wait().await
        }
    };

    print_summary(&detector);
    match outcome {
        Ok(StopReason::Requested) => Ok(()),
        Ok(StopReason::Thrashing) => {
            warn!("The bobber was out of position; re-cast and calibrate again.");
            Ok(())
        }
        Err(err) => Err(report_failure(err)),
    }
}

/// Requires exactly one running game process and captures its window.
fn discover_host(processes: &dyn ProcessControl, name: &str) -> Result<CaptureTarget> {
    let found = processes.find_processes(name);
    match found.as_slice() {
        [] => bail!("No game processes named '{name}' are running right now. Open the game and try again."),
        [only] => {
            info!("Found the game: {} (pid {}).", only.name, only.pid);
            Ok(CaptureTarget::Process { pid: only.pid })
        }
        _ => bail!(
            "You have {} game processes open. Please close all but one.",
            found.len()
        ),
    }
}

async fn countdown() {
    for remaining in (0..=COUNTDOWN_SECS).rev() {
        println!("You have {remaining} seconds remaining.");
        if remaining == REEL_OUT_AT_SECS {
            println!("\tReel your fishing rod out now.");
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn print_summary(detector: &DetectionLoop) {
    let snapshot = detector.snapshot();
    println!("Caught {} fish.", snapshot.catches);
    if let Some(average) = snapshot.average_secs {
        println!("Average time per fish: {average:.1} seconds.");
    }
}

fn report_failure(err: DetectorError) -> anyhow::Error {
    error!("AutoFisher ended unexpectedly: {err}");
    anyhow::Error::new(err).context("detection loop failed")
}

/// An answer outside the accepted range keeps the current value.
fn parse_interval(answer: Option<&str>, current: u64) -> u64 {
    answer
        .and_then(|answer| answer.parse::<u64>().ok())
        .filter(|interval| (MIN_SCAN_INTERVAL_MS..=MAX_SCAN_INTERVAL_MS).contains(interval))
        .unwrap_or(current)
}

/// Only an explicit "n"/"no" (or "y"/"yes") overrides the default.
fn parse_yes_no(answer: Option<&str>, default: bool) -> bool {
    match answer.map(str::to_lowercase).as_deref() {
        Some("n") | Some("no") => false,
        Some("y") | Some("yes") => true,
        _ => default,
    }
}

fn default_game_dir() -> PathBuf {
    let home = |var: &str| std::env::var_os(var).map(PathBuf::from);
    if cfg!(target_os = "windows") {
        home("APPDATA")
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    } else if cfg!(target_os = "macos") {
        home("HOME")
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Path::new("Library/Application Support/minecraft"))
    } else {
        home("HOME")
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    }
}
