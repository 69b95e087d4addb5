use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use chrono::Utc;
use image::RgbaImage;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::host::Host;

use super::config::DetectorConfig;
use super::error::{DetectorError, StopReason};
use super::state::{Catch, DetectorState, RunState, ScanEffect};

// Set to false to silence the per-cycle status lines
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub(super) struct LoopContext {
    pub config: DetectorConfig,
    pub host: Host,
    pub state: Arc<Mutex<DetectorState>>,
}

enum CycleOutcome {
    Continue,
    Aborted,
}

pub(super) fn lock_state(state: &Mutex<DetectorState>) -> MutexGuard<'_, DetectorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs scan cycles until cancelled, aborted by the safety net, or a host
/// capability fails. The state is `Stopped` on every exit path.
pub(super) async fn detection_loop(
    ctx: LoopContext,
    cancel_token: CancellationToken,
) -> Result<StopReason, DetectorError> {
    let outcome = watch(&ctx, &cancel_token).await;
    lock_state(&ctx.state).stop();

    match &outcome {
        Ok(StopReason::Requested) => log_info!("AutoFisher has stopped."),
        Ok(StopReason::Thrashing) => log_error!("AutoFisher stopped by the safety net."),
        Err(err) => log_error!("AutoFisher stopped: {err}"),
    }
    outcome
}

async fn watch(
    ctx: &LoopContext,
    cancel_token: &CancellationToken,
) -> Result<StopReason, DetectorError> {
    let period = ctx.config.scan_interval();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel_token.cancelled() => {
                log_debug!("cancelled while waiting for the next scan");
                return Ok(StopReason::Requested);
            }
        }

        // A stop that raced the tick wins before any frame is captured.
        if cancel_token.is_cancelled() || lock_state(&ctx.state).status != RunState::Watching {
            return Ok(StopReason::Requested);
        }

        if let CycleOutcome::Aborted = scan_cycle(ctx).await? {
            return Ok(StopReason::Thrashing);
        }

        // The next scan is a full interval after this cycle, however long
        // the reel sequence took.
        ticker.reset();
    }
}

async fn scan_cycle(ctx: &LoopContext) -> Result<CycleOutcome, DetectorError> {
    let frame = capture_frame(&ctx.host).await?;

    let region = lock_state(&ctx.state)
        .region
        .ok_or(DetectorError::NotCalibrated)?;
    let present = region.contains_marker(&frame);
    log_debug!("scan: bobber {}", if present { "present" } else { "absent" });

    let effect = lock_state(&ctx.state).apply_scan(
        present,
        &ctx.config,
        Instant::now().into_std(),
        Utc::now(),
    );

    match effect {
        ScanEffect::Nothing => Ok(CycleOutcome::Continue),
        ScanEffect::Reel(catch) => {
            report_catch(&catch);
            reel(ctx).await?;
            Ok(CycleOutcome::Continue)
        }
        ScanEffect::Abort { misses } => {
            terminate_host(ctx, misses);
            Ok(CycleOutcome::Aborted)
        }
    }
}

/// Grabs one frame off the async runtime.
pub(super) async fn capture_frame(host: &Host) -> Result<RgbaImage, DetectorError> {
    let frames = Arc::clone(&host.frames);
    tokio::task::spawn_blocking(move || frames.capture())
        .await
        .context("frame capture worker join failed")
        .and_then(|captured| captured)
        .map_err(DetectorError::Capture)
}

/// Reel in, let the line settle, cast out, then wait for the bobber to
/// come back up before the next scan.
async fn reel(ctx: &LoopContext) -> Result<(), DetectorError> {
    let input = &ctx.host.input;
    let button = ctx.config.button;

    input
        .press_and_release(button)
        .map_err(DetectorError::Input)?;
    time::sleep(ctx.config.settle_delay()).await;

    input
        .press_and_release(button)
        .map_err(DetectorError::Input)?;
    log_info!("Reeled fishing rod out.");

    time::sleep(ctx.config.cooldown()).await;
    Ok(())
}

fn report_catch(catch: &Catch) {
    if catch.tallied {
        log_info!(
            "Bobber no longer in view. Caught something in {:.1} seconds ({} so far).",
            catch.elapsed_secs,
            catch.number
        );
    } else {
        log_info!(
            "Bobber no longer in view after {:.1} seconds; using it as the timing baseline.",
            catch.elapsed_secs
        );
    }

    if catch.warning {
        log_warn!(
            "Bobber was reeled in and out {} times in a row. One more and AutoFisher terminates the game.",
            catch.misses
        );
    }

    if let Some((average, samples)) = catch.summary {
        log_info!("Average time per fish: {:.1} seconds ({} caught)", average, samples);
    }
}

fn terminate_host(ctx: &LoopContext, misses: u32) {
    log_error!(
        "Bobber was reeled in and out {} times in a row; it is probably out of position. Terminating.",
        misses
    );

    let name = &ctx.config.safety_net.host_process;
    let processes = &ctx.host.processes;
    match processes.find_process(name) {
        Some(handle) => match processes.terminate(&handle) {
            Ok(()) => log_warn!("Terminated {} (pid {}).", handle.name, handle.pid),
            Err(err) => log_error!("Could not terminate {} (pid {}): {err:#}", handle.name, handle.pid),
        },
        None => log_warn!("No process matching '{}' is running; nothing to terminate.", name),
    }
}
