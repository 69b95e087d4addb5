use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{error, info};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::host::Host;

use super::config::DetectorConfig;
use super::error::{DetectorError, StopReason};
use super::loop_worker::{capture_frame, detection_loop, lock_state, LoopContext};
use super::region::{locate_marker, WatchRegion};
use super::state::{DetectorSnapshot, DetectorState, RunState};

/// One calibrate-then-watch session against a host.
///
/// The lifecycle is `calibrate()` until it returns `true`, `start()`, then
/// `wait()` or `stop()`. A stopped loop cannot be restarted; build a new one.
pub struct DetectionLoop {
    config: DetectorConfig,
    host: Host,
    state: Arc<Mutex<DetectorState>>,
    handle: Option<JoinHandle<Result<StopReason, DetectorError>>>,
    cancel_token: CancellationToken,
    finished: Option<Result<StopReason, DetectorError>>,
}

impl DetectionLoop {
    /// Out-of-range settings are clamped, never rejected.
    pub fn new(config: DetectorConfig, host: Host) -> Self {
        Self {
            config: config.sanitized(),
            host,
            state: Arc::new(Mutex::new(DetectorState::new())),
            handle: None,
            cancel_token: CancellationToken::new(),
            finished: None,
        }
    }

    /// Looks for the bobber in a full frame and fixes the watch region
    /// around the first match. `Ok(false)` means nothing matched and the
    /// caller may retry once the bobber is visible.
    pub async fn calibrate(&mut self) -> Result<bool, DetectorError> {
        if self.handle.is_some() {
            return Err(DetectorError::AlreadyRunning);
        }
        {
            let mut state = lock_state(&self.state);
            if state.status == RunState::Stopped {
                return Err(DetectorError::Stopped);
            }
            state.begin_calibration();
        }

        info!("Attempting to calibrate. This might take a while.");
        let started = Instant::now();

        let frame = match capture_frame(&self.host).await {
            Ok(frame) => frame,
            Err(err) => {
                lock_state(&self.state).finish_calibration(None, Instant::now().into_std(), Utc::now());
                return Err(err);
            }
        };

        let exclusion_band = self.config.exclusion_band;
        let radius = self.config.watch_radius;
        let (width, height) = frame.dimensions();
        let region = tokio::task::spawn_blocking(move || locate_marker(&frame, exclusion_band))
            .await?
            .map(|point| WatchRegion::around(point, radius, width, height));

        let found = lock_state(&self.state).finish_calibration(
            region,
            Instant::now().into_std(),
            Utc::now(),
        );

        match region {
            Some(region) => {
                info!(
                    "Successfully calibrated in {:.1} seconds. Watching ({}, {}) to ({}, {}).",
                    started.elapsed().as_secs_f64(),
                    region.top_left.x,
                    region.top_left.y,
                    region.bottom_right.x,
                    region.bottom_right.y
                );
            }
            None => error!("Failed to calibrate. Is your bobber visible?"),
        }
        Ok(found)
    }

    /// Spawns the scan loop. Requires a successful calibration.
    pub fn start(&mut self) -> Result<(), DetectorError> {
        let status = lock_state(&self.state).status;
        match status {
            RunState::Watching => {}
            RunState::Stopped => return Err(DetectorError::Stopped),
            RunState::Idle | RunState::Calibrating => return Err(DetectorError::NotCalibrated),
        }
        if self.handle.is_some() {
            return Err(DetectorError::AlreadyRunning);
        }

        let ctx = LoopContext {
            config: self.config.clone(),
            host: self.host.clone(),
            state: Arc::clone(&self.state),
        };
        let handle = tokio::spawn(detection_loop(ctx, self.cancel_token.clone()));
        self.handle = Some(handle);

        info!(
            "AutoFisher started. Scanning every {} ms, auto-kill when out of position: {}",
            self.config.scan_interval_ms,
            if self.config.safety_net.enabled { "yes" } else { "no" }
        );
        Ok(())
    }

    /// Requests a stop and waits for the loop to wind down. A reel sequence
    /// already under way finishes first. Calling this again is a no-op.
    pub async fn stop(&mut self) {
        self.cancel_token.cancel();
        lock_state(&self.state).stop();
        self.join().await;
    }

    pub fn is_running(&self) -> bool {
        let task_alive = self
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        task_alive && lock_state(&self.state).status == RunState::Watching
    }

    /// Waits for the loop to end on its own (safety net or host failure)
    /// or through `stop()`. An error is reported once; later calls see
    /// `Requested`. Waiting on a loop that was never started is a misuse
    /// error unless it has already been stopped.
    pub async fn wait(&mut self) -> Result<StopReason, DetectorError> {
        self.join().await;
        match self.finished.take() {
            Some(Ok(reason)) => {
                self.finished = Some(Ok(reason));
                Ok(reason)
            }
            Some(Err(err)) => Err(err),
            None => match self.snapshot().status {
                RunState::Stopped => Ok(StopReason::Requested),
                RunState::Watching => Err(DetectorError::NotStarted),
                RunState::Idle | RunState::Calibrating => Err(DetectorError::NotCalibrated),
            },
        }
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        lock_state(&self.state).snapshot()
    }

    /// Cancel-safe: dropping this future leaves the handle in place.
    async fn join(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(DetectorError::Join(err)),
        };
        self.handle = None;
        self.finished = Some(result);
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
