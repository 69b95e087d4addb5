use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::config::{DetectorConfig, FirstCatchPolicy};
use super::region::WatchRegion;
use super::safety::Verdict;
use super::stats::{round_to_tenths, IntervalHistory};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    #[default]
    Idle,
    Calibrating,
    Watching,
    Stopped,
}

/// Result of feeding one scan into [`DetectorState::apply_scan`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEffect {
    /// Bobber still there (or the loop is no longer watching).
    Nothing,
    /// Bobber gone: run the reel sequence.
    Reel(Catch),
    /// Too many misses in a row; the state is now `Stopped`.
    Abort { misses: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    /// Catches counted so far, including this one when it was tallied.
    pub number: u64,
    /// Seconds since the previous catch (or calibration), one decimal.
    pub elapsed_secs: f64,
    /// False when the first catch only reset the timing baseline.
    pub tallied: bool,
    /// Successive misses including this scan.
    pub misses: u32,
    pub warning: bool,
    /// Running average and sample count, present every `report_every` catches.
    pub summary: Option<(f64, u64)>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorSnapshot {
    pub status: RunState,
    pub region: Option<WatchRegion>,
    pub successive_misses: u32,
    pub catches: u64,
    pub average_secs: Option<f64>,
    pub calibrated_at: Option<DateTime<Utc>>,
    pub last_catch_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectorState {
    pub status: RunState,
    pub region: Option<WatchRegion>,
    pub successive_misses: u32,
    pub catches: u64,
    pub history: IntervalHistory,
    pub calibrated_at: Option<DateTime<Utc>>,
    pub last_catch_at: Option<DateTime<Utc>>,
    /// When the previous catch (or calibration) happened.
    baseline: Option<Instant>,
    first_catch_pending: bool,
}

impl DetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_calibration(&mut self) {
        self.status = RunState::Calibrating;
    }

    /// Settles a calibration attempt. Returns whether the bobber was found.
    pub fn finish_calibration(
        &mut self,
        region: Option<WatchRegion>,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> bool {
        match region {
            Some(region) => {
                self.status = RunState::Watching;
                self.region = Some(region);
                self.successive_misses = 0;
                self.baseline = Some(now);
                self.calibrated_at = Some(wall);
                self.first_catch_pending = true;
                true
            }
            None => {
                self.status = RunState::Idle;
                false
            }
        }
    }

    pub fn stop(&mut self) {
        self.status = RunState::Stopped;
    }

    pub fn apply_scan(
        &mut self,
        marker_present: bool,
        config: &DetectorConfig,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> ScanEffect {
        if self.status != RunState::Watching {
            return ScanEffect::Nothing;
        }

        if marker_present {
            self.successive_misses = 0;
            return ScanEffect::Nothing;
        }

        self.successive_misses = self.successive_misses.saturating_add(1);
        let misses = self.successive_misses;
        let verdict = config.safety_net.judge(misses);
        if verdict == Verdict::Abort {
            self.stop();
            return ScanEffect::Abort { misses };
        }

        let elapsed = now.saturating_duration_since(self.baseline.unwrap_or(now));
        self.baseline = Some(now);
        self.last_catch_at = Some(wall);

        let baseline_only =
            self.first_catch_pending && config.first_catch == FirstCatchPolicy::BaselineOnly;
        self.first_catch_pending = false;

        let (elapsed_secs, tallied) = if baseline_only {
            (round_to_tenths(elapsed) as f64 / 10.0, false)
        } else {
            self.catches += 1;
            (self.history.record(elapsed), true)
        };

        let summary = if tallied && self.catches % config.report_every.max(1) == 0 {
            self.history
                .average_secs()
                .map(|average| (average, self.history.total()))
        } else {
            None
        };

        ScanEffect::Reel(Catch {
            number: self.catches,
            elapsed_secs,
            tallied,
            misses,
            warning: verdict == Verdict::Warn,
            summary,
        })
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        DetectorSnapshot {
            status: self.status,
            region: self.region,
            successive_misses: self.successive_misses,
            catches: self.catches,
            average_secs: self.history.average_secs(),
            calibrated_at: self.calibrated_at,
            last_catch_at: self.last_catch_at,
        }
    }
}
