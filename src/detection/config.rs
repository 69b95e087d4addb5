use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::host::PointerButton;

pub const MIN_SCAN_INTERVAL_MS: u64 = 200;
pub const MAX_SCAN_INTERVAL_MS: u64 = 850;
pub const MIN_WATCH_RADIUS: u32 = 40;
pub const MAX_WATCH_RADIUS: u32 = 100;
const MAX_EXCLUSION_BAND: u32 = 2_000;

/// What the first catch after calibration counts for. Time spent between
/// calibration and the first catch includes the operator getting ready, so
/// it can skew the averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FirstCatchPolicy {
    /// Tally it like any other catch.
    #[default]
    Count,
    /// Reel as usual but only use it to reset the timing baseline.
    BaselineOnly,
}

/// Guards against the watch region being in the wrong place: a reel
/// followed immediately by another reel means the bobber never showed up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SafetyNetConfig {
    pub enabled: bool,
    /// Consecutive misses that produce a warning.
    pub warn_after: u32,
    /// Consecutive misses that kill the host process and stop the loop.
    pub abort_after: u32,
    /// Process name prefix of the game client.
    pub host_process: String,
}

impl Default for SafetyNetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warn_after: 3,
            abort_after: 4,
            host_process: default_host_process().into(),
        }
    }
}

fn default_host_process() -> &'static str {
    if cfg!(target_os = "windows") {
        "javaw"
    } else {
        "java"
    }
}

/// Tunables for one detection loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub scan_interval_ms: u64,
    /// Half the side of the watch square, in pixels.
    pub watch_radius: u32,
    /// Rows at the bottom of the frame skipped during calibration.
    pub exclusion_band: u32,
    pub button: PointerButton,
    /// Pause between reeling in and casting out again.
    pub settle_delay_ms: u64,
    /// Pause after casting so the bobber can surface before scanning resumes.
    pub cooldown_ms: u64,
    /// Log the running average every this many catches.
    pub report_every: u64,
    pub first_catch: FirstCatchPolicy,
    pub safety_net: SafetyNetConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 350,
            watch_radius: MIN_WATCH_RADIUS,
            exclusion_band: 100,
            button: PointerButton::Right,
            settle_delay_ms: 750,
            cooldown_ms: 2_500,
            report_every: 5,
            first_catch: FirstCatchPolicy::Count,
            safety_net: SafetyNetConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Pulls every field back into its accepted range instead of rejecting it.
    pub fn sanitized(mut self) -> Self {
        self.scan_interval_ms = self
            .scan_interval_ms
            .clamp(MIN_SCAN_INTERVAL_MS, MAX_SCAN_INTERVAL_MS);
        self.watch_radius = self.watch_radius.clamp(MIN_WATCH_RADIUS, MAX_WATCH_RADIUS);
        self.exclusion_band = self.exclusion_band.min(MAX_EXCLUSION_BAND);
        self.settle_delay_ms = self.settle_delay_ms.clamp(100, 5_000);
        self.cooldown_ms = self.cooldown_ms.clamp(500, 10_000);
        self.report_every = self.report_every.max(1);
        self.safety_net.warn_after = self.safety_net.warn_after.clamp(1, u32::MAX - 1);
        self.safety_net.abort_after = self
            .safety_net
            .abort_after
            .max(self.safety_net.warn_after + 1);
        self
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Exclusion band for a Minecraft `guiScale`: the hotbar, armor and
    /// health rows are roughly 50 pixels tall per scale step.
    pub fn exclusion_band_for_gui_scale(gui_scale: u32) -> u32 {
        gui_scale.saturating_mul(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_clamped_to_safe_range() {
        let low = DetectorConfig {
            scan_interval_ms: 10,
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(low.scan_interval_ms, MIN_SCAN_INTERVAL_MS);

        let high = DetectorConfig {
            scan_interval_ms: 5_000,
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(high.scan_interval(), Duration::from_millis(MAX_SCAN_INTERVAL_MS));

        let ok = DetectorConfig {
            scan_interval_ms: 300,
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(ok.scan_interval_ms, 300);
    }

    #[test]
    fn thresholds_stay_ordered() {
        let config = DetectorConfig {
            safety_net: SafetyNetConfig {
                warn_after: 0,
                abort_after: 0,
                ..SafetyNetConfig::default()
            },
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(config.safety_net.warn_after, 1);
        assert_eq!(config.safety_net.abort_after, 2);

        let inverted = DetectorConfig {
            safety_net: SafetyNetConfig {
                warn_after: 6,
                abort_after: 2,
                ..SafetyNetConfig::default()
            },
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(inverted.safety_net.abort_after, 7);
    }

    #[test]
    fn radius_and_report_cadence_are_clamped() {
        let config = DetectorConfig {
            watch_radius: 500,
            report_every: 0,
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(config.watch_radius, MAX_WATCH_RADIUS);
        assert_eq!(config.report_every, 1);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"scanIntervalMs": 400, "safetyNet": {"enabled": false}}"#)
                .unwrap();
        assert_eq!(config.scan_interval_ms, 400);
        assert!(!config.safety_net.enabled);
        assert_eq!(config.safety_net.abort_after, 4);
        assert_eq!(config.cooldown_ms, 2_500);
    }

    #[test]
    fn gui_scale_maps_to_exclusion_band() {
        assert_eq!(DetectorConfig::exclusion_band_for_gui_scale(2), 100);
        assert_eq!(DetectorConfig::exclusion_band_for_gui_scale(0), 0);
        assert_eq!(
            DetectorConfig::exclusion_band_for_gui_scale(100_000_000),
            u32::MAX
        );
    }

    #[test]
    fn huge_thresholds_are_clamped_not_overflowed() {
        let config = DetectorConfig {
            safety_net: SafetyNetConfig {
                warn_after: u32::MAX,
                abort_after: u32::MAX,
                ..SafetyNetConfig::default()
            },
            ..DetectorConfig::default()
        }
        .sanitized();
        assert_eq!(config.safety_net.warn_after, u32::MAX - 1);
        assert_eq!(config.safety_net.abort_after, u32::MAX);

        let band = DetectorConfig {
            exclusion_band: DetectorConfig::exclusion_band_for_gui_scale(u32::MAX),
            ..DetectorConfig::default()
        }
        .sanitized()
        .exclusion_band;
        assert_eq!(band, MAX_EXCLUSION_BAND);
    }
}
