use serde::Serialize;
use thiserror::Error;

/// Why a detection loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// `stop()` was called.
    Requested,
    /// The safety net saw too many reels in a row.
    Thrashing,
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("frame capture failed: {0:#}")]
    Capture(anyhow::Error),
    #[error("input injection failed: {0:#}")]
    Input(anyhow::Error),
    #[error("no watch region; calibrate first")]
    NotCalibrated,
    #[error("detector was calibrated but never started")]
    NotStarted,
    #[error("detector already running")]
    AlreadyRunning,
    #[error("detector has stopped; create a new one to continue")]
    Stopped,
    #[error("detection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
