//! Bobber detection: the color classifier, calibration, the watch region
//! and the loop that reels when the bobber dips.

pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
mod loop_worker;
pub mod region;
pub mod safety;
pub mod state;
pub mod stats;

pub use classifier::is_marker;
pub use config::{DetectorConfig, FirstCatchPolicy, SafetyNetConfig};
pub use controller::DetectionLoop;
pub use error::{DetectorError, StopReason};
pub use region::{locate_marker, Point, WatchRegion};
pub use state::{DetectorSnapshot, RunState};
pub use stats::IntervalHistory;
