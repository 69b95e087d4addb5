use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::FrameSource;

/// Which pixels to watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureTarget {
    /// Largest visible window owned by this process.
    Process { pid: u32 },
    /// Largest visible window whose app name contains `name`.
    AppName { name: String },
    PrimaryMonitor,
}

/// Screen capture through xcap. The window is looked up again for every
/// frame, so a closed or minimized window surfaces as a capture error
/// instead of a stale handle.
pub struct WindowCapture {
    target: CaptureTarget,
}

impl WindowCapture {
    pub fn new(target: CaptureTarget) -> Self {
        Self { target }
    }

    fn find_window(&self) -> Result<xcap::Window> {
        let windows = xcap::Window::all().context("failed to enumerate windows")?;

        let mut best: Option<(u64, xcap::Window)> = None;
        for window in windows {
            let matches = match &self.target {
                CaptureTarget::Process { pid } => window.pid().ok() == Some(*pid),
                CaptureTarget::AppName { name } => window
                    .app_name()
                    .map(|app| app.to_lowercase().contains(&name.to_lowercase()))
                    .unwrap_or(false),
                CaptureTarget::PrimaryMonitor => false,
            };
            if !matches {
                continue;
            }

            let area = u64::from(window.width().unwrap_or(0)) * u64::from(window.height().unwrap_or(0));
            if best.as_ref().map_or(true, |(best_area, _)| area > *best_area) {
                best = Some((area, window));
            }
        }

        let (_, window) = best.ok_or_else(|| anyhow!("no window found for {:?}", self.target))?;
        if window.is_minimized().unwrap_or(false) {
            bail!("target window is minimized");
        }
        Ok(window)
    }

    fn capture_primary_monitor(&self) -> Result<RgbaImage> {
        let monitors = xcap::Monitor::all().context("failed to enumerate monitors")?;
        let monitor = monitors
            .iter()
            .find(|monitor| monitor.is_primary().unwrap_or(false))
            .or_else(|| monitors.first())
            .context("no monitors found")?;
        let image = monitor
            .capture_image()
            .context("monitor capture failed")?;
        into_frame(image.width(), image.height(), image.into_raw())
    }
}

impl FrameSource for WindowCapture {
    fn capture(&self) -> Result<RgbaImage> {
        if self.target == CaptureTarget::PrimaryMonitor {
            return self.capture_primary_monitor();
        }

        let window = self.find_window()?;
        let image = window.capture_image().context("window capture failed")?;
        into_frame(image.width(), image.height(), image.into_raw())
    }
}

fn into_frame(width: u32, height: u32, raw: Vec<u8>) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        bail!("captured an empty {width}x{height} frame");
    }
    RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| anyhow!("captured buffer does not match {width}x{height}"))
}
