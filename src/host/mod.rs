//! Everything the detector needs from the operating system: frames, mouse
//! clicks and the game process. The detector only sees the traits so tests
//! can substitute scripted fakes.

pub mod capture;
pub mod input;
pub mod process;

use std::sync::Arc;

use anyhow::Result;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub use capture::{CaptureTarget, WindowCapture};
pub use input::EnigoInput;
pub use process::SystemProcesses;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Source of the pixels the bobber is searched in.
pub trait FrameSource: Send + Sync {
    fn capture(&self) -> Result<RgbaImage>;
}

/// Synthetic pointer input at the cursor's current location.
pub trait InputDriver: Send + Sync {
    fn press_and_release(&self, button: PointerButton) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
}

pub trait ProcessControl: Send + Sync {
    /// All processes whose name starts with `name`, lowest pid first.
    fn find_processes(&self, name: &str) -> Vec<ProcessHandle>;

    fn find_process(&self, name: &str) -> Option<ProcessHandle> {
        self.find_processes(name).into_iter().next()
    }

    fn terminate(&self, handle: &ProcessHandle) -> Result<()>;
}

/// The three capabilities a detection loop runs against.
#[derive(Clone)]
pub struct Host {
    pub frames: Arc<dyn FrameSource>,
    pub input: Arc<dyn InputDriver>,
    pub processes: Arc<dyn ProcessControl>,
}

impl Host {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        input: Arc<dyn InputDriver>,
        processes: Arc<dyn ProcessControl>,
    ) -> Self {
        Self {
            frames,
            input,
            processes,
        }
    }

    /// Real screen capture, enigo input and sysinfo process control.
    pub fn system(target: CaptureTarget) -> Result<Self> {
        Ok(Self::new(
            Arc::new(WindowCapture::new(target)),
            Arc::new(EnigoInput::new()?),
            Arc::new(SystemProcesses::new()),
        ))
    }
}
