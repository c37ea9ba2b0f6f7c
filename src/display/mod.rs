/// Display and filter collaborators
///
/// The capture core never renders or perturbs pixels itself. It calls into
/// two narrow interfaces:
/// - `ImageDisplay` - show an image full-screen and wait for pacing (console.rs)
/// - `ImageFilter` - apply a named perturbation at a severity level (filter.rs)

pub mod console;
pub mod filter;

use std::path::Path;
use std::time::Duration;

use crate::dataset::DatasetRow;
use crate::{Error, Result};

pub use console::ConsoleDisplay;
pub use filter::{FilterRegistry, Identity, ImageFilter, Level, LEVELS};

/// Size of the target screen in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry { width, height });
        }
        Ok(Self { width, height })
    }
}

/// How the display waits before the session moves on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Block until the operator confirms
    KeyPress,
    /// Wait a fixed time, unless the operator cancels
    Delay(Duration),
}

impl Pacing {
    /// Manual-mode pacing from a delay in milliseconds; 0 waits for a key
    pub fn from_millis(delay_ms: u64) -> Self {
        if delay_ms == 0 {
            Pacing::KeyPress
        } else {
            Pacing::Delay(Duration::from_millis(delay_ms))
        }
    }
}

/// What the operator asked for while the display was waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSignal {
    Advance,
    Cancel,
}

/// Shows images to the capture device
pub trait ImageDisplay {
    /// Show `row` on a screen of size `geometry`
    fn show(&mut self, row: &DatasetRow, geometry: ScreenGeometry) -> Result<()>;

    /// Wait according to `pacing`, returning the operator's signal
    fn wait(&mut self, pacing: Pacing) -> OperatorSignal;
}

pub(crate) fn display_error(path: &Path, reason: impl ToString) -> Error {
    Error::Display {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
