//! Frame rendering pipeline for fixed-size, low-refresh displays.
//!
//! Turns a remote image or an HTML document into a bitmap of exactly the
//! panel's size: rotation to the panel orientation, aspect-correct crop or
//! blurred padding, and a brightness/contrast/saturation/sharpness pass.
//! A SHA-256 fingerprint of the final pixels lets callers skip refreshes
//! when nothing visible changed.

pub mod compose;
pub mod enhance;
pub mod fetch;
pub mod hash;
pub mod pipeline;
pub mod render;
pub mod rotate;

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;

// Re-exports for convenience
pub use compose::{pad_with_blur, resize};
pub use enhance::{EnhancementSettings, apply_enhancement};
pub use fetch::ImageFetcher;
pub use hash::{ContentFingerprint, fingerprint};
pub use pipeline::{FramePipeline, ImageSettings, RenderTarget};
pub use render::{ChromiumBackend, Renderer, ScreenshotBackend};
pub use rotate::change_orientation;

/// Result of any stage that can fail to produce an image.
///
/// `Err` is the "no image produced" outcome; it is never a partially valid
/// bitmap.
pub type RenderOutcome = Result<DynamicImage, PipelineError>;

/// Expected, recoverable failures of a single pipeline invocation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    FetchStatus { url: String, status: u16 },

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Renderer exited with {exit_code:?}")]
    ProcessFailed { exit_code: Option<i32> },

    #[error("Renderer did not finish within {0} ms")]
    ProcessTimeout(u64),

    #[error("Screenshot file was not created: {0}")]
    OutputMissing(String),

    #[error("Screenshot file is empty (0 bytes): {0}")]
    OutputEmpty(String),

    #[error("Screenshot file is not a valid image ({file_size} bytes): {source}")]
    OutputUndecodable {
        file_size: u64,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Target size in pixels. Both components are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Panics if either component is zero.
    pub fn new(width: u32, height: u32) -> Self {
        Self::try_new(width, height)
            .unwrap_or_else(|| panic!("dimensions must be positive, got {width}x{height}"))
    }

    pub fn try_new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Logical size of a panel mounted in `orientation`.
    ///
    /// A vertical panel renders content at swapped width/height, which the
    /// orientation transform later rotates back onto the physical panel.
    pub fn oriented(self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => self,
            Orientation::Vertical => Self {
                width: self.height,
                height: self.width,
            },
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Physical mounting of the display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(format!("unknown orientation: {other}")),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}
