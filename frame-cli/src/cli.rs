//! Command-line arguments for a single render.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use frame_pipeline::ImageSettings;

use crate::config::DeviceConfig;

#[derive(Debug, Parser)]
#[command(
    name = "frame-render",
    version,
    about = "Render an image URL or HTML page into a panel-sized PNG"
)]
pub struct Cli {
    #[command(subcommand)]
    pub source: Source,

    /// Where to write the PNG
    #[arg(short, long, global = true, default_value = "frame.png")]
    pub output: PathBuf,

    /// Pad over a blurred background instead of cropping
    #[arg(long, global = true)]
    pub pad_blur: bool,

    /// Anchor crops at the left/top edge
    #[arg(long, global = true)]
    pub keep_width: bool,

    /// Render timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Fingerprint of the previously displayed frame
    #[arg(long, global = true)]
    pub previous: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Source {
    /// Download a remote image
    Url { url: String },
    /// Render an HTML file's contents
    Html { file: PathBuf },
    /// Let the browser open a path or URL directly
    Target { target: String },
}

impl Cli {
    /// Image settings from config, with command-line flags switched on top.
    pub fn image_settings(&self, config: &DeviceConfig) -> ImageSettings {
        ImageSettings {
            keep_width: self.keep_width || config.image.keep_width,
            pad_blur: self.pad_blur || config.image.pad_blur,
            enhancement: config.image.enhancement,
        }
    }

    pub fn timeout(&self, config: &DeviceConfig) -> Option<Duration> {
        self.timeout_ms
            .map(Duration::from_millis)
            .or(config.render_timeout)
    }
}
