//! Runtime device configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use frame_pipeline::{Dimensions, EnhancementSettings, ImageSettings, Orientation};

use super::defaults::get_default;
use super::validation::validate_setting;

/// Display and rendering configuration for one panel.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub resolution: Dimensions,
    pub orientation: Orientation,
    pub inverted: bool,
    pub image: ImageSettings,
    pub renderer_binary: PathBuf,
    pub render_timeout: Option<Duration>,
    pub virtual_time_budget_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::load_from(|_| None)
    }
}

impl DeviceConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults.
    ///
    /// Values that fail validation are logged and replaced by the default.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let g = |key: &str| -> String {
            let default = get_default(key).unwrap_or_default();
            match lookup(key) {
                Some(v) if !v.is_empty() => match validate_setting(key, &v) {
                    Ok(()) => v,
                    Err(e) => {
                        tracing::warn!("Invalid {key}={v:?} ({e}), using default {default:?}");
                        default.to_string()
                    }
                },
                _ => default.to_string(),
            }
        };

        let width = parse_u32(&g("DISPLAY_WIDTH"), 800);
        let height = parse_u32(&g("DISPLAY_HEIGHT"), 480);
        let resolution =
            Dimensions::try_new(width, height).unwrap_or_else(|| Dimensions::new(800, 480));

        let enhancement = EnhancementSettings {
            brightness: parse_f32(&g("IMAGE_BRIGHTNESS"), 1.0),
            contrast: parse_f32(&g("IMAGE_CONTRAST"), 1.0),
            saturation: parse_f32(&g("IMAGE_SATURATION"), 1.0),
            sharpness: parse_f32(&g("IMAGE_SHARPNESS"), 1.0),
        };

        let render_timeout = g("RENDER_TIMEOUT_MS")
            .parse::<u64>()
            .ok()
            .map(Duration::from_millis);

        Self {
            resolution,
            orientation: g("DISPLAY_ORIENTATION").parse().unwrap_or_default(),
            inverted: g("DISPLAY_INVERTED") == "true",
            image: ImageSettings {
                keep_width: g("IMAGE_KEEP_WIDTH") == "true",
                pad_blur: g("IMAGE_PAD_BLUR") == "true",
                enhancement,
            },
            renderer_binary: PathBuf::from(g("RENDERER_BINARY")),
            render_timeout,
            virtual_time_budget_ms: parse_u64(&g("VIRTUAL_TIME_BUDGET_MS"), 10_000),
        }
    }
}

fn parse_f32(s: &str, default: f32) -> f32 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_u32(s: &str, default: u32) -> u32 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
