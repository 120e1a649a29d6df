//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    ("DISPLAY_WIDTH", "800", "Physical panel width in pixels"),
    ("DISPLAY_HEIGHT", "480", "Physical panel height in pixels"),
    ("DISPLAY_ORIENTATION", "horizontal", "Panel mounting: horizontal or vertical"),
    ("DISPLAY_INVERTED", "false", "Panel is mounted upside down"),
    ("IMAGE_BRIGHTNESS", "1.0", "Brightness factor (1.0 = unchanged)"),
    ("IMAGE_CONTRAST", "1.0", "Contrast factor (1.0 = unchanged)"),
    ("IMAGE_SATURATION", "1.0", "Saturation factor (1.0 = unchanged)"),
    ("IMAGE_SHARPNESS", "1.0", "Sharpness factor (1.0 = unchanged)"),
    ("IMAGE_KEEP_WIDTH", "false", "Anchor crops at the left/top edge instead of centering"),
    ("IMAGE_PAD_BLUR", "false", "Pad mismatched images over a blurred background"),
    ("RENDERER_BINARY", "chromium-headless-shell", "Headless browser executable"),
    ("RENDER_TIMEOUT_MS", "", "Render timeout; empty uses the per-source default"),
    ("VIRTUAL_TIME_BUDGET_MS", "10000", "Virtual time budget passed to the browser"),
];

/// A single setting definition.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
