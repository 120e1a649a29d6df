//! Orientation correction for physically rotated panels.

use image::DynamicImage;
use tracing::debug;

use crate::Orientation;

/// Counter-clockwise rotation in degrees for a panel orientation.
///
/// Horizontal panels need no rotation, vertical ones a quarter turn.
/// `inverted` adds a half turn for panels mounted upside down.
pub fn rotation_angle(orientation: Orientation, inverted: bool) -> u32 {
    let angle = match orientation {
        Orientation::Horizontal => 0,
        Orientation::Vertical => 90,
    };
    if inverted { (angle + 180) % 360 } else { angle }
}

/// Rotate `img` onto the physical panel.
///
/// Quarter turns swap width and height, so the canvas always fits the
/// rotated content and nothing is cropped.
pub fn change_orientation(img: DynamicImage, orientation: Orientation, inverted: bool) -> DynamicImage {
    let angle = rotation_angle(orientation, inverted);
    let (w, h) = (img.width(), img.height());
    debug!(w, h, angle, %orientation, inverted, "Changing image orientation");

    // Angles are counter-clockwise; image's rotate helpers turn clockwise.
    match angle {
        90 => img.rotate270(),
        180 => img.rotate180(),
        270 => img.rotate90(),
        _ => img,
    }
}
