//! Brightness, contrast, saturation and sharpness adjustments.
//!
//! Every adjustment blends the image with a "degenerate" version of itself:
//! `out = degenerate + factor * (image - degenerate)`. A factor of 1.0 leaves
//! the image untouched, 0.0 yields the degenerate image and larger values
//! amplify the difference.
//!
//! | Adjustment | Degenerate image                          |
//! |------------|-------------------------------------------|
//! | brightness | black                                     |
//! | contrast   | flat gray at the image's mean luminance   |
//! | saturation | grayscale copy of the image               |
//! | sharpness  | 3x3 smoothed copy (edge pixels unchanged) |

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::debug;

/// Multiplicative enhancement factors. `1.0` means "no change".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancementSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sharpness: f32,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpness: 1.0,
        }
    }
}

impl EnhancementSettings {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Interleaved 8-bit pixels with one (gray) or three (RGB) channels.
struct Plane<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    channels: usize,
}

/// Apply brightness, contrast, saturation and sharpness, in that order.
///
/// Images that are neither 8-bit RGB nor 8-bit grayscale are converted to
/// RGB first. The order is fixed: each stage sees the previous stage's output.
pub fn apply_enhancement(img: DynamicImage, settings: &EnhancementSettings) -> DynamicImage {
    if !settings.is_identity() {
        debug!(
            brightness = settings.brightness,
            contrast = settings.contrast,
            saturation = settings.saturation,
            sharpness = settings.sharpness,
            "Applying image enhancement"
        );
    }

    match img {
        DynamicImage::ImageLuma8(mut gray) => {
            enhance_plane(gray_plane(&mut gray), settings);
            DynamicImage::ImageLuma8(gray)
        }
        other => {
            let mut rgb = other.into_rgb8();
            enhance_plane(rgb_plane(&mut rgb), settings);
            DynamicImage::ImageRgb8(rgb)
        }
    }
}

fn rgb_plane(img: &mut RgbImage) -> Plane<'_> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    Plane {
        data: &mut **img,
        width,
        height,
        channels: 3,
    }
}

fn gray_plane(img: &mut GrayImage) -> Plane<'_> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    Plane {
        data: &mut **img,
        width,
        height,
        channels: 1,
    }
}

fn enhance_plane(plane: Plane<'_>, settings: &EnhancementSettings) {
    if settings.brightness != 1.0 {
        let degenerate = vec![0u8; plane.data.len()];
        blend(plane.data, &degenerate, settings.brightness);
    }
    if settings.contrast != 1.0 {
        let mean = mean_luma(&plane);
        let degenerate = vec![mean; plane.data.len()];
        blend(plane.data, &degenerate, settings.contrast);
    }
    if settings.saturation != 1.0 && plane.channels == 3 {
        let degenerate = grayscale_copy(&plane);
        blend(plane.data, &degenerate, settings.saturation);
    }
    if settings.sharpness != 1.0 {
        let degenerate = smoothed_copy(&plane);
        blend(plane.data, &degenerate, settings.sharpness);
    }
}

/// `data = degenerate + factor * (data - degenerate)`, clamped to 0..=255.
///
/// Results are rounded to nearest rather than truncated, so a non-default
/// factor can land one level above a truncating blend.
fn blend(data: &mut [u8], degenerate: &[u8], factor: f32) {
    for (value, &base) in data.iter_mut().zip(degenerate) {
        let base = f32::from(base);
        let out = base + factor * (f32::from(*value) - base);
        *value = out.round().clamp(0.0, 255.0) as u8;
    }
}

/// ITU-R 601-2 luma with 16-bit fixed-point rounding.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

fn pixel_luma(plane: &Plane<'_>, px: &[u8]) -> u8 {
    if plane.channels == 3 {
        luma(px[0], px[1], px[2])
    } else {
        px[0]
    }
}

fn mean_luma(plane: &Plane<'_>) -> u8 {
    let count = (plane.width * plane.height) as f64;
    if count == 0.0 {
        return 0;
    }
    let sum: u64 = plane
        .data
        .chunks_exact(plane.channels)
        .map(|px| u64::from(pixel_luma(plane, px)))
        .sum();
    (sum as f64 / count + 0.5) as u8
}

fn grayscale_copy(plane: &Plane<'_>) -> Vec<u8> {
    let mut out = Vec::with_capacity(plane.data.len());
    for px in plane.data.chunks_exact(plane.channels) {
        let l = pixel_luma(plane, px);
        out.extend(std::iter::repeat_n(l, plane.channels));
    }
    out
}

/// Smooth with the kernel `[1 1 1; 1 5 1; 1 1 1] / 13`, leaving edges as-is.
fn smoothed_copy(plane: &Plane<'_>) -> Vec<u8> {
    let mut out = plane.data.to_vec();
    let (w, h, ch) = (plane.width, plane.height, plane.channels);
    if w < 3 || h < 3 {
        return out;
    }

    let at = |x: usize, y: usize, c: usize| u32::from(plane.data[(y * w + x) * ch + c]);
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            for c in 0..ch {
                let mut sum = 0u32;
                for dy in 0..3 {
                    for dx in 0..3 {
                        sum += at(x + dx - 1, y + dy - 1, c);
                    }
                }
                // centre weight is 5: already counted once above
                sum += 4 * at(x, y, c);
                out[(y * w + x) * ch + c] = ((sum as f32 / 13.0).round()) as u8;
            }
        }
    }
    out
}
