//! Fitting images to an exact panel size.
//!
//! [`resize`] crops to the target aspect ratio and resamples with Lanczos3.
//! [`pad_with_blur`] keeps the whole image visible, centered over a blurred
//! cover-scaled copy of itself.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::box_filter;
use tracing::{debug, warn};

use crate::Dimensions;

/// Box blur radius applied to the padding background.
pub const PAD_BLUR_RADIUS: u32 = 8;

/// Region of the source image kept by [`resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the crop that gives `(src_w, src_h)` the aspect ratio of `target`.
///
/// Wider sources lose width, taller (or equal) ones lose height. The crop is
/// centered unless `keep_width` anchors it at the left (or top) edge. An empty
/// source yields the whole (empty) source.
pub fn crop_box(src_w: u32, src_h: u32, target: Dimensions, keep_width: bool) -> CropBox {
    if src_w == 0 || src_h == 0 {
        return CropBox {
            x: 0,
            y: 0,
            width: src_w,
            height: src_h,
        };
    }

    let (sw, sh) = (u64::from(src_w), u64::from(src_h));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    // src_w / src_h > tw / th, compared without floating point
    if sw * th > tw * sh {
        let width = ((sh * tw / th) as u32).clamp(1, src_w);
        let x = if keep_width { 0 } else { (src_w - width) / 2 };
        CropBox {
            x,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        let height = ((sw * th / tw) as u32).clamp(1, src_h);
        let y = if keep_width { 0 } else { (src_h - height) / 2 };
        CropBox {
            x: 0,
            y,
            width: src_w,
            height,
        }
    }
}

/// Crop `img` to the aspect ratio of `target`, then resample to exactly `target`.
pub fn resize(img: DynamicImage, target: Dimensions, keep_width: bool) -> DynamicImage {
    let (src_w, src_h) = (img.width(), img.height());
    if src_w == 0 || src_h == 0 {
        return blank_frame(src_w, src_h, target);
    }
    let crop = crop_box(src_w, src_h, target, keep_width);

    debug!(
        src_w,
        src_h,
        target_w = target.width,
        target_h = target.height,
        crop_x = crop.x,
        crop_y = crop.y,
        crop_w = crop.width,
        crop_h = crop.height,
        "Cropping image to target aspect ratio"
    );

    let cropped = if crop.width == src_w && crop.height == src_h {
        img
    } else {
        img.crop_imm(crop.x, crop.y, crop.width, crop.height)
    };

    if cropped.width() == target.width && cropped.height() == target.height {
        debug!("Crop already at target size, skipping resample");
        return cropped;
    }
    cropped.resize_exact(target.width, target.height, FilterType::Lanczos3)
}

/// Offset that centers an image of `inner` size inside `target`.
pub fn centered_offset(target: Dimensions, inner_w: u32, inner_h: u32) -> (u32, u32) {
    (
        target.width.saturating_sub(inner_w) / 2,
        target.height.saturating_sub(inner_h) / 2,
    )
}

/// Fit `img` into `target` without cropping its content.
///
/// The frame is filled with a cover-scaled, box-blurred copy of the image and
/// the contain-scaled original is pasted centered on top.
pub fn pad_with_blur(img: DynamicImage, target: Dimensions) -> DynamicImage {
    let (w, h) = (target.width, target.height);
    if img.width() == 0 || img.height() == 0 {
        return blank_frame(img.width(), img.height(), target);
    }

    let cover = img.resize_to_fill(w, h, FilterType::Lanczos3).to_rgb8();
    let mut background = box_blur_rgb(&cover, PAD_BLUR_RADIUS);

    let contained = img.resize(w, h, FilterType::Lanczos3).to_rgb8();
    let (x, y) = centered_offset(target, contained.width(), contained.height());

    debug!(
        src_w = img.width(),
        src_h = img.height(),
        inner_w = contained.width(),
        inner_h = contained.height(),
        x,
        y,
        "Padding image over blurred background"
    );

    imageops::replace(&mut background, &contained, i64::from(x), i64::from(y));
    DynamicImage::ImageRgb8(background)
}

/// Black frame of `target` size standing in for an empty source.
fn blank_frame(src_w: u32, src_h: u32, target: Dimensions) -> DynamicImage {
    warn!(src_w, src_h, %target, "Source image is empty, using a blank frame");
    DynamicImage::ImageRgb8(RgbImage::new(target.width, target.height))
}

/// Box blur each channel of an RGB image independently.
fn box_blur_rgb(img: &RgbImage, radius: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let channels: Vec<GrayImage> = (0..3)
        .map(|c| {
            let plane = GrayImage::from_fn(width, height, |x, y| Luma([img.get_pixel(x, y)[c]]));
            box_filter(&plane, radius, radius)
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y)[0],
            channels[1].get_pixel(x, y)[0],
            channels[2].get_pixel(x, y)[0],
        ])
    })
}
