//! Content fingerprints for change detection.

use std::fmt;

use image::DynamicImage;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of an image's RGB pixels (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ContentFingerprint {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Fingerprint the visible content of `img`.
///
/// Pixels are normalized to 8-bit RGB and hashed row-major, so the result
/// does not depend on the file format, an alpha channel, or gray-vs-color
/// storage of the same pixels.
pub fn fingerprint(img: &DynamicImage) -> ContentFingerprint {
    let rgb = img.to_rgb8();
    let mut hasher = Sha256::new();
    hasher.update(rgb.as_raw());
    ContentFingerprint(hex::encode(hasher.finalize()))
}
