// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use image::imageops::FilterType;
use image::DynamicImage;
use sha2::{Digest, Sha256};

/// Side of the grayscale grid that is hashed
pub const FINGERPRINT_GRID: u32 = 8;

/// Content digest of an image, used only to build cache keys
///
/// The image is reduced to an 8x8 grayscale grid before hashing, so the
/// same picture decoded twice (or re-encoded losslessly) fingerprints the
/// same. Near-duplicates may collide.
pub fn fingerprint(image: &DynamicImage) -> String {
    let grid = image
        .resize_exact(FINGERPRINT_GRID, FINGERPRINT_GRID, FilterType::Lanczos3)
        .to_luma8();

    let mut hasher = Sha256::new();
    hasher.update(grid.as_raw());
    hex::encode(hasher.finalize())
}
