// Synthetic test images

use image::{DynamicImage, Rgb, RgbImage};

pub fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Deterministic pseudo-random texture.
pub fn noise(width: u32, height: u32, seed: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let mut v = x.wrapping_mul(73_856_093)
            ^ y.wrapping_mul(19_349_663)
            ^ seed.wrapping_mul(83_492_791);
        v ^= v >> 13;
        v = v.wrapping_mul(0x5bd1_e995);
        v ^= v >> 15;
        Rgb([v as u8, (v >> 8) as u8, (v >> 16) as u8])
    }))
}

/// Bright flat top-left third, dark checkerboard of `block` px squares in
/// the bottom-right third, mid gray elsewhere.
pub fn bright_top_left_busy_bottom_right(size: u32, block: u32) -> DynamicImage {
    let third = size / 3;
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        if x < third && y < third {
            Rgb([235, 235, 235])
        } else if x >= size - third && y >= size - third {
            let v = if (x / block + y / block) % 2 == 0 { 10 } else { 70 };
            Rgb([v, v, v])
        } else {
            Rgb([128, 128, 128])
        }
    }))
}
