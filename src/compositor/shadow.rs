//! Drop shadow.
//!
//! The shadow is the text mask shifted by a fixed offset and softened with
//! a separable Gaussian blur. The kernel is quantized to Q16 fixed point
//! and applied with integer arithmetic, so the result does not depend on
//! float evaluation order.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

fn default_offset() -> i32 {
    2
}

fn default_blur_radius() -> u32 {
    3
}

fn default_sigma() -> f32 {
    1.5
}

fn default_strength() -> f32 {
    0.6
}

fn default_tone() -> f32 {
    0.25
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Horizontal offset in pixels (default: 2)
    #[serde(default = "default_offset")]
    pub offset_x: i32,

    /// Vertical offset in pixels (default: 2)
    #[serde(default = "default_offset")]
    pub offset_y: i32,

    /// Kernel radius in pixels; 0 disables the blur (default: 3)
    #[serde(default = "default_blur_radius")]
    pub blur_radius: u32,

    /// Gaussian sigma (default: 1.5)
    #[serde(default = "default_sigma")]
    pub sigma: f32,

    /// Shadow opacity relative to the text opacity (default: 0.6)
    #[serde(default = "default_strength")]
    pub strength: f32,

    /// Brightness of the shadow colour relative to the text colour (default: 0.25)
    #[serde(default = "default_tone")]
    pub tone: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            offset_x: default_offset(),
            offset_y: default_offset(),
            blur_radius: default_blur_radius(),
            sigma: default_sigma(),
            strength: default_strength(),
            tone: default_tone(),
        }
    }
}

impl ShadowConfig {
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.blur_radius > 0 && !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(OverlayError::config(format!(
                "shadow sigma must be > 0, got {}",
                self.sigma
            )));
        }
        if self.blur_radius > 32 {
            return Err(OverlayError::config(format!(
                "shadow blur_radius must be at most 32, got {}",
                self.blur_radius
            )));
        }
        for (name, value) in [("strength", self.strength), ("tone", self.tone)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OverlayError::config(format!(
                    "shadow {} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Shadow mask for a text mask: shifted, then blurred.
pub fn cast(mask: &GrayImage, config: &ShadowConfig) -> GrayImage {
    let shifted = shift(mask, config.offset_x, config.offset_y);
    if config.blur_radius == 0 {
        return shifted;
    }
    let kernel = gaussian_kernel_q16(config.blur_radius, config.sigma);
    blur(&shifted, &kernel)
}

/// Translate a mask; pixels shifted in from outside are empty.
fn shift(mask: &GrayImage, dx: i32, dy: i32) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let sx = x as i64 - dx as i64;
        let sy = y as i64 - dy as i64;
        if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
            image::Luma([0])
        } else {
            *mask.get_pixel(sx as u32, sy as u32)
        }
    })
}

/// Normalized Gaussian weights summing exactly to 1 << 16.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Vec<u32> {
    let r = radius as i32;
    let denom = 2.0 * sigma as f64 * sigma as f64;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-(i as f64 * i as f64) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push any rounding residue into the centre tap
    let acc: i64 = weights.iter().map(|w| *w as i64).sum();
    let mid = weights.len() / 2;
    weights[mid] = (weights[mid] as i64 + 65536 - acc).clamp(0, 65536) as u32;
    weights
}

fn blur(src: &GrayImage, kernel: &[u32]) -> GrayImage {
    let (width, height) = src.dimensions();
    let radius = (kernel.len() / 2) as i64;

    let horizontal = GrayImage::from_fn(width, height, |x, y| {
        let acc: u64 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sx = (x as i64 + k as i64 - radius).clamp(0, width as i64 - 1) as u32;
                *w as u64 * src.get_pixel(sx, y).0[0] as u64
            })
            .sum();
        image::Luma([q16_to_u8(acc)])
    });

    GrayImage::from_fn(width, height, |x, y| {
        let acc: u64 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sy = (y as i64 + k as i64 - radius).clamp(0, height as i64 - 1) as u32;
                *w as u64 * horizontal.get_pixel(x, sy).0[0] as u64
            })
            .sum();
        image::Luma([q16_to_u8(acc)])
    })
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_kernel_sums_to_one() {
        for (radius, sigma) in [(1, 0.5), (3, 1.5), (8, 4.0)] {
            let kernel = gaussian_kernel_q16(radius, sigma);
            assert_eq!(kernel.len(), 2 * radius as usize + 1);
            assert_eq!(kernel.iter().map(|w| *w as u64).sum::<u64>(), 65536);
            // Symmetric and peaked in the middle
            assert_eq!(kernel[0], kernel[kernel.len() - 1]);
            assert!(kernel[radius as usize] >= kernel[0]);
        }
    }

    #[test]
    fn test_constant_mask_unchanged_by_blur() {
        let mask = GrayImage::from_pixel(9, 7, Luma([200]));
        let blurred = blur(&mask, &gaussian_kernel_q16(3, 1.5));
        assert!(blurred.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn test_shift_moves_pixels() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(1, 1, Luma([255]));
        let shifted = shift(&mask, 2, 2);
        assert_eq!(shifted.get_pixel(3, 3).0[0], 255);
        assert_eq!(shifted.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn test_cast_spreads_and_offsets() {
        let mut mask = GrayImage::new(21, 21);
        mask.put_pixel(10, 10, Luma([255]));
        let shadow = cast(&mask, &ShadowConfig::default());
        let peak = shadow.get_pixel(12, 12).0[0];
        assert!(peak > 0 && peak < 255);
        assert!(shadow.get_pixel(13, 12).0[0] > 0);
        assert!(shadow.get_pixel(12, 12).0[0] >= shadow.get_pixel(14, 12).0[0]);
        assert_eq!(shadow.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_config_validation() {
        assert!(ShadowConfig::default().validate().is_ok());
        let config = ShadowConfig {
            strength: 1.5,
            ..ShadowConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ShadowConfig {
            sigma: 0.0,
            ..ShadowConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
