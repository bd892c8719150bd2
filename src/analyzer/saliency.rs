//! Saliency map: per-pixel estimate of visual clutter.
//!
//! Each pixel combines two normalized measurements on the BT.601 luminance
//! plane:
//!
//! - **Edge strength**: Sobel gradient magnitude with clamped borders,
//!   divided by the largest single-axis response an 8-bit image can produce.
//! - **Local variation**: luminance standard deviation over a square window
//!   (radius scales with the image, 1..=7 px), computed from integral images.
//!
//! Values lie in [0, 1]; higher means busier and less suitable for text.
//! Rows are computed in parallel with rayon, but every pixel depends only on
//! the input, so the map is identical to a sequential computation.

use image::RgbImage;
use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::error::OverlayError;
use crate::grid::CellRect;

/// Largest |gx| of a 3x3 Sobel kernel on 8-bit input (4 * 255).
const EDGE_NORM: f32 = 1020.0;

/// Standard deviation treated as fully busy.
const LOCAL_STD_NORM: f32 = 64.0;

/// Share of the edge term in the final value; the rest is local variation.
const EDGE_SHARE: f32 = 0.5;

const MAX_WINDOW_RADIUS: u32 = 7;

#[derive(Debug, Clone)]
pub struct SaliencyMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl SaliencyMap {
    /// Compute the map, polling `token` once per row.
    pub fn compute(
        image: &RgbImage,
        token: Option<&CancellationToken>,
    ) -> Result<Self, OverlayError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OverlayError::invalid_input("Cannot compute saliency of an empty image"));
        }

        let cancelled = || token.map(CancellationToken::is_cancelled).unwrap_or(false);
        if cancelled() {
            return Err(OverlayError::Cancelled);
        }

        let luma = luminance_plane(image);
        let integral = Integral::new(&luma, width, height);
        let radius = window_radius(width, height);

        let mut values = vec![0.0f32; width as usize * height as usize];
        values
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                if cancelled() {
                    return;
                }
                let y = y as u32;
                for (x, value) in row.iter_mut().enumerate() {
                    let x = x as u32;
                    let edge = sobel_magnitude(&luma, width, height, x, y) / EDGE_NORM;
                    let spread = integral.std_dev(x, y, radius) / LOCAL_STD_NORM;
                    *value = (EDGE_SHARE * edge.min(1.0) + (1.0 - EDGE_SHARE) * spread.min(1.0))
                        .clamp(0.0, 1.0);
                }
            });

        if cancelled() {
            return Err(OverlayError::Cancelled);
        }

        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    /// Mean saliency inside `rect`; 0.0 for an empty rectangle.
    pub fn mean_in(&self, rect: &CellRect) -> f64 {
        if rect.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0f64;
        for y in rect.y..rect.y + rect.height {
            let start = (y * self.width + rect.x) as usize;
            let row = &self.values[start..start + rect.width as usize];
            sum += row.iter().map(|v| *v as f64).sum::<f64>();
        }
        sum / rect.area() as f64
    }
}

/// Convert to grayscale using ITU-R BT.601 luminance.
fn luminance_plane(image: &RgbImage) -> Vec<f32> {
    image
        .pixels()
        .map(|p| 0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
        .collect()
}

fn window_radius(width: u32, height: u32) -> u32 {
    (width.min(height) / 64).clamp(1, MAX_WINDOW_RADIUS)
}

fn sobel_magnitude(luma: &[f32], width: u32, height: u32, x: u32, y: u32) -> f32 {
    let at = |dx: i64, dy: i64| {
        let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as usize;
        let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as usize;
        luma[sy * width as usize + sx]
    };

    let gx = (at(1, -1) + 2.0 * at(1, 0) + at(1, 1)) - (at(-1, -1) + 2.0 * at(-1, 0) + at(-1, 1));
    let gy = (at(-1, 1) + 2.0 * at(0, 1) + at(1, 1)) - (at(-1, -1) + 2.0 * at(0, -1) + at(1, -1));
    (gx * gx + gy * gy).sqrt()
}

/// Summed-area tables of luminance and squared luminance.
struct Integral {
    stride: usize,
    width: u32,
    height: u32,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Integral {
    fn new(luma: &[f32], width: u32, height: u32) -> Self {
        let stride = width as usize + 1;
        let mut sum = vec![0.0f64; stride * (height as usize + 1)];
        let mut sum_sq = vec![0.0f64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row_sum = 0.0f64;
            let mut row_sq = 0.0f64;
            for x in 0..width as usize {
                let v = luma[y * width as usize + x] as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sum_sq[idx] = sum_sq[idx - stride] + row_sq;
            }
        }

        Self {
            stride,
            width,
            height,
            sum,
            sum_sq,
        }
    }

    fn std_dev(&self, x: u32, y: u32, radius: u32) -> f32 {
        let x0 = x.saturating_sub(radius) as usize;
        let y0 = y.saturating_sub(radius) as usize;
        let x1 = (x + radius + 1).min(self.width) as usize;
        let y1 = (y + radius + 1).min(self.height) as usize;
        let n = ((x1 - x0) * (y1 - y0)) as f64;

        let rect = |table: &[f64]| {
            table[y1 * self.stride + x1] - table[y0 * self.stride + x1]
                - table[y1 * self.stride + x0]
                + table[y0 * self.stride + x0]
        };

        let mean = rect(&self.sum) / n;
        let variance = rect(&self.sum_sq) / n - mean * mean;
        variance.max(0.0).sqrt() as f32
    }
}
