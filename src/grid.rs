//! Canonical 3x3 placement grid.
//!
//! Both the analyzer and the compositor resolve positions to pixel
//! rectangles through [`partition`], so a font size recommended for a cell
//! is always computed against the same geometry the text is later drawn in.
//!
//! # Partitioning
//!
//! Each axis is split into three spans of `len / 3` pixels; the remainder
//! (1 or 2 pixels) is appended to the last span. A 10px wide image yields
//! columns of 3, 3 and 4 pixels. Images narrower than 3px produce empty
//! cells, which callers must treat as degenerate rather than skip.
//!
//! # Example
//!
//! ```ignore
//! use textoverlay::grid::{cell_rect, Position};
//!
//! let rect = cell_rect(Position::BottomRight, 800, 600);
//! assert_eq!((rect.x, rect.y, rect.width, rect.height), (532, 400, 268, 200));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OverlayError;

/// One of the nine canonical grid cells.
///
/// The set is closed; variants are declared in row-major order, which is
/// also the order used when serializing a full placement result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Position {
    /// All positions in row-major order.
    pub const ALL: [Position; 9] = [
        Position::TopLeft,
        Position::TopCenter,
        Position::TopRight,
        Position::CenterLeft,
        Position::Center,
        Position::CenterRight,
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopCenter => "top_center",
            Self::TopRight => "top_right",
            Self::CenterLeft => "center_left",
            Self::Center => "center",
            Self::CenterRight => "center_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }

    /// Column index (0 = left, 2 = right).
    pub fn column(&self) -> usize {
        self.index() % 3
    }

    /// Row index (0 = top, 2 = bottom).
    pub fn row(&self) -> usize {
        self.index() / 3
    }

    /// Row-major index into [`Position::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Whether the cell shares its left or right edge with the image border.
    pub fn touches_vertical_border(&self) -> bool {
        self.column() != 1
    }

    /// Whether the cell shares its top or bottom edge with the image border.
    pub fn touches_horizontal_border(&self) -> bool {
        self.row() != 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = OverlayError;

    /// Accepts `bottom_right`, `bottom-right` and `Bottom Right`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Position::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| OverlayError::invalid_input(format!("Unknown position '{}'", s)))
    }
}

/// Pixel rectangle of a grid cell. May be empty for tiny images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// Split one axis into three spans, remainder appended to the last.
fn spans(len: u32) -> [(u32, u32); 3] {
    let base = len / 3;
    [(0, base), (base, base), (2 * base, len - 2 * base)]
}

/// Partition an image into the nine cells, indexed like [`Position::ALL`].
pub fn partition(width: u32, height: u32) -> [CellRect; 9] {
    let cols = spans(width);
    let rows = spans(height);

    Position::ALL.map(|p| {
        let (x, w) = cols[p.column()];
        let (y, h) = rows[p.row()];
        CellRect {
            x,
            y,
            width: w,
            height: h,
        }
    })
}

/// Pixel rectangle of a single position.
pub fn cell_rect(position: Position, width: u32, height: u32) -> CellRect {
    partition(width, height)[position.index()]
}

/// Clamp a box's top-left corner so that the box stays inside the image.
///
/// If the box is larger than the image along an axis, that axis is pinned
/// to 0 so the overflow happens on the far side only.
pub fn clamp_to_bounds(
    x: f32,
    y: f32,
    box_w: f32,
    box_h: f32,
    width: u32,
    height: u32,
) -> (f32, f32) {
    let max_x = (width as f32 - box_w).max(0.0);
    let max_y = (height as f32 - box_h).max(0.0);
    (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}
