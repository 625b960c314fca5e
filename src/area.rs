//! Axis-aligned rectangular regions of interest.
//!
//! An [`Area`] uses inclusive raster coordinates. The external
//! representation is four `;`-separated integers (`"x0;y0;x1;y1"`). A
//! degenerate point (`x_min == x_max && y_min == y_max`) is the "not set"
//! sentinel used by region-scoped algorithms. Bounds are validated against
//! a concrete raster at the point of use, not at construction.

use std::fmt;
use std::str::FromStr;

use crate::error::TransformError;
use crate::raster::Raster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x_min: usize,
    pub y_min: usize,
    pub x_max: usize,
    pub y_max: usize,
}

impl Area {
    pub fn new(x_min: usize, y_min: usize, x_max: usize, y_max: usize) -> Self {
        Area {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// The "not set" sentinel: a degenerate point.
    pub fn is_empty(&self) -> bool {
        self.x_min == self.x_max && self.y_min == self.y_max
    }

    /// Width in pixels (inclusive bounds).
    pub fn width(&self) -> usize {
        self.x_max - self.x_min + 1
    }

    /// Height in pixels (inclusive bounds).
    pub fn height(&self) -> usize {
        self.y_max - self.y_min + 1
    }

    /// Validate ordering and raster bounds. When `require_non_empty` is
    /// set, the degenerate sentinel is rejected as well.
    pub fn check_within(
        &self,
        raster: &Raster,
        require_non_empty: bool,
    ) -> Result<(), TransformError> {
        if self.x_min > self.x_max || self.y_min > self.y_max {
            return Err(TransformError::InvalidArea(format!(
                "inverted bounds {self}"
            )));
        }
        if self.x_max >= raster.width() || self.y_max >= raster.height() {
            return Err(TransformError::InvalidArea(format!(
                "{self} exceeds raster {}x{}",
                raster.width(),
                raster.height()
            )));
        }
        if require_non_empty && self.is_empty() {
            return Err(TransformError::InvalidArea(format!("{self} is empty")));
        }
        Ok(())
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

impl FromStr for Area {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(';').collect();
        if parts.len() != 4 {
            return Err(format!("expected 4 ';'-separated integers, got {}", parts.len()));
        }
        let mut coords = [0usize; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            let v: i64 = part
                .trim()
                .parse()
                .map_err(|_| format!("'{part}' is not an integer"))?;
            if v < 0 {
                return Err(format!("coordinate {v} is negative"));
            }
            *slot = v as usize;
        }
        Ok(Area::new(coords[0], coords[1], coords[2], coords[3]))
    }
}
