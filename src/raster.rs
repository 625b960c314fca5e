//! In-memory multi-band raster.
//!
//! A [`Raster`] is a `(height, width, bands)` grid of 8-bit samples with
//! 1 band (grayscale) or 3 bands (RGB). All bands share the same
//! dimensions and every sample stays in `[0, 255]`. Transforms mutate the
//! raster in place; transforms that read a pixel neighborhood clone the
//! raster first so per-pixel computation sees stable source data.

use ndarray::{s, Array2, Array3};

use crate::error::TransformError;

/// Luminance of an RGB triple: `0.3 R + 0.59 G + 0.11 B`, truncated.
/// Integer hundredths keep the result exact for flat inputs.
#[inline]
pub(crate) fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((30 * r as u32 + 59 * g as u32 + 11 * b as u32) / 100) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    data: Array3<u8>,
}

impl Raster {
    /// Create an all-zero raster. Bands must be 1 or 3.
    pub fn new(width: usize, height: usize, bands: usize) -> Result<Self, TransformError> {
        if bands != 1 && bands != 3 {
            return Err(TransformError::Internal(format!(
                "unsupported band count {bands}"
            )));
        }
        if width == 0 || height == 0 {
            return Err(TransformError::Internal(format!(
                "degenerate raster {width}x{height}"
            )));
        }
        Ok(Raster {
            data: Array3::zeros((height, width, bands)),
        })
    }

    /// Wrap an existing `(height, width, bands)` sample grid.
    pub fn from_array(data: Array3<u8>) -> Result<Self, TransformError> {
        let (h, w, bands) = data.dim();
        if bands != 1 && bands != 3 {
            return Err(TransformError::Internal(format!(
                "unsupported band count {bands}"
            )));
        }
        if w == 0 || h == 0 {
            return Err(TransformError::Internal(format!("degenerate raster {w}x{h}")));
        }
        Ok(Raster { data })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    /// RGB triple at `(x, y)`. Grayscale rasters replicate band 0.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        if self.bands() == 1 {
            let v = self.data[[y, x, 0]];
            [v, v, v]
        } else {
            [
                self.data[[y, x, 0]],
                self.data[[y, x, 1]],
                self.data[[y, x, 2]],
            ]
        }
    }

    /// Write an RGB triple at `(x, y)`. Grayscale rasters take `rgb[0]`.
    #[inline]
    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if self.bands() == 1 {
            self.data[[y, x, 0]] = rgb[0];
        } else {
            self.data[[y, x, 0]] = rgb[0];
            self.data[[y, x, 1]] = rgb[1];
            self.data[[y, x, 2]] = rgb[2];
        }
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize, band: usize) -> u8 {
        self.data[[y, x, band]]
    }

    #[inline]
    pub fn set_sample(&mut self, x: usize, y: usize, band: usize, value: u8) {
        self.data[[y, x, band]] = value;
    }

    /// Single-band luminance plane (`0.3 R + 0.59 G + 0.11 B`, truncated).
    /// For grayscale input this is a copy of band 0.
    pub fn luminance_plane(&self) -> Array2<u8> {
        let (h, w, bands) = self.data.dim();
        if bands == 1 {
            return self.data.slice(s![.., .., 0]).to_owned();
        }
        let mut plane = Array2::<u8>::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                let [r, g, b] = self.rgb(x, y);
                plane[[y, x]] = luminance(r, g, b);
            }
        }
        plane
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array3<u8> {
        &mut self.data
    }

    /// Replace the raster's contents wholesale (used by crop and the
    /// flat-buffer row-parallel filters).
    pub(crate) fn replace(&mut self, data: Array3<u8>) {
        self.data = data;
    }
}

/// Clamp an integer band value into the 8-bit sample range.
#[inline]
pub(crate) fn clamp_u8(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}
