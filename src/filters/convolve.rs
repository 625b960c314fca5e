//! Generic integer convolution with configurable border handling.
//!
//! The engine reads every neighborhood from an unmodified clone of the
//! source raster, accumulates per band in `i64`, divides by the sum of
//! the kernel coefficients actually used (truncating division) and clamps
//! the result into `[0, 255]` at the write. Rows are processed in
//! parallel: each rayon worker owns one output row of a flat buffer and
//! ticks the progress handle when its row completes.

use log::trace;
use ndarray::{Array2, Array3};
use rayon::prelude::*;

use crate::error::TransformError;
use crate::progress::ProgressHandle;
use crate::raster::{clamp_u8, Raster};

/// Rule for neighbor samples that fall outside the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// Leave border-ring pixels unchanged.
    Skip,
    /// Out-of-range neighbors contribute zero; divisor stays the full
    /// kernel sum.
    Zero,
    /// Out-of-range neighbors are excluded from both sum and divisor.
    Normalized,
    /// Mirror the coordinate across the edge.
    Reflect,
    /// Clamp the coordinate to the edge.
    Extend,
    /// Wrap the coordinate modulo the dimension.
    Wrap,
}

impl Border {
    pub const OPTIONS: &'static [&'static str] =
        &["skip", "zero", "normalized", "reflect", "extend", "wrap"];
}

impl std::str::FromStr for Border {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Border::Skip),
            "zero" => Ok(Border::Zero),
            "normalized" => Ok(Border::Normalized),
            "reflect" => Ok(Border::Reflect),
            "extend" => Ok(Border::Extend),
            "wrap" => Ok(Border::Wrap),
            _ => Err(format!("'{s}' is not a border policy")),
        }
    }
}

/// Square odd-sized integer kernel with its coefficient sum cached.
#[derive(Debug, Clone)]
pub struct Kernel {
    coef: Array2<i64>,
    sum: i64,
}

impl Kernel {
    fn from_coefficients(coef: Array2<i64>) -> Self {
        let sum = coef.iter().sum();
        Kernel { coef, sum }
    }

    /// All-ones mean filter kernel.
    pub fn mean(size: usize) -> Result<Self, TransformError> {
        check_size(size)?;
        Ok(Self::from_coefficients(Array2::ones((size, size))))
    }

    /// Integer-quantized 2-D Gaussian.
    ///
    /// The continuous kernel is normalized to sum 1, rescaled by the
    /// reciprocal of its corner value (capped at 1,000,000) and truncated
    /// to integers, trading a small quantization error for integer-only
    /// convolution arithmetic.
    pub fn gaussian(size: usize, sigma: f64) -> Result<Self, TransformError> {
        check_size(size)?;
        if sigma <= 0.0 {
            return Err(TransformError::InvalidKernel(format!(
                "sigma must be positive, got {sigma}"
            )));
        }
        let half = (size / 2) as i64;
        let mut continuous = Array2::<f64>::zeros((size, size));
        let mut sum = 0.0;
        for dy in -half..=half {
            for dx in -half..=half {
                let v = 1.0 / (2.0 * std::f64::consts::PI * sigma * sigma)
                    * (-((dx * dx + dy * dy) as f64) / (2.0 * sigma * sigma)).exp();
                continuous[[(dy + half) as usize, (dx + half) as usize]] = v;
                sum += v;
            }
        }
        continuous.mapv_inplace(|v| v / sum);

        // corner / corner is exactly 1.0; multiplying by a precomputed
        // reciprocal could truncate the smallest coefficient to 0.
        let corner = continuous[[0, 0]];
        let coef = if 1.0 / corner > 1_000_000.0 {
            continuous.mapv(|v| (v * 1_000_000.0) as i64)
        } else {
            continuous.mapv(|v| (v / corner) as i64)
        };
        Ok(Self::from_coefficients(coef))
    }

    pub fn size(&self) -> usize {
        self.coef.dim().0
    }

    pub(crate) fn half(&self) -> usize {
        self.size() / 2
    }

    #[inline]
    pub(crate) fn at(&self, kx: usize, ky: usize) -> i64 {
        self.coef[[ky, kx]]
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }
}

fn check_size(size: usize) -> Result<(), TransformError> {
    if size == 0 || size % 2 == 0 {
        return Err(TransformError::InvalidKernel(format!(
            "size must be odd and positive, got {size}"
        )));
    }
    Ok(())
}

/// Remap an out-of-range coordinate per policy; `None` drops the tap.
#[inline]
fn remap(coord: i64, len: i64, border: Border) -> Option<i64> {
    if (0..len).contains(&coord) {
        return Some(coord);
    }
    match border {
        Border::Extend => Some(coord.clamp(0, len - 1)),
        Border::Reflect => {
            let mirrored = if coord < 0 {
                -coord
            } else {
                (len - 1) - (coord - (len - 1))
            };
            Some(mirrored.clamp(0, len - 1))
        }
        Border::Wrap => Some(coord.rem_euclid(len)),
        Border::Zero | Border::Normalized | Border::Skip => None,
    }
}

/// Convolve the raster in place under the given border policy.
pub fn convolve(
    raster: &mut Raster,
    kernel: &Kernel,
    border: Border,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    if kernel.sum() == 0 {
        return Err(TransformError::InvalidKernel(
            "kernel coefficients sum to zero".to_string(),
        ));
    }
    trace!(
        "convolve {}x{} kernel (sum {}) border {:?}",
        kernel.size(),
        kernel.size(),
        kernel.sum(),
        border
    );

    let src = raster.clone();
    let (h, w, bands) = (raster.height(), raster.width(), raster.bands());
    let half = kernel.half();
    let size = kernel.size();

    let mut out = vec![0u8; h * w * bands];
    out.par_chunks_mut(w * bands)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let on_border = y < half || x < half || y + half >= h || x + half >= w;
                if on_border && border == Border::Skip {
                    for c in 0..bands {
                        row[x * bands + c] = src.sample(x, y, c);
                    }
                    continue;
                }

                let mut acc = [0i64; 3];
                let mut used = 0i64;
                for ky in 0..size {
                    for kx in 0..size {
                        let sy = y as i64 + ky as i64 - half as i64;
                        let sx = x as i64 + kx as i64 - half as i64;
                        let (Some(sy), Some(sx)) =
                            (remap(sy, h as i64, border), remap(sx, w as i64, border))
                        else {
                            continue;
                        };
                        let coef = kernel.at(kx, ky);
                        for (c, slot) in acc.iter_mut().enumerate().take(bands) {
                            *slot += src.sample(sx as usize, sy as usize, c) as i64 * coef;
                        }
                        used += coef;
                    }
                }
                let divisor = if border == Border::Normalized {
                    used
                } else {
                    kernel.sum()
                };
                for c in 0..bands {
                    let v = if divisor != 0 { acc[c] / divisor } else { 0 };
                    row[x * bands + c] = clamp_u8(v);
                }
            }
            progress.row_done();
        });

    let data = Array3::from_shape_vec((h, w, bands), out)
        .map_err(|e| TransformError::Internal(e.to_string()))?;
    raster.replace(data);
    Ok(())
}

const SOBEL_V: [[i64; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];
const SOBEL_H: [[i64; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Sobel gradient magnitude.
///
/// Works on the luminance derivation of the raster; the border ring
/// receives the plain luminance value, interior pixels the Euclidean
/// magnitude of the fixed horizontal/vertical kernel pair, clamped to
/// `[0, 255]` and written into every band.
pub fn sobel(raster: &mut Raster, progress: &ProgressHandle) -> Result<(), TransformError> {
    let gray = raster.luminance_plane();
    let (h, w, bands) = (raster.height(), raster.width(), raster.bands());

    let mut out = vec![0u8; h * w * bands];
    out.par_chunks_mut(w * bands)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let value = if y < 1 || x < 1 || y + 1 >= h || x + 1 >= w {
                    gray[[y, x]]
                } else {
                    let mut gx = 0i64;
                    let mut gy = 0i64;
                    for ky in 0..3 {
                        for kx in 0..3 {
                            let sample = gray[[y + ky - 1, x + kx - 1]] as i64;
                            gx += sample * SOBEL_H[ky][kx];
                            gy += sample * SOBEL_V[ky][kx];
                        }
                    }
                    clamp_u8(((gx * gx + gy * gy) as f64).sqrt() as i64)
                };
                for c in 0..bands {
                    row[x * bands + c] = value;
                }
            }
            progress.row_done();
        });

    let data = Array3::from_shape_vec((h, w, bands), out)
        .map_err(|e| TransformError::Internal(e.to_string()))?;
    raster.replace(data);
    Ok(())
}

/// Laplacian-style sharpening.
///
/// Applies the cross kernel `[0, -a, 0; -a, 1+4a, -a; 0, -a, 0]` in
/// floating point; the border ring is copied unchanged.
pub fn sharpen(
    raster: &mut Raster,
    amount: f64,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    let src = raster.clone();
    let (h, w, bands) = (raster.height(), raster.width(), raster.bands());
    let center = 1.0 + 4.0 * amount;

    let mut out = vec![0u8; h * w * bands];
    out.par_chunks_mut(w * bands)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                if y < 1 || x < 1 || y + 1 >= h || x + 1 >= w {
                    for c in 0..bands {
                        row[x * bands + c] = src.sample(x, y, c);
                    }
                    continue;
                }
                for c in 0..bands {
                    let v = src.sample(x, y, c) as f64 * center
                        - amount
                            * (src.sample(x, y - 1, c) as f64
                                + src.sample(x, y + 1, c) as f64
                                + src.sample(x - 1, y, c) as f64
                                + src.sample(x + 1, y, c) as f64);
                    row[x * bands + c] = v.clamp(0.0, 255.0) as u8;
                }
            }
            progress.row_done();
        });

    let data = Array3::from_shape_vec((h, w, bands), out)
        .map_err(|e| TransformError::Internal(e.to_string()))?;
    raster.replace(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Progress;

    fn gradient_raster(w: usize, h: usize) -> Raster {
        let mut r = Raster::new(w, h, 3).unwrap();
        for y in 0..h {
            for x in 0..w {
                let v = ((x * 40 + y * 17) % 256) as u8;
                r.set_rgb(x, y, [v, v.wrapping_add(10), v.wrapping_add(20)]);
            }
        }
        r
    }

    fn run(raster: &mut Raster, kernel: &Kernel, border: Border) {
        let handle = Progress::begin(raster.height());
        convolve(raster, kernel, border, &handle).unwrap();
        handle.finish();
    }

    #[test]
    fn mean_1x1_is_identity() {
        let mut r = gradient_raster(6, 5);
        let original = r.clone();
        run(&mut r, &Kernel::mean(1).unwrap(), Border::Zero);
        assert_eq!(r, original);
    }

    #[test]
    fn skip_leaves_border_ring_untouched() {
        let mut r = gradient_raster(7, 7);
        let original = r.clone();
        run(&mut r, &Kernel::mean(3).unwrap(), Border::Skip);
        for x in 0..7 {
            assert_eq!(r.rgb(x, 0), original.rgb(x, 0));
            assert_eq!(r.rgb(x, 6), original.rgb(x, 6));
        }
        for y in 0..7 {
            assert_eq!(r.rgb(0, y), original.rgb(0, y));
            assert_eq!(r.rgb(6, y), original.rgb(6, y));
        }
        // Interior must still change for a non-trivial kernel.
        assert_ne!(r.rgb(3, 3), original.rgb(3, 3));
    }

    #[test]
    fn zero_and_normalized_differ_at_corners() {
        let kernel = Kernel::gaussian(3, 1.0).unwrap();
        let mut zero = gradient_raster(6, 6);
        let mut norm = zero.clone();
        run(&mut zero, &kernel, Border::Zero);
        run(&mut norm, &kernel, Border::Normalized);
        assert_ne!(zero.rgb(0, 0), norm.rgb(0, 0));
    }

    #[test]
    fn extend_clamps_to_edge_on_flat_image() {
        // A flat image stays flat under every coordinate-remapping policy.
        let mut r = Raster::new(5, 5, 3).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                r.set_rgb(x, y, [90, 90, 90]);
            }
        }
        for border in [Border::Extend, Border::Reflect, Border::Wrap] {
            let mut img = r.clone();
            run(&mut img, &Kernel::mean(3).unwrap(), border);
            for y in 0..5 {
                for x in 0..5 {
                    assert_eq!(img.rgb(x, y), [90, 90, 90], "{border:?} at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn interior_mean_averages_neighborhood() {
        let mut r = Raster::new(3, 3, 3).unwrap();
        // Only center differs: 9-tap mean of eight 0s and one 90 is 10.
        r.set_rgb(1, 1, [90, 90, 90]);
        run(&mut r, &Kernel::mean(3).unwrap(), Border::Skip);
        assert_eq!(r.rgb(1, 1), [10, 10, 10]);
    }

    #[test]
    fn kernel_validation() {
        assert!(matches!(
            Kernel::mean(4),
            Err(TransformError::InvalidKernel(_))
        ));
        assert!(matches!(
            Kernel::mean(0),
            Err(TransformError::InvalidKernel(_))
        ));
        assert!(matches!(
            Kernel::gaussian(5, 0.0),
            Err(TransformError::InvalidKernel(_))
        ));
        assert!(matches!(
            Kernel::gaussian(2, 1.0),
            Err(TransformError::InvalidKernel(_))
        ));
    }

    #[test]
    fn gaussian_kernel_is_integer_quantized() {
        let k = Kernel::gaussian(3, 1.0).unwrap();
        assert_eq!(k.size(), 3);
        // Corner rescaled to 1 before truncation.
        assert_eq!(k.at(0, 0), 1);
        // Center dominates the corners.
        assert!(k.at(1, 1) > k.at(0, 0));
        assert_eq!(k.sum(), k.at(0, 0) * 4 + k.at(1, 0) * 4 + k.at(1, 1));
    }

    #[test]
    fn sobel_flat_image_keeps_luminance_everywhere() {
        let mut r = Raster::new(5, 4, 3).unwrap();
        for y in 0..4 {
            for x in 0..5 {
                r.set_rgb(x, y, [100, 100, 100]);
            }
        }
        let handle = Progress::begin(4);
        sobel(&mut r, &handle).unwrap();
        handle.finish();
        // Border keeps the luminance value, flat interior has zero gradient.
        assert_eq!(r.rgb(0, 0), [100, 100, 100]);
        assert_eq!(r.rgb(2, 1), [0, 0, 0]);
    }

    #[test]
    fn sobel_vertical_edge_lights_up() {
        let mut r = Raster::new(6, 6, 3).unwrap();
        for y in 0..6 {
            for x in 3..6 {
                r.set_rgb(x, y, [255, 255, 255]);
            }
        }
        let handle = Progress::begin(6);
        sobel(&mut r, &handle).unwrap();
        handle.finish();
        assert_eq!(r.rgb(3, 3), [255, 255, 255]);
        assert_eq!(r.rgb(1, 3), [0, 0, 0]);
    }

    #[test]
    fn sharpen_zero_amount_is_identity() {
        let mut r = gradient_raster(6, 6);
        let original = r.clone();
        let handle = Progress::begin(6);
        sharpen(&mut r, 0.0, &handle).unwrap();
        handle.finish();
        assert_eq!(r, original);
    }

    #[test]
    fn sharpen_amplifies_center_of_bright_spot() {
        let mut r = Raster::new(5, 5, 3).unwrap();
        r.set_rgb(2, 2, [100, 100, 100]);
        let handle = Progress::begin(5);
        sharpen(&mut r, 1.0, &handle).unwrap();
        handle.finish();
        // Center gains, orthogonal neighbors are pushed down to zero.
        assert_eq!(r.rgb(2, 2), [255, 255, 255]);
        assert_eq!(r.rgb(2, 1), [0, 0, 0]);
    }
}
