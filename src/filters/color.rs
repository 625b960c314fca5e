//! Color-model conversions and per-pixel color filters.
//!
//! HSV here uses hue in degrees `[0, 360)`, saturation in `[0, 1]` and
//! value in the 8-bit pixel range `[0, 255]`; keeping value in pixel
//! units avoids a rescale step on every conversion. Round-trips stay
//! within one count per channel for every valid RGB triple.

use rayon::prelude::*;

use crate::progress::ProgressHandle;
use crate::raster::{clamp_u8, luminance, Raster};

// ============================================================================
// RGB <-> HSV
// ============================================================================

/// Convert an RGB triple to `(hue, saturation, value)`.
///
/// Grayscale (`max == min`) pixels report hue 0; black reports
/// saturation 0.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = (max - min) as f32;

    let h = if max == min {
        0.0
    } else if max == r {
        (60.0 * (g - b) as f32 / d + 360.0) % 360.0
    } else if max == g {
        60.0 * (b - r) as f32 / d + 120.0
    } else {
        60.0 * (r - g) as f32 / d + 240.0
    };
    let s = if max == 0 {
        0.0
    } else {
        1.0 - min as f32 / max as f32
    };
    (h, s, max as f32)
}

/// Convert `(hue, saturation, value)` back to an RGB triple.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let sector = (h / 60.0).floor();
    let f = h / 60.0 - sector;
    let l = v * (1.0 - s);
    let m = v * (1.0 - f * s);
    let n = v * (1.0 - (1.0 - f) * s);
    let [r, g, b] = match (sector as i32).rem_euclid(6) {
        0 => [v, n, l],
        1 => [m, v, l],
        2 => [l, v, n],
        3 => [l, m, v],
        4 => [n, l, v],
        _ => [v, l, m],
    };
    [r.round() as u8, g.round() as u8, b.round() as u8]
}

// ============================================================================
// Row-parallel per-pixel filters
// ============================================================================

/// Run `op` over every row in parallel, writing whole rows of a fresh
/// buffer, then swap the buffer into the raster. `op` receives `(x, y,
/// rgb)` and returns the replacement triple.
fn for_each_pixel<F>(raster: &mut Raster, progress: &ProgressHandle, op: F)
where
    F: Fn(usize, usize, [u8; 3]) -> [u8; 3] + Sync,
{
    let (h, w, bands) = (raster.height(), raster.width(), raster.bands());
    let src = raster.clone();

    let mut out = vec![0u8; h * w * bands];
    out.par_chunks_mut(w * bands)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let rgb = op(x, y, src.rgb(x, y));
                if bands == 1 {
                    row[x] = rgb[0];
                } else {
                    row[x * bands] = rgb[0];
                    row[x * bands + 1] = rgb[1];
                    row[x * bands + 2] = rgb[2];
                }
            }
            progress.row_done();
        });

    let data = ndarray::Array3::from_shape_vec((h, w, bands), out)
        .unwrap_or_else(|_| src.as_array().clone());
    raster.replace(data);
}

/// Shift every band by `delta`, saturating at 0 and 255.
pub fn luminosity(raster: &mut Raster, delta: i32, progress: &ProgressHandle) {
    for_each_pixel(raster, progress, |_, _, rgb| {
        rgb.map(|v| clamp_u8(v as i64 + delta as i64))
    });
}

/// Replace every pixel's hue, keeping saturation and value.
/// No-op on grayscale rasters.
pub fn hue_filter(raster: &mut Raster, hue: i32, progress: &ProgressHandle) {
    if raster.bands() == 1 {
        return;
    }
    for_each_pixel(raster, progress, |_, _, [r, g, b]| {
        let (_, s, v) = rgb_to_hsv(r, g, b);
        hsv_to_rgb(hue as f32, s, v)
    });
}

/// Scale every pixel's saturation by `factor`, clamped to `[0, 1]`.
/// No-op on grayscale rasters.
pub fn saturation(raster: &mut Raster, factor: f64, progress: &ProgressHandle) {
    if raster.bands() == 1 {
        return;
    }
    for_each_pixel(raster, progress, |_, _, [r, g, b]| {
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let s = (s * factor as f32).clamp(0.0, 1.0);
        hsv_to_rgb(h, s, v)
    });
}

/// Invert every band.
pub fn negative(raster: &mut Raster, progress: &ProgressHandle) {
    for_each_pixel(raster, progress, |_, _, rgb| rgb.map(|v| 255 - v));
}

/// Classic sepia color matrix, clamped per band.
/// No-op on grayscale rasters.
pub fn sepia(raster: &mut Raster, progress: &ProgressHandle) {
    if raster.bands() == 1 {
        return;
    }
    for_each_pixel(raster, progress, |_, _, [r, g, b]| {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        [
            clamp_u8((0.393 * r + 0.769 * g + 0.189 * b) as i64),
            clamp_u8((0.349 * r + 0.686 * g + 0.168 * b) as i64),
            clamp_u8((0.272 * r + 0.534 * g + 0.131 * b) as i64),
        ]
    });
}

/// Darken toward the raster edges with a quadratic radial falloff.
/// `strength` 0 leaves the raster untouched; 1 drives the far corners to
/// black.
pub fn vignette(raster: &mut Raster, strength: f64, progress: &ProgressHandle) {
    let (w, h) = (raster.width() as f64, raster.height() as f64);
    let cx = (w - 1.0) / 2.0;
    let cy = (h - 1.0) / 2.0;
    let max_dist_sq = (cx * cx + cy * cy).max(1.0);

    for_each_pixel(raster, progress, |x, y, rgb| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let falloff = 1.0 - strength * (dx * dx + dy * dy) / max_dist_sq;
        rgb.map(|v| clamp_u8((v as f64 * falloff).round() as i64))
    });
}

// ============================================================================
// Selective recoloring
// ============================================================================

/// 60-degree color wheel bases addressable as recolor targets. `grey`
/// replaces matched pixels with their luminance instead of re-hueing.
pub const RECOLOR_TARGETS: &[&str] =
    &["red", "yellow", "green", "cyan", "blue", "magenta", "grey"];

fn target_base(target: &str) -> f32 {
    match target {
        "yellow" => 60.0,
        "green" => 120.0,
        "cyan" => 180.0,
        "blue" => 240.0,
        "magenta" => 300.0,
        _ => 0.0,
    }
}

/// Largest multiple of 60 strictly more than 60 below `h`.
fn hue_floor(h: f32) -> f32 {
    let mut floor = 0.0;
    while floor + 60.0 < h {
        floor += 60.0;
    }
    floor
}

/// Re-hue (or keep) every pixel whose hue falls within `range` degrees of
/// the reference color's hue.
///
/// With `keep` false, matched pixels move to the target color (their
/// shade within the 60-degree band is preserved); with `keep` true,
/// matched pixels stay and everything else moves. When the hue window
/// wraps past 360 the bounds are swapped and `keep` inverted, which
/// normalizes the window without changing its meaning.
pub fn recolor(
    raster: &mut Raster,
    reference: [u8; 3],
    range: i32,
    target: &str,
    keep: bool,
    progress: &ProgressHandle,
) {
    if raster.bands() == 1 {
        return;
    }
    let (ref_hue, _, _) = rgb_to_hsv(reference[0], reference[1], reference[2]);
    let mut lo = (ref_hue - range as f32 + 360.0) % 360.0;
    let mut hi = (ref_hue + range as f32) % 360.0;
    let mut keep = keep;
    if lo > hi {
        std::mem::swap(&mut lo, &mut hi);
        keep = !keep;
    }
    let delta = target_base(target);
    let to_grey = target == "grey";

    for_each_pixel(raster, progress, |_, _, [r, g, b]| {
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let inside = h >= lo && h < hi;
        if inside == keep {
            return [r, g, b];
        }
        if to_grey {
            let gl = luminance(r, g, b);
            [gl, gl, gl]
        } else {
            let shade = h - hue_floor(h);
            hsv_to_rgb(shade + delta, s, v)
        }
    });
}
