//! Region engine: crop/paste plumbing and area deletion with refill.
//!
//! Deletion supports directional fills (mirror the coordinate across the
//! named edge of the area, clamped to the raster) and a content-aware
//! mode that reconstructs the blanked area from its real boundary: the
//! area is traversed as a shrinking rectangular ring, and every boundary
//! pixel becomes the Gaussian-weighted average of neighbors that are
//! either outside the area or already reconstructed. Ring traversal order
//! is fixed (top edge left to right, right edge top to bottom, bottom
//! edge right to left, left edge bottom to top) and each corner belongs
//! to the first edge that reaches it.

use std::collections::HashMap;

use log::debug;
use ndarray::s;

use crate::area::Area;
use crate::error::TransformError;
use crate::filters::convolve::Kernel;
use crate::raster::{clamp_u8, Raster};

/// Refill policy for [`delete_area`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Zero the area.
    Skip,
    /// Content-aware spiral reconstruction.
    Convolution,
    /// Mirror across the left edge.
    Left,
    /// Mirror across the right edge.
    Right,
    /// Mirror across the top edge.
    Top,
    /// Mirror across the bottom edge.
    Bottom,
}

impl Fill {
    pub const OPTIONS: &'static [&'static str] =
        &["skip", "convolution", "left", "right", "top", "bottom"];
}

impl std::str::FromStr for Fill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Fill::Skip),
            "convolution" => Ok(Fill::Convolution),
            "left" => Ok(Fill::Left),
            "right" => Ok(Fill::Right),
            "top" => Ok(Fill::Top),
            "bottom" => Ok(Fill::Bottom),
            _ => Err(format!("'{s}' is not a fill policy")),
        }
    }
}

/// Copy the area out of the raster into a new raster of the area's size.
pub(crate) fn extract(raster: &Raster, area: &Area) -> Result<Raster, TransformError> {
    let sub = raster
        .as_array()
        .slice(s![area.y_min..=area.y_max, area.x_min..=area.x_max, ..])
        .to_owned();
    Raster::from_array(sub)
}

/// Write `sub` back into the raster at the area's offset. Caller
/// guarantees matching dimensions.
pub(crate) fn paste(raster: &mut Raster, sub: &Raster, area: &Area) {
    raster
        .as_array_mut()
        .slice_mut(s![area.y_min..=area.y_max, area.x_min..=area.x_max, ..])
        .assign(sub.as_array());
}

/// Shrink the raster to the area.
pub fn crop(raster: &mut Raster, area: &Area) -> Result<(), TransformError> {
    area.check_within(raster, true)?;
    let sub = extract(raster, area)?;
    debug!(
        "crop {}x{} -> {}x{}",
        raster.width(),
        raster.height(),
        sub.width(),
        sub.height()
    );
    raster.replace(sub.as_array().clone());
    Ok(())
}

/// Remove the area's contents and refill per policy.
pub fn delete_area(raster: &mut Raster, area: &Area, fill: Fill) -> Result<(), TransformError> {
    area.check_within(raster, true)?;
    debug!("delete_area {area} fill {fill:?}");
    match fill {
        Fill::Skip => {
            for y in area.y_min..=area.y_max {
                for x in area.x_min..=area.x_max {
                    raster.set_rgb(x, y, [0, 0, 0]);
                }
            }
            Ok(())
        }
        Fill::Left | Fill::Right | Fill::Top | Fill::Bottom => {
            directional_fill(raster, area, fill);
            Ok(())
        }
        Fill::Convolution => spiral_fill(raster, area),
    }
}

fn directional_fill(raster: &mut Raster, area: &Area, fill: Fill) {
    let (w, h) = (raster.width() as i64, raster.height() as i64);
    for y in area.y_min..=area.y_max {
        for x in area.x_min..=area.x_max {
            let (sx, sy) = match fill {
                Fill::Left => ((2 * area.x_min as i64 - x as i64).max(0), y as i64),
                Fill::Right => ((2 * area.x_max as i64 - x as i64).min(w - 1), y as i64),
                Fill::Top => (x as i64, (2 * area.y_min as i64 - y as i64).max(0)),
                Fill::Bottom => (x as i64, (2 * area.y_max as i64 - y as i64).min(h - 1)),
                Fill::Skip | Fill::Convolution => (x as i64, y as i64),
            };
            let rgb = raster.rgb(sx as usize, sy as usize);
            raster.set_rgb(x, y, rgb);
        }
    }
}

/// Collision-free key for a pixel position: the Cantor pairing of
/// `(x, y)` is a bijection over coordinate pairs.
#[inline]
fn pair_key(x: u64, y: u64) -> u64 {
    y + (x + y) * (x + y + 1) / 2
}

/// True when `(x, y)` may contribute to a reconstruction average: any
/// in-raster pixel outside the area, or an area pixel already resolved.
fn contributes(
    raster: &Raster,
    x: i64,
    y: i64,
    area: &Area,
    resolved: &HashMap<u64, bool>,
) -> bool {
    if x < 0 || x >= raster.width() as i64 || y < 0 || y >= raster.height() as i64 {
        return false;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= area.x_min && x <= area.x_max && y >= area.y_min && y <= area.y_max {
        return *resolved.get(&pair_key(x as u64, y as u64)).unwrap_or(&false);
    }
    true
}

fn reconstruction_value(
    raster: &Raster,
    x: i64,
    y: i64,
    area: &Area,
    kernel: &Kernel,
    resolved: &HashMap<u64, bool>,
) -> [u8; 3] {
    let half = kernel.half() as i64;
    let mut acc = [0i64; 3];
    let mut used = 0i64;
    for dy in -half..=half {
        for dx in -half..=half {
            let (sx, sy) = (x + dx, y + dy);
            if !contributes(raster, sx, sy, area, resolved) {
                continue;
            }
            let coef = kernel.at((dx + half) as usize, (dy + half) as usize);
            let rgb = raster.rgb(sx as usize, sy as usize);
            for (slot, v) in acc.iter_mut().zip(rgb) {
                *slot += v as i64 * coef;
            }
            used += coef;
        }
    }
    if used == 0 {
        return [0, 0, 0];
    }
    [
        clamp_u8(acc[0] / used),
        clamp_u8(acc[1] / used),
        clamp_u8(acc[2] / used),
    ]
}

fn spiral_fill(raster: &mut Raster, area: &Area) -> Result<(), TransformError> {
    let kernel = Kernel::gaussian(5, 1.0)?;

    let mut resolved: HashMap<u64, bool> = HashMap::new();
    for y in area.y_min..=area.y_max {
        for x in area.x_min..=area.x_max {
            resolved.insert(pair_key(x as u64, y as u64), false);
            raster.set_rgb(x, y, [0, 0, 0]);
        }
    }

    let resolve = |raster: &mut Raster, x: i64, y: i64, resolved: &mut HashMap<u64, bool>| {
        let rgb = reconstruction_value(raster, x, y, area, &kernel, resolved);
        raster.set_rgb(x as usize, y as usize, rgb);
        resolved.insert(pair_key(x as u64, y as u64), true);
    };

    let mut xs = area.x_min as i64;
    let mut ys = area.y_min as i64;
    let mut xe = area.x_max as i64;
    let mut ye = area.y_max as i64;

    while xs <= xe && ys <= ye {
        for x in xs..=xe {
            resolve(raster, x, ys, &mut resolved);
        }
        for y in ys + 1..=ye {
            resolve(raster, xe, y, &mut resolved);
        }
        if ys < ye {
            for x in (xs..xe).rev() {
                resolve(raster, x, ye, &mut resolved);
            }
        }
        if xs < xe {
            for y in (ys + 1..ye).rev() {
                resolve(raster, xs, y, &mut resolved);
            }
        }
        xs += 1;
        ys += 1;
        xe -= 1;
        ye -= 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: usize, h: usize, v: u8) -> Raster {
        let mut r = Raster::new(w, h, 3).unwrap();
        for y in 0..h {
            for x in 0..w {
                r.set_rgb(x, y, [v, v, v]);
            }
        }
        r
    }

    fn coordinate_raster(w: usize, h: usize) -> Raster {
        let mut r = Raster::new(w, h, 3).unwrap();
        for y in 0..h {
            for x in 0..w {
                r.set_rgb(x, y, [(x * 10) as u8, (y * 10) as u8, 7]);
            }
        }
        r
    }

    #[test]
    fn crop_takes_area_dimensions_and_origin() {
        let mut r = coordinate_raster(12, 10);
        let area = Area::new(3, 2, 8, 6);
        crop(&mut r, &area).unwrap();
        assert_eq!((r.width(), r.height()), (6, 5));
        assert_eq!(r.rgb(0, 0), [30, 20, 7]);
        assert_eq!(r.rgb(5, 4), [80, 60, 7]);
    }

    #[test]
    fn crop_rejects_out_of_bounds_and_empty() {
        let mut r = coordinate_raster(8, 8);
        assert!(matches!(
            crop(&mut r, &Area::new(0, 0, 8, 4)),
            Err(TransformError::InvalidArea(_))
        ));
        assert!(matches!(
            crop(&mut r, &Area::new(2, 2, 2, 2)),
            Err(TransformError::InvalidArea(_))
        ));
        // The failed calls must not have shrunk the raster.
        assert_eq!((r.width(), r.height()), (8, 8));
    }

    #[test]
    fn skip_zeroes_inside_only() {
        let mut r = flat(8, 8, 200);
        let area = Area::new(2, 2, 5, 5);
        delete_area(&mut r, &area, Fill::Skip).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..=5).contains(&x) && (2..=5).contains(&y);
                let expected = if inside { [0, 0, 0] } else { [200, 200, 200] };
                assert_eq!(r.rgb(x, y), expected, "at ({x},{y})");
            }
        }
    }

    #[test]
    fn left_fill_mirrors_across_left_edge() {
        let mut r = coordinate_raster(12, 4);
        let area = Area::new(4, 1, 6, 2);
        delete_area(&mut r, &area, Fill::Left).unwrap();
        // x=5 mirrors to x=3, x=6 to x=2; band 0 carries 10*x.
        assert_eq!(r.rgb(5, 1)[0], 30);
        assert_eq!(r.rgb(6, 1)[0], 20);
        // Outside untouched.
        assert_eq!(r.rgb(7, 1)[0], 70);
    }

    #[test]
    fn top_fill_clamps_at_raster_edge() {
        let mut r = coordinate_raster(6, 6);
        let area = Area::new(1, 0, 3, 2);
        delete_area(&mut r, &area, Fill::Top).unwrap();
        // Mirror of y=2 across y_min=0 is -2, clamped to row 0.
        assert_eq!(r.rgb(2, 2)[1], 0);
    }

    #[test]
    fn convolution_fill_restores_flat_content_exactly() {
        let mut r = flat(10, 10, 100);
        let area = Area::new(3, 3, 6, 6);
        delete_area(&mut r, &area, Fill::Convolution).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(r.rgb(x, y), [100, 100, 100], "at ({x},{y})");
            }
        }
    }

    #[test]
    fn convolution_fill_is_deterministic() {
        let mut a = coordinate_raster(16, 12);
        let mut b = a.clone();
        let area = Area::new(4, 3, 11, 8);
        delete_area(&mut a, &area, Fill::Convolution).unwrap();
        delete_area(&mut b, &area, Fill::Convolution).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn convolution_fill_resolves_every_pixel() {
        let mut r = flat(9, 9, 180);
        // 1-wide strip and a single-row strip exercise the degenerate
        // ring shapes.
        delete_area(&mut r, &Area::new(4, 1, 4, 6), Fill::Convolution).unwrap();
        delete_area(&mut r, &Area::new(1, 8, 6, 8), Fill::Convolution).unwrap();
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(r.rgb(x, y), [180, 180, 180], "at ({x},{y})");
            }
        }
    }

    #[test]
    fn convolution_fill_blends_toward_surroundings() {
        // Left half dark, right half bright; the refilled band must end
        // up between the two, darker on the left side of the area.
        let mut r = Raster::new(12, 8, 3).unwrap();
        for y in 0..8 {
            for x in 0..12 {
                let v = if x < 6 { 40 } else { 220 };
                r.set_rgb(x, y, [v, v, v]);
            }
        }
        let area = Area::new(4, 2, 7, 5);
        delete_area(&mut r, &area, Fill::Convolution).unwrap();
        let left = r.rgb(4, 3)[0] as i32;
        let right = r.rgb(7, 3)[0] as i32;
        assert!(left < right, "left {left} right {right}");
        assert!(left >= 40 && right <= 220);
    }

    #[test]
    fn pair_key_is_injective_over_a_window() {
        let mut seen = std::collections::HashSet::new();
        for x in 0..64u64 {
            for y in 0..64u64 {
                assert!(seen.insert(pair_key(x, y)), "collision at ({x},{y})");
            }
        }
    }

    #[test]
    fn delete_area_validates_bounds() {
        let mut r = flat(6, 6, 10);
        assert!(matches!(
            delete_area(&mut r, &Area::new(0, 0, 6, 3), Fill::Skip),
            Err(TransformError::InvalidArea(_))
        ));
        assert!(matches!(
            delete_area(&mut r, &Area::new(1, 1, 1, 1), Fill::Skip),
            Err(TransformError::InvalidArea(_))
        ));
    }
}
