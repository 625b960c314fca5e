//! Histogram equalization over the luminance distribution.
//!
//! The tally phase is a rayon fold/reduce: every worker accumulates a
//! private 256-bin histogram over its rows and the partials are merged
//! afterward, so counts are deterministic without locking. The cumulative
//! distribution then becomes a 256-entry LUT applied to every band.

use log::debug;
use rayon::prelude::*;

use crate::error::TransformError;
use crate::progress::ProgressHandle;
use crate::raster::Raster;

/// Equalize the raster's histogram in place.
///
/// A raster with a single populated luminance level is left untouched:
/// equalization of a flat image is the identity.
pub fn equalize(raster: &mut Raster, progress: &ProgressHandle) -> Result<(), TransformError> {
    let gray = raster.luminance_plane();
    let (h, w) = (raster.height(), raster.width());
    let total = (h * w) as i64;

    let flat = gray.as_slice().ok_or_else(|| {
        TransformError::Internal("luminance plane is not contiguous".to_string())
    })?;
    let histogram = flat
        .par_chunks(w)
        .fold(
            || [0i64; 256],
            |mut tally, row| {
                for &v in row {
                    tally[v as usize] += 1;
                }
                tally
            },
        )
        .reduce(
            || [0i64; 256],
            |mut a, b| {
                for (slot, v) in a.iter_mut().zip(b.iter()) {
                    *slot += v;
                }
                a
            },
        );

    if histogram.iter().filter(|&&count| count > 0).count() <= 1 {
        debug!("equalize: flat luminance distribution, nothing to spread");
        return Ok(());
    }

    let mut cumulative = [0i64; 256];
    cumulative[0] = histogram[0];
    for i in 1..256 {
        cumulative[i] = cumulative[i - 1] + histogram[i];
    }
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = (cumulative[i] * 255 / total) as u8;
    }

    let bands = raster.bands();
    let data = raster.as_array_mut();
    let flat = data.as_slice_mut().ok_or_else(|| {
        TransformError::Internal("raster storage is not contiguous".to_string())
    })?;
    flat.par_chunks_mut(w * bands).for_each(|row| {
        for v in row.iter_mut() {
            *v = lut[*v as usize];
        }
        progress.row_done();
    });
    Ok(())
}
