//! Additive Gaussian noise.
//!
//! Noise is drawn per band from a zero-mean normal distribution via the
//! Box-Muller transform over seeded uniform draws. Each row derives its
//! own RNG from the caller's seed and the row index, so output is
//! deterministic per seed regardless of row scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::progress::ProgressHandle;
use crate::raster::{clamp_u8, Raster};

/// Zero-mean Gaussian draw from uniform samples.
fn next_gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-12);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Add Gaussian noise with standard deviation `sigma` to every band.
pub fn gaussian_noise(raster: &mut Raster, sigma: f64, seed: u64, progress: &ProgressHandle) {
    if sigma <= 0.0 {
        return;
    }
    let (w, bands) = (raster.width(), raster.bands());
    let data = raster.as_array_mut();
    let Some(flat) = data.as_slice_mut() else {
        return;
    };

    flat.par_chunks_mut(w * bands)
        .enumerate()
        .for_each(|(y, row)| {
            let row_seed = seed ^ (y as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            let mut rng = StdRng::seed_from_u64(row_seed);
            for v in row.iter_mut() {
                let noise = next_gaussian(&mut rng) * sigma;
                *v = clamp_u8((*v as f64 + noise).round() as i64);
            }
            progress.row_done();
        });
}
