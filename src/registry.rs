//! The algorithm catalog and its apply entry point.
//!
//! Every operation the engine supports is an [`AlgorithmSpec`]: a display
//! name, a stable machine key, an ordered parameter schema and a
//! transform function. The catalog is a single static enumerated at
//! process start; registration order is stable and is the order
//! [`catalog`] and [`catalog_json`] report.
//!
//! [`apply`] is the one write path: resolve the key, bind every declared
//! parameter from the caller's string map (in declaration order), then
//! run the transform: either over the whole raster or, for algorithms
//! with a region scope, over a cropped scratch raster that is pasted back
//! afterward.

use std::collections::HashMap;

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::TransformError;
use crate::filters::color;
use crate::filters::convolve::{self, Border, Kernel};
use crate::filters::histogram;
use crate::filters::noise;
use crate::params::{BoundValues, ParamKind, ParamSpec};
use crate::progress::{Progress, ProgressHandle};
use crate::raster::Raster;
use crate::region::{self, Fill};

type TransformFn =
    fn(&mut Raster, &BoundValues, &ProgressHandle) -> Result<(), TransformError>;

pub struct AlgorithmSpec {
    /// User-facing display name.
    pub name: &'static str,
    /// Stable machine key used for routing.
    pub key: &'static str,
    /// Parameter schema, bound in declaration order.
    pub params: &'static [ParamSpec],
    /// Name of the region parameter that scopes this algorithm to a
    /// cropped sub-raster, if it has that capability. The region engine's
    /// own operations (delete, crop) take their area as plain input
    /// instead.
    pub crop_scope: Option<&'static str>,
    run: TransformFn,
}

// ============================================================================
// Transform bindings
// ============================================================================

fn run_luminosity(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::luminosity(raster, values.int("delta")? as i32, progress);
    Ok(())
}

fn run_hue(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::hue_filter(raster, values.int("hue")? as i32, progress);
    Ok(())
}

fn run_saturation(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::saturation(raster, values.float("factor")?, progress);
    Ok(())
}

fn parse_border(values: &BoundValues) -> Result<Border, TransformError> {
    values
        .select("border")?
        .parse()
        .map_err(TransformError::Internal)
}

fn run_mean_filter(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    let kernel = Kernel::mean(values.int("size")? as usize)?;
    convolve::convolve(raster, &kernel, parse_border(values)?, progress)
}

fn run_gaussian_filter(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    let kernel = Kernel::gaussian(values.int("size")? as usize, values.float("sigma")?)?;
    convolve::convolve(raster, &kernel, parse_border(values)?, progress)
}

fn run_sharpen(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    convolve::sharpen(raster, values.float("amount")?, progress)
}

fn run_edges(
    raster: &mut Raster,
    _values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    convolve::sobel(raster, progress)
}

fn run_equalize(
    raster: &mut Raster,
    _values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    histogram::equalize(raster, progress)
}

fn run_negative(
    raster: &mut Raster,
    _values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::negative(raster, progress);
    Ok(())
}

fn run_sepia(
    raster: &mut Raster,
    _values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::sepia(raster, progress);
    Ok(())
}

fn run_recolor(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::recolor(
        raster,
        values.color("color")?,
        values.int("range")? as i32,
        values.select("target")?,
        values.flag("keep")?,
        progress,
    );
    Ok(())
}

fn run_noise(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    noise::gaussian_noise(
        raster,
        values.float("sigma")?,
        values.int("seed")? as u64,
        progress,
    );
    Ok(())
}

fn run_delete_area(
    raster: &mut Raster,
    values: &BoundValues,
    _progress: &ProgressHandle,
) -> Result<(), TransformError> {
    let area = values.region("area")?;
    let fill: Fill = values
        .select("fill")?
        .parse()
        .map_err(TransformError::Internal)?;
    region::delete_area(raster, &area, fill)
}

fn run_crop(
    raster: &mut Raster,
    values: &BoundValues,
    _progress: &ProgressHandle,
) -> Result<(), TransformError> {
    region::crop(raster, &values.region("area")?)
}

fn run_vignette(
    raster: &mut Raster,
    values: &BoundValues,
    progress: &ProgressHandle,
) -> Result<(), TransformError> {
    color::vignette(raster, values.float("strength")?, progress);
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

const fn int(name: &'static str, label: &'static str, min: i64, max: i64, step: i64) -> ParamSpec {
    ParamSpec::new(name, label, ParamKind::IntRange { min, max, step })
}

const fn float(
    name: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    step: f64,
) -> ParamSpec {
    ParamSpec::new(name, label, ParamKind::FloatRange { min, max, step })
}

const fn select(
    name: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> ParamSpec {
    ParamSpec::new(name, label, ParamKind::Select { options })
}

const fn region_param(name: &'static str, label: &'static str) -> ParamSpec {
    ParamSpec::new(name, label, ParamKind::Region)
}

static CATALOG: &[AlgorithmSpec] = &[
    AlgorithmSpec {
        name: "Luminosity shift",
        key: "luminosity",
        params: &[
            int("delta", "Delta", -255, 255, 1),
            region_param("area", "Area"),
        ],
        crop_scope: Some("area"),
        run: run_luminosity,
    },
    AlgorithmSpec {
        name: "Hue filter",
        key: "hue",
        params: &[int("hue", "Hue", 0, 359, 1)],
        crop_scope: None,
        run: run_hue,
    },
    AlgorithmSpec {
        name: "Saturation scale",
        key: "saturation",
        params: &[float("factor", "Factor", 0.0, 2.0, 0.1)],
        crop_scope: None,
        run: run_saturation,
    },
    AlgorithmSpec {
        name: "Mean filter",
        key: "meanFilter",
        params: &[
            int("size", "Kernel size", 1, 21, 2),
            select("border", "Border policy", Border::OPTIONS),
        ],
        crop_scope: None,
        run: run_mean_filter,
    },
    AlgorithmSpec {
        name: "Gaussian blur",
        key: "gaussianFilter",
        params: &[
            int("size", "Kernel size", 1, 21, 2),
            float("sigma", "Sigma", 0.1, 2.0, 0.1),
            select("border", "Border policy", Border::OPTIONS),
        ],
        crop_scope: None,
        run: run_gaussian_filter,
    },
    AlgorithmSpec {
        name: "Sharpen",
        key: "sharpen",
        params: &[float("amount", "Amount", 0.0, 2.0, 0.1)],
        crop_scope: None,
        run: run_sharpen,
    },
    AlgorithmSpec {
        name: "Edge detection",
        key: "edges",
        params: &[],
        crop_scope: None,
        run: run_edges,
    },
    AlgorithmSpec {
        name: "Histogram equalization",
        key: "equalize",
        params: &[],
        crop_scope: None,
        run: run_equalize,
    },
    AlgorithmSpec {
        name: "Negative",
        key: "negative",
        params: &[],
        crop_scope: None,
        run: run_negative,
    },
    AlgorithmSpec {
        name: "Sepia",
        key: "sepia",
        params: &[],
        crop_scope: None,
        run: run_sepia,
    },
    AlgorithmSpec {
        name: "Selective recolor",
        key: "recolor",
        params: &[
            ParamSpec::new("color", "Reference color", ParamKind::Color),
            int("range", "Hue range", 0, 179, 1),
            select("target", "Target color", color::RECOLOR_TARGETS),
            ParamSpec::new("keep", "Keep selection", ParamKind::Flag),
        ],
        crop_scope: None,
        run: run_recolor,
    },
    AlgorithmSpec {
        name: "Gaussian noise",
        key: "noise",
        params: &[
            float("sigma", "Sigma", 0.0, 64.0, 1.0),
            int("seed", "Seed", 0, 1_000_000, 1),
        ],
        crop_scope: None,
        run: run_noise,
    },
    AlgorithmSpec {
        name: "Delete area",
        key: "deleteArea",
        params: &[
            region_param("area", "Area"),
            select("fill", "Fill policy", Fill::OPTIONS),
        ],
        crop_scope: None,
        run: run_delete_area,
    },
    AlgorithmSpec {
        name: "Crop",
        key: "crop",
        params: &[region_param("area", "Area")],
        crop_scope: None,
        run: run_crop,
    },
    AlgorithmSpec {
        name: "Vignette",
        key: "vignette",
        params: &[
            float("strength", "Strength", 0.0, 1.0, 0.05),
            region_param("area", "Area"),
        ],
        crop_scope: Some("area"),
        run: run_vignette,
    },
];

/// The full catalog in registration order.
pub fn catalog() -> &'static [AlgorithmSpec] {
    CATALOG
}

/// Catalog serialized for the discovery boundary.
pub fn catalog_json() -> Result<serde_json::Value, TransformError> {
    serde_json::to_value(CATALOG).map_err(|e| TransformError::Internal(e.to_string()))
}

impl Serialize for AlgorithmSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", self.name)?;
        map.serialize_entry("key", self.key)?;
        map.serialize_entry("parameters", self.params)?;
        map.end()
    }
}

// ============================================================================
// Apply
// ============================================================================

/// Look up `key`, bind `values` against its schema and run the transform
/// over `raster`.
///
/// Binding happens before any pixel is touched: a missing or invalid
/// parameter leaves the raster unchanged. When the algorithm declares a
/// region scope and a non-empty area is bound, only the pixels inside the
/// area are rewritten.
pub fn apply(
    key: &str,
    raster: &mut Raster,
    values: &HashMap<String, String>,
) -> Result<(), TransformError> {
    let spec = CATALOG
        .iter()
        .find(|a| a.key == key)
        .ok_or_else(|| TransformError::UnknownAlgorithm(key.to_string()))?;

    let mut bound = BoundValues::default();
    for param in spec.params {
        let raw = values
            .get(param.name)
            .ok_or_else(|| TransformError::MissingParameter(param.name.to_string()))?;
        bound.insert(param.name, param.bind(raw)?);
    }
    debug!("apply '{}' with {} parameter(s)", spec.key, spec.params.len());

    let scope = match spec.crop_scope {
        Some(name) => {
            let area = bound.region(name)?;
            if area.is_empty() {
                None
            } else {
                area.check_within(raster, false)?;
                Some(area)
            }
        }
        None => None,
    };

    match scope {
        Some(area) => {
            let mut scratch = region::extract(raster, &area)?;
            let handle = Progress::begin(scratch.height());
            let result = (spec.run)(&mut scratch, &bound, &handle);
            handle.finish();
            result?;
            if scratch.width() != area.width() || scratch.height() != area.height() {
                return Err(TransformError::Internal(
                    "region-scoped transform changed dimensions".to_string(),
                ));
            }
            region::paste(raster, &scratch, &area);
        }
        None => {
            let handle = Progress::begin(raster.height());
            let result = (spec.run)(raster, &bound, &handle);
            handle.finish();
            result?;
        }
    }
    Ok(())
}
