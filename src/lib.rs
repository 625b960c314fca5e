//! rastermill - server-side raster transform engine.
//!
//! Operates on already-decoded in-memory rasters: callers pick an
//! operation from the [`registry`] catalog by machine key, supply its
//! parameters as strings, and the engine validates, binds and runs the
//! transform in place. Decoding, encoding, storage and transport live
//! outside this crate.
//!
//! ## Raster model
//!
//! A [`Raster`] is a `(height, width, bands)` grid of 8-bit samples with
//! 1 (grayscale) or 3 (RGB) bands. Transforms mutate it in place; whole-
//! raster passes run row-parallel and report completion through
//! [`Progress`].
//!
//! ## Entry points
//!
//! - [`registry::catalog`] / [`registry::catalog_json`] - discovery
//! - [`registry::apply`] - validate, bind and run one operation
//! - [`Progress::current`] - completion of the running operation
//!
//! Individual algorithms are also callable directly through the
//! [`filters`] and [`region`] modules when the caller already holds typed
//! parameters.

pub mod area;
pub mod error;
pub mod filters;
pub mod params;
pub mod progress;
pub mod raster;
pub mod region;
pub mod registry;

pub use area::Area;
pub use error::TransformError;
pub use filters::convolve::{Border, Kernel};
pub use params::{BoundValues, ParamKind, ParamSpec, ParamValue};
pub use progress::{Progress, ProgressHandle};
pub use raster::Raster;
pub use region::Fill;
pub use registry::{apply, catalog, catalog_json, AlgorithmSpec};
