//! Error taxonomy for the transform engine.
//!
//! Every variant except [`TransformError::Internal`] is a caller/input
//! error surfaced synchronously from [`crate::registry::apply`]; none are
//! retried. Out-of-range arithmetic inside a transform is clamped at the
//! band write, never reported here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// The requested machine key is not in the catalog.
    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    /// A declared parameter key was absent from the supplied value map.
    #[error("parameter '{0}' is missing")]
    MissingParameter(String),

    /// A supplied value failed to parse or violated the declared constraints.
    #[error("parameter '{name}' is invalid: {reason}")]
    ParameterInvalid { name: String, reason: String },

    /// An area is out of raster bounds, inverted, or empty where a
    /// non-empty area is required.
    #[error("invalid area: {0}")]
    InvalidArea(String),

    /// A kernel request with an even or non-positive size, or a
    /// non-positive sigma.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Unexpected failure inside a transform.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TransformError {
    pub(crate) fn invalid_param(name: &str, reason: impl Into<String>) -> Self {
        TransformError::ParameterInvalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
