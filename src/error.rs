//! Error types for kernel configuration and evaluation.

use thiserror::Error;

/// Every validation failure raised by this crate.
///
/// All variants are deterministic functions of the caller's input and are
/// returned directly; nothing is retried or silently recovered.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Bounds given as a string other than `fixed`
    #[error("Unknown bound option {0}.")]
    UnknownBoundsOption(String),

    /// Bounds that are neither `fixed` nor a sequence
    #[error("Unknown bound option {0} of a non-iterable type.")]
    NonIterableBounds(String),

    /// Bounds sequence of the wrong length
    #[error("Provided hyperparameter optimization bounds have unsupported length {0}.")]
    BoundsLength(usize),

    /// A bound that is not a number
    #[error("Nonscalar {0} is not a supported hyperparameter bound type.")]
    NonNumericBound(String),

    /// Lower bound above upper bound
    #[error("Lower bound {low} is not lesser than upper bound {high}.")]
    UnorderedBounds { low: f64, high: f64 },

    /// Range too wide for its width to be represented
    #[error("Bounds ({low}, {high}) span a range wider than the largest finite float.")]
    UnboundedRange { low: f64, high: f64 },

    /// Sampling requested on a fixed hyperparameter
    #[error("Must provide optimization bounds in order to {sentinel} a hyperparameter value.")]
    SentinelRequiresBounds { sentinel: &'static str },

    /// Log-uniform sampling over a range that includes non-positive values
    #[error("Log-sampling requires a positive lower bound, got {low}.")]
    NonPositiveLogBounds { low: f64 },

    /// String value that is not a known sentinel
    #[error("string hyperparameter value {0} is not supported.")]
    UnsupportedSentinel(String),

    /// Value that is neither a number, a numeric array nor a sentinel
    #[error("Unsupported hyperparameter value {0}.")]
    MalformedValue(String),

    /// Value under the lower bound (beyond tolerance)
    #[error("Hyperparameter value {value} is lesser than the optimization lower bound {low}")]
    BelowLowerBound { value: String, low: f64 },

    /// Value over the upper bound (beyond tolerance)
    #[error("Hyperparameter value {value} is greater than the optimization upper bound {high}")]
    AboveUpperBound { value: String, high: f64 },

    /// Update addressed to a parameter the kernel does not own
    #[error("Unknown hyperparameter {name} for kernel {kernel}")]
    UnknownParameter { kernel: &'static str, name: String },

    /// Parameter needed as a concrete scalar but holding something else
    #[error("Hyperparameter {name} has no concrete scalar value (found {found})")]
    UnresolvedParameter { name: String, found: String },

    /// Factory tag with no matching kernel
    #[error("Kernel type {0} is not supported!")]
    UnsupportedKernel(String),

    /// Difference tensor without a trailing `(dx, dy)` axis
    #[error("Difference tensor must have shape (..., n, m, 2), got {0:?}")]
    DifferenceShape(Vec<usize>),
}

/// Result type alias for kernel operations.
pub type Result<T> = std::result::Result<T, ConfigurationError>;
