//! # Lensing Kernels: covariance functions for weak-lensing GPs
//!
//! Covariance kernels consumed by a Gaussian-process solver: named,
//! bounded hyperparameters, the RBF and Matérn kernels behind a string-tag
//! factory, and convergence/shear block covariances built from raw
//! coordinate differences.
//!
//! ## Quick Start
//!
//! ```rust
//! use lensing_kernels::{build_kernel, field_covariance, KernelFn, KernelParams};
//! use ndarray::{array, Array};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//!
//! // Configure a kernel from JSON records
//! let params: KernelParams = serde_json::from_str(
//!     r#"{"nu": {"val": 1.5}, "length_scale": {"val": "sample", "bounds": [0.5, 2.0]}}"#,
//! )?;
//! let kernel = build_kernel("matern", &params, &mut rng)?;
//! println!("{}", kernel.describe());
//!
//! // Evaluate on a distance tensor
//! let dists = array![[0.0, 0.4], [0.4, 0.0]].into_dyn();
//! let cov = kernel.evaluate(dists.view())?;
//! assert_eq!(cov.shape(), &[2, 2]);
//!
//! // Convergence/shear covariance between 3 and 4 points
//! let diffs = Array::<f64, _>::zeros((3, 4, 2)).into_dyn();
//! let blocks = field_covariance(diffs.view(), 1.0)?;
//! assert_eq!(blocks.shape(), &[3, 3, 3, 4]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Hyperparameter**: a value plus optimization bounds, validated on every change
//! - **Sentinels**: `sample` / `log_sample` draw a value from the bounds, `learn` defers it
//! - **Kernel**: a functor from a distance tensor to a same-shaped covariance tensor
//! - **Shear blocks**: κ/γ1/γ2 covariances under an isotropic Gaussian potential

pub mod error;
pub mod hyperparameter;
pub mod kernel;
pub mod shear;
pub mod special;

// Re-exports for convenience
pub use error::{ConfigurationError, Result};
pub use hyperparameter::{
    Bounds, HyperValue, Hyperparameter, HyperparameterConfig, ValueSpec, BOUNDS_TOLERANCE,
};
pub use kernel::{
    build_kernel, build_kernel_with_metric, Kernel, KernelFn, KernelKind, KernelParams,
    KernelSpec, Matern, ParameterRegistry, Rbf,
};
pub use shear::{cross_covariance, field_covariance, shear_covariance};
