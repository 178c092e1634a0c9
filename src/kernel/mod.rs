//! Kernel layer: isotropic covariance functors and their factory.
//!
//! The layer provides:
//! - the [`KernelFn`] capability shared by every kernel
//! - a per-kernel [`ParameterRegistry`] of named [`Hyperparameter`]s
//! - the concrete functors [`Rbf`] and [`Matern`]
//! - the closed [`Kernel`] enum and the string-tag factory [`build_kernel`]
//!
//! Kernels map a distance tensor produced elsewhere (pairwise or crosswise,
//! any rank) to a same-shaped covariance tensor. The distance function they
//! expect is named by [`KernelFn::metric`] and is not interpreted here.
//!
//! # Example
//!
//! ```rust
//! use lensing_kernels::kernel::{KernelFn, KernelSpec};
//! use ndarray::array;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let spec = KernelSpec::from_json(r#"{"kern": "rbf", "length_scale": {"val": 2.0}}"#)?;
//! let kernel = spec.build(&mut rng)?;
//!
//! let dists = array![[0.0, 8.0 * std::f64::consts::LN_2]].into_dyn();
//! let k = kernel.evaluate(dists.view())?;
//! assert!((k[[0, 0]] - 1.0).abs() < 1e-12);
//! assert!((k[[0, 1]] - 0.5).abs() < 1e-12);
//! # Ok::<(), lensing_kernels::ConfigurationError>(())
//! ```

pub mod matern;
pub mod rbf;

pub use matern::Matern;
pub use rbf::Rbf;

use crate::error::{ConfigurationError, Result};
use crate::hyperparameter::{Hyperparameter, HyperparameterConfig};
use ndarray::{ArrayD, ArrayViewD};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Hyperparameter configuration records keyed by parameter name.
pub type KernelParams = BTreeMap<String, HyperparameterConfig>;

// =============================================================================
// Parameter registry
// =============================================================================

/// Named hyperparameters owned by one kernel.
///
/// The set of names is fixed when the kernel is constructed; only the values
/// and bounds of existing entries can change afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterRegistry {
    entries: Vec<(&'static str, Hyperparameter)>,
}

impl ParameterRegistry {
    pub(crate) fn new(entries: Vec<(&'static str, Hyperparameter)>) -> Self {
        Self { entries }
    }

    /// Look up a hyperparameter by name.
    pub fn get(&self, name: &str) -> Option<&Hyperparameter> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| p)
    }

    /// Mutable access to a hyperparameter by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Hyperparameter> {
        self.entries
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| p)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// `(name, hyperparameter)` pairs, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Hyperparameter)> + '_ {
        self.entries.iter().map(|(n, p)| (*n, p))
    }

    /// Number of hyperparameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Concrete scalar value of a registered parameter.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| ConfigurationError::UnresolvedParameter {
                name: name.to_string(),
                found: "nothing".to_string(),
            })?
            .scalar(name)
    }
}

/// Reject configuration records addressed to parameters `kernel` does not own.
pub(crate) fn check_param_names(
    kernel: &'static str,
    known: &[&str],
    params: &KernelParams,
) -> Result<()> {
    match params.keys().find(|name| !known.contains(&name.as_str())) {
        Some(name) => Err(ConfigurationError::UnknownParameter {
            kernel,
            name: name.clone(),
        }),
        None => Ok(()),
    }
}

// =============================================================================
// KernelFn
// =============================================================================

/// Common contract of the covariance functors.
pub trait KernelFn {
    /// Factory tag of this kernel.
    fn name(&self) -> &'static str;

    /// Tag of the distance function this kernel expects its input from.
    fn metric(&self) -> &str;

    /// The kernel's hyperparameters.
    fn hyperparameters(&self) -> &ParameterRegistry;

    /// Mutable access to the kernel's hyperparameters.
    fn hyperparameters_mut(&mut self) -> &mut ParameterRegistry;

    /// Map a distance tensor to a same-shaped covariance tensor.
    ///
    /// Pure in the current parameter values. Fails only when a parameter the
    /// kernel needs has no concrete scalar value (e.g. it is still `learn`).
    fn evaluate(&self, dists: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>>;

    /// Update hyperparameters from configuration records.
    ///
    /// Every name must belong to this kernel. The update is all-or-nothing:
    /// if any record is rejected no parameter changes.
    fn set_params<R: Rng + ?Sized>(&mut self, updates: &KernelParams, rng: &mut R) -> Result<()>
    where
        Self: Sized,
    {
        let mut staged = self.hyperparameters().clone();
        for (name, config) in updates {
            let param = staged
                .get_mut(name)
                .ok_or_else(|| ConfigurationError::UnknownParameter {
                    kernel: self.name(),
                    name: name.clone(),
                })?;
            param.apply(config, rng)?;
        }
        *self.hyperparameters_mut() = staged;
        Ok(())
    }

    /// One `name : value - bounds` line per hyperparameter.
    fn describe(&self) -> String {
        self.hyperparameters()
            .iter()
            .map(|(name, param)| format!("{} : {}", name, param))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Kernel selection
// =============================================================================

/// Supported kernel families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelKind {
    /// Squared-exponential kernel, see [`Rbf`]
    Rbf,
    /// Matérn kernel, see [`Matern`]
    Matern,
}

impl KernelKind {
    /// Factory tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rbf => Rbf::NAME,
            Self::Matern => Matern::NAME,
        }
    }
}

impl FromStr for KernelKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            Rbf::NAME => Ok(Self::Rbf),
            Matern::NAME => Ok(Self::Matern),
            other => Err(ConfigurationError::UnsupportedKernel(other.to_string())),
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructed kernel of any supported family.
#[derive(Clone, Debug, PartialEq)]
pub enum Kernel {
    /// RBF kernel
    Rbf(Rbf),
    /// Matérn kernel
    Matern(Matern),
}

impl Kernel {
    /// Family of this kernel.
    pub fn kind(&self) -> KernelKind {
        match self {
            Self::Rbf(_) => KernelKind::Rbf,
            Self::Matern(_) => KernelKind::Matern,
        }
    }
}

impl From<Rbf> for Kernel {
    fn from(kernel: Rbf) -> Self {
        Self::Rbf(kernel)
    }
}

impl From<Matern> for Kernel {
    fn from(kernel: Matern) -> Self {
        Self::Matern(kernel)
    }
}

impl KernelFn for Kernel {
    fn name(&self) -> &'static str {
        match self {
            Self::Rbf(k) => k.name(),
            Self::Matern(k) => k.name(),
        }
    }

    fn metric(&self) -> &str {
        match self {
            Self::Rbf(k) => k.metric(),
            Self::Matern(k) => k.metric(),
        }
    }

    fn hyperparameters(&self) -> &ParameterRegistry {
        match self {
            Self::Rbf(k) => k.hyperparameters(),
            Self::Matern(k) => k.hyperparameters(),
        }
    }

    fn hyperparameters_mut(&mut self) -> &mut ParameterRegistry {
        match self {
            Self::Rbf(k) => k.hyperparameters_mut(),
            Self::Matern(k) => k.hyperparameters_mut(),
        }
    }

    fn evaluate(&self, dists: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        match self {
            Self::Rbf(k) => k.evaluate(dists),
            Self::Matern(k) => k.evaluate(dists),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Build a kernel from its factory tag (`"rbf"` or `"matern"`).
///
/// `params` holds configuration records for the kernel's hyperparameters;
/// omitted parameters take the kernel defaults. `rng` feeds any
/// `sample` / `log_sample` requests.
pub fn build_kernel<R: Rng + ?Sized>(
    tag: &str,
    params: &KernelParams,
    rng: &mut R,
) -> Result<Kernel> {
    build_kernel_with_metric(tag, params, None, rng)
}

/// [`build_kernel`] with an explicit metric tag instead of the kernel default.
pub fn build_kernel_with_metric<R: Rng + ?Sized>(
    tag: &str,
    params: &KernelParams,
    metric: Option<&str>,
    rng: &mut R,
) -> Result<Kernel> {
    let kind: KernelKind = tag.parse()?;
    let kernel: Kernel = match kind {
        KernelKind::Rbf => Rbf::from_params(params, metric, rng)?.into(),
        KernelKind::Matern => Matern::from_params(params, metric, rng)?.into(),
    };
    tracing::debug!(kernel = %kind, metric = kernel.metric(), "built kernel");
    Ok(kernel)
}

/// JSON description of a kernel:
/// `{"kern": "matern", "metric": "l2", "nu": {"val": 1.5}, ...}`.
///
/// Every key other than `kern` and `metric` is a hyperparameter record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Factory tag
    pub kern: String,
    /// Distance-function tag; the kernel default when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Hyperparameter records
    #[serde(flatten)]
    pub params: KernelParams,
}

impl KernelSpec {
    /// Parse a kernel description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the described kernel.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Kernel> {
        build_kernel_with_metric(&self.kern, &self.params, self.metric.as_deref(), rng)
    }
}
