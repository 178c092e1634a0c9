//! Radial basis function (squared-exponential) kernel.
//!
//! ```text
//! K(x_i, x_j) = exp(-d(x_i, x_j) / (2ℓ²))
//! ```
//!
//! `d` is normally the squared Euclidean distance (metric `"F2"`), so the
//! input tensor is expected to carry zeros on its pairwise diagonal.

use super::{check_param_names, KernelFn, KernelParams, ParameterRegistry};
use crate::error::Result;
use crate::hyperparameter::{Bounds, Hyperparameter, HyperparameterConfig, ValueSpec};
use ndarray::{ArrayD, ArrayViewD};
use rand::Rng;

const LENGTH_SCALE: &str = "length_scale";

/// The RBF kernel with a single isotropic length scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Rbf {
    params: ParameterRegistry,
    metric: String,
}

impl Rbf {
    /// Factory tag.
    pub const NAME: &'static str = "rbf";

    /// Metric used when none is configured.
    pub const DEFAULT_METRIC: &'static str = "F2";

    /// Parameter names owned by this kernel.
    pub const PARAMETERS: [&'static str; 1] = [LENGTH_SCALE];

    /// Kernel with a fixed length scale.
    pub fn new(length_scale: f64) -> Self {
        Self::from_length_scale(Hyperparameter::fixed(length_scale))
    }

    /// Kernel from an already-built length scale hyperparameter.
    pub fn from_length_scale(length_scale: Hyperparameter) -> Self {
        Self {
            params: ParameterRegistry::new(vec![(LENGTH_SCALE, length_scale)]),
            metric: Self::DEFAULT_METRIC.to_string(),
        }
    }

    /// Kernel from configuration records; `length_scale` defaults to a fixed 1.0.
    pub fn from_params<R: Rng + ?Sized>(
        params: &KernelParams,
        metric: Option<&str>,
        rng: &mut R,
    ) -> Result<Self> {
        check_param_names(Self::NAME, &Self::PARAMETERS, params)?;
        let default = HyperparameterConfig::default();
        let length_scale = Hyperparameter::from_config(
            params.get(LENGTH_SCALE).unwrap_or(&default),
            ValueSpec::Scalar(1.0),
            Bounds::Fixed,
            rng,
        )?;
        let kernel = Self::from_length_scale(length_scale);
        Ok(match metric {
            Some(metric) => kernel.with_metric(metric),
            None => kernel,
        })
    }

    /// Replace the metric tag.
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    /// Current length scale.
    pub fn length_scale(&self) -> Result<f64> {
        self.params.scalar(LENGTH_SCALE)
    }
}

impl Default for Rbf {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl KernelFn for Rbf {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn metric(&self) -> &str {
        &self.metric
    }

    fn hyperparameters(&self) -> &ParameterRegistry {
        &self.params
    }

    fn hyperparameters_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.params
    }

    /// `exp(-d / (2ℓ²))` element-wise over squared distances.
    fn evaluate(&self, squared_dists: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        let length_scale = self.length_scale()?;
        let denom = 2.0 * length_scale * length_scale;
        Ok(squared_dists.mapv(|d| (-d / denom).exp()))
    }
}
