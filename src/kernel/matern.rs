//! Matérn kernel.
//!
//! ```text
//! K(d) = 2^(1-ν) / Γ(ν) · (√(2ν)·d/ℓ)^ν · K_ν(√(2ν)·d/ℓ)
//! ```
//!
//! `d` is the plain Euclidean distance (metric `"l2"`). The half-integer
//! orders 1/2, 3/2, 5/2 and the ν → ∞ limit use their closed forms; every
//! other order goes through [`crate::special::matern_correlation`].

use super::{check_param_names, KernelFn, KernelParams, ParameterRegistry};
use crate::error::Result;
use crate::hyperparameter::{Bounds, Hyperparameter, HyperparameterConfig, ValueSpec};
use crate::special::matern_correlation;
use ndarray::{ArrayD, ArrayViewD};
use rand::Rng;

const NU: &str = "nu";
const LENGTH_SCALE: &str = "length_scale";

/// The Matérn kernel with smoothness `nu` and an isotropic length scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Matern {
    params: ParameterRegistry,
    metric: String,
}

impl Matern {
    /// Factory tag.
    pub const NAME: &'static str = "matern";

    /// Metric used when none is configured.
    pub const DEFAULT_METRIC: &'static str = "l2";

    /// Parameter names owned by this kernel, in registration order.
    pub const PARAMETERS: [&'static str; 2] = [NU, LENGTH_SCALE];

    /// Kernel with fixed smoothness and length scale.
    pub fn new(nu: f64, length_scale: f64) -> Self {
        Self::from_hyperparameters(Hyperparameter::fixed(nu), Hyperparameter::fixed(length_scale))
    }

    /// Kernel from already-built hyperparameters.
    pub fn from_hyperparameters(nu: Hyperparameter, length_scale: Hyperparameter) -> Self {
        Self {
            params: ParameterRegistry::new(vec![(NU, nu), (LENGTH_SCALE, length_scale)]),
            metric: Self::DEFAULT_METRIC.to_string(),
        }
    }

    /// Kernel from configuration records; both parameters default to a fixed 1.0.
    pub fn from_params<R: Rng + ?Sized>(
        params: &KernelParams,
        metric: Option<&str>,
        rng: &mut R,
    ) -> Result<Self> {
        check_param_names(Self::NAME, &Self::PARAMETERS, params)?;
        let default = HyperparameterConfig::default();
        let mut build = |name: &str| {
            Hyperparameter::from_config(
                params.get(name).unwrap_or(&default),
                ValueSpec::Scalar(1.0),
                Bounds::Fixed,
                &mut *rng,
            )
        };
        let nu = build(NU)?;
        let length_scale = build(LENGTH_SCALE)?;
        let kernel = Self::from_hyperparameters(nu, length_scale);
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

    /// Current smoothness.
    pub fn nu(&self) -> Result<f64> {
        self.params.scalar(NU)
    }

    /// Current length scale.
    pub fn length_scale(&self) -> Result<f64> {
        self.params.scalar(LENGTH_SCALE)
    }
}

impl Default for Matern {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl KernelFn for Matern {
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

    fn evaluate(&self, dists: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        let nu = self.nu()?;
        let length_scale = self.length_scale()?;
        let scaled = dists.mapv(|d| d / length_scale);

        let k = if nu == 0.5 {
            scaled.mapv(|d| (-d).exp())
        } else if nu == 1.5 {
            let sqrt3 = 3.0_f64.sqrt();
            scaled.mapv(|d| {
                let u = sqrt3 * d;
                (1.0 + u) * (-u).exp()
            })
        } else if nu == 2.5 {
            let sqrt5 = 5.0_f64.sqrt();
            scaled.mapv(|d| {
                let u = sqrt5 * d;
                (1.0 + u + u * u / 3.0) * (-u).exp()
            })
        } else if nu == f64::INFINITY {
            scaled.mapv(|d| (-0.5 * d * d).exp())
        } else {
            // K_ν diverges at the origin
            let factor = (2.0 * nu).sqrt();
            scaled.mapv(|d| {
                let d = if d == 0.0 { f64::EPSILON } else { d };
                matern_correlation(nu, factor * d)
            })
        };
        Ok(k)
    }
}
