//! Hyperparameters: bounded kernel parameters with optional random initialization.
//!
//! A hyperparameter is a value plus optimization bounds. Bounds are either
//! [`Bounds::Fixed`] (the value never moves and cannot be sampled) or an
//! ordered `(low, high)` pair that every concrete value must respect, up to a
//! tolerance of [`BOUNDS_TOLERANCE`].
//!
//! Values are described by a [`ValueSpec`]: a concrete number or
//! response-indexed vector, or one of the sentinels
//!
//! - `sample`: draw uniformly from `[low, high]`
//! - `log_sample`: draw log-uniformly from `[low, high]` (needs `low > 0`)
//! - `learn`: leave the value to an external optimizer
//!
//! Sampling never touches a global generator. The caller hands in the random
//! source, so a seeded `ChaCha8Rng` makes every draw reproducible:
//!
//! ```rust
//! use lensing_kernels::{Bounds, Hyperparameter, ValueSpec};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let bounds = Bounds::range(0.1, 10.0)?;
//! let param = Hyperparameter::new(ValueSpec::LogSample, bounds, &mut rng)?;
//! let value = param.scalar("length_scale")?;
//! assert!((0.1..=10.0).contains(&value));
//! # Ok::<(), lensing_kernels::ConfigurationError>(())
//! ```

use crate::error::{ConfigurationError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Slack allowed on either side of the bounds when checking a value.
pub const BOUNDS_TOLERANCE: f64 = 1e-5;

const FIXED: &str = "fixed";
const SAMPLE: &str = "sample";
const LOG_SAMPLE: &str = "log_sample";
const LEARN: &str = "learn";

// =============================================================================
// Bounds
// =============================================================================

/// Optimization bounds of a hyperparameter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Bounds {
    /// Excluded from optimization; sampling is not allowed.
    #[default]
    Fixed,
    /// Closed optimization range with `low <= high`.
    Range {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
}

impl Bounds {
    /// Build a validated `(low, high)` range.
    pub fn range(low: f64, high: f64) -> Result<Self> {
        for bound in [low, high] {
            if !bound.is_finite() {
                return Err(ConfigurationError::NonNumericBound(bound.to_string()));
            }
        }
        if low > high {
            return Err(ConfigurationError::UnorderedBounds { low, high });
        }
        // uniform sampling needs a finite width
        if !(high - low).is_finite() {
            return Err(ConfigurationError::UnboundedRange { low, high });
        }
        Ok(Self::Range { low, high })
    }

    /// Parse bounds from a configuration value: `"fixed"` or `[low, high]`.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) if s == FIXED => Ok(Self::Fixed),
            Value::String(s) => Err(ConfigurationError::UnknownBoundsOption(s.clone())),
            Value::Array(items) => {
                if items.len() != 2 {
                    return Err(ConfigurationError::BoundsLength(items.len()));
                }
                let low = json_bound(&items[0])?;
                let high = json_bound(&items[1])?;
                Self::range(low, high)
            }
            other => Err(ConfigurationError::NonIterableBounds(other.to_string())),
        }
    }

    /// Whether these are the `fixed` bounds.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed)
    }

    /// The `(low, high)` pair, if not fixed.
    pub fn as_pair(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Fixed => None,
            Self::Range { low, high } => Some((low, high)),
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => f.write_str(FIXED),
            Self::Range { low, high } => write!(f, "({}, {})", low, high),
        }
    }
}

fn json_bound(item: &Value) -> Result<f64> {
    item.as_f64()
        .ok_or_else(|| ConfigurationError::NonNumericBound(item.to_string()))
}

// =============================================================================
// Value descriptors
// =============================================================================

/// Requested initial value of a hyperparameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueSpec {
    /// A concrete scalar.
    Scalar(f64),
    /// A concrete response-indexed vector.
    Vector(Vec<f64>),
    /// Uniform draw from the bounds.
    Sample,
    /// Log-uniform draw from the bounds.
    LogSample,
    /// Deferred to an external optimizer.
    Learn,
}

impl ValueSpec {
    /// Parse a value descriptor from a configuration value.
    ///
    /// Numbers and numeric arrays become concrete values (a one-element array
    /// is squeezed to a scalar); strings must name a sentinel.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Self::Scalar)
                .ok_or_else(|| ConfigurationError::MalformedValue(n.to_string())),
            Value::String(s) => s.parse(),
            Value::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| {
                        item.as_f64()
                            .ok_or_else(|| ConfigurationError::MalformedValue(value.to_string()))
                    })
                    .collect::<Result<Vec<f64>>>()?;
                match values.len() {
                    0 => Err(ConfigurationError::MalformedValue(value.to_string())),
                    1 => Ok(Self::Scalar(values[0])),
                    _ => Ok(Self::Vector(values)),
                }
            }
            other => Err(ConfigurationError::MalformedValue(other.to_string())),
        }
    }

    fn sentinel_name(&self) -> Option<&'static str> {
        match self {
            Self::Sample => Some(SAMPLE),
            Self::LogSample => Some(LOG_SAMPLE),
            Self::Learn => Some(LEARN),
            Self::Scalar(_) | Self::Vector(_) => None,
        }
    }
}

impl FromStr for ValueSpec {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            SAMPLE => Ok(Self::Sample),
            LOG_SAMPLE => Ok(Self::LogSample),
            LEARN => Ok(Self::Learn),
            other => Err(ConfigurationError::UnsupportedSentinel(other.to_string())),
        }
    }
}

impl From<f64> for ValueSpec {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for ValueSpec {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

impl From<&HyperValue> for ValueSpec {
    fn from(value: &HyperValue) -> Self {
        match value {
            HyperValue::Scalar(v) => Self::Scalar(*v),
            HyperValue::Vector(v) => Self::Vector(v.clone()),
            HyperValue::Learn => Self::Learn,
        }
    }
}

/// Resolved value held by a hyperparameter.
#[derive(Clone, Debug, PartialEq)]
pub enum HyperValue {
    /// Concrete scalar
    Scalar(f64),
    /// Concrete response-indexed vector
    Vector(Vec<f64>),
    /// Awaiting an external optimizer
    Learn,
}

impl HyperValue {
    fn elements(&self) -> &[f64] {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::Vector(v) => v,
            Self::Learn => &[],
        }
    }
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{}", v),
            Self::Vector(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Self::Learn => f.write_str(LEARN),
        }
    }
}

// =============================================================================
// Configuration record
// =============================================================================

/// Configuration record for one hyperparameter: `{"val": .., "bounds": ..}`.
///
/// Both keys are optional; omitted keys fall back to the owning kernel's
/// defaults. Contents are kept as raw JSON so that malformed descriptors
/// surface as [`ConfigurationError`]s rather than deserialization failures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HyperparameterConfig {
    /// Value descriptor: number, numeric array, or sentinel string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<Value>,
    /// Bounds descriptor: `"fixed"` or a `[low, high]` pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Value>,
}

impl HyperparameterConfig {
    /// An empty record (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value descriptor.
    pub fn with_val(mut self, val: impl Into<Value>) -> Self {
        self.val = Some(val.into());
        self
    }

    /// Set the bounds descriptor.
    pub fn with_bounds(mut self, bounds: impl Into<Value>) -> Self {
        self.bounds = Some(bounds.into());
        self
    }

    /// Parse the value descriptor, if present.
    pub fn value_spec(&self) -> Result<Option<ValueSpec>> {
        self.val.as_ref().map(ValueSpec::from_json).transpose()
    }

    /// Parse the bounds descriptor, if present.
    pub fn bounds_spec(&self) -> Result<Option<Bounds>> {
        self.bounds.as_ref().map(Bounds::from_json).transpose()
    }
}

// =============================================================================
// Hyperparameter
// =============================================================================

/// A kernel hyperparameter: a validated value and its optimization bounds.
///
/// Mutation goes through [`Hyperparameter::update`] only. The type is a plain
/// value; concurrent writers need external synchronization.
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperparameter {
    value: HyperValue,
    bounds: Bounds,
}

impl Hyperparameter {
    /// Create a hyperparameter, validating (or sampling) `value` against `bounds`.
    pub fn new<R: Rng + ?Sized>(value: ValueSpec, bounds: Bounds, rng: &mut R) -> Result<Self> {
        let value = resolve_value(value, bounds, rng)?;
        Ok(Self { value, bounds })
    }

    /// A fixed scalar hyperparameter. Never fails.
    pub fn fixed(value: f64) -> Self {
        Self {
            value: HyperValue::Scalar(value),
            bounds: Bounds::Fixed,
        }
    }

    /// Create from a configuration record, using defaults for omitted keys.
    ///
    /// Bounds are parsed and applied before the value so that sampling and
    /// range checks see them.
    pub fn from_config<R: Rng + ?Sized>(
        config: &HyperparameterConfig,
        default_value: ValueSpec,
        default_bounds: Bounds,
        rng: &mut R,
    ) -> Result<Self> {
        let bounds = config.bounds_spec()?.unwrap_or(default_bounds);
        let value = config.value_spec()?.unwrap_or(default_value);
        Self::new(value, bounds, rng)
    }

    /// Replace the value and/or bounds.
    ///
    /// Supplied bounds take effect first. When only bounds are supplied, the
    /// current value is re-checked against them. On error nothing changes.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        value: Option<ValueSpec>,
        bounds: Option<Bounds>,
        rng: &mut R,
    ) -> Result<()> {
        if value.is_none() && bounds.is_none() {
            return Ok(());
        }
        let bounds = bounds.unwrap_or(self.bounds);
        let value = value.unwrap_or_else(|| ValueSpec::from(&self.value));
        self.value = resolve_value(value, bounds, rng)?;
        self.bounds = bounds;
        Ok(())
    }

    /// Apply a configuration record via [`Hyperparameter::update`].
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        config: &HyperparameterConfig,
        rng: &mut R,
    ) -> Result<()> {
        let bounds = config.bounds_spec()?;
        let value = config.value_spec()?;
        self.update(value, bounds, rng)
    }

    /// Current value.
    pub fn value(&self) -> &HyperValue {
        &self.value
    }

    /// Current bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether the bounds are `fixed`.
    pub fn is_fixed(&self) -> bool {
        self.bounds.is_fixed()
    }

    /// The value as a concrete scalar.
    ///
    /// `name` is only used to label the error when the value is a vector or
    /// still awaiting an optimizer.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        match self.value {
            HyperValue::Scalar(v) => Ok(v),
            ref other => Err(ConfigurationError::UnresolvedParameter {
                name: name.to_string(),
                found: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.value, self.bounds)
    }
}

fn resolve_value<R: Rng + ?Sized>(
    value: ValueSpec,
    bounds: Bounds,
    rng: &mut R,
) -> Result<HyperValue> {
    let (low, high) = match bounds.as_pair() {
        Some(pair) => pair,
        None => {
            return match value {
                ValueSpec::Scalar(v) => Ok(HyperValue::Scalar(v)),
                ValueSpec::Vector(v) => Ok(HyperValue::Vector(v)),
                sentinel => Err(ConfigurationError::SentinelRequiresBounds {
                    sentinel: sentinel.sentinel_name().unwrap_or(LEARN),
                }),
            };
        }
    };

    let resolved = match value {
        ValueSpec::Sample => {
            let drawn = rng.gen_range(low..=high);
            tracing::debug!(low, high, drawn, "sampled hyperparameter");
            return Ok(HyperValue::Scalar(drawn));
        }
        ValueSpec::LogSample => {
            if low <= 0.0 {
                return Err(ConfigurationError::NonPositiveLogBounds { low });
            }
            let drawn = rng.gen_range(low.ln()..=high.ln()).exp().clamp(low, high);
            tracing::debug!(low, high, drawn, "log-sampled hyperparameter");
            return Ok(HyperValue::Scalar(drawn));
        }
        ValueSpec::Learn => return Ok(HyperValue::Learn),
        ValueSpec::Scalar(v) => HyperValue::Scalar(v),
        ValueSpec::Vector(v) => HyperValue::Vector(v),
    };

    let elements = resolved.elements();
    if elements.iter().any(|v| !v.is_finite()) {
        return Err(ConfigurationError::MalformedValue(resolved.to_string()));
    }
    if elements.iter().any(|&v| v < low - BOUNDS_TOLERANCE) {
        return Err(ConfigurationError::BelowLowerBound {
            value: resolved.to_string(),
            low,
        });
    }
    if elements.iter().any(|&v| v > high + BOUNDS_TOLERANCE) {
        return Err(ConfigurationError::AboveUpperBound {
            value: resolved.to_string(),
            high,
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_bounds_from_json() {
        assert_eq!(Bounds::from_json(&json!("fixed")).unwrap(), Bounds::Fixed);
        assert_eq!(
            Bounds::from_json(&json!([1e-2, 5e4])).unwrap(),
            Bounds::Range {
                low: 1e-2,
                high: 5e4
            }
        );
        assert_eq!(
            Bounds::from_json(&json!([3, 3])).unwrap(),
            Bounds::Range { low: 3.0, high: 3.0 }
        );
    }

    #[test]
    fn test_bad_bounds_rejected() {
        assert!(matches!(
            Bounds::from_json(&json!("free")),
            Err(ConfigurationError::UnknownBoundsOption(_))
        ));
        assert!(matches!(
            Bounds::from_json(&json!(5.0)),
            Err(ConfigurationError::NonIterableBounds(_))
        ));
        assert!(matches!(
            Bounds::from_json(&json!([1.0, 2.0, 3.0])),
            Err(ConfigurationError::BoundsLength(3))
        ));
        assert!(matches!(
            Bounds::from_json(&json!(["a", 2.0])),
            Err(ConfigurationError::NonNumericBound(_))
        ));
        assert!(matches!(
            Bounds::from_json(&json!([1.0, true])),
            Err(ConfigurationError::NonNumericBound(_))
        ));
        assert!(matches!(
            Bounds::from_json(&json!([2.0, 1.0])),
            Err(ConfigurationError::UnorderedBounds { .. })
        ));
        assert!(Bounds::range(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_overflowing_range_rejected() {
        assert!(matches!(
            Bounds::range(-1e308, 1e308),
            Err(ConfigurationError::UnboundedRange { .. })
        ));
        assert!(matches!(
            Bounds::from_json(&json!([-f64::MAX, f64::MAX])),
            Err(ConfigurationError::UnboundedRange { .. })
        ));

        // Widest representable ranges still sample.
        let bounds = Bounds::range(-1e307, 1e307).unwrap();
        let param = Hyperparameter::new(ValueSpec::Sample, bounds, &mut rng()).unwrap();
        let v = param.scalar("p").unwrap();
        assert!((-1e307..=1e307).contains(&v), "{} outside bounds", v);
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let bounds = Bounds::range(0.0, 1.0).unwrap();
        for value in [
            ValueSpec::Scalar(f64::NAN),
            ValueSpec::Scalar(f64::INFINITY),
            ValueSpec::Vector(vec![0.5, f64::NAN]),
        ] {
            let result = Hyperparameter::new(value.clone(), bounds, &mut rng());
            assert!(
                matches!(result, Err(ConfigurationError::MalformedValue(_))),
                "{:?} accepted: {:?}",
                value,
                result
            );
        }

        let mut param = Hyperparameter::new(ValueSpec::Scalar(0.5), bounds, &mut rng()).unwrap();
        assert!(param
            .update(Some(ValueSpec::Scalar(f64::NAN)), None, &mut rng())
            .is_err());
        assert_eq!(param.value(), &HyperValue::Scalar(0.5));
    }

    #[test]
    fn test_value_spec_parsing() {
        assert_eq!(ValueSpec::from_json(&json!(1.5)).unwrap(), ValueSpec::Scalar(1.5));
        assert_eq!(ValueSpec::from_json(&json!([2.0])).unwrap(), ValueSpec::Scalar(2.0));
        assert_eq!(
            ValueSpec::from_json(&json!([1.0, 0.98])).unwrap(),
            ValueSpec::Vector(vec![1.0, 0.98])
        );
        assert_eq!(ValueSpec::from_json(&json!("sample")).unwrap(), ValueSpec::Sample);
        assert_eq!(ValueSpec::from_json(&json!("log_sample")).unwrap(), ValueSpec::LogSample);
        assert_eq!(ValueSpec::from_json(&json!("learn")).unwrap(), ValueSpec::Learn);

        assert!(matches!(
            ValueSpec::from_json(&json!("guess")),
            Err(ConfigurationError::UnsupportedSentinel(_))
        ));
        assert!(matches!(
            ValueSpec::from_json(&json!([])),
            Err(ConfigurationError::MalformedValue(_))
        ));
        assert!(matches!(
            ValueSpec::from_json(&json!({"val": 1})),
            Err(ConfigurationError::MalformedValue(_))
        ));
    }

    #[test]
    fn test_in_bounds_values_accepted() {
        let bounds = Bounds::range(1e-1, 1e2).unwrap();
        let param = Hyperparameter::new(ValueSpec::Scalar(1.5), bounds, &mut rng()).unwrap();
        assert_eq!(param.value(), &HyperValue::Scalar(1.5));
        assert_eq!(param.bounds(), bounds);

        // Within tolerance of either edge.
        let bounds = Bounds::range(1.0, 2.0).unwrap();
        assert!(Hyperparameter::new(ValueSpec::Scalar(1.0 - 5e-6), bounds, &mut rng()).is_ok());
        assert!(Hyperparameter::new(ValueSpec::Scalar(2.0 + 5e-6), bounds, &mut rng()).is_ok());
    }

    #[test]
    fn test_out_of_bounds_values_rejected() {
        let bounds = Bounds::range(1e-1, 1e2).unwrap();
        assert!(matches!(
            Hyperparameter::new(ValueSpec::Scalar(1e-2), bounds, &mut rng()),
            Err(ConfigurationError::BelowLowerBound { .. })
        ));

        let bounds = Bounds::range(2e-5, 2e1).unwrap();
        assert!(matches!(
            Hyperparameter::new(ValueSpec::Scalar(7000.2), bounds, &mut rng()),
            Err(ConfigurationError::AboveUpperBound { .. })
        ));

        let bounds = Bounds::range(1.0, 2.0).unwrap();
        assert!(Hyperparameter::new(ValueSpec::Scalar(2.0 + 2e-5), bounds, &mut rng()).is_err());
    }

    #[test]
    fn test_vector_values_checked_elementwise() {
        let bounds = Bounds::range(1e-8, 2.0).unwrap();
        let param =
            Hyperparameter::new(ValueSpec::Vector(vec![1.0, 0.98]), bounds, &mut rng()).unwrap();
        assert_eq!(param.value(), &HyperValue::Vector(vec![1.0, 0.98]));

        let result = Hyperparameter::new(ValueSpec::Vector(vec![1.0, 2.1]), bounds, &mut rng());
        assert!(matches!(result, Err(ConfigurationError::AboveUpperBound { .. })));
    }

    #[test]
    fn test_fixed_bounds_reject_sentinels() {
        for sentinel in [ValueSpec::Sample, ValueSpec::LogSample, ValueSpec::Learn] {
            let result = Hyperparameter::new(sentinel, Bounds::Fixed, &mut rng());
            assert!(
                matches!(result, Err(ConfigurationError::SentinelRequiresBounds { .. })),
                "fixed bounds accepted a sentinel: {:?}",
                result
            );
        }
    }

    #[test]
    fn test_fixed_bounds_skip_range_check() {
        let param =
            Hyperparameter::new(ValueSpec::Scalar(-1e9), Bounds::Fixed, &mut rng()).unwrap();
        assert_eq!(param.scalar("nu").unwrap(), -1e9);
        assert!(param.is_fixed());
    }

    #[test]
    fn test_sample_stays_in_bounds() {
        let mut rng = rng();
        for &(low, high) in &[(1e-2, 5e4), (2e-5, 1e1), (1e-1, 1e2), (1e-8, 1e-2)] {
            let bounds = Bounds::range(low, high).unwrap();
            for _ in 0..100 {
                for spec in [ValueSpec::Sample, ValueSpec::LogSample] {
                    let param = Hyperparameter::new(spec, bounds, &mut rng).unwrap();
                    let v = param.scalar("p").unwrap();
                    assert!(v >= low && v <= high, "{} not in [{}, {}]", v, low, high);
                    assert_eq!(param.bounds(), bounds);
                }
            }
        }
    }

    #[test]
    fn test_sampling_is_reproducible() {
        let bounds = Bounds::range(0.5, 3.0).unwrap();
        let a = Hyperparameter::new(ValueSpec::Sample, bounds, &mut rng()).unwrap();
        let b = Hyperparameter::new(ValueSpec::Sample, bounds, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_log_sample_needs_positive_bounds() {
        let bounds = Bounds::range(0.0, 1.0).unwrap();
        assert!(matches!(
            Hyperparameter::new(ValueSpec::LogSample, bounds, &mut rng()),
            Err(ConfigurationError::NonPositiveLogBounds { .. })
        ));
    }

    #[test]
    fn test_learn_is_deferred() {
        let bounds = Bounds::range(0.1, 10.0).unwrap();
        let param = Hyperparameter::new(ValueSpec::Learn, bounds, &mut rng()).unwrap();
        assert_eq!(param.value(), &HyperValue::Learn);
        assert!(matches!(
            param.scalar("length_scale"),
            Err(ConfigurationError::UnresolvedParameter { .. })
        ));
    }

    #[test]
    fn test_update_partial_fields() {
        let mut rng = rng();
        let mut param = Hyperparameter::fixed(1.0);

        param
            .update(None, Some(Bounds::range(0.5, 5.0).unwrap()), &mut rng)
            .unwrap();
        assert_eq!(param.value(), &HyperValue::Scalar(1.0));
        assert_eq!(param.bounds(), Bounds::Range { low: 0.5, high: 5.0 });

        param.update(Some(ValueSpec::Scalar(4.0)), None, &mut rng).unwrap();
        assert_eq!(param.value(), &HyperValue::Scalar(4.0));

        param.update(None, None, &mut rng).unwrap();
        assert_eq!(param.value(), &HyperValue::Scalar(4.0));
    }

    #[test]
    fn test_failed_update_leaves_state() {
        let mut rng = rng();
        let bounds = Bounds::range(0.5, 5.0).unwrap();
        let mut param = Hyperparameter::new(ValueSpec::Scalar(4.0), bounds, &mut rng).unwrap();

        assert!(param.update(Some(ValueSpec::Scalar(9.0)), None, &mut rng).is_err());
        // Narrowing the bounds below the current value is rejected too.
        assert!(param
            .update(None, Some(Bounds::range(0.5, 1.0).unwrap()), &mut rng)
            .is_err());
        assert_eq!(param.value(), &HyperValue::Scalar(4.0));
        assert_eq!(param.bounds(), bounds);
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let mut rng = rng();
        let config: HyperparameterConfig = serde_json::from_str(r#"{"val": 7.2}"#).unwrap();
        let param =
            Hyperparameter::from_config(&config, ValueSpec::Scalar(1.0), Bounds::Fixed, &mut rng)
                .unwrap();
        assert_eq!(param.scalar("length_scale").unwrap(), 7.2);
        assert!(param.is_fixed());

        let config = HyperparameterConfig::new()
            .with_val("sample")
            .with_bounds(json!([2e-5, 1e1]));
        let param =
            Hyperparameter::from_config(&config, ValueSpec::Scalar(1.0), Bounds::Fixed, &mut rng)
                .unwrap();
        let v = param.scalar("length_scale").unwrap();
        assert!((2e-5..=1e1).contains(&v));

        let empty = HyperparameterConfig::new();
        let param =
            Hyperparameter::from_config(&empty, ValueSpec::Scalar(1.0), Bounds::Fixed, &mut rng)
                .unwrap();
        assert_eq!(param, Hyperparameter::fixed(1.0));
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let parsed: std::result::Result<HyperparameterConfig, _> =
            serde_json::from_str(r#"{"value": 1.0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_display() {
        let mut rng = rng();
        let bounds = Bounds::range(0.1, 100.0).unwrap();
        let param = Hyperparameter::new(ValueSpec::Scalar(1.5), bounds, &mut rng).unwrap();
        assert_eq!(param.to_string(), "1.5 - (0.1, 100)");

        let param = Hyperparameter::new(ValueSpec::Vector(vec![1.0, 0.98]), Bounds::Fixed, &mut rng)
            .unwrap();
        assert_eq!(param.to_string(), "[1, 0.98] - fixed");
    }
}
