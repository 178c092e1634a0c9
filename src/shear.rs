//! Convergence/shear covariance blocks for a 2-D potential field.
//!
//! A scalar potential `Φ` with an isotropic Gaussian correlation of length
//! `L` induces correlated second-derivative fields
//!
//! ```text
//! κ  = ½(∂₁₁ + ∂₂₂)Φ      (convergence)
//! γ1 = ½(∂₁₁ − ∂₂₂)Φ      (shear, first component)
//! γ2 = ∂₁₂Φ               (shear, second component)
//! ```
//!
//! The builders here take a tensor of raw coordinate differences with shape
//! `(..., n, m, 2)` and assemble the covariance between those fields at every
//! `(row, column)` pair:
//!
//! | builder | output | rows × columns |
//! |---|---|---|
//! | [`field_covariance`] | `(..., 3, n, 3, m)` | `{κ, γ1, γ2} × {κ, γ1, γ2}` |
//! | [`shear_covariance`] | `(..., 2, n, 2, m)` | `{γ1, γ2} × {γ1, γ2}` |
//! | [`cross_covariance`] | `(..., 2, n, 3, m)` | shear rows × field columns |
//!
//! Leading batch axes of length one are dropped from the result.
//!
//! # Example
//!
//! ```rust
//! use lensing_kernels::shear::field_covariance;
//! use ndarray::Array;
//!
//! // 4 row points against 5 column points, no batch axis
//! let diffs = Array::<f64, _>::zeros((4, 5, 2)).into_dyn();
//! let cov = field_covariance(diffs.view(), 1.0)?;
//! assert_eq!(cov.shape(), &[3, 4, 3, 5]);
//! # Ok::<(), lensing_kernels::ConfigurationError>(())
//! ```

use crate::error::{ConfigurationError, Result};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};

// =============================================================================
// Per-pair moments
// =============================================================================

/// Polynomial moments of one `(dx, dy)` pair shared by every element.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PairMoments {
    sum_sq: f64,
    prod_sq: f64,
    sum_quad: f64,
    prod: f64,
    diff_yx_sq: f64,
    diff_xy_sq: f64,
    diff_xy_quad: f64,
    /// `exp(-sum_sq / (2L))`
    exp_term: f64,
}

impl PairMoments {
    fn new(dx: f64, dy: f64, length_scale: f64) -> Self {
        let dx2 = dx * dx;
        let dy2 = dy * dy;
        let sum_sq = dx2 + dy2;
        Self {
            sum_sq,
            prod_sq: dx2 * dy2,
            sum_quad: dx2 * dx2 + dy2 * dy2,
            prod: dx * dy,
            diff_yx_sq: dy2 - dx2,
            diff_xy_sq: dx2 - dy2,
            diff_xy_quad: dx2 * dx2 - dy2 * dy2,
            exp_term: (-sum_sq / (2.0 * length_scale)).exp(),
        }
    }
}

// =============================================================================
// Elementary kernels
// =============================================================================

/// The six independent entries of the symmetric field covariance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Element {
    /// κ with κ
    KK,
    /// κ with γ1
    KG1,
    /// κ with γ2
    KG2,
    /// γ1 with γ1
    G1G1,
    /// γ1 with γ2
    G1G2,
    /// γ2 with γ2
    G2G2,
}

impl Element {
    fn compute(self, m: &PairMoments, l: f64) -> f64 {
        let l2 = l * l;
        let poly = match self {
            Self::KK => 0.25 * (8.0 * l2 - 8.0 * l * m.sum_sq + 2.0 * m.prod_sq + m.sum_quad),
            Self::KG1 => 0.25 * (6.0 * l * m.diff_yx_sq + m.diff_xy_quad),
            Self::KG2 => 0.5 * m.prod * (m.sum_sq - 6.0 * l),
            Self::G1G1 => 0.25 * (4.0 * l2 - 4.0 * l * m.sum_sq - 2.0 * m.prod_sq + m.sum_quad),
            Self::G1G2 => 0.5 * m.prod * m.diff_xy_sq,
            Self::G2G2 => l2 - l * m.sum_sq + m.prod_sq,
        };
        poly * m.exp_term / (l2 * l2)
    }
}

/// Block placement: each element and the `(row, column)` blocks it fills.
type Layout = [(Element, &'static [(usize, usize)])];

const FIELD_LAYOUT: &Layout = &[
    (Element::KK, &[(0, 0)]),
    (Element::KG1, &[(0, 1), (1, 0)]),
    (Element::KG2, &[(0, 2), (2, 0)]),
    (Element::G1G1, &[(1, 1)]),
    (Element::G1G2, &[(1, 2), (2, 1)]),
    (Element::G2G2, &[(2, 2)]),
];

const SHEAR_LAYOUT: &Layout = &[
    (Element::G1G1, &[(0, 0)]),
    (Element::G1G2, &[(0, 1), (1, 0)]),
    (Element::G2G2, &[(1, 1)]),
];

// Not the (γ1, γ2) rows of FIELD_LAYOUT: downstream consumers rely on this
// exact placement.
const CROSS_LAYOUT: &Layout = &[
    (Element::KG1, &[(0, 0)]),
    (Element::KG2, &[(1, 0)]),
    (Element::G1G1, &[(0, 1)]),
    (Element::G1G2, &[(0, 2), (1, 1)]),
    (Element::G2G2, &[(1, 2)]),
];

// =============================================================================
// Builders
// =============================================================================

/// Full convergence/shear covariance, shape `(..., 3, n, 3, m)`.
///
/// Block `(i, j)` pairs field `i` of the row point with field `j` of the
/// column point, fields ordered `κ, γ1, γ2`. Mirrored blocks hold identical
/// values.
pub fn field_covariance(diffs: ArrayViewD<'_, f64>, length_scale: f64) -> Result<ArrayD<f64>> {
    assemble(diffs, length_scale, (3, 3), FIELD_LAYOUT)
}

/// Shear-only covariance, shape `(..., 2, n, 2, m)`, fields ordered `γ1, γ2`.
pub fn shear_covariance(diffs: ArrayViewD<'_, f64>, length_scale: f64) -> Result<ArrayD<f64>> {
    assemble(diffs, length_scale, (2, 2), SHEAR_LAYOUT)
}

/// Shear rows against full-field columns, shape `(..., 2, n, 3, m)`.
///
/// Blocks are `(0,0)=κγ1`, `(1,0)=κγ2`, `(0,1)=γ1γ1`, `(0,2)=(1,1)=γ1γ2`,
/// `(1,2)=γ2γ2`; this is not a sub-block of [`field_covariance`].
pub fn cross_covariance(diffs: ArrayViewD<'_, f64>, length_scale: f64) -> Result<ArrayD<f64>> {
    assemble(diffs, length_scale, (2, 3), CROSS_LAYOUT)
}

fn assemble(
    diffs: ArrayViewD<'_, f64>,
    length_scale: f64,
    (rows, cols): (usize, usize),
    layout: &Layout,
) -> Result<ArrayD<f64>> {
    let moments = pair_moments(diffs.view(), length_scale)?;

    let batch = moments.ndim() - 2;
    let (n, m) = (moments.shape()[batch], moments.shape()[batch + 1]);
    let mut shape = moments.shape()[..batch].to_vec();
    shape.extend_from_slice(&[rows, n, cols, m]);
    let mut out = ArrayD::<f64>::zeros(IxDyn(&shape));

    for &(element, blocks) in layout {
        let values = moments.mapv(|pair| element.compute(&pair, length_scale));
        for &(row, col) in blocks {
            out.index_axis_mut(Axis(batch), row)
                .index_axis_move(Axis(batch + 1), col)
                .assign(&values);
        }
    }

    tracing::trace!(
        input = ?diffs.shape(),
        output = ?out.shape(),
        length_scale,
        "assembled covariance blocks"
    );
    Ok(out)
}

/// Moments of every pair, shape `(..., n, m)` with unit batch axes removed.
fn pair_moments(diffs: ArrayViewD<'_, f64>, length_scale: f64) -> Result<ArrayD<PairMoments>> {
    let ndim = diffs.ndim();
    if ndim < 3 || diffs.shape()[ndim - 1] != 2 {
        return Err(ConfigurationError::DifferenceShape(diffs.shape().to_vec()));
    }

    let mut moments = Zip::from(diffs.lanes(Axis(ndim - 1)))
        .map_collect(|pair| PairMoments::new(pair[0], pair[1], length_scale));

    for axis in (0..ndim - 3).rev() {
        if moments.shape()[axis] == 1 {
            moments = moments.index_axis_move(Axis(axis), 0);
        }
    }
    Ok(moments)
}
