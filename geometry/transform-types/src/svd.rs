//! Singular value decomposition of 3x3 matrices into rotation, scale, rotation.
//!
//! A general linear map `M` is written `M = U * diag(W) * Vᵀ` with `U` and `V`
//! proper rotations stored as unit quaternions.
//!
//! # Conventions
//!
//! - Singular values are ordered by decreasing magnitude, as produced by the
//!   underlying bidiagonal solver.
//! - `U` and `V` always have determinant `+1`. When the solver hands back an
//!   improper factor, its last column is negated together with `W.z`, so a
//!   matrix with a negative determinant carries the sign on `W.z`.
//! - For repeated singular values the rotations are not unique; only the
//!   reconstruction `U * diag(W) * Vᵀ ≈ M` is guaranteed.

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output of a 3x3 singular value decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Svd3 {
    /// Pre-scale rotation `U`.
    pub u: UnitQuaternion<f64>,
    /// Singular values `W`.
    pub w: Vector3<f64>,
    /// Rotation `V`; the post-scale rotation is its inverse `Vᵀ`.
    pub v: UnitQuaternion<f64>,
}

impl Default for Svd3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Svd3 {
    /// Decomposition of the identity matrix.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            u: UnitQuaternion::identity(),
            w: Vector3::new(1.0, 1.0, 1.0),
            v: UnitQuaternion::identity(),
        }
    }

    /// Decomposition filled with `NaN`, used for non-finite input.
    #[must_use]
    pub fn nan() -> Self {
        let q = UnitQuaternion::new_unchecked(Quaternion::new(
            f64::NAN,
            f64::NAN,
            f64::NAN,
            f64::NAN,
        ));
        Self {
            u: q,
            w: Vector3::repeat(f64::NAN),
            v: q,
        }
    }

    /// Decomposition of a pure rotation: `U = q`, `W = (1, 1, 1)`, `V = I`.
    #[must_use]
    pub fn from_rotation(q: UnitQuaternion<f64>) -> Self {
        Self {
            u: q,
            w: Vector3::new(1.0, 1.0, 1.0),
            v: UnitQuaternion::identity(),
        }
    }

    /// Run the general solver on `m`.
    #[must_use]
    pub fn decompose(m: &Matrix3<f64>) -> Self {
        if m.iter().any(|x| !x.is_finite()) {
            warn!("SVD requested on a matrix with non-finite coefficients");
            return Self::nan();
        }

        let svd = m.svd(true, true);
        let (Some(mut u), Some(mut v_t)) = (svd.u, svd.v_t) else {
            warn!("SVD solver did not produce both rotation factors");
            return Self::nan();
        };
        let mut w = svd.singular_values;

        if u.determinant() < 0.0 {
            u.column_mut(2).neg_mut();
            w.z = -w.z;
        }
        if v_t.determinant() < 0.0 {
            v_t.row_mut(2).neg_mut();
            w.z = -w.z;
        }

        debug!(w = ?w, "general SVD solve");

        Self {
            u: UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(u)),
            w,
            v: UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
                v_t.transpose(),
            )),
        }
    }

    /// Post-scale rotation `Vᵀ`.
    #[must_use]
    pub fn post_scale(&self) -> UnitQuaternion<f64> {
        self.v.inverse()
    }

    /// Rebuild the matrix `U * diag(W) * Vᵀ`.
    #[must_use]
    pub fn reconstruct(&self) -> Matrix3<f64> {
        self.u.to_rotation_matrix().matrix()
            * Matrix3::from_diagonal(&self.w)
            * self.v.to_rotation_matrix().matrix().transpose()
    }

    /// Product of the singular values, equal to the determinant of the matrix.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.w.x * self.w.y * self.w.z
    }

    /// Turn this into the decomposition of the transposed matrix.
    ///
    /// `(U W Vᵀ)ᵀ = V W Uᵀ`, so only the rotations swap.
    pub fn transpose(&mut self) {
        std::mem::swap(&mut self.u, &mut self.v);
    }

    /// Turn this into the decomposition of the inverse matrix.
    ///
    /// `(U W Vᵀ)⁻¹ = V W⁻¹ Uᵀ`.
    pub fn invert(&mut self) {
        self.transpose();
        self.w = self.w.map(f64::recip);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_matrix() -> Matrix3<f64> {
        Matrix3::new(2.0, -1.0, 0.5, 0.3, 1.5, -0.7, 0.9, 0.2, 3.0)
    }

    #[test]
    fn test_reconstruction() {
        let m = sample_matrix();
        let svd = Svd3::decompose(&m);
        assert_relative_eq!(svd.reconstruct(), m, epsilon = 1e-10);
    }

    #[test]
    fn test_singular_values_descending_magnitude() {
        let svd = Svd3::decompose(&sample_matrix());
        assert!(svd.w.x.abs() >= svd.w.y.abs());
        assert!(svd.w.y.abs() >= svd.w.z.abs());
    }

    #[test]
    fn test_negative_determinant_sign_on_last_value() {
        let m = Matrix3::from_diagonal(&Vector3::new(3.0, 2.0, -1.0));
        let svd = Svd3::decompose(&m);
        assert!(svd.w.x > 0.0);
        assert!(svd.w.y > 0.0);
        assert!(svd.w.z < 0.0);
        assert_relative_eq!(svd.determinant(), m.determinant(), epsilon = 1e-10);
        assert_relative_eq!(svd.reconstruct(), m, epsilon = 1e-10);
    }

    #[test]
    fn test_rank_deficient() {
        let m = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 0.0, 1.0);
        let svd = Svd3::decompose(&m);
        assert_relative_eq!(svd.w.z, 0.0, epsilon = 1e-10);
        assert_relative_eq!(svd.reconstruct(), m, epsilon = 1e-10);
    }

    #[test]
    fn test_transpose_and_invert_patches() {
        let m = sample_matrix();
        let mut svd = Svd3::decompose(&m);

        svd.transpose();
        assert_relative_eq!(svd.reconstruct(), m.transpose(), epsilon = 1e-10);

        svd.transpose();
        svd.invert();
        let inverse = m.try_inverse().unwrap();
        assert_relative_eq!(svd.reconstruct(), inverse, epsilon = 1e-10);
    }

    #[test]
    fn test_non_finite_input() {
        let mut m = Matrix3::identity();
        m[(1, 1)] = f64::INFINITY;
        let svd = Svd3::decompose(&m);
        assert!(svd.w.x.is_nan());
    }

    #[test]
    fn test_from_rotation() {
        let q = UnitQuaternion::from_euler_angles(0.4, 0.1, -0.8);
        let svd = Svd3::from_rotation(q);
        assert_relative_eq!(
            svd.reconstruct(),
            *q.to_rotation_matrix().matrix(),
            epsilon = 1e-12
        );
        assert_relative_eq!(svd.determinant(), 1.0);
    }
}
