//! Numerical tolerances used to classify matrices.
//!
//! The checks that decide whether a matrix is the identity, a rotation, or a
//! rotation about the Z axis all compare against an epsilon. Those epsilons are
//! grouped here so callers working at a different numerical scale can tune them.

use crate::error::{Result, TransformError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default epsilon for the per-coefficient identity check.
pub const EPS_CHECK_IDENTITY: f64 = 1.0e-12;

/// Default epsilon for the orthonormality check of rotation matrices.
pub const EPS_CHECK_ROTATION: f64 = 1.0e-7;

/// Default epsilon for the rotation-about-Z check.
pub const EPS_CHECK_2D: f64 = 1.0e-8;

/// Epsilons used when classifying a 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tolerances {
    /// Maximum per-coefficient deviation from the identity.
    pub identity: f64,
    /// Maximum deviation of row norms, row dot products and determinant for a rotation.
    pub rotation: f64,
    /// Maximum magnitude of the out-of-plane coefficients for a rotation about Z.
    pub planar: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Tolerances {
    /// The tolerances used throughout the crate unless overridden.
    pub const DEFAULT: Self = Self {
        identity: EPS_CHECK_IDENTITY,
        rotation: EPS_CHECK_ROTATION,
        planar: EPS_CHECK_2D,
    };

    /// Tight tolerances for matrices produced by exact construction.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            identity: 1.0e-15,
            rotation: 1.0e-12,
            planar: 1.0e-12,
        }
    }

    /// Loose tolerances for matrices accumulated over many compositions or
    /// read from single-precision sources.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            identity: 1.0e-9,
            rotation: 1.0e-5,
            planar: 1.0e-6,
        }
    }

    /// Set the identity epsilon.
    #[must_use]
    pub fn with_identity(mut self, epsilon: f64) -> Self {
        self.identity = epsilon;
        self
    }

    /// Set the rotation epsilon.
    #[must_use]
    pub fn with_rotation(mut self, epsilon: f64) -> Self {
        self.rotation = epsilon;
        self
    }

    /// Set the planar (rotation about Z) epsilon.
    #[must_use]
    pub fn with_planar(mut self, epsilon: f64) -> Self {
        self.planar = epsilon;
        self
    }

    /// Check that every epsilon is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("identity", self.identity),
            ("rotation", self.rotation),
            ("planar", self.planar),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TransformError::InvalidTolerance { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tolerances() {
        let tol = Tolerances::default();
        assert_eq!(tol.identity, EPS_CHECK_IDENTITY);
        assert_eq!(tol.rotation, EPS_CHECK_ROTATION);
        assert_eq!(tol.planar, EPS_CHECK_2D);
        assert!(tol.validate().is_ok());
    }

    #[test]
    fn test_presets_are_ordered() {
        let strict = Tolerances::strict();
        let relaxed = Tolerances::relaxed();
        assert!(strict.rotation < Tolerances::DEFAULT.rotation);
        assert!(relaxed.rotation > Tolerances::DEFAULT.rotation);
        assert!(strict.validate().is_ok());
        assert!(relaxed.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let tol = Tolerances::default()
            .with_identity(1e-10)
            .with_rotation(1e-6)
            .with_planar(1e-4);
        assert_eq!(tol.identity, 1e-10);
        assert_eq!(tol.rotation, 1e-6);
        assert_eq!(tol.planar, 1e-4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Tolerances::default().with_rotation(0.0).validate().is_err());
        assert!(Tolerances::default().with_planar(-1.0).validate().is_err());
        assert!(
            Tolerances::default()
                .with_identity(f64::NAN)
                .validate()
                .is_err()
        );
    }
}
