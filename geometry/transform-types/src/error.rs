//! Error types for transform operations.

use nalgebra::Matrix3;
use thiserror::Error;

/// Errors raised when a transform mutator is handed malformed input.
///
/// Transforming points, vectors or orientations never fails for well-formed
/// transforms; only the operations that accept raw matrices, scales or
/// quaternions validate their input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// The matrix is not orthonormal with a determinant of `+1`.
    #[error("not a rotation matrix:\n{matrix}")]
    NotARotationMatrix {
        /// The rejected matrix.
        matrix: Matrix3<f64>,
    },

    /// The matrix is not a rotation composed with a positive diagonal scale.
    #[error("not a rotation-scale matrix: {reason}")]
    NotARotationScaleMatrix {
        /// Description of what is wrong.
        reason: String,
    },

    /// `NaN` or infinite values were supplied.
    #[error("non-finite values in {what}")]
    NonFinite {
        /// What contained the non-finite values.
        what: String,
    },

    /// The linear map is singular and cannot be inverted.
    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// A 2D operation was requested on a transform that rotates out of the XY plane.
    #[error("transform is not a 2D transform: rotation is not about the Z axis")]
    NotATransform2D,

    /// The quaternion has zero norm or contains non-finite values.
    #[error("degenerate quaternion: cannot be normalized")]
    DegenerateQuaternion,

    /// A classification tolerance is not a positive finite number.
    #[error("invalid {name} tolerance: {value} (must be positive and finite)")]
    InvalidTolerance {
        /// Which tolerance is invalid.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

impl TransformError {
    /// Create a not-a-rotation-matrix error.
    #[must_use]
    pub fn not_a_rotation(matrix: Matrix3<f64>) -> Self {
        Self::NotARotationMatrix { matrix }
    }

    /// Create a not-a-rotation-scale-matrix error.
    #[must_use]
    pub fn not_a_rotation_scale(reason: impl Into<String>) -> Self {
        Self::NotARotationScaleMatrix {
            reason: reason.into(),
        }
    }

    /// Create a non-finite input error.
    #[must_use]
    pub fn non_finite(what: impl Into<String>) -> Self {
        Self::NonFinite { what: what.into() }
    }

    /// Check if this error reports a malformed rotation or rotation-scale matrix.
    #[must_use]
    pub fn is_not_a_rotation(&self) -> bool {
        matches!(
            self,
            Self::NotARotationMatrix { .. } | Self::NotARotationScaleMatrix { .. }
        )
    }

    /// Check if this error reports non-finite input.
    #[must_use]
    pub fn is_non_finite(&self) -> bool {
        matches!(self, Self::NonFinite { .. })
    }
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
