//! Error types for reference-frame operations.

use thiserror::Error;
use transform_types::TransformError;

/// Errors raised by frame-aware operations.
///
/// None of these are transient: they report frames combined the wrong way or
/// frames used after being cleared.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    /// Two frame-bearing operands are not expressed in the same frame instance.
    #[error("frame mismatch: expected '{expected}', got '{actual}'")]
    FrameMismatch {
        /// Name id of the frame that was required.
        expected: String,
        /// Name id of the frame that was supplied.
        actual: String,
    },

    /// Two frames belong to different trees.
    #[error(
        "frames do not share a root: '{frame}' is under '{frame_root}', '{other}' is under '{other_root}'"
    )]
    RootMismatch {
        /// Name id of the first frame.
        frame: String,
        /// Name id of the second frame.
        other: String,
        /// Root of the first frame.
        frame_root: String,
        /// Root of the second frame.
        other_root: String,
    },

    /// The frame was removed or its subtree was cleared.
    #[error("frame '{name}' was removed from its frame tree and can no longer be used")]
    DisabledFrame {
        /// Name of the disabled frame.
        name: String,
    },

    /// The frame name contains the reserved `:` separator.
    #[error("invalid frame name '{name}': names cannot contain ':'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A stationary frame was requested under a frame that moves.
    #[error("frame '{name}' cannot be stationary: parent '{parent}' is not stationary")]
    StationaryUnderMovingParent {
        /// Name of the frame being created.
        name: String,
        /// Name id of the non-stationary parent.
        parent: String,
    },

    /// The frame does not satisfy a required property.
    #[error("frame '{name}' is not {property}")]
    MissingProperty {
        /// Name id of the frame.
        name: String,
        /// The property that was required, e.g. "stationary".
        property: &'static str,
    },

    /// A transform was rejected while building or updating a frame.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl FrameError {
    /// Create a frame mismatch error.
    #[must_use]
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::FrameMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a disabled frame error.
    #[must_use]
    pub fn disabled(name: impl Into<String>) -> Self {
        Self::DisabledFrame { name: name.into() }
    }

    /// Check if this error reports frames that cannot be combined, either
    /// because they differ or because they live in different trees.
    #[must_use]
    pub fn is_frame_mismatch(&self) -> bool {
        matches!(self, Self::FrameMismatch { .. } | Self::RootMismatch { .. })
    }

    /// Check if this error reports use of a removed frame.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::DisabledFrame { .. })
    }
}

/// Result type for frame operations.
pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameError::mismatch("world:a", "world:b");
        assert!(err.to_string().contains("world:a"));
        assert!(err.to_string().contains("world:b"));

        let err = FrameError::disabled("sensor");
        assert!(err.to_string().contains("sensor"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(FrameError::mismatch("a", "b").is_frame_mismatch());
        let err = FrameError::RootMismatch {
            frame: "a".into(),
            other: "b".into(),
            frame_root: "r1".into(),
            other_root: "r2".into(),
        };
        assert!(err.is_frame_mismatch());
        assert!(!err.is_disabled());
        assert!(FrameError::disabled("a").is_disabled());
        assert!(!FrameError::disabled("a").is_frame_mismatch());
    }

    #[test]
    fn test_from_transform_error() {
        let err: FrameError = TransformError::NotATransform2D.into();
        assert!(matches!(err, FrameError::Transform(_)));
    }
}
