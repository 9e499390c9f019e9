//! Frame-bearing values and the identity check that guards them.

use transform_types::Transformable;

use crate::error::Result;
use crate::frame::ReferenceFrame;

/// Check whether two handles refer to the very same frame.
///
/// Names and transforms play no part: two frames built identically are
/// still different frames.
#[must_use]
pub fn same_frame(a: &ReferenceFrame, b: &ReferenceFrame) -> bool {
    a == b
}

/// A value expressed in a reference frame.
///
/// Anything that combines two holders must call
/// [`ReferenceFrameHolder::check_reference_frame_match`] first.
pub trait ReferenceFrameHolder {
    /// The frame this value is expressed in.
    fn reference_frame(&self) -> &ReferenceFrame;

    /// Fail unless `other` is expressed in the same frame as `self`.
    fn check_reference_frame_match<H: ReferenceFrameHolder + ?Sized>(&self, other: &H) -> Result<()> {
        self.reference_frame()
            .check_reference_frame_match(other.reference_frame())
    }
}

impl ReferenceFrameHolder for ReferenceFrame {
    fn reference_frame(&self) -> &ReferenceFrame {
        self
    }
}

/// A value tagged with the frame it is expressed in.
///
/// # Example
///
/// ```
/// use frame_tree::{Framed, ReferenceFrame};
/// use nalgebra::{Point3, Vector3};
///
/// let world = ReferenceFrame::new_root("world").unwrap();
/// let body = ReferenceFrame::with_fixed_translation_from_parent("body", &world, Vector3::new(0.0, 0.0, 1.0)).unwrap();
///
/// let mut p = Framed::new(body.clone(), Point3::<f64>::origin());
/// p.change_frame(&world).unwrap();
/// assert_eq!(*p.value(), Point3::new(0.0, 0.0, 1.0));
///
/// // Values in different frames do not combine
/// let q = Framed::new(body, Vector3::new(1.0, 0.0, 0.0));
/// assert!(p.combine(&q, |p, v| p + v).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Framed<T> {
    frame: ReferenceFrame,
    value: T,
}

impl<T> Framed<T> {
    /// Tag `value` with `frame`.
    #[must_use]
    pub fn new(frame: ReferenceFrame, value: T) -> Self {
        Self { frame, value }
    }

    /// The underlying value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the value, in the same frame.
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Split into frame and value.
    #[must_use]
    pub fn into_parts(self) -> (ReferenceFrame, T) {
        (self.frame, self.value)
    }

    /// Combine with another framed value after checking both share a frame.
    pub fn combine<U, R>(
        &self,
        other: &Framed<U>,
        combine: impl FnOnce(&T, &U) -> R,
    ) -> Result<Framed<R>> {
        self.check_reference_frame_match(other)?;
        Ok(Framed::new(self.frame.clone(), combine(&self.value, &other.value)))
    }
}

impl<T: Transformable> Framed<T> {
    /// Re-express the value in `desired`.
    ///
    /// On error the value and its frame are left untouched.
    pub fn change_frame(&mut self, desired: &ReferenceFrame) -> Result<()> {
        self.frame
            .transform_from_this_to_desired_frame(desired, &mut self.value)?;
        self.frame = desired.clone();
        Ok(())
    }

    /// Copy of the value re-expressed in `desired`.
    pub fn in_frame(&self, desired: &ReferenceFrame) -> Result<Self>
    where
        T: Clone,
    {
        let mut moved = self.clone();
        moved.change_frame(desired)?;
        Ok(moved)
    }
}

impl<T> ReferenceFrameHolder for Framed<T> {
    fn reference_frame(&self) -> &ReferenceFrame {
        &self.frame
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use transform_types::RigidBodyTransform;

    #[test]
    fn test_same_frame_is_identity() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, RigidBodyTransform::identity()).unwrap();
        let b = ReferenceFrame::with_fixed_transform_to_parent("a", &root, RigidBodyTransform::identity()).unwrap();
        assert!(same_frame(&a, &a));
        assert!(same_frame(&a, &a.clone()));
        assert!(!same_frame(&a, &b));
    }

    #[test]
    fn test_holder_check() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let other = ReferenceFrame::with_fixed_transform_to_parent("other", &root, RigidBodyTransform::identity()).unwrap();
        let p = Framed::new(root.clone(), Point3::<f64>::origin());
        assert!(p.check_reference_frame_match(&root).is_ok());
        assert!(p.check_reference_frame_match(&other).unwrap_err().is_frame_mismatch());
    }

    #[test]
    fn test_change_frame_round_trip() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent(
            "a",
            &root,
            RigidBodyTransform::new(
                nalgebra::Rotation3::from_euler_angles(0.2, -0.4, 1.1),
                Vector3::new(1.0, 2.0, 3.0),
            ),
        )
        .unwrap();
        let start = Point3::new(0.5, -1.0, 2.0);
        let mut p = Framed::new(a.clone(), start);
        p.change_frame(&root).unwrap();
        assert_eq!(p.reference_frame(), &root);
        p.change_frame(&a).unwrap();
        assert_relative_eq!(*p.value(), start, epsilon = 1e-12);
    }

    #[test]
    fn test_change_frame_failure_leaves_value() {
        let r1 = ReferenceFrame::new_root("r1").unwrap();
        let r2 = ReferenceFrame::new_root("r2").unwrap();
        let mut v = Framed::new(r1.clone(), Vector3::new(1.0, 0.0, 0.0));
        assert!(v.change_frame(&r2).is_err());
        assert_eq!(v.reference_frame(), &r1);
        assert_eq!(*v.value(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_combine_in_same_frame() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let p = Framed::new(root.clone(), Point3::new(1.0, 0.0, 0.0));
        let v = Framed::new(root, Vector3::new(0.0, 1.0, 0.0));
        let sum = p.combine(&v, |p, v| p + v).unwrap();
        assert_eq!(*sum.value(), Point3::new(1.0, 1.0, 0.0));
    }
}
