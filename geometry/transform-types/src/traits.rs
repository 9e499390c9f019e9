//! Capability traits shared by the transform kinds.
//!
//! - [`Transform`] is what a transform can do to points, vectors,
//!   orientations and matrices.
//! - [`Transformable`] is the other side: a value that knows how to move
//!   itself through any [`Transform`].
//! - [`RigidParts`] exposes the rotation and translation of a transform so the
//!   composition methods accept any of the three kinds as operand.

use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};

/// A transform that can be applied to geometric quantities.
///
/// Scale (affine only) is applied first, then rotation, then, for points
/// only, translation. The `inverse_*` methods apply the inverse without
/// building an inverted transform.
///
/// # Implementors
///
/// - [`RigidBodyTransform`](crate::RigidBodyTransform)
/// - [`QuaternionBasedTransform`](crate::QuaternionBasedTransform)
/// - [`AffineTransform`](crate::AffineTransform)
pub trait Transform {
    /// Transform a point: scale, rotate and translate.
    fn transform_point(&self, p: &Point3<f64>) -> Point3<f64>;

    /// Transform a vector: scale and rotate, never translate.
    fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64>;

    /// Rotate an orientation. Scale does not apply to orientations.
    fn transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64>;

    /// Change the basis of a matrix: `A * M * A⁻¹` with `A` the linear part.
    fn transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64>;

    /// Undo [`Self::transform_point`]: subtract the translation, then inverse-rotate.
    fn inverse_transform_point(&self, p: &Point3<f64>) -> Point3<f64>;

    /// Undo [`Self::transform_vector`].
    fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64>;

    /// Undo [`Self::transform_orientation`].
    fn inverse_transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64>;

    /// Undo [`Self::transform_matrix`].
    fn inverse_transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64>;
}

/// Rotation and translation of a transform, used as composition operand.
///
/// For an [`AffineTransform`](crate::AffineTransform) the rotation is the
/// best-fit rotation of its rotation-scale matrix; its scale is not part of
/// the rigid parts.
pub trait RigidParts {
    /// Rotation part.
    fn rotation_part(&self) -> Rotation3<f64>;

    /// Translation part.
    fn translation_part(&self) -> Vector3<f64>;
}

/// A value that can be moved through a [`Transform`].
///
/// # Example
///
/// ```
/// use transform_types::{RigidBodyTransform, Transformable};
/// use nalgebra::{Point3, Vector3};
///
/// let t = RigidBodyTransform::from_translation(Vector3::new(1.0, 2.0, 3.0));
/// let mut p = Point3::origin();
/// p.apply_transform(&t);
/// assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
/// ```
pub trait Transformable {
    /// Replace `self` with its image under `transform`.
    fn apply_transform<T: Transform + ?Sized>(&mut self, transform: &T);

    /// Replace `self` with its image under the inverse of `transform`.
    fn apply_inverse_transform<T: Transform + ?Sized>(&mut self, transform: &T);
}

impl Transformable for Point3<f64> {
    fn apply_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.transform_point(self);
    }

    fn apply_inverse_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.inverse_transform_point(self);
    }
}

impl Transformable for Vector3<f64> {
    fn apply_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.transform_vector(self);
    }

    fn apply_inverse_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.inverse_transform_vector(self);
    }
}

impl Transformable for UnitQuaternion<f64> {
    fn apply_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.transform_orientation(self);
    }

    fn apply_inverse_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.inverse_transform_orientation(self);
    }
}

impl Transformable for Matrix3<f64> {
    fn apply_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.transform_matrix(self);
    }

    fn apply_inverse_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        *self = transform.inverse_transform_matrix(self);
    }
}

impl<V: Transformable> Transformable for Vec<V> {
    fn apply_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        for value in self.iter_mut() {
            value.apply_transform(transform);
        }
    }

    fn apply_inverse_transform<T: Transform + ?Sized>(&mut self, transform: &T) {
        for value in self.iter_mut() {
            value.apply_inverse_transform(transform);
        }
    }
}
