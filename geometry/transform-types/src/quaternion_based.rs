//! Unit-quaternion plus translation transform.

use nalgebra::{Matrix3, Point3, Quaternion, Rotation3, UnitQuaternion, Vector3};

use crate::error::{Result, TransformError};
use crate::traits::{RigidParts, Transform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid transform that stores its rotation as a unit quaternion.
///
/// Raw quaternions are normalized on the way in, so the stored rotation is
/// always unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuaternionBasedTransform {
    quaternion: UnitQuaternion<f64>,
    translation: Vector3<f64>,
}

impl Default for QuaternionBasedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl QuaternionBasedTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// Build from a unit quaternion and a translation.
    #[must_use]
    pub fn new(quaternion: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            quaternion,
            translation,
        }
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(UnitQuaternion::identity(), translation)
    }

    /// Build from a raw quaternion, normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::DegenerateQuaternion`] if `q` has zero norm or
    /// non-finite components.
    pub fn from_raw_quaternion(q: &Quaternion<f64>, translation: Vector3<f64>) -> Result<Self> {
        Ok(Self::new(normalized(q)?, translation))
    }

    /// Rotation part.
    #[must_use]
    pub fn quaternion(&self) -> &UnitQuaternion<f64> {
        &self.quaternion
    }

    /// Translation part.
    #[must_use]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Replace the rotation with a raw quaternion, normalizing it.
    ///
    /// `self` is unchanged on error.
    pub fn set_raw_quaternion(&mut self, q: &Quaternion<f64>) -> Result<()> {
        self.quaternion = normalized(q)?;
        Ok(())
    }

    /// Replace the rotation.
    pub fn set_quaternion(&mut self, q: UnitQuaternion<f64>) {
        self.quaternion = q;
    }

    /// Replace the translation.
    pub fn set_translation(&mut self, translation: Vector3<f64>) {
        self.translation = translation;
    }

    /// Reset to the identity.
    pub fn set_identity(&mut self) {
        *self = Self::identity();
    }

    /// Copy the rotation and translation of any transform kind.
    pub fn set_from<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.quaternion = UnitQuaternion::from_rotation_matrix(&other.rotation_part());
        self.translation = other.translation_part();
    }

    /// Renormalize the quaternion after drift from repeated composition.
    pub fn normalize_rotation_part(&mut self) {
        self.quaternion.renormalize();
    }

    /// Check whether the rotation is only about the Z axis.
    #[must_use]
    pub fn is_rotation_2d(&self) -> bool {
        let q = self.quaternion.quaternion();
        q.i.abs() <= crate::config::EPS_CHECK_2D && q.j.abs() <= crate::config::EPS_CHECK_2D
    }

    /// Invert in place.
    pub fn invert(&mut self) {
        self.quaternion = self.quaternion.inverse();
        self.translation = -(self.quaternion * self.translation);
    }

    /// The inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut result = *self;
        result.invert();
        result
    }

    /// Set to the inverse of `other`.
    pub fn set_and_invert<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.set_from(other);
        self.invert();
    }

    /// `self = self ∘ other`.
    pub fn multiply<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = operand_quaternion(other);
        self.translation += self.quaternion * other.translation_part();
        self.quaternion *= q;
    }

    /// `self = self⁻¹ ∘ other`.
    pub fn multiply_invert_this<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = operand_quaternion(other);
        self.translation = self
            .quaternion
            .inverse_transform_vector(&(other.translation_part() - self.translation));
        self.quaternion = self.quaternion.inverse() * q;
    }

    /// `self = self ∘ other⁻¹`.
    pub fn multiply_invert_other<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = operand_quaternion(other);
        self.quaternion *= q.inverse();
        self.translation -= self.quaternion * other.translation_part();
    }

    /// `self = other ∘ self`.
    pub fn pre_multiply<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = operand_quaternion(other);
        self.translation = q * self.translation + other.translation_part();
        self.quaternion = q * self.quaternion;
    }

    /// `self = other ∘ self⁻¹`.
    pub fn pre_multiply_invert_this<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = operand_quaternion(other);
        self.quaternion = q * self.quaternion.inverse();
        self.translation = other.translation_part() - self.quaternion * self.translation;
    }

    /// `self = other⁻¹ ∘ self`.
    pub fn pre_multiply_invert_other<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = operand_quaternion(other);
        self.translation = q.inverse_transform_vector(&(self.translation - other.translation_part()));
        self.quaternion = q.inverse() * self.quaternion;
    }

    /// Translate in the local frame.
    pub fn append_translation(&mut self, v: &Vector3<f64>) {
        self.translation += self.quaternion * v;
    }

    /// Translate in the parent frame.
    pub fn prepend_translation(&mut self, v: &Vector3<f64>) {
        self.translation += v;
    }

    /// Rotate about the local Z axis.
    pub fn append_yaw_rotation(&mut self, yaw: f64) {
        self.quaternion *= UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
    }

    /// Rotate about the local Y axis.
    pub fn append_pitch_rotation(&mut self, pitch: f64) {
        self.quaternion *= UnitQuaternion::from_axis_angle(&Vector3::y_axis(), pitch);
    }

    /// Rotate about the local X axis.
    pub fn append_roll_rotation(&mut self, roll: f64) {
        self.quaternion *= UnitQuaternion::from_axis_angle(&Vector3::x_axis(), roll);
    }

    /// Rotate the whole transform about the parent Z axis.
    pub fn prepend_yaw_rotation(&mut self, yaw: f64) {
        let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
        self.quaternion = qz * self.quaternion;
        self.translation = qz * self.translation;
    }

    /// Interpolate towards `other`: slerp on the rotation, lerp on the translation.
    #[must_use]
    pub fn interpolate(&self, other: &Self, alpha: f64) -> Self {
        let q = self
            .quaternion
            .try_slerp(&other.quaternion, alpha, 1.0e-12)
            .unwrap_or(self.quaternion);
        Self::new(q, self.translation.lerp(&other.translation, alpha))
    }

    /// Per-component comparison. `q` and `-q` are not considered equal here.
    #[must_use]
    pub fn epsilon_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.quaternion
            .coords
            .iter()
            .zip(other.quaternion.coords.iter())
            .chain(self.translation.iter().zip(other.translation.iter()))
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Compare by rotation angle and translation distance.
    #[must_use]
    pub fn geometrically_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.quaternion.angle_to(&other.quaternion) <= epsilon
            && (self.translation - other.translation).norm() <= epsilon
    }
}

fn normalized(q: &Quaternion<f64>) -> Result<UnitQuaternion<f64>> {
    if q.coords.iter().any(|x| !x.is_finite()) {
        return Err(TransformError::DegenerateQuaternion);
    }
    UnitQuaternion::try_new(*q, 0.0).ok_or(TransformError::DegenerateQuaternion)
}

fn operand_quaternion<T: RigidParts + ?Sized>(other: &T) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&other.rotation_part())
}

impl RigidParts for QuaternionBasedTransform {
    fn rotation_part(&self) -> Rotation3<f64> {
        self.quaternion.to_rotation_matrix()
    }

    fn translation_part(&self) -> Vector3<f64> {
        self.translation
    }
}

impl Transform for QuaternionBasedTransform {
    fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.quaternion * p + self.translation
    }

    fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion * v
    }

    fn transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.quaternion * q
    }

    fn transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        let r = self.quaternion.to_rotation_matrix();
        r.matrix() * m * r.matrix().transpose()
    }

    fn inverse_transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.quaternion.inverse_transform_point(&(p - self.translation))
    }

    fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion.inverse_transform_vector(v)
    }

    fn inverse_transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.quaternion.inverse() * q
    }

    fn inverse_transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        let r = self.quaternion.to_rotation_matrix();
        r.matrix().transpose() * m * r.matrix()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::RigidBodyTransform;
    use approx::assert_relative_eq;

    fn sample() -> QuaternionBasedTransform {
        QuaternionBasedTransform::new(
            UnitQuaternion::from_euler_angles(0.2, -0.5, 1.3),
            Vector3::new(1.0, -2.0, 0.5),
        )
    }

    fn rigid_other() -> RigidBodyTransform {
        RigidBodyTransform::new(
            Rotation3::from_euler_angles(-1.1, 0.4, 0.7),
            Vector3::new(-0.3, 0.8, 2.0),
        )
    }

    #[test]
    fn test_raw_quaternion_is_normalized() {
        let t = QuaternionBasedTransform::from_raw_quaternion(
            &Quaternion::new(2.0, 0.0, 0.0, 2.0),
            Vector3::zeros(),
        )
        .unwrap();
        assert_relative_eq!(t.quaternion().norm(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_degenerate_quaternion_rejected() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(
            QuaternionBasedTransform::from_raw_quaternion(&zero, Vector3::zeros()),
            Err(TransformError::DegenerateQuaternion)
        );
        let mut t = sample();
        let nan = Quaternion::new(f64::NAN, 0.0, 0.0, 1.0);
        assert!(t.set_raw_quaternion(&nan).is_err());
        assert_eq!(t, sample());
    }

    #[test]
    fn test_agrees_with_rigid_body_transform() {
        let q = sample();
        let mut rigid = RigidBodyTransform::identity();
        rigid.set_from(&q);
        let p = Point3::new(0.4, -0.2, 1.5);
        assert_relative_eq!(q.transform_point(&p), rigid.transform_point(&p), epsilon = 1e-12);

        let mut a = q;
        a.multiply(&rigid_other());
        rigid.multiply(&rigid_other());
        assert_relative_eq!(a.transform_point(&p), rigid.transform_point(&p), epsilon = 1e-12);
    }

    #[test]
    fn test_invert_variants() {
        let a = sample();
        let b = rigid_other();
        let p = Point3::new(0.3, 0.1, -0.7);

        let mut t = a;
        t.multiply_invert_this(&b);
        assert_relative_eq!(
            t.transform_point(&p),
            a.inverse_transform_point(&b.transform_point(&p)),
            epsilon = 1e-12
        );

        let mut t = a;
        t.multiply_invert_other(&b);
        assert_relative_eq!(
            t.transform_point(&p),
            a.transform_point(&b.inverse_transform_point(&p)),
            epsilon = 1e-12
        );

        let mut t = a;
        t.pre_multiply_invert_this(&b);
        assert_relative_eq!(
            t.transform_point(&p),
            b.transform_point(&a.inverse_transform_point(&p)),
            epsilon = 1e-12
        );

        let mut t = a;
        t.pre_multiply_invert_other(&b);
        assert_relative_eq!(
            t.transform_point(&p),
            b.inverse_transform_point(&a.transform_point(&p)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_inverse_round_trip() {
        let a = sample();
        let mut t = a;
        t.multiply(&a.inverse());
        assert!(t.geometrically_equals(&QuaternionBasedTransform::identity(), 1e-12));
    }

    #[test]
    fn test_is_rotation_2d() {
        let mut t = QuaternionBasedTransform::identity();
        t.append_yaw_rotation(0.8);
        assert!(t.is_rotation_2d());
        t.append_pitch_rotation(0.1);
        assert!(!t.is_rotation_2d());
    }
}
