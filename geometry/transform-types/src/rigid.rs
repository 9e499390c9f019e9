//! Rotation-matrix plus translation transform.

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point2, Point3, Rotation3, Translation3, Unit, UnitQuaternion,
    Vector3,
};

use crate::config::Tolerances;
use crate::error::{Result, TransformError};
use crate::features;
use crate::traits::{RigidParts, Transform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid-body transform: an orthonormal rotation followed by a translation.
///
/// Maps `p` to `R * p + t`. Raw matrices handed to [`Self::from_matrix`] or
/// [`Self::set_rotation_matrix`] are checked to be proper rotations.
///
/// # Example
///
/// ```
/// use transform_types::{RigidBodyTransform, Transform};
/// use nalgebra::{Point3, Vector3};
/// use std::f64::consts::FRAC_PI_2;
///
/// let mut t = RigidBodyTransform::from_translation(Vector3::new(1.0, 0.0, 0.0));
/// t.append_yaw_rotation(FRAC_PI_2);
///
/// let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyTransform {
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
}

impl Default for RigidBodyTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidBodyTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Build from a rotation and a translation.
    #[must_use]
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(Rotation3::identity(), translation)
    }

    /// Rotation given as a quaternion, plus a translation.
    #[must_use]
    pub fn from_quaternion(q: &UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self::new(q.to_rotation_matrix(), translation)
    }

    /// Rotation of `angle` radians about `axis`, plus a translation.
    #[must_use]
    pub fn from_axis_angle(
        axis: &Unit<Vector3<f64>>,
        angle: f64,
        translation: Vector3<f64>,
    ) -> Self {
        Self::new(Rotation3::from_axis_angle(axis, angle), translation)
    }

    /// Rotation `Rz(yaw) * Ry(pitch) * Rx(roll)` without translation.
    #[must_use]
    pub fn from_yaw_pitch_roll(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self::new(
            Rotation3::from_euler_angles(roll, pitch, yaw),
            Vector3::zeros(),
        )
    }

    /// Build from a raw rotation matrix and a translation.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NonFinite`] if any value is `NaN` or infinite
    /// and [`TransformError::NotARotationMatrix`] if `m` is not a proper rotation.
    pub fn from_matrix(m: &Matrix3<f64>, translation: Vector3<f64>) -> Result<Self> {
        Self::from_matrix_with(m, translation, &Tolerances::default())
    }

    /// Like [`Self::from_matrix`] with explicit tolerances.
    pub fn from_matrix_with(
        m: &Matrix3<f64>,
        translation: Vector3<f64>,
        tolerances: &Tolerances,
    ) -> Result<Self> {
        if translation.iter().any(|x| !x.is_finite()) {
            return Err(TransformError::non_finite("translation"));
        }
        let rotation = checked_rotation(m, tolerances)?;
        Ok(Self::new(rotation, translation))
    }

    /// Rotation part.
    #[must_use]
    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Rotation part as a quaternion.
    #[must_use]
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.rotation)
    }

    /// Translation part.
    #[must_use]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Reset to the identity.
    pub fn set_identity(&mut self) {
        *self = Self::identity();
    }

    /// Replace the rotation, keeping the translation.
    pub fn set_rotation(&mut self, rotation: Rotation3<f64>) {
        self.rotation = rotation;
    }

    /// Replace the rotation with a quaternion, keeping the translation.
    pub fn set_quaternion(&mut self, q: &UnitQuaternion<f64>) {
        self.rotation = q.to_rotation_matrix();
    }

    /// Replace the rotation with a raw matrix, keeping the translation.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::from_matrix`]; `self` is unchanged on error.
    pub fn set_rotation_matrix(&mut self, m: &Matrix3<f64>) -> Result<()> {
        self.rotation = checked_rotation(m, &Tolerances::default())?;
        Ok(())
    }

    /// Replace the translation, keeping the rotation.
    pub fn set_translation(&mut self, translation: Vector3<f64>) {
        self.translation = translation;
    }

    /// Copy the rotation and translation of any transform kind.
    pub fn set_from<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.rotation = other.rotation_part();
        self.translation = other.translation_part();
    }

    /// Check whether this is the identity within `epsilon`.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        features::is_identity(self.rotation.matrix(), epsilon)
            && self.translation.iter().all(|x| x.abs() <= epsilon)
    }

    /// Check whether the rotation is only about the Z axis.
    #[must_use]
    pub fn is_rotation_2d(&self) -> bool {
        features::is_matrix_2d(self.rotation.matrix(), Tolerances::DEFAULT.planar)
    }

    /// Re-orthonormalize the rotation after drift from repeated composition.
    pub fn normalize_rotation_part(&mut self) {
        self.rotation.renormalize();
    }

    /// Invert in place: `R ← Rᵀ`, `t ← -Rᵀ t`.
    pub fn invert(&mut self) {
        self.rotation = self.rotation.inverse();
        self.translation = -(self.rotation * self.translation);
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

    /// `self = self ∘ other`: `other` is applied first.
    pub fn multiply<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let rotation = other.rotation_part();
        self.translation += self.rotation * other.translation_part();
        self.rotation *= rotation;
    }

    /// `self = self⁻¹ ∘ other`, without inverting `self` separately.
    pub fn multiply_invert_this<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.translation = self
            .rotation
            .inverse_transform_vector(&(other.translation_part() - self.translation));
        self.rotation = self.rotation.inverse() * other.rotation_part();
    }

    /// `self = self ∘ other⁻¹`, without inverting `other` separately.
    pub fn multiply_invert_other<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.rotation *= other.rotation_part().inverse();
        self.translation -= self.rotation * other.translation_part();
    }

    /// `self = other ∘ self`: `self` is applied first.
    pub fn pre_multiply<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let rotation = other.rotation_part();
        self.translation = rotation * self.translation + other.translation_part();
        self.rotation = rotation * self.rotation;
    }

    /// `self = other ∘ self⁻¹`, without inverting `self` separately.
    pub fn pre_multiply_invert_this<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.rotation = other.rotation_part() * self.rotation.inverse();
        self.translation = other.translation_part() - self.rotation * self.translation;
    }

    /// `self = other⁻¹ ∘ self`, without inverting `other` separately.
    pub fn pre_multiply_invert_other<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let rotation = other.rotation_part();
        self.translation =
            rotation.inverse_transform_vector(&(self.translation - other.translation_part()));
        self.rotation = rotation.inverse() * self.rotation;
    }

    /// Translate in the local frame: `t ← t + R * v`.
    pub fn append_translation(&mut self, v: &Vector3<f64>) {
        self.translation += self.rotation * v;
    }

    /// Translate in the parent frame: `t ← t + v`.
    pub fn prepend_translation(&mut self, v: &Vector3<f64>) {
        self.translation += v;
    }

    /// Rotate about the local Z axis.
    pub fn append_yaw_rotation(&mut self, yaw: f64) {
        self.rotation *= Rotation3::from_axis_angle(&Vector3::z_axis(), yaw);
    }

    /// Rotate about the local Y axis.
    pub fn append_pitch_rotation(&mut self, pitch: f64) {
        self.rotation *= Rotation3::from_axis_angle(&Vector3::y_axis(), pitch);
    }

    /// Rotate about the local X axis.
    pub fn append_roll_rotation(&mut self, roll: f64) {
        self.rotation *= Rotation3::from_axis_angle(&Vector3::x_axis(), roll);
    }

    /// Rotate the whole transform about the parent Z axis.
    pub fn prepend_yaw_rotation(&mut self, yaw: f64) {
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), yaw);
        self.rotation = rz * self.rotation;
        self.translation = rz * self.translation;
    }

    /// Transform a point lying in the XY plane.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NotATransform2D`] if the rotation is not about Z.
    pub fn transform_point2(&self, p: &Point2<f64>) -> Result<Point2<f64>> {
        if !self.is_rotation_2d() {
            return Err(TransformError::NotATransform2D);
        }
        let q = self.transform_point(&Point3::new(p.x, p.y, 0.0));
        Ok(Point2::new(q.x, q.y))
    }

    /// Inverse of [`Self::transform_point2`].
    pub fn inverse_transform_point2(&self, p: &Point2<f64>) -> Result<Point2<f64>> {
        if !self.is_rotation_2d() {
            return Err(TransformError::NotATransform2D);
        }
        let q = self.inverse_transform_point(&Point3::new(p.x, p.y, self.translation.z));
        Ok(Point2::new(q.x, q.y))
    }

    /// Interpolate towards `other`: slerp on the rotation, lerp on the translation.
    #[must_use]
    pub fn interpolate(&self, other: &Self, alpha: f64) -> Self {
        let from = self.quaternion();
        let to = other.quaternion();
        let q = from.try_slerp(&to, alpha, 1.0e-12).unwrap_or(from);
        Self::from_quaternion(&q, self.translation.lerp(&other.translation, alpha))
    }

    /// Per-coefficient comparison of rotation and translation.
    #[must_use]
    pub fn epsilon_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.rotation
            .matrix()
            .iter()
            .zip(other.rotation.matrix().iter())
            .chain(self.translation.iter().zip(other.translation.iter()))
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Compare by the angle between rotations and the distance between translations.
    #[must_use]
    pub fn geometrically_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.rotation.angle_to(&other.rotation) <= epsilon
            && (self.translation - other.translation).norm() <= epsilon
    }

    /// Convert to an nalgebra isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.quaternion())
    }

    /// Homogeneous 4x4 matrix.
    #[must_use]
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut m = self.rotation.to_homogeneous();
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }
}

fn checked_rotation(m: &Matrix3<f64>, tolerances: &Tolerances) -> Result<Rotation3<f64>> {
    if m.iter().any(|x| !x.is_finite()) {
        return Err(TransformError::non_finite("rotation matrix"));
    }
    if !features::is_rotation_matrix(m, tolerances.rotation) {
        return Err(TransformError::not_a_rotation(*m));
    }
    Ok(Rotation3::from_matrix_unchecked(*m))
}

impl From<Isometry3<f64>> for RigidBodyTransform {
    fn from(iso: Isometry3<f64>) -> Self {
        Self::from_quaternion(&iso.rotation, iso.translation.vector)
    }
}

impl RigidParts for RigidBodyTransform {
    fn rotation_part(&self) -> Rotation3<f64> {
        self.rotation
    }

    fn translation_part(&self) -> Vector3<f64> {
        self.translation
    }
}

impl Transform for RigidBodyTransform {
    fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation * p + self.translation
    }

    fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * v
    }

    fn transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.quaternion() * q
    }

    fn transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        self.rotation.matrix() * m * self.rotation.matrix().transpose()
    }

    fn inverse_transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation.inverse_transform_point(&(p - self.translation))
    }

    fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(v)
    }

    fn inverse_transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.quaternion().inverse() * q
    }

    fn inverse_transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        self.rotation.matrix().transpose() * m * self.rotation.matrix()
    }
}
