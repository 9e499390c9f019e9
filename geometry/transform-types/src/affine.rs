//! Rotation-scale plus translation transform.
//!
//! An [`AffineTransform`] maps `p` to `L * p + t`. The rotation-scale matrix
//! `L` starts out as `R * diag(s)` and is held in a [`LinearTransform3D`], so
//! the rotation and scale views come out of its cached decomposition
//! `L = U * diag(W) * Vᵀ`.
//!
//! # Composition
//!
//! The composition methods take any [`RigidParts`] operand and compose with
//! its rigid part `(R₀, t₀)`: `self ∘ other` maps `p` to `L * (R₀ * p + t₀) + t`.
//! The scale of an affine operand is discarded. Rotations are patched into
//! the cached decomposition, so composing with a rotation on the right can
//! leave `L` as a general `U * diag(W) * Vᵀ` rather than `R * diag(s)`.

use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};

use crate::config::Tolerances;
use crate::error::{Result, TransformError};
use crate::features;
use crate::linear::LinearTransform3D;
use crate::rigid::RigidBodyTransform;
use crate::traits::{RigidParts, Transform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rotation-scale map with strictly positive singular values, followed by a
/// translation.
///
/// # Example
///
/// ```
/// use transform_types::{AffineTransform, Transform};
/// use nalgebra::Vector3;
///
/// let t = AffineTransform::from_scale(Vector3::new(2.0, 2.0, 2.0)).unwrap();
/// let v = t.transform_vector(&Vector3::x());
/// assert!((v - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
///
/// let back = t.inverse_transform_vector(&Vector3::x());
/// assert!((back - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "AffineParts", into = "AffineParts")
)]
pub struct AffineTransform {
    rotation_scale: LinearTransform3D,
    translation: Vector3<f64>,
}

/// Plain-data form used for serialization: the decomposition `U, W, Vᵀ` of
/// the rotation-scale matrix, and the translation.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct AffineParts {
    pre_scale_rotation: UnitQuaternion<f64>,
    scale: Vector3<f64>,
    post_scale_rotation: UnitQuaternion<f64>,
    translation: Vector3<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<AffineParts> for AffineTransform {
    type Error = TransformError;

    fn try_from(parts: AffineParts) -> Result<Self> {
        check_scale(&parts.scale)?;
        check_translation(&parts.translation)?;
        let m = parts.pre_scale_rotation.to_rotation_matrix().matrix()
            * Matrix3::from_diagonal(&parts.scale)
            * parts.post_scale_rotation.to_rotation_matrix().matrix();
        Ok(Self {
            rotation_scale: LinearTransform3D::from_matrix(m),
            translation: parts.translation,
        })
    }
}

#[cfg(feature = "serde")]
impl From<AffineTransform> for AffineParts {
    fn from(t: AffineTransform) -> Self {
        Self {
            pre_scale_rotation: t.rotation_scale.pre_scale_quaternion(),
            scale: t.rotation_scale.scale_vector(),
            post_scale_rotation: t.rotation_scale.post_scale_quaternion(),
            translation: t.translation,
        }
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation_scale: LinearTransform3D::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Build from a rotation, a scale and a translation.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NotARotationScaleMatrix`] if a scale factor is
    /// not strictly positive or not finite, and [`TransformError::NonFinite`]
    /// for a non-finite translation.
    pub fn new(
        rotation: &Rotation3<f64>,
        scale: &Vector3<f64>,
        translation: Vector3<f64>,
    ) -> Result<Self> {
        check_scale(scale)?;
        check_translation(&translation)?;
        let mut rotation_scale =
            LinearTransform3D::from_rotation(&UnitQuaternion::from_rotation_matrix(rotation));
        rotation_scale.append_scale(scale);
        Ok(Self {
            rotation_scale,
            translation,
        })
    }

    /// Pure scale.
    pub fn from_scale(scale: Vector3<f64>) -> Result<Self> {
        Self::new(&Rotation3::identity(), &scale, Vector3::zeros())
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            rotation_scale: LinearTransform3D::identity(),
            translation,
        }
    }

    /// Rigid transform with unit scale.
    #[must_use]
    pub fn from_rigid<T: RigidParts + ?Sized>(rigid: &T) -> Self {
        let q = UnitQuaternion::from_rotation_matrix(&rigid.rotation_part());
        Self {
            rotation_scale: LinearTransform3D::from_rotation(&q),
            translation: rigid.translation_part(),
        }
    }

    /// Build from a raw rotation-scale matrix `R * diag(s)`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NotARotationScaleMatrix`] if `m` is not a
    /// proper rotation times a positive diagonal scale.
    pub fn from_rotation_scale_matrix(m: &Matrix3<f64>, translation: Vector3<f64>) -> Result<Self> {
        Self::from_rotation_scale_matrix_with(m, translation, &Tolerances::default())
    }

    /// Like [`Self::from_rotation_scale_matrix`] with explicit tolerances.
    pub fn from_rotation_scale_matrix_with(
        m: &Matrix3<f64>,
        translation: Vector3<f64>,
        tolerances: &Tolerances,
    ) -> Result<Self> {
        if m.iter().any(|x| !x.is_finite()) {
            return Err(TransformError::non_finite("rotation-scale matrix"));
        }
        check_translation(&translation)?;
        if features::rotation_scale_parts(m, tolerances.rotation).is_none() {
            return Err(TransformError::not_a_rotation_scale(
                "matrix is not a rotation times a positive diagonal scale",
            ));
        }
        Ok(Self {
            rotation_scale: LinearTransform3D::from_matrix(*m).with_tolerances(*tolerances),
            translation,
        })
    }

    /// The rotation-scale matrix and its cached decomposition.
    #[must_use]
    pub fn linear_transform(&self) -> &LinearTransform3D {
        &self.rotation_scale
    }

    /// Translation part.
    #[must_use]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Replace the translation.
    pub fn set_translation(&mut self, translation: Vector3<f64>) {
        self.translation = translation;
    }

    /// Reset to the identity.
    pub fn set_identity(&mut self) {
        self.rotation_scale.set_identity();
        self.translation = Vector3::zeros();
    }

    /// Best-fit rotation of the rotation-scale matrix.
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.rotation_scale.as_quaternion()
    }

    /// Scale factors, the singular values `W` of the rotation-scale matrix.
    ///
    /// Read from the cached decomposition in its order, not per axis: a fresh
    /// solve sorts them from largest to smallest.
    #[must_use]
    pub fn scale(&self) -> Vector3<f64> {
        self.rotation_scale.scale_vector()
    }

    /// Replace the best-fit rotation, keeping scale and translation.
    ///
    /// `R * diag(s)` becomes `q * diag(s)`.
    pub fn set_rotation(&mut self, q: &UnitQuaternion<f64>) {
        let delta = q * self.rotation().inverse();
        self.rotation_scale.prepend_rotation(&delta);
    }

    /// Replace the scale, keeping rotation and translation.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::new`] for a non-positive or non-finite scale.
    pub fn set_scale(&mut self, scale: &Vector3<f64>) -> Result<()> {
        check_scale(scale)?;
        self.rotation_scale.reset_scale();
        self.rotation_scale.append_scale(scale);
        Ok(())
    }

    /// Scale along the local axes: `L ← L * diag(scale)`.
    pub fn append_scale(&mut self, scale: &Vector3<f64>) -> Result<()> {
        check_scale(scale)?;
        self.rotation_scale.append_scale(scale);
        Ok(())
    }

    /// Drop the scale, keeping rotation and translation.
    pub fn reset_scale(&mut self) {
        self.rotation_scale.reset_scale();
    }

    /// Check whether the three scale factors agree within the rotation tolerance.
    #[must_use]
    pub fn has_uniform_scale(&self) -> bool {
        let s = self.scale();
        let epsilon = self.rotation_scale.tolerances().rotation * s.max();
        (s.x - s.y).abs() <= epsilon && (s.x - s.z).abs() <= epsilon
    }

    /// Rigid part `(R, t)`, without scale.
    #[must_use]
    pub fn rigid_part(&self) -> RigidBodyTransform {
        RigidBodyTransform::from_quaternion(&self.rotation(), self.translation)
    }

    /// Invert in place: `L ← L⁻¹`, `t ← -L⁻¹ * t`.
    ///
    /// A cached decomposition is patched to `V * diag(1/W) * Uᵀ`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::SingularMatrix`] if the rotation-scale matrix
    /// cannot be inverted; `self` is then unchanged.
    pub fn invert(&mut self) -> Result<()> {
        self.rotation_scale.invert()?;
        self.translation = -self.rotation_scale.transform_vector(&self.translation);
        Ok(())
    }

    /// The inverse transform, see [`Self::invert`].
    pub fn inverse(&self) -> Result<Self> {
        let mut result = self.clone();
        result.invert()?;
        Ok(result)
    }

    /// `self = self ∘ other`: `t ← L * t₀ + t`, `L ← L * R₀`.
    pub fn multiply<T: RigidParts + ?Sized>(&mut self, other: &T) {
        self.translation += self
            .rotation_scale
            .transform_vector(&other.translation_part());
        self.rotation_scale.append_rotation(&rotation_of(other));
    }

    /// `self = self⁻¹ ∘ other`.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::invert`].
    pub fn multiply_invert_this<T: RigidParts + ?Sized>(&mut self, other: &T) -> Result<()> {
        self.invert()?;
        self.multiply(other);
        Ok(())
    }

    /// `self = self ∘ other⁻¹`: `t ← t - L * R₀ᵀ * t₀`, `L ← L * R₀ᵀ`.
    pub fn multiply_invert_other<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let inverse = rotation_of(other).inverse();
        self.translation -= self
            .rotation_scale
            .transform_vector(&(inverse * other.translation_part()));
        self.rotation_scale.append_rotation(&inverse);
    }

    /// `self = other ∘ self`: `t ← R₀ * t + t₀`, `L ← R₀ * L`.
    pub fn pre_multiply<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let q = rotation_of(other);
        self.translation = q * self.translation + other.translation_part();
        self.rotation_scale.prepend_rotation(&q);
    }

    /// `self = other ∘ self⁻¹`.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::invert`].
    pub fn pre_multiply_invert_this<T: RigidParts + ?Sized>(&mut self, other: &T) -> Result<()> {
        self.invert()?;
        self.pre_multiply(other);
        Ok(())
    }

    /// `self = other⁻¹ ∘ self`: `t ← R₀ᵀ * (t - t₀)`, `L ← R₀ᵀ * L`.
    pub fn pre_multiply_invert_other<T: RigidParts + ?Sized>(&mut self, other: &T) {
        let inverse = rotation_of(other).inverse();
        self.translation = inverse * (self.translation - other.translation_part());
        self.rotation_scale.prepend_rotation(&inverse);
    }

    /// Translate in the local frame, scale included: `t ← t + L * v`.
    pub fn append_translation(&mut self, v: &Vector3<f64>) {
        self.translation += self.rotation_scale.transform_vector(v);
    }

    /// Translate in the parent frame.
    pub fn prepend_translation(&mut self, v: &Vector3<f64>) {
        self.translation += v;
    }

    /// Per-component comparison of the rotation-scale matrix and translation.
    #[must_use]
    pub fn epsilon_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.rotation_scale
            .matrix()
            .iter()
            .zip(other.rotation_scale.matrix().iter())
            .chain(self.translation.iter().zip(other.translation.iter()))
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Compare rotation angle, scale and translation separately.
    #[must_use]
    pub fn geometrically_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.rotation().angle_to(&other.rotation()) <= epsilon
            && (self.scale() - other.scale()).norm() <= epsilon
            && (self.translation - other.translation).norm() <= epsilon
    }

    /// Exact inverse of the rotation-scale matrix: `V * diag(1/W) * Uᵀ`.
    fn inverse_linear(&self) -> Matrix3<f64> {
        let mut svd = self.rotation_scale.decomposition();
        svd.invert();
        svd.reconstruct()
    }
}

fn rotation_of<T: RigidParts + ?Sized>(rigid: &T) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&rigid.rotation_part())
}

fn check_scale(scale: &Vector3<f64>) -> Result<()> {
    for &s in scale.iter() {
        if !s.is_finite() || s <= 0.0 {
            return Err(TransformError::not_a_rotation_scale(format!(
                "scale factor {s} is not strictly positive and finite"
            )));
        }
    }
    Ok(())
}

fn check_translation(translation: &Vector3<f64>) -> Result<()> {
    if translation.iter().any(|x| !x.is_finite()) {
        return Err(TransformError::non_finite("translation"));
    }
    Ok(())
}

impl From<RigidBodyTransform> for AffineTransform {
    fn from(rigid: RigidBodyTransform) -> Self {
        Self::from_rigid(&rigid)
    }
}

impl From<&AffineTransform> for RigidBodyTransform {
    fn from(affine: &AffineTransform) -> Self {
        affine.rigid_part()
    }
}

impl RigidParts for AffineTransform {
    fn rotation_part(&self) -> Rotation3<f64> {
        self.rotation().to_rotation_matrix()
    }

    fn translation_part(&self) -> Vector3<f64> {
        self.translation
    }
}

impl Transform for AffineTransform {
    fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation_scale.transform_vector(&p.coords) + self.translation)
    }

    fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation_scale.transform_vector(v)
    }

    fn transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.rotation() * q
    }

    fn transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        self.rotation_scale.matrix() * m * self.inverse_linear()
    }

    fn inverse_transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.inverse_transform_vector(&(p.coords - self.translation)))
    }

    fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.inverse_linear() * v
    }

    fn inverse_transform_orientation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.rotation().inverse() * q
    }

    fn inverse_transform_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        self.inverse_linear() * m * self.rotation_scale.matrix()
    }
}
