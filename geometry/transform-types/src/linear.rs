//! General 3x3 linear map with lazily derived facets.
//!
//! [`LinearTransform3D`] stores nine raw coefficients and derives four facets
//! from them on demand:
//!
//! - whether the matrix is the identity,
//! - whether the matrix is a pure rotation,
//! - its singular value decomposition `U * diag(W) * Vᵀ`,
//! - the best-fit rotation `U * Vᵀ` as a quaternion.
//!
//! Each facet is cached separately. Mutators that really change a coefficient
//! invalidate the facets; the structural operations ([`transpose`], [`invert`],
//! [`reset_scale`], rotation append/prepend) patch a valid decomposition in
//! place instead of discarding it.
//!
//! The caches use [`Cell`], so a `LinearTransform3D` is `Send` but not `Sync`.
//!
//! [`transpose`]: LinearTransform3D::transpose
//! [`invert`]: LinearTransform3D::invert
//! [`reset_scale`]: LinearTransform3D::reset_scale

use std::cell::Cell;

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

use crate::config::Tolerances;
use crate::error::{Result, TransformError};
use crate::features;
use crate::svd::Svd3;

/// State of one cached facet.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Facet<T> {
    /// Never computed.
    Absent,
    /// Consistent with the current coefficients.
    Valid(T),
    /// Computed once, stale since.
    Invalidated,
}

impl<T: Copy> Facet<T> {
    fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Absent | Self::Invalidated => None,
        }
    }
}

fn invalidate<T: Copy>(cell: &Cell<Facet<T>>) {
    if let Facet::Valid(_) = cell.get() {
        cell.set(Facet::Invalidated);
    }
}

fn quaternion_from_rotation(m: &Matrix3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*m))
}

macro_rules! element_accessors {
    ($($get:ident, $set:ident, $row:literal, $col:literal;)*) => {
        $(
            #[doc = concat!("Coefficient at row ", stringify!($row), ", column ", stringify!($col), ".")]
            #[must_use]
            pub fn $get(&self) -> f64 {
                self.m[($row, $col)]
            }

            #[doc = concat!("Set the coefficient at row ", stringify!($row), ", column ", stringify!($col), ".")]
            ///
            /// Writing the value already stored keeps every cache valid.
            pub fn $set(&mut self, value: f64) {
                self.set_element($row, $col, value);
            }
        )*
    };
}

/// A general 3x3 linear map with cached classification and decomposition.
///
/// # Example
///
/// ```
/// use transform_types::LinearTransform3D;
/// use nalgebra::{Matrix3, Vector3};
///
/// let mut m = LinearTransform3D::from_matrix(Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 4.0)));
/// assert!(!m.is_rotation_matrix());
///
/// let scale = m.scale_vector();
/// assert!((scale.x - 4.0).abs() < 1e-10);
///
/// m.reset_scale();
/// assert!(m.is_rotation_matrix());
/// ```
#[derive(Debug, Clone)]
pub struct LinearTransform3D {
    m: Matrix3<f64>,
    tolerances: Tolerances,
    identity: Cell<Facet<bool>>,
    rotation: Cell<Facet<bool>>,
    svd: Cell<Facet<Svd3>>,
    quaternion_view: Cell<Facet<UnitQuaternion<f64>>>,
    general_solves: Cell<u64>,
}

impl Default for LinearTransform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for LinearTransform3D {
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m
    }
}

impl From<Matrix3<f64>> for LinearTransform3D {
    fn from(m: Matrix3<f64>) -> Self {
        Self::from_matrix(m)
    }
}

impl LinearTransform3D {
    /// The identity map, with every facet already known.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
            tolerances: Tolerances::DEFAULT,
            identity: Cell::new(Facet::Valid(true)),
            rotation: Cell::new(Facet::Valid(true)),
            svd: Cell::new(Facet::Valid(Svd3::identity())),
            quaternion_view: Cell::new(Facet::Valid(UnitQuaternion::identity())),
            general_solves: Cell::new(0),
        }
    }

    /// Wrap a raw matrix. Nothing is derived until asked for.
    #[must_use]
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self {
            m,
            tolerances: Tolerances::DEFAULT,
            identity: Cell::new(Facet::Absent),
            rotation: Cell::new(Facet::Absent),
            svd: Cell::new(Facet::Absent),
            quaternion_view: Cell::new(Facet::Absent),
            general_solves: Cell::new(0),
        }
    }

    /// Build from a rotation. The matrix is known to be a rotation without a check.
    #[must_use]
    pub fn from_rotation(q: &UnitQuaternion<f64>) -> Self {
        let mut result = Self::identity();
        result.set_rotation(q);
        result
    }

    /// Replace the classification tolerances.
    ///
    /// Every cached facet is discarded since the classification may change.
    #[must_use]
    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self.identity.set(Facet::Absent);
        self.rotation.set(Facet::Absent);
        self.svd.set(Facet::Absent);
        self.quaternion_view.set(Facet::Absent);
        self
    }

    /// Tolerances used to classify this matrix.
    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// The raw coefficients.
    #[must_use]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    element_accessors! {
        m00, set_m00, 0, 0;
        m01, set_m01, 0, 1;
        m02, set_m02, 0, 2;
        m10, set_m10, 1, 0;
        m11, set_m11, 1, 1;
        m12, set_m12, 1, 2;
        m20, set_m20, 2, 0;
        m21, set_m21, 2, 1;
        m22, set_m22, 2, 2;
    }

    /// Set one coefficient, invalidating the caches only if the value changes.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is greater than 2.
    #[allow(clippy::float_cmp)]
    pub fn set_element(&mut self, row: usize, col: usize, value: f64) {
        if self.m[(row, col)] != value {
            self.m[(row, col)] = value;
            self.mark_changed();
        }
    }

    /// Replace all nine coefficients.
    pub fn set(&mut self, m: &Matrix3<f64>) {
        self.m = *m;
        self.mark_changed();
    }

    /// Copy another linear transform, including whatever it has cached.
    pub fn set_from(&mut self, other: &Self) {
        self.m = other.m;
        self.tolerances = other.tolerances;
        self.identity.set(other.identity.get());
        self.rotation.set(other.rotation.get());
        self.svd.set(other.svd.get());
        invalidate(&self.quaternion_view);
    }

    /// Set to the rotation `q`.
    pub fn set_rotation(&mut self, q: &UnitQuaternion<f64>) {
        self.m = *q.to_rotation_matrix().matrix();
        self.rotation.set(Facet::Valid(true));
        invalidate(&self.identity);
        invalidate(&self.svd);
        invalidate(&self.quaternion_view);
    }

    /// Reset to the identity map.
    pub fn set_identity(&mut self) {
        self.m = Matrix3::identity();
        self.identity.set(Facet::Valid(true));
        self.rotation.set(Facet::Valid(true));
        self.svd.set(Facet::Valid(Svd3::identity()));
        self.quaternion_view
            .set(Facet::Valid(UnitQuaternion::identity()));
    }

    /// Fill every coefficient with `NaN`.
    pub fn set_to_nan(&mut self) {
        self.m = Matrix3::repeat(f64::NAN);
        self.identity.set(Facet::Valid(false));
        self.rotation.set(Facet::Valid(false));
        self.svd.set(Facet::Valid(Svd3::nan()));
        invalidate(&self.quaternion_view);
    }

    /// Check whether any coefficient is `NaN`.
    #[must_use]
    pub fn contains_nan(&self) -> bool {
        self.m.iter().any(|x| x.is_nan())
    }

    fn mark_changed(&mut self) {
        invalidate(&self.identity);
        invalidate(&self.rotation);
        invalidate(&self.svd);
        invalidate(&self.quaternion_view);
    }

    /// Check whether this is the identity map.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        if let Some(known) = self.identity.get().valid() {
            return known;
        }
        let is_identity = features::is_identity(&self.m, self.tolerances.identity);
        self.identity.set(Facet::Valid(is_identity));
        if is_identity {
            self.rotation.set(Facet::Valid(true));
        }
        is_identity
    }

    /// Check whether this is a pure rotation.
    ///
    /// With a valid decomposition this only compares the three singular values
    /// to `1`; otherwise it checks orthonormality of the raw matrix, which never
    /// triggers a decomposition.
    #[must_use]
    pub fn is_rotation_matrix(&self) -> bool {
        if let Some(known) = self.rotation.get().valid() {
            return known;
        }
        let epsilon = self.tolerances.rotation;
        let is_rotation = match self.svd.get().valid() {
            Some(svd) => svd.w.iter().all(|w| (w - 1.0).abs() <= epsilon),
            None => features::is_rotation_matrix(&self.m, epsilon),
        };
        self.rotation.set(Facet::Valid(is_rotation));
        is_rotation
    }

    /// Check whether this rotation only turns about the Z axis.
    #[must_use]
    pub fn is_rotation_2d(&self) -> bool {
        self.is_rotation_matrix() && features::is_matrix_2d(&self.m, self.tolerances.planar)
    }

    /// Current decomposition, computing it if needed.
    ///
    /// A pure rotation skips the solver: `U` is converted straight from the
    /// matrix, `W = (1, 1, 1)` and `V = I`.
    #[must_use]
    pub fn decomposition(&self) -> Svd3 {
        if let Some(svd) = self.svd.get().valid() {
            return svd;
        }
        let svd = if self.is_rotation_matrix() {
            Svd3::from_rotation(quaternion_from_rotation(&self.m))
        } else {
            self.general_solves.set(self.general_solves.get() + 1);
            Svd3::decompose(&self.m)
        };
        self.svd.set(Facet::Valid(svd));
        svd
    }

    /// Check whether a decomposition is currently cached.
    #[must_use]
    pub fn is_decomposition_cached(&self) -> bool {
        self.svd.get().valid().is_some()
    }

    /// Number of times the general SVD solver ran for this instance.
    #[must_use]
    pub fn general_decomposition_count(&self) -> u64 {
        self.general_solves.get()
    }

    /// Rotation `U` applied after the scale.
    #[must_use]
    pub fn pre_scale_quaternion(&self) -> UnitQuaternion<f64> {
        self.decomposition().u
    }

    /// Singular values `W`.
    #[must_use]
    pub fn scale_vector(&self) -> Vector3<f64> {
        self.decomposition().w
    }

    /// Rotation `Vᵀ` applied before the scale.
    #[must_use]
    pub fn post_scale_quaternion(&self) -> UnitQuaternion<f64> {
        self.decomposition().post_scale()
    }

    /// First singular value.
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        self.scale_vector().x
    }

    /// Second singular value.
    #[must_use]
    pub fn scale_y(&self) -> f64 {
        self.scale_vector().y
    }

    /// Third singular value.
    #[must_use]
    pub fn scale_z(&self) -> f64 {
        self.scale_vector().z
    }

    /// Best-fit rotation `U * Vᵀ` of this map.
    ///
    /// For a pure rotation this is the rotation itself, whether `V` is the
    /// identity from the fast path or was moved by a cache patch.
    #[must_use]
    pub fn as_quaternion(&self) -> UnitQuaternion<f64> {
        if let Some(q) = self.quaternion_view.get().valid() {
            return q;
        }
        let svd = self.decomposition();
        let q = svd.u * svd.post_scale();
        self.quaternion_view.set(Facet::Valid(q));
        q
    }

    /// Determinant, read from the singular values when a decomposition is cached.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        match self.svd.get().valid() {
            Some(svd) => svd.determinant(),
            None => self.m.determinant(),
        }
    }

    /// Transpose in place.
    ///
    /// A cached decomposition is patched by swapping `U` and `V`.
    pub fn transpose(&mut self) {
        self.m.transpose_mut();
        invalidate(&self.quaternion_view);
        if let Some(mut svd) = self.svd.get().valid() {
            svd.transpose();
            self.svd.set(Facet::Valid(svd));
        }
    }

    /// Invert in place.
    ///
    /// A rotation is inverted by transposition. A cached decomposition is
    /// patched by reciprocating `W` and swapping `U` and `V`.
    pub fn invert(&mut self) -> Result<()> {
        if self.is_identity() {
            return Ok(());
        }
        let cached = self.svd.get().valid();
        if self.is_rotation_matrix() {
            self.m.transpose_mut();
        } else {
            self.m = self
                .m
                .try_inverse()
                .ok_or(TransformError::SingularMatrix)?;
        }
        invalidate(&self.quaternion_view);
        if let Some(mut svd) = cached {
            svd.invert();
            self.svd.set(Facet::Valid(svd));
        }
        Ok(())
    }

    /// Drop the scale, keeping only the best-fit rotation `U * Vᵀ`.
    ///
    /// Recombines the cached rotations instead of decomposing the new matrix.
    pub fn reset_scale(&mut self) {
        if self.is_identity() || self.is_rotation_matrix() {
            return;
        }
        let mut svd = self.decomposition();
        svd.u *= svd.post_scale();
        svd.v = UnitQuaternion::identity();
        svd.w = Vector3::new(1.0, 1.0, 1.0);
        self.m = *svd.u.to_rotation_matrix().matrix();
        self.svd.set(Facet::Valid(svd));
        self.rotation.set(Facet::Valid(true));
        invalidate(&self.identity);
        invalidate(&self.quaternion_view);
    }

    /// `self = self * other`.
    pub fn multiply(&mut self, other: &Matrix3<f64>) {
        self.m *= other;
        self.mark_changed();
    }

    /// `self = other * self`.
    pub fn pre_multiply(&mut self, other: &Matrix3<f64>) {
        self.m = other * self.m;
        self.mark_changed();
    }

    /// `self = self * R(q)`, patching a cached decomposition.
    pub fn append_rotation(&mut self, q: &UnitQuaternion<f64>) {
        self.m *= q.to_rotation_matrix().matrix();
        invalidate(&self.identity);
        invalidate(&self.quaternion_view);
        if let Some(mut svd) = self.svd.get().valid() {
            // U W Vᵀ R = U W (Rᵀ V)ᵀ
            svd.v = q.inverse() * svd.v;
            self.svd.set(Facet::Valid(svd));
        }
    }

    /// `self = R(q) * self`, patching a cached decomposition.
    pub fn prepend_rotation(&mut self, q: &UnitQuaternion<f64>) {
        self.m = q.to_rotation_matrix().matrix() * self.m;
        invalidate(&self.identity);
        invalidate(&self.quaternion_view);
        if let Some(mut svd) = self.svd.get().valid() {
            svd.u = q * svd.u;
            self.svd.set(Facet::Valid(svd));
        }
    }

    /// `self = self * diag(scale)`.
    pub fn append_scale(&mut self, scale: &Vector3<f64>) {
        self.m *= Matrix3::from_diagonal(scale);
        self.mark_changed();
    }

    /// Apply this map to a vector.
    #[must_use]
    pub fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.m * v
    }

    /// Apply the inverse of this map to a vector without inverting in place.
    pub fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Result<Vector3<f64>> {
        if self.is_rotation_matrix() {
            return Ok(self.m.tr_mul(v));
        }
        if let Some(svd) = self.svd.get().valid() {
            if svd.w.iter().any(|&w| w == 0.0) {
                return Err(TransformError::SingularMatrix);
            }
            let local = svd.u.inverse_transform_vector(v).component_div(&svd.w);
            return Ok(svd.v.transform_vector(&local));
        }
        self.m
            .try_inverse()
            .map(|inverse| inverse * v)
            .ok_or(TransformError::SingularMatrix)
    }
}
