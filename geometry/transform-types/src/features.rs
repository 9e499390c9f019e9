//! Classification checks on raw 3x3 matrices.

use nalgebra::Matrix3;

/// Check that every coefficient is within `epsilon` of the identity.
#[must_use]
pub fn is_identity(m: &Matrix3<f64>, epsilon: f64) -> bool {
    m.iter()
        .zip(Matrix3::<f64>::identity().iter())
        .all(|(a, b)| (a - b).abs() <= epsilon)
}

/// Check that the matrix is a proper rotation.
///
/// A matrix is a rotation when each row has unit length, the rows are
/// mutually orthogonal, and the determinant is `+1`, all within `epsilon`.
#[must_use]
#[allow(clippy::similar_names)]
pub fn is_rotation_matrix(m: &Matrix3<f64>, epsilon: f64) -> bool {
    if m.iter().any(|x| !x.is_finite()) {
        return false;
    }

    let r0 = m.row(0);
    let r1 = m.row(1);
    let r2 = m.row(2);

    let xx = r0.norm_squared();
    let yy = r1.norm_squared();
    let zz = r2.norm_squared();
    let xy = r0.dot(&r1);
    let xz = r0.dot(&r2);
    let yz = r1.dot(&r2);

    (xx - 1.0).abs() <= epsilon
        && (yy - 1.0).abs() <= epsilon
        && (zz - 1.0).abs() <= epsilon
        && xy.abs() <= epsilon
        && xz.abs() <= epsilon
        && yz.abs() <= epsilon
        && (m.determinant() - 1.0).abs() <= epsilon
}

/// Check that the matrix only acts in the XY plane.
///
/// The coefficients coupling Z with X or Y must vanish and `m22` must be `1`.
#[must_use]
pub fn is_matrix_2d(m: &Matrix3<f64>, epsilon: f64) -> bool {
    m[(2, 0)].abs() <= epsilon
        && m[(0, 2)].abs() <= epsilon
        && m[(2, 1)].abs() <= epsilon
        && m[(1, 2)].abs() <= epsilon
        && (m[(2, 2)] - 1.0).abs() <= epsilon
}

/// Check that the matrix is a rotation composed with a positive diagonal scale,
/// `M = R * diag(s)`.
///
/// Returns the per-axis scale when the check passes.
#[must_use]
pub fn rotation_scale_parts(m: &Matrix3<f64>, epsilon: f64) -> Option<nalgebra::Vector3<f64>> {
    if m.iter().any(|x| !x.is_finite()) {
        return None;
    }
    let scale = nalgebra::Vector3::new(
        m.column(0).norm(),
        m.column(1).norm(),
        m.column(2).norm(),
    );
    if scale.iter().any(|&s| s <= 0.0) {
        return None;
    }
    let rotation = m * Matrix3::from_diagonal(&scale.map(f64::recip));
    is_rotation_matrix(&rotation, epsilon).then_some(scale)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{EPS_CHECK_2D, EPS_CHECK_IDENTITY, EPS_CHECK_ROTATION};
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    #[test]
    fn test_identity() {
        assert!(is_identity(&Matrix3::identity(), EPS_CHECK_IDENTITY));
        let mut m = Matrix3::identity();
        m[(1, 2)] = 1e-6;
        assert!(!is_identity(&m, EPS_CHECK_IDENTITY));
    }

    #[test]
    fn test_rotation_matrix() {
        let r = Rotation3::from_euler_angles(0.3, -1.2, 2.5);
        assert!(is_rotation_matrix(r.matrix(), EPS_CHECK_ROTATION));

        // Reflection: orthonormal but det = -1
        let reflection = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        assert!(!is_rotation_matrix(&reflection, EPS_CHECK_ROTATION));

        let scaled = r.matrix() * 2.0;
        assert!(!is_rotation_matrix(&scaled, EPS_CHECK_ROTATION));

        let mut nan = Matrix3::identity();
        nan[(0, 0)] = f64::NAN;
        assert!(!is_rotation_matrix(&nan, EPS_CHECK_ROTATION));
    }

    #[test]
    fn test_matrix_2d() {
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.7);
        assert!(is_matrix_2d(yaw.matrix(), EPS_CHECK_2D));

        let pitch = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.7);
        assert!(!is_matrix_2d(pitch.matrix(), EPS_CHECK_2D));
    }

    #[test]
    fn test_rotation_scale_parts() {
        let r = Rotation3::from_euler_angles(0.1, 0.2, 0.3);
        let m = r.matrix() * Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 0.5));
        let scale = rotation_scale_parts(&m, EPS_CHECK_ROTATION).unwrap();
        assert_relative_eq!(scale, Vector3::new(2.0, 3.0, 0.5), epsilon = 1e-12);

        // Shear is not a rotation-scale matrix
        let mut shear = Matrix3::identity();
        shear[(0, 1)] = 0.5;
        assert!(rotation_scale_parts(&shear, EPS_CHECK_ROTATION).is_none());

        // Zero column
        let degenerate = Matrix3::from_diagonal(&Vector3::new(1.0, 0.0, 1.0));
        assert!(rotation_scale_parts(&degenerate, EPS_CHECK_ROTATION).is_none());

        // Negative scale shows up as a reflection
        let flipped = Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0));
        assert!(rotation_scale_parts(&flipped, EPS_CHECK_ROTATION).is_none());
    }
}
