//! Scenario tests for the transform primitives.

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;
use transform_types::{
    AffineTransform, LinearTransform3D, RigidBodyTransform, Tolerances, Transform, TransformError,
    Transformable,
};

#[test]
fn affine_uniform_scale_scenario() {
    let t = AffineTransform::new(
        &Rotation3::identity(),
        &Vector3::new(2.0, 2.0, 2.0),
        Vector3::zeros(),
    )
    .unwrap();

    let mut v = Vector3::new(1.0, 0.0, 0.0);
    v.apply_transform(&t);
    assert_relative_eq!(v, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);

    let mut w = Vector3::new(1.0, 0.0, 0.0);
    w.apply_inverse_transform(&t);
    assert_relative_eq!(w, Vector3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
}

#[test]
fn vectors_are_never_translated() {
    let t = RigidBodyTransform::from_translation(Vector3::new(5.0, 5.0, 5.0));
    assert_eq!(
        t.transform_vector(&Vector3::new(1.0, 2.0, 3.0)),
        Vector3::new(1.0, 2.0, 3.0)
    );
    assert_eq!(
        t.transform_point(&Point3::new(1.0, 2.0, 3.0)),
        Point3::new(6.0, 7.0, 8.0)
    );
}

#[test]
fn orientations_ignore_scale() {
    let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
    let t = AffineTransform::new(
        &yaw.to_rotation_matrix(),
        &Vector3::new(3.0, 1.0, 7.0),
        Vector3::new(1.0, 0.0, 0.0),
    )
    .unwrap();
    let moved = t.transform_orientation(&UnitQuaternion::identity());
    assert_relative_eq!(moved.angle_to(&yaw), 0.0, epsilon = 1e-9);
}

#[test]
fn malformed_rotation_is_rejected() {
    let m = Matrix3::new(1.0, 0.1, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    match RigidBodyTransform::from_matrix(&m, Vector3::zeros()) {
        Err(TransformError::NotARotationMatrix { matrix }) => assert_eq!(matrix, m),
        other => panic!("expected NotARotationMatrix, got {other:?}"),
    }

    // The same matrix passes with loose enough tolerances
    let loose = Tolerances::default().with_rotation(0.5);
    assert!(RigidBodyTransform::from_matrix_with(&m, Vector3::zeros(), &loose).is_ok());
}

#[test]
fn linear_transform_cache_lifecycle() {
    let mut m = LinearTransform3D::identity();
    assert!(m.is_identity());

    m.set_m00(2.0);
    assert!(!m.is_identity());
    assert!(!m.is_rotation_matrix());
    assert_relative_eq!(m.scale_x(), 2.0, epsilon = 1e-12);
    assert_relative_eq!(m.determinant(), 2.0, epsilon = 1e-12);
    assert_eq!(m.general_decomposition_count(), 1);

    m.set_m00(1.0);
    assert!(m.is_identity());
    assert!(m.is_rotation_matrix());
    assert_relative_eq!(m.scale_x(), 1.0);
    assert_eq!(m.general_decomposition_count(), 1);
}
