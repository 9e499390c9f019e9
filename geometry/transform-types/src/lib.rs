//! Rigid, affine and quaternion-based transforms with a lazily decomposed 3x3 linear map.
//!
//! This crate provides the transform primitives used to move geometry between
//! coordinate frames:
//!
//! - [`RigidBodyTransform`] - Rotation matrix plus translation
//! - [`QuaternionBasedTransform`] - Unit quaternion plus translation
//! - [`AffineTransform`] - Rotation-scale map with positive scale factors, plus translation
//! - [`LinearTransform3D`] - General 3x3 map with cached classification and SVD
//!
//! # Core Traits
//!
//! - [`Transform`]: apply a transform (or its inverse) to points, vectors,
//!   orientations and matrices
//! - [`Transformable`]: a value that can move itself through any [`Transform`]
//! - [`RigidParts`]: rotation and translation of any transform kind, accepted
//!   by every composition method
//!
//! # Lazy Decomposition
//!
//! [`LinearTransform3D`] defers the expensive work. Whether it is the
//! identity, whether it is a rotation, its singular value decomposition and its
//! best-fit rotation are each computed on first use and cached. Structural
//! operations (transpose, invert, reset scale, rotation append) patch a valid
//! decomposition instead of recomputing it.
//!
//! # Example
//!
//! ```
//! use transform_types::{RigidBodyTransform, Transform};
//! use nalgebra::{Point3, Vector3};
//!
//! let a = RigidBodyTransform::from_translation(Vector3::new(1.0, 0.0, 0.0));
//! let b = RigidBodyTransform::from_yaw_pitch_roll(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
//!
//! // a ∘ b: b first, then a
//! let mut ab = a;
//! ab.multiply(&b);
//!
//! let p = ab.transform_point(&Point3::new(1.0, 0.0, 0.0));
//! assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
//! ```
//!
//! # Thread Safety
//!
//! [`LinearTransform3D`] and [`AffineTransform`] cache through `Cell`; they
//! are `Send` but not `Sync`.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It only depends on
//! `nalgebra` for the underlying linear algebra.
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for transforms, tolerances
//!   and [`Svd3`]

#![doc(html_root_url = "https://docs.rs/transform-types/0.7.0")]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::suboptimal_flops,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::return_self_not_must_use
)]

mod affine;
pub mod config;
mod error;
pub mod features;
mod linear;
mod quaternion_based;
mod rigid;
mod svd;
mod traits;

pub use affine::AffineTransform;
pub use config::Tolerances;
pub use error::{Result, TransformError};
pub use linear::LinearTransform3D;
pub use quaternion_based::QuaternionBasedTransform;
pub use rigid::RigidBodyTransform;
pub use svd::Svd3;
pub use traits::{RigidParts, Transform, Transformable};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Point2, Point3, Quaternion, Rotation3, UnitQuaternion, Vector3};
