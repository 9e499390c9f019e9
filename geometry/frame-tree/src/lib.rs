//! Tree of named reference frames with lazily cached transforms to root.
//!
//! Every frame owns a rigid transform to its parent, either fixed at
//! construction or refilled by a caller hook on [`ReferenceFrame::update`].
//! The transform to root is cached per frame and rebuilt only for the stale
//! part of the path on the next read.
//!
//! - [`ReferenceFrame`] - Handle to a frame, compared by identity
//! - [`FrameBuilder`] - Construction with explicit stationary / z-up flags
//! - [`Framed`] - A value tagged with the frame it is expressed in
//! - [`tree`] - Paths, enumeration and clearing of whole trees
//!
//! # Core Traits
//!
//! - [`ReferenceFrameHolder`]: anything expressed in a frame; combining two
//!   holders requires [`ReferenceFrameHolder::check_reference_frame_match`]
//!
//! # Frame Identity
//!
//! Frames match only when they are the very same frame. Two frames with equal
//! names and equal transforms are still different, and combining values
//! expressed in them fails with [`FrameError::FrameMismatch`]. Frames from
//! different trees never combine ([`FrameError::RootMismatch`]).
//!
//! # Example
//!
//! ```
//! use frame_tree::{ReferenceFrame, RigidBodyTransform, Transform};
//! use nalgebra::{Point3, Vector3};
//! use std::f64::consts::FRAC_PI_2;
//!
//! let world = ReferenceFrame::new_root("world").unwrap();
//! let mut yaw = 0.0;
//! let arm = ReferenceFrame::updatable("arm", &world, move |t| {
//!     yaw += FRAC_PI_2;
//!     *t = RigidBodyTransform::from_yaw_pitch_roll(yaw, 0.0, 0.0);
//! })
//! .unwrap();
//! let tip = ReferenceFrame::with_fixed_translation_from_parent("tip", &arm, Vector3::new(1.0, 0.0, 0.0)).unwrap();
//!
//! arm.update().unwrap();
//! let p = tip.transform_to_root().unwrap().transform_point(&Point3::origin());
//! assert!((p - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
//! ```
//!
//! # Thread Safety
//!
//! Frames are single-threaded (`Rc` and `RefCell` inside). They are neither
//! `Send` nor `Sync`.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It depends only on
//! `transform-types` and `nalgebra`.
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization for the re-exported transform types

#![doc(html_root_url = "https://docs.rs/frame-tree/0.7.0")]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::return_self_not_must_use
)]

mod builder;
mod error;
mod frame;
mod holder;
pub mod tree;

pub use builder::FrameBuilder;
pub use error::{FrameError, Result};
pub use frame::{ReferenceFrame, SEPARATOR, UpdateHook};
pub use holder::{Framed, ReferenceFrameHolder, same_frame};

// Re-export transform types handed out by frames
pub use transform_types::{
    AffineTransform, QuaternionBasedTransform, RigidBodyTransform, RigidParts, Transform,
    TransformError, Transformable,
};
