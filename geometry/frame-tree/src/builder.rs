//! Builder for frames that need more than the plain constructors offer.

use std::cell::RefCell;

use nalgebra::Vector3;
use transform_types::RigidBodyTransform;

use crate::error::Result;
use crate::frame::{FrameParts, ReferenceFrame, TransformKind, UpdateHook};

/// Builder for a child frame.
///
/// Without an update hook the frame is fixed and its flags are derived from
/// the parent and the transform. With a hook the frame starts neither
/// stationary nor z-up. Explicit flags override both; requesting a stationary
/// frame under a moving parent fails at [`FrameBuilder::build`].
///
/// # Example
///
/// ```
/// use frame_tree::{FrameBuilder, ReferenceFrame};
/// use transform_types::RigidBodyTransform;
///
/// let world = ReferenceFrame::new_root("world").unwrap();
/// let mut yaw = 0.0;
/// let turret = FrameBuilder::new("turret", &world)
///     .z_up(true)
///     .update_hook(move |t: &mut RigidBodyTransform| {
///         yaw += 0.1;
///         *t = RigidBodyTransform::from_yaw_pitch_roll(yaw, 0.0, 0.0);
///     })
///     .build()
///     .unwrap();
///
/// turret.update().unwrap();
/// assert!(turret.is_z_up().unwrap());
/// assert!(!turret.is_stationary().unwrap());
/// ```
pub struct FrameBuilder<'a> {
    name: String,
    parent: &'a ReferenceFrame,
    transform_to_parent: RigidBodyTransform,
    hook: Option<UpdateHook>,
    stationary: Option<bool>,
    z_up: Option<bool>,
}

impl<'a> FrameBuilder<'a> {
    /// Start a frame named `name` under `parent`, at the identity.
    #[must_use]
    pub fn new(name: impl Into<String>, parent: &'a ReferenceFrame) -> Self {
        Self {
            name: name.into(),
            parent,
            transform_to_parent: RigidBodyTransform::identity(),
            hook: None,
            stationary: None,
            z_up: None,
        }
    }

    /// Set the transform from the new frame to its parent.
    #[must_use]
    pub fn transform_to_parent(mut self, transform: RigidBodyTransform) -> Self {
        self.transform_to_parent = transform;
        self
    }

    /// Set the transform from the parent to the new frame.
    #[must_use]
    pub fn transform_from_parent(mut self, transform: &RigidBodyTransform) -> Self {
        self.transform_to_parent = transform.inverse();
        self
    }

    /// Offset the new frame from its parent by a pure translation.
    #[must_use]
    pub fn translation_from_parent(mut self, translation: Vector3<f64>) -> Self {
        self.transform_to_parent = RigidBodyTransform::from_translation(translation);
        self
    }

    /// Declare whether the frame is stationary.
    #[must_use]
    pub fn stationary(mut self, stationary: bool) -> Self {
        self.stationary = Some(stationary);
        self
    }

    /// Declare whether the frame is z-up.
    #[must_use]
    pub fn z_up(mut self, z_up: bool) -> Self {
        self.z_up = Some(z_up);
        self
    }

    /// Make the frame updatable: `hook` refills the transform to parent on
    /// every [`ReferenceFrame::update`].
    #[must_use]
    pub fn update_hook(mut self, hook: impl FnMut(&mut RigidBodyTransform) + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Attach the frame to its parent.
    pub fn build(self) -> Result<ReferenceFrame> {
        let updatable = self.hook.is_some();
        let kind = match self.hook {
            Some(hook) => TransformKind::Updatable(RefCell::new(hook)),
            None => TransformKind::Fixed,
        };
        let default_flag = if updatable { Some(false) } else { None };

        ReferenceFrame::attach(
            self.parent,
            FrameParts {
                name: self.name,
                transform_to_parent: self.transform_to_parent,
                kind,
                stationary: self.stationary.or(default_flag),
                z_up: self.z_up.or(default_flag),
            },
        )
    }
}
