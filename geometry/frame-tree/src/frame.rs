//! Reference frames and the lazily cached transform to root.
//!
//! A [`ReferenceFrame`] is a handle to a node of a rooted tree. Handles are
//! cheap to clone and compare by identity: two handles are equal only when
//! they point to the very same node, whatever their names or transforms.
//!
//! # Staleness
//!
//! Each node caches its transform to root together with a stamp drawn from a
//! counter shared by the whole tree, and the value of its own change counter
//! at the time of computation. A node is stale when its change counter moved
//! since the cache was filled, or when its stamp is older than its parent's
//! stamp. [`ReferenceFrame::update`] only bumps the change counter; the walk
//! from the root in [`ReferenceFrame::transform_to_root`] rebuilds exactly the
//! stale suffix of the path on the next read.
//!
//! # Thread Safety
//!
//! Frames use `Rc` and `RefCell` internally and are neither `Send` nor `Sync`.
//! A frame tree belongs to one thread.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use nalgebra::Vector3;
use tracing::{debug, warn};
use transform_types::{RigidBodyTransform, Transformable};

use crate::error::{FrameError, Result};

/// Separator between the names of a frame's ancestors in its name id.
pub const SEPARATOR: char = ':';

/// Hook that refills the transform to parent when a frame is updated.
pub type UpdateHook = Box<dyn FnMut(&mut RigidBodyTransform)>;

pub(crate) enum TransformKind {
    Fixed,
    Updatable(RefCell<UpdateHook>),
}

/// Counters shared by every frame of one tree.
struct TreeState {
    frames_added: Cell<u64>,
    next_stamp: Cell<u64>,
}

impl TreeState {
    fn new() -> Self {
        // Stamp 1 belongs to the root, fresh frames start at 0
        Self {
            frames_added: Cell::new(0),
            next_stamp: Cell::new(2),
        }
    }

    fn next_stamp(&self) -> u64 {
        let stamp = self.next_stamp.get();
        self.next_stamp.set(stamp + 1);
        stamp
    }
}

#[derive(Clone, Copy)]
struct RootCache {
    transform: RigidBodyTransform,
    stamp: u64,
    seen_change: u64,
}

struct FrameNode {
    name: String,
    name_id: String,
    frame_index: u64,
    parent: Option<ReferenceFrame>,
    children: RefCell<Vec<Weak<FrameNode>>>,
    transform_to_parent: RefCell<RigidBodyTransform>,
    kind: TransformKind,
    stationary: bool,
    z_up: bool,
    removed: Cell<bool>,
    change_count: Cell<u64>,
    cache: RefCell<RootCache>,
    tree: Rc<TreeState>,
}

/// Everything needed to attach a new frame under a parent.
pub(crate) struct FrameParts {
    pub(crate) name: String,
    pub(crate) transform_to_parent: RigidBodyTransform,
    pub(crate) kind: TransformKind,
    pub(crate) stationary: Option<bool>,
    pub(crate) z_up: Option<bool>,
}

impl FrameParts {
    pub(crate) fn fixed(name: impl Into<String>, transform_to_parent: RigidBodyTransform) -> Self {
        Self {
            name: name.into(),
            transform_to_parent,
            kind: TransformKind::Fixed,
            stationary: None,
            z_up: None,
        }
    }
}

/// A named coordinate frame in a tree of frames.
///
/// # Example
///
/// ```
/// use frame_tree::ReferenceFrame;
/// use nalgebra::{Point3, Vector3};
/// use transform_types::Transform;
///
/// let world = ReferenceFrame::new_root("world").unwrap();
/// let c1 = ReferenceFrame::with_fixed_translation_from_parent("c1", &world, Vector3::new(1.0, 0.0, 0.0)).unwrap();
/// let c2 = ReferenceFrame::with_fixed_translation_from_parent("c2", &c1, Vector3::new(0.0, 1.0, 0.0)).unwrap();
///
/// let to_world = c2.transform_to_desired_frame(&world).unwrap();
/// let p = to_world.transform_point(&Point3::origin());
/// assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
/// ```
#[derive(Clone)]
pub struct ReferenceFrame {
    node: Rc<FrameNode>,
}

impl PartialEq for ReferenceFrame {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for ReferenceFrame {}

impl Hash for ReferenceFrame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.node), state);
    }
}

impl fmt::Debug for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceFrame")
            .field("name_id", &self.node.name_id)
            .field("frame_index", &self.node.frame_index)
            .field("stationary", &self.node.stationary)
            .field("z_up", &self.node.z_up)
            .field("removed", &self.node.removed.get())
            .finish()
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.contains(SEPARATOR) {
        return Err(FrameError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl ReferenceFrame {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create the root of a new, independent frame tree.
    ///
    /// A root is stationary and z-up, and its transform to parent is the
    /// identity forever.
    pub fn new_root(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        debug!(frame = %name, "root frame created");
        Ok(Self {
            node: Rc::new(FrameNode {
                name_id: name.clone(),
                name,
                frame_index: 0,
                parent: None,
                children: RefCell::new(Vec::new()),
                transform_to_parent: RefCell::new(RigidBodyTransform::identity()),
                kind: TransformKind::Fixed,
                stationary: true,
                z_up: true,
                removed: Cell::new(false),
                change_count: Cell::new(0),
                cache: RefCell::new(RootCache {
                    transform: RigidBodyTransform::identity(),
                    stamp: 1,
                    seen_change: 0,
                }),
                tree: Rc::new(TreeState::new()),
            }),
        })
    }

    /// Create a frame whose transform to `parent` never changes.
    ///
    /// The frame is stationary if its parent is, and z-up if its parent is
    /// z-up and the transform only rotates about Z.
    pub fn with_fixed_transform_to_parent(
        name: impl Into<String>,
        parent: &Self,
        transform_to_parent: RigidBodyTransform,
    ) -> Result<Self> {
        Self::attach(parent, FrameParts::fixed(name, transform_to_parent))
    }

    /// Create a fixed frame from the transform that maps parent coordinates
    /// into this frame.
    pub fn with_fixed_transform_from_parent(
        name: impl Into<String>,
        parent: &Self,
        transform_from_parent: &RigidBodyTransform,
    ) -> Result<Self> {
        Self::with_fixed_transform_to_parent(name, parent, transform_from_parent.inverse())
    }

    /// Create a fixed frame offset from `parent` by a pure translation.
    pub fn with_fixed_translation_from_parent(
        name: impl Into<String>,
        parent: &Self,
        translation: Vector3<f64>,
    ) -> Result<Self> {
        Self::with_fixed_transform_to_parent(
            name,
            parent,
            RigidBodyTransform::from_translation(translation),
        )
    }

    /// Create a frame whose transform to parent is refilled by `hook` on
    /// every [`Self::update`].
    ///
    /// The transform starts as the identity. The frame is neither stationary
    /// nor z-up.
    pub fn updatable(
        name: impl Into<String>,
        parent: &Self,
        hook: impl FnMut(&mut RigidBodyTransform) + 'static,
    ) -> Result<Self> {
        Self::attach(
            parent,
            FrameParts {
                name: name.into(),
                transform_to_parent: RigidBodyTransform::identity(),
                kind: TransformKind::Updatable(RefCell::new(Box::new(hook))),
                stationary: Some(false),
                z_up: Some(false),
            },
        )
    }

    pub(crate) fn attach(parent: &Self, parts: FrameParts) -> Result<Self> {
        validate_name(&parts.name)?;
        parent.ensure_enabled()?;

        let parent_node = &parent.node;
        let stationary = match parts.stationary {
            Some(true) if !parent_node.stationary => {
                return Err(FrameError::StationaryUnderMovingParent {
                    name: parts.name,
                    parent: parent_node.name_id.clone(),
                });
            }
            Some(requested) => requested,
            None => parent_node.stationary,
        };
        let derived_z_up = parent_node.z_up && parts.transform_to_parent.is_rotation_2d();
        let z_up = match parts.z_up {
            Some(true) if !derived_z_up => {
                warn!(
                    frame = %parts.name,
                    parent = %parent_node.name_id,
                    "frame declared z-up but its parent or transform is not"
                );
                true
            }
            Some(requested) => requested,
            None => derived_z_up,
        };

        let tree = Rc::clone(&parent_node.tree);
        let frame_index = tree.frames_added.get() + 1;
        tree.frames_added.set(frame_index);

        let name_id = format!("{}{SEPARATOR}{}", parent_node.name_id, parts.name);
        let frame = Self {
            node: Rc::new(FrameNode {
                name: parts.name,
                name_id,
                frame_index,
                parent: Some(parent.clone()),
                children: RefCell::new(Vec::new()),
                transform_to_parent: RefCell::new(parts.transform_to_parent),
                kind: parts.kind,
                stationary,
                z_up,
                removed: Cell::new(false),
                change_count: Cell::new(0),
                cache: RefCell::new(RootCache {
                    transform: RigidBodyTransform::identity(),
                    stamp: 0,
                    seen_change: 0,
                }),
                tree,
            }),
        };

        let mut children = parent_node.children.borrow_mut();
        children.retain(|child| child.strong_count() > 0);
        children.push(Rc::downgrade(&frame.node));

        debug!(
            frame = %frame.node.name_id,
            index = frame_index,
            stationary,
            z_up,
            "frame attached"
        );
        Ok(frame)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn ensure_enabled(&self) -> Result<()> {
        if self.node.removed.get() {
            return Err(FrameError::disabled(self.node.name.as_str()));
        }
        Ok(())
    }

    /// Check whether two handles refer to the same frame.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self == other
    }

    /// Frame name. Diagnostic only; never used to match frames.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Names from the root down to this frame, joined with [`SEPARATOR`].
    pub fn name_id(&self) -> Result<&str> {
        self.ensure_enabled()?;
        Ok(&self.node.name_id)
    }

    /// Index of this frame within its tree. The root is 0.
    pub fn frame_index(&self) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.node.frame_index)
    }

    /// Check whether this frame has been removed or cleared.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.node.removed.get()
    }

    /// Check whether this frame is the root of its tree.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    /// Parent frame, `None` for a root.
    pub fn parent(&self) -> Result<Option<Self>> {
        self.ensure_enabled()?;
        Ok(self.node.parent.clone())
    }

    /// Root of the tree this frame belongs to.
    pub fn root(&self) -> Result<Self> {
        self.ensure_enabled()?;
        Ok(self.root_unchecked())
    }

    fn root_unchecked(&self) -> Self {
        let mut frame = self;
        while let Some(parent) = &frame.node.parent {
            frame = parent;
        }
        frame.clone()
    }

    /// Check whether `frame` is the parent of this frame.
    pub fn is_parent_frame(&self, frame: &Self) -> Result<bool> {
        self.ensure_enabled()?;
        Ok(self.node.parent.as_ref() == Some(frame))
    }

    /// Check whether `frame` is a child of this frame.
    pub fn is_child_frame(&self, frame: &Self) -> Result<bool> {
        self.ensure_enabled()?;
        frame.is_parent_frame(self)
    }

    /// Whether this frame never moves with respect to the root.
    pub fn is_stationary(&self) -> Result<bool> {
        self.ensure_enabled()?;
        Ok(self.node.stationary)
    }

    /// Whether this frame's Z axis is aligned with the root's.
    pub fn is_z_up(&self) -> Result<bool> {
        self.ensure_enabled()?;
        Ok(self.node.z_up)
    }

    /// Live children of this frame, in attachment order.
    pub fn children(&self) -> Result<Vec<Self>> {
        self.ensure_enabled()?;
        Ok(self
            .node
            .children
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|node| Self { node })
            .collect())
    }

    /// Number of live children.
    pub fn number_of_children(&self) -> Result<usize> {
        Ok(self.children()?.len())
    }

    /// Number of times [`Self::update`] refilled this frame's transform.
    pub fn change_count(&self) -> Result<u64> {
        self.ensure_enabled()?;
        Ok(self.node.change_count.get())
    }

    /// Current transform from this frame to its parent.
    pub fn transform_to_parent(&self) -> Result<RigidBodyTransform> {
        self.ensure_enabled()?;
        Ok(*self.node.transform_to_parent.borrow())
    }

    /// Frames from the root down to this one, both included.
    pub fn path_from_root(&self) -> Result<Vec<Self>> {
        self.ensure_enabled()?;
        Ok(self.path_unchecked())
    }

    fn path_unchecked(&self) -> Vec<Self> {
        let mut path = vec![self.clone()];
        let mut frame = self;
        while let Some(parent) = &frame.node.parent {
            path.push(parent.clone());
            frame = parent;
        }
        path.reverse();
        path
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Fail unless `other` is this very frame.
    pub fn check_reference_frame_match(&self, other: &Self) -> Result<()> {
        if self != other {
            return Err(FrameError::mismatch(
                self.node.name_id.as_str(),
                other.node.name_id.as_str(),
            ));
        }
        Ok(())
    }

    /// Fail unless this frame is stationary.
    pub fn check_is_stationary(&self) -> Result<()> {
        if !self.is_stationary()? {
            return Err(FrameError::MissingProperty {
                name: self.node.name_id.clone(),
                property: "stationary",
            });
        }
        Ok(())
    }

    /// Fail unless this frame is z-up.
    pub fn check_is_z_up(&self) -> Result<()> {
        if !self.is_z_up()? {
            return Err(FrameError::MissingProperty {
                name: self.node.name_id.clone(),
                property: "z-up",
            });
        }
        Ok(())
    }

    /// Fail unless both frames belong to the same tree.
    pub fn verify_same_roots(&self, other: &Self) -> Result<()> {
        self.ensure_enabled()?;
        other.ensure_enabled()?;
        let frame_root = self.root_unchecked();
        let other_root = other.root_unchecked();
        if frame_root != other_root {
            return Err(FrameError::RootMismatch {
                frame: self.node.name_id.clone(),
                other: other.node.name_id.clone(),
                frame_root: frame_root.node.name_id.clone(),
                other_root: other_root.node.name_id.clone(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Refill the transform to parent from the update hook and bump the
    /// change counter. Does nothing for fixed frames.
    ///
    /// Descendants are not touched; they notice the change on their next
    /// [`Self::transform_to_root`].
    ///
    /// # Panics
    ///
    /// Panics if the hook calls `update` on its own frame.
    pub fn update(&self) -> Result<()> {
        self.ensure_enabled()?;
        let TransformKind::Updatable(hook) = &self.node.kind else {
            return Ok(());
        };

        let mut transform = *self.node.transform_to_parent.borrow();
        {
            let mut hook = hook.borrow_mut();
            (*hook)(&mut transform);
        }
        if self.node.z_up && !transform.is_rotation_2d() {
            warn!(frame = %self.node.name_id, "z-up frame updated with an out-of-plane rotation");
        }
        *self.node.transform_to_parent.borrow_mut() = transform;

        let count = self.node.change_count.get() + 1;
        self.node.change_count.set(count);
        debug!(frame = %self.node.name_id, change_count = count, "frame updated");
        Ok(())
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Transform mapping coordinates in this frame into the root's.
    ///
    /// Only the stale part of the path from the root is recomputed.
    pub fn transform_to_root(&self) -> Result<RigidBodyTransform> {
        self.ensure_enabled()?;
        Ok(self.refresh_transform_to_root())
    }

    fn refresh_transform_to_root(&self) -> RigidBodyTransform {
        let path = self.path_unchecked();
        let mut refreshed = 0_usize;

        for pair in path.windows(2) {
            let (parent, frame) = (&pair[0].node, &pair[1].node);
            let parent_cache = *parent.cache.borrow();
            let change = frame.change_count.get();
            let mut cache = frame.cache.borrow_mut();
            if cache.stamp >= parent_cache.stamp && cache.seen_change == change {
                continue;
            }

            let mut transform = parent_cache.transform;
            transform.multiply(&*frame.transform_to_parent.borrow());
            transform.normalize_rotation_part();
            *cache = RootCache {
                transform,
                stamp: frame.tree.next_stamp(),
                seen_change: change,
            };
            refreshed += 1;
        }

        if refreshed > 0 {
            debug!(frame = %self.node.name_id, refreshed, "transform to root recomputed");
        }
        self.node.cache.borrow().transform
    }

    /// Transform mapping coordinates in this frame into `desired`'s.
    ///
    /// Direct relations (root, parent, child, sibling, grandparent,
    /// grandchild) are composed from at most two transforms to parent.
    /// Otherwise the lowest common ancestor is located: when it is the root,
    /// the cached transforms to root are combined; when it is deeper, only the
    /// two chains up to it are composed.
    pub fn transform_to_desired_frame(&self, desired: &Self) -> Result<RigidBodyTransform> {
        self.ensure_enabled()?;
        desired.ensure_enabled()?;
        if self == desired {
            return Ok(RigidBodyTransform::identity());
        }
        self.verify_same_roots(desired)?;

        let mut result = RigidBodyTransform::identity();
        let this_parent = self.node.parent.as_ref();
        let desired_parent = desired.node.parent.as_ref();

        match (this_parent, desired_parent) {
            (None, _) => result.set_and_invert(&desired.refresh_transform_to_root()),
            (_, None) => result = self.refresh_transform_to_root(),
            (Some(parent), _) if parent == desired => result = self.local_transform(),
            (_, Some(parent)) if parent == self => result.set_and_invert(&desired.local_transform()),
            (Some(a), Some(b)) if a == b => {
                result.set_and_invert(&desired.local_transform());
                result.multiply(&self.local_transform());
            }
            (Some(parent), _) if parent.node.parent.as_ref() == Some(desired) => {
                result = self.local_transform();
                result.pre_multiply(&parent.local_transform());
            }
            (_, Some(parent)) if parent.node.parent.as_ref() == Some(self) => {
                result.set_and_invert(&desired.local_transform());
                result.multiply_invert_other(&parent.local_transform());
            }
            _ => result = self.transform_through_common_ancestor(desired),
        }
        Ok(result)
    }

    fn local_transform(&self) -> RigidBodyTransform {
        *self.node.transform_to_parent.borrow()
    }

    fn transform_through_common_ancestor(&self, desired: &Self) -> RigidBodyTransform {
        let this_path = self.path_unchecked();
        let desired_path = desired.path_unchecked();
        let common = this_path
            .iter()
            .zip(desired_path.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = RigidBodyTransform::identity();
        if common <= 1 {
            result.set_and_invert(&desired.refresh_transform_to_root());
            result.multiply(&self.refresh_transform_to_root());
        } else {
            result.set_and_invert(&chain_to_ancestor(&desired_path[common..]));
            result.multiply(&chain_to_ancestor(&this_path[common..]));
        }
        result
    }

    /// Move `value` from this frame's coordinates into `desired`'s.
    ///
    /// Nothing happens when both frames are the same.
    pub fn transform_from_this_to_desired_frame<T: Transformable + ?Sized>(
        &self,
        desired: &Self,
        value: &mut T,
    ) -> Result<()> {
        self.ensure_enabled()?;
        desired.ensure_enabled()?;
        if self == desired {
            return Ok(());
        }
        self.verify_same_roots(desired)?;

        match (self.node.parent.as_ref(), desired.node.parent.as_ref()) {
            (None, _) => value.apply_inverse_transform(&desired.refresh_transform_to_root()),
            (_, None) => value.apply_transform(&self.refresh_transform_to_root()),
            (Some(parent), _) if parent == desired => value.apply_transform(&self.local_transform()),
            (_, Some(parent)) if parent == self => {
                value.apply_inverse_transform(&desired.local_transform());
            }
            (Some(a), Some(b)) if a == b => {
                value.apply_transform(&self.local_transform());
                value.apply_inverse_transform(&desired.local_transform());
            }
            _ => value.apply_transform(&self.transform_to_desired_frame(desired)?),
        }
        Ok(())
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Detach this frame from its parent and disable it with all its
    /// descendants. A root cannot be removed; use [`Self::clear_subtree`].
    pub fn remove(&self) {
        if self.node.removed.get() {
            return;
        }
        let Some(parent) = &self.node.parent else {
            return;
        };
        parent
            .node
            .children
            .borrow_mut()
            .retain(|child| !std::ptr::eq(child.as_ptr(), Rc::as_ptr(&self.node)));
        self.disable_recursively();
        debug!(frame = %self.node.name_id, "frame removed");
    }

    /// Disable every descendant of this frame, keeping the frame itself.
    ///
    /// On a root this also resets the frame index counter of the tree.
    pub fn clear_children(&self) -> Result<()> {
        self.ensure_enabled()?;
        let children: Vec<_> = self.node.children.borrow_mut().drain(..).collect();
        let cleared = children.len();
        for child in children.iter().filter_map(Weak::upgrade) {
            Self { node: child }.disable_recursively();
        }
        if self.is_root() {
            self.node.tree.frames_added.set(0);
        }
        debug!(frame = %self.node.name_id, cleared, "children cleared");
        Ok(())
    }

    /// Disable the whole subtree rooted at this frame, this frame included.
    ///
    /// For a non-root frame this is [`Self::remove`]. For a root it disables
    /// the entire tree; other trees are unaffected.
    pub fn clear_subtree(&self) {
        if self.node.removed.get() {
            return;
        }
        if self.is_root() {
            self.disable_recursively();
            debug!(frame = %self.node.name_id, "frame tree cleared");
        } else {
            self.remove();
        }
    }

    fn disable_recursively(&self) {
        self.node.removed.set(true);
        if let TransformKind::Updatable(hook) = &self.node.kind {
            if let Ok(mut hook) = hook.try_borrow_mut() {
                // Release whatever the hook captured
                *hook = Box::new(|_: &mut RigidBodyTransform| {});
            }
        }
        let children: Vec<_> = self.node.children.borrow_mut().drain(..).collect();
        for child in children.iter().filter_map(Weak::upgrade) {
            Self { node: child }.disable_recursively();
        }
    }
}

/// Compose the transforms to parent of `frames`, listed from just below the
/// ancestor down to the leaf, into the transform from the leaf to the ancestor.
fn chain_to_ancestor(frames: &[ReferenceFrame]) -> RigidBodyTransform {
    let mut result = RigidBodyTransform::identity();
    for frame in frames {
        result.multiply(&frame.local_transform());
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_PI_2;
    use transform_types::Transform;

    fn translation(x: f64, y: f64, z: f64) -> RigidBodyTransform {
        RigidBodyTransform::from_translation(Vector3::new(x, y, z))
    }

    #[test]
    fn test_root_properties() {
        let root = ReferenceFrame::new_root("world").unwrap();
        assert!(root.is_root());
        assert!(root.is_stationary().unwrap());
        assert!(root.is_z_up().unwrap());
        assert_eq!(root.frame_index().unwrap(), 0);
        assert_eq!(root.name_id().unwrap(), "world");
        assert!(root.transform_to_root().unwrap().is_identity(0.0));
    }

    #[test]
    fn test_invalid_name() {
        let err = ReferenceFrame::new_root("a:b").unwrap_err();
        assert!(matches!(err, FrameError::InvalidName { .. }));

        let root = ReferenceFrame::new_root("world").unwrap();
        assert!(ReferenceFrame::with_fixed_transform_to_parent("x:y", &root, translation(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_name_id_and_index() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(1.0, 0.0, 0.0)).unwrap();
        let b = ReferenceFrame::with_fixed_transform_to_parent("b", &a, translation(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(b.name_id().unwrap(), "world:a:b");
        assert_eq!(a.frame_index().unwrap(), 1);
        assert_eq!(b.frame_index().unwrap(), 2);
        assert_eq!(b.to_string(), "b");
    }

    #[test]
    fn test_identity_not_value_equality() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("twin", &root, translation(0.0, 0.0, 0.0)).unwrap();
        let b = ReferenceFrame::with_fixed_transform_to_parent("twin", &root, translation(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.check_reference_frame_match(&a.clone()).is_ok());
        assert!(a.check_reference_frame_match(&b).unwrap_err().is_frame_mismatch());
    }

    #[test]
    fn test_parent_child_queries() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(1.0, 0.0, 0.0)).unwrap();
        assert!(a.is_parent_frame(&root).unwrap());
        assert!(root.is_child_frame(&a).unwrap());
        assert!(!root.is_parent_frame(&a).unwrap());
        assert_eq!(root.number_of_children().unwrap(), 1);
        assert_eq!(a.parent().unwrap(), Some(root.clone()));
        assert_eq!(a.root().unwrap(), root);
    }

    #[test]
    fn test_children_list_drops_dead_frames() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let kept = ReferenceFrame::with_fixed_transform_to_parent("kept", &root, translation(1.0, 0.0, 0.0)).unwrap();
        {
            let _temporary = ReferenceFrame::with_fixed_transform_to_parent("temp", &root, translation(0.0, 1.0, 0.0)).unwrap();
            assert_eq!(root.number_of_children().unwrap(), 2);
        }
        assert_eq!(root.children().unwrap(), vec![kept]);
    }

    #[test]
    fn test_stationary_and_z_up_flags() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let yawed = ReferenceFrame::with_fixed_transform_to_parent(
            "yawed",
            &root,
            RigidBodyTransform::from_yaw_pitch_roll(0.5, 0.0, 0.0),
        )
        .unwrap();
        assert!(yawed.is_stationary().unwrap());
        assert!(yawed.is_z_up().unwrap());

        let pitched = ReferenceFrame::with_fixed_transform_to_parent(
            "pitched",
            &root,
            RigidBodyTransform::from_yaw_pitch_roll(0.0, 0.5, 0.0),
        )
        .unwrap();
        assert!(!pitched.is_z_up().unwrap());
        assert!(pitched.check_is_z_up().is_err());
        assert!(pitched.check_is_stationary().is_ok());

        let moving = ReferenceFrame::updatable("moving", &root, |_| {}).unwrap();
        assert!(!moving.is_stationary().unwrap());
        let child = ReferenceFrame::with_fixed_transform_to_parent("child", &moving, translation(1.0, 0.0, 0.0)).unwrap();
        assert!(!child.is_stationary().unwrap());
    }

    #[test]
    fn test_lazy_recompute() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let mut angle = 0.0;
        let moving = ReferenceFrame::updatable("moving", &root, move |t| {
            angle += FRAC_PI_2;
            *t = RigidBodyTransform::from_yaw_pitch_roll(angle, 0.0, 0.0);
        })
        .unwrap();
        let tip = ReferenceFrame::with_fixed_transform_to_parent("tip", &moving, translation(1.0, 0.0, 0.0)).unwrap();

        let p = tip.transform_to_root().unwrap().transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);

        moving.update().unwrap();
        assert_eq!(moving.change_count().unwrap(), 1);
        let p = tip.transform_to_root().unwrap().transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        // Reading through an unrelated path in between changes nothing
        let _ = moving.transform_to_root().unwrap();
        moving.update().unwrap();
        let p = tip.transform_to_root().unwrap().transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_update_on_fixed_frame_is_no_op() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let fixed = ReferenceFrame::with_fixed_transform_to_parent("fixed", &root, translation(1.0, 0.0, 0.0)).unwrap();
        fixed.update().unwrap();
        assert_eq!(fixed.change_count().unwrap(), 0);
    }

    #[test]
    fn test_desired_frame_shortcuts_agree_with_general_path() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent(
            "a",
            &root,
            RigidBodyTransform::from_yaw_pitch_roll(0.3, 0.1, -0.2),
        )
        .unwrap();
        let b = ReferenceFrame::with_fixed_transform_to_parent(
            "b",
            &a,
            RigidBodyTransform::new(
                nalgebra::Rotation3::from_euler_angles(0.5, 0.0, 1.0),
                Vector3::new(0.0, 2.0, 0.0),
            ),
        )
        .unwrap();
        let c = ReferenceFrame::with_fixed_transform_to_parent("c", &b, translation(0.0, 0.0, 3.0)).unwrap();
        let sibling = ReferenceFrame::with_fixed_transform_to_parent("s", &a, translation(-1.0, 0.0, 0.0)).unwrap();
        let cousin = ReferenceFrame::with_fixed_transform_to_parent("cousin", &sibling, translation(0.0, 5.0, 0.0)).unwrap();

        let frames = [&root, &a, &b, &c, &sibling, &cousin];
        for from in frames {
            for to in frames {
                let fast = from.transform_to_desired_frame(to).unwrap();
                let mut general = to.transform_to_root().unwrap().inverse();
                general.multiply(&from.transform_to_root().unwrap());
                assert!(
                    fast.epsilon_equals(&general, 1e-9),
                    "{} -> {}",
                    from.name(),
                    to.name()
                );

                let mut p = Point3::new(0.3, -0.4, 0.5);
                from.transform_from_this_to_desired_frame(to, &mut p).unwrap();
                assert_relative_eq!(p, general.transform_point(&Point3::new(0.3, -0.4, 0.5)), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_root_mismatch() {
        let r1 = ReferenceFrame::new_root("r1").unwrap();
        let r2 = ReferenceFrame::new_root("r2").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &r1, translation(1.0, 0.0, 0.0)).unwrap();
        let err = a.transform_to_desired_frame(&r2).unwrap_err();
        assert!(err.is_frame_mismatch());
        assert!(matches!(err, FrameError::RootMismatch { .. }));
    }

    #[test]
    fn test_remove_disables_subtree() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(1.0, 0.0, 0.0)).unwrap();
        let b = ReferenceFrame::with_fixed_transform_to_parent("b", &a, translation(1.0, 0.0, 0.0)).unwrap();
        let other = ReferenceFrame::with_fixed_transform_to_parent("other", &root, translation(0.0, 1.0, 0.0)).unwrap();

        a.remove();
        assert!(a.is_removed());
        assert!(b.transform_to_root().unwrap_err().is_disabled());
        assert!(a.name_id().unwrap_err().is_disabled());
        assert_eq!(a.name(), "a");
        assert!(other.transform_to_root().is_ok());
        assert_eq!(root.children().unwrap(), vec![other]);
        assert!(ReferenceFrame::with_fixed_transform_to_parent("late", &b, translation(0.0, 0.0, 0.0)).is_err());

        // Removing a root does nothing
        root.remove();
        assert!(!root.is_removed());
    }

    #[test]
    fn test_clear_children_resets_index() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(1.0, 0.0, 0.0)).unwrap();
        root.clear_children().unwrap();
        assert!(a.is_removed());
        assert!(!root.is_removed());
        assert_eq!(root.number_of_children().unwrap(), 0);

        let fresh = ReferenceFrame::with_fixed_transform_to_parent("fresh", &root, translation(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(fresh.frame_index().unwrap(), 1);
    }

    #[test]
    fn test_clear_subtree_from_root() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(1.0, 0.0, 0.0)).unwrap();
        let other_root = ReferenceFrame::new_root("other").unwrap();

        root.clear_subtree();
        assert!(root.is_removed());
        assert!(a.is_removed());
        assert!(root.transform_to_root().unwrap_err().is_disabled());
        assert!(!other_root.is_removed());
    }

    #[test]
    fn test_hash_by_identity() {
        use std::collections::HashSet;

        let root = ReferenceFrame::new_root("world").unwrap();
        let a = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(0.0, 0.0, 0.0)).unwrap();
        let b = ReferenceFrame::with_fixed_transform_to_parent("a", &root, translation(0.0, 0.0, 0.0)).unwrap();
        let set: HashSet<_> = [a.clone(), a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
