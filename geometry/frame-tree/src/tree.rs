//! Whole-tree utilities: paths, enumeration and clearing.

use tracing::debug;

use crate::error::Result;
use crate::frame::ReferenceFrame;

/// Frames from the root of `frame`'s tree down to `frame`, both included.
pub fn path_from_root(frame: &ReferenceFrame) -> Result<Vec<ReferenceFrame>> {
    frame.path_from_root()
}

/// `frame` followed by all of its live descendants, depth first.
pub fn frames_in_subtree(frame: &ReferenceFrame) -> Result<Vec<ReferenceFrame>> {
    let mut frames = Vec::new();
    let mut stack = vec![frame.clone()];
    while let Some(next) = stack.pop() {
        let children = next.children()?;
        frames.push(next);
        // Reverse so children come out in attachment order
        stack.extend(children.into_iter().rev());
    }
    Ok(frames)
}

/// Every live frame of the tree containing `frame`, root first.
pub fn all_frames_in_tree(frame: &ReferenceFrame) -> Result<Vec<ReferenceFrame>> {
    frames_in_subtree(&frame.root()?)
}

/// Disable every frame of the tree containing `frame` except its root.
///
/// The root stays usable and its frame index counter restarts, so the tree
/// can be rebuilt from scratch.
pub fn clear_frame_tree(frame: &ReferenceFrame) -> Result<()> {
    let root = frame.root()?;
    root.clear_children()?;
    debug!(root = %root.name(), "frame tree cleared");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn child(name: &str, parent: &ReferenceFrame) -> ReferenceFrame {
        ReferenceFrame::with_fixed_translation_from_parent(name, parent, Vector3::new(1.0, 0.0, 0.0))
            .unwrap()
    }

    fn names(frames: &[ReferenceFrame]) -> Vec<&str> {
        frames.iter().map(ReferenceFrame::name).collect()
    }

    #[test]
    fn test_path_from_root() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = child("a", &root);
        let b = child("b", &a);
        assert_eq!(names(&path_from_root(&b).unwrap()), ["world", "a", "b"]);
        assert_eq!(names(&path_from_root(&root).unwrap()), ["world"]);
    }

    #[test]
    fn test_enumeration_order() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = child("a", &root);
        let _a1 = child("a1", &a);
        let _a2 = child("a2", &a);
        let b = child("b", &root);
        let _b1 = child("b1", &b);

        let all = all_frames_in_tree(&b).unwrap();
        assert_eq!(names(&all), ["world", "a", "a1", "a2", "b", "b1"]);
        assert_eq!(names(&frames_in_subtree(&a).unwrap()), ["a", "a1", "a2"]);
    }

    #[test]
    fn test_clear_frame_tree() {
        let root = ReferenceFrame::new_root("world").unwrap();
        let a = child("a", &root);
        let b = child("b", &a);

        clear_frame_tree(&b).unwrap();
        assert!(a.is_removed());
        assert!(b.is_removed());
        assert!(!root.is_removed());
        assert_eq!(names(&all_frames_in_tree(&root).unwrap()), ["world"]);

        let again = child("again", &root);
        assert_eq!(again.frame_index().unwrap(), 1);
    }
}
