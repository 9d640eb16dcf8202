//! Recursion guard for mapping inference.
//!
//! Tracks the types on the active descent path and how deep the descent has
//! gone below the root. Cycle detection is always on; the depth bound only
//! applies when `max_recursion` is positive.

use crate::descriptor::TypeDescriptor;
use std::ops::{Deref, DerefMut};
use tessera_log::trace;

/// `max_recursion` value meaning "bounded by cycle detection only".
pub const UNBOUNDED: usize = 0;

/// Per-traversal recursion state.
#[derive(Debug, Clone, Default)]
pub struct RecursionState {
    depth: usize,
    max_recursion: usize,
    path: Vec<String>,
}

impl RecursionState {
    /// Create an empty state.
    pub fn new(max_recursion: usize) -> Self {
        Self {
            depth: 0,
            max_recursion,
            path: Vec::new(),
        }
    }

    /// Create a state whose active path already holds the root type, at
    /// depth 0.
    pub fn rooted_at(root: &TypeDescriptor, max_recursion: usize) -> Self {
        let mut state = Self::new(max_recursion);
        state.path.push(root.key().to_string());
        state
    }

    /// Nested object levels entered below the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Configured bound.
    pub fn max_recursion(&self) -> usize {
        self.max_recursion
    }

    /// Type keys on the active path, root first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Whether a type is on the active path.
    pub fn is_on_path(&self, descriptor: &TypeDescriptor) -> bool {
        self.path.iter().any(|key| key == descriptor.key())
    }

    /// Whether `descriptor` may be expanded at the current position.
    ///
    /// Returns false when the type is already on the active path, or when a
    /// positive bound is set and the depth has reached it.
    pub fn should_expand(&self, descriptor: &TypeDescriptor) -> bool {
        if self.is_on_path(descriptor) {
            trace!(
                target: "tessera::guard",
                "cycle on {} at depth {}",
                descriptor.name(),
                self.depth
            );
            return false;
        }

        if self.max_recursion != UNBOUNDED && self.depth >= self.max_recursion {
            trace!(
                target: "tessera::guard",
                "depth bound {} reached before {}",
                self.max_recursion,
                descriptor.name()
            );
            return false;
        }

        true
    }

    /// Push `descriptor` onto the active path and descend one level.
    ///
    /// The returned scope leaves again when dropped, so the state is restored
    /// however the descent ends.
    pub fn enter(&mut self, descriptor: &TypeDescriptor) -> PathScope<'_> {
        self.path.push(descriptor.key().to_string());
        self.depth += 1;
        PathScope { state: self }
    }

    /// Pop the innermost type and ascend one level.
    pub fn leave(&mut self) {
        self.path.pop();
        self.depth = self.depth.saturating_sub(1);
    }
}

/// An entered level of the descent. Derefs to the underlying state.
#[derive(Debug)]
pub struct PathScope<'a> {
    state: &'a mut RecursionState,
}

impl Deref for PathScope<'_> {
    type Target = RecursionState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for PathScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for PathScope<'_> {
    fn drop(&mut self) {
        self.state.leave();
    }
}
