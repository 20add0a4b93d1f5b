//! Arena handles.
//!
//! Map adapters own their `Line`/`Node` objects in `Vec`s and hand out these
//! handles instead of references, so the decoder can hold many lines at once
//! while the adapter keeps mutating its caches.  A handle is only meaningful
//! for the adapter that issued it.

/// Position of a directed line in a map adapter's arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct LineIdx(pub u32);

/// Position of a node in a map adapter's arena.  Ordered so shortest-path
/// ties break the same way on every run.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeIdx(pub u32);

impl LineIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl NodeIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
