//! Typed node handles.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A node category. The name shows up in handle debug output and in
/// internal-error messages.
pub trait Variety: 'static {
    const NAME: &'static str;
}

/// Identity of one node within its variety's store.
///
/// Handles are `Copy` values compared by index. The phantom type keeps
/// handles of different varieties apart at compile time; all trait impls
/// are written by hand so they hold for every `N`, not only `N: Eq` etc.
#[repr(transparent)]
pub struct Handle<N> {
    index: u32,
    _variety: PhantomData<fn() -> N>,
}

impl<N> Handle<N> {
    #[inline]
    pub const fn from_raw(index: u32) -> Self {
        Handle {
            index,
            _variety: PhantomData,
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl<N> Clone for Handle<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for Handle<N> {}

impl<N> PartialEq for Handle<N> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<N> Eq for Handle<N> {}

impl<N> PartialOrd for Handle<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for Handle<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<N> Hash for Handle<N> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<N: Variety> fmt::Debug for Handle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", N::NAME, self.index)
    }
}
