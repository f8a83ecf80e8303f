//! Append-only per-variety node stores.

use crate::{GraphError, Handle, Variety};

/// The store for one node variety.
///
/// Slots are `None` only between [`Arena::reserve`] and [`Arena::fill`];
/// reading such a slot is an internal error.
pub struct Arena<N> {
    slots: Vec<Option<N>>,
}

impl<N: Variety> Arena<N> {
    pub fn new() -> Self {
        Arena { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_handle(&self) -> Handle<N> {
        let index = u32::try_from(self.slots.len())
            .unwrap_or_else(|_| panic!("{} store exceeded u32::MAX nodes", N::NAME));
        Handle::from_raw(index)
    }

    pub fn insert(&mut self, node: N) -> Handle<N> {
        let handle = self.next_handle();
        self.slots.push(Some(node));
        handle
    }

    /// Mint a handle whose node is supplied later with [`Arena::fill`].
    pub fn reserve(&mut self) -> Handle<N> {
        let handle = self.next_handle();
        self.slots.push(None);
        handle
    }

    pub fn fill(&mut self, handle: Handle<N>, node: N) -> Result<(), GraphError> {
        match self.slots.get_mut(handle.index()) {
            None => Err(GraphError::Missing {
                variety: N::NAME,
                index: handle.raw(),
            }),
            Some(Some(_)) => Err(GraphError::AlreadyFilled {
                variety: N::NAME,
                index: handle.raw(),
            }),
            Some(slot @ None) => {
                *slot = Some(node);
                Ok(())
            }
        }
    }

    pub fn get(&self, handle: Handle<N>) -> Result<&N, GraphError> {
        match self.slots.get(handle.index()) {
            Some(Some(node)) => Ok(node),
            Some(None) => Err(GraphError::Incomplete {
                variety: N::NAME,
                index: handle.raw(),
            }),
            None => Err(GraphError::Missing {
                variety: N::NAME,
                index: handle.raw(),
            }),
        }
    }

    /// Mutable access for the building phase. Later phases only read.
    pub fn get_mut(&mut self, handle: Handle<N>) -> Result<&mut N, GraphError> {
        match self.slots.get_mut(handle.index()) {
            Some(Some(node)) => Ok(node),
            Some(None) => Err(GraphError::Incomplete {
                variety: N::NAME,
                index: handle.raw(),
            }),
            None => Err(GraphError::Missing {
                variety: N::NAME,
                index: handle.raw(),
            }),
        }
    }

    /// Every filled node, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<N>, &N)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let node = slot.as_ref()?;
            Some((Handle::from_raw(u32::try_from(i).ok()?), node))
        })
    }
}

impl<N: Variety> Default for Arena<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A graph that stores nodes of variety `N`.
pub trait Holds<N: Variety> {
    fn arena(&self) -> &Arena<N>;
    fn arena_mut(&mut self) -> &mut Arena<N>;
}

/// Variety-generic operations over a multi-variety graph.
pub trait Graph: Sized {
    fn insert<N: Variety>(&mut self, node: N) -> Handle<N>
    where
        Self: Holds<N>,
    {
        <Self as Holds<N>>::arena_mut(self).insert(node)
    }

    /// Insert a node whose construction needs its own handle.
    ///
    /// The handle is reserved first and passed to `build`, which may insert
    /// any other nodes (including ones that point back at the handle)
    /// before returning the node itself.
    fn insert_with<N, E>(
        &mut self,
        build: impl FnOnce(&mut Self, Handle<N>) -> Result<N, E>,
    ) -> Result<Handle<N>, E>
    where
        N: Variety,
        E: From<GraphError>,
        Self: Holds<N>,
    {
        let handle = <Self as Holds<N>>::arena_mut(self).reserve();
        let node = build(self, handle)?;
        <Self as Holds<N>>::arena_mut(self).fill(handle, node)?;
        Ok(handle)
    }

    fn get<N: Variety>(&self, handle: Handle<N>) -> Result<&N, GraphError>
    where
        Self: Holds<N>,
    {
        <Self as Holds<N>>::arena(self).get(handle)
    }

    fn get_mut<N: Variety>(&mut self, handle: Handle<N>) -> Result<&mut N, GraphError>
    where
        Self: Holds<N>,
    {
        <Self as Holds<N>>::arena_mut(self).get_mut(handle)
    }

    /// Visit every node of one variety in insertion order.
    fn each<N, E>(&self, mut visit: impl FnMut(Handle<N>, &N) -> Result<(), E>) -> Result<(), E>
    where
        N: Variety,
        Self: Holds<N>,
    {
        for (handle, node) in <Self as Holds<N>>::arena(self).iter() {
            visit(handle, node)?;
        }
        Ok(())
    }

    fn count<N: Variety>(&self) -> usize
    where
        Self: Holds<N>,
    {
        <Self as Holds<N>>::arena(self).len()
    }
}
