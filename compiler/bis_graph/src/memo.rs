//! Memoized, cycle-checked attribute tables.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::stack::ensure_sufficient_stack;
use crate::{GraphError, Handle, Variety};

/// Evaluation state of one attribute on one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoState<T> {
    NotStarted,
    InProgress,
    Done(T),
}

/// One attribute of one variety: a lazily filled map from handle to value.
///
/// `get` computes the value on first demand and caches it. The computation
/// may demand any attribute of any node, including other entries of this
/// table; demanding the entry that is currently being computed fails with
/// [`GraphError::Cycle`]. A failed computation leaves the entry
/// `NotStarted`, but since every error aborts compilation that is never
/// observed in practice.
pub struct Memo<N, T> {
    attribute: &'static str,
    cells: RefCell<FxHashMap<Handle<N>, MemoState<T>>>,
}

impl<N: Variety, T: Clone> Memo<N, T> {
    pub fn new(attribute: &'static str) -> Self {
        Memo {
            attribute,
            cells: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    /// The attribute value for `handle`, computing it with `compute` if
    /// this is the first demand.
    pub fn get<E>(
        &self,
        handle: Handle<N>,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<GraphError>,
    {
        {
            let mut cells = self.cells.borrow_mut();
            match cells.get(&handle) {
                Some(MemoState::Done(value)) => return Ok(value.clone()),
                Some(MemoState::InProgress) => {
                    return Err(GraphError::Cycle {
                        attribute: self.attribute,
                        variety: N::NAME,
                        index: handle.raw(),
                    }
                    .into());
                }
                Some(MemoState::NotStarted) | None => {
                    cells.insert(handle, MemoState::InProgress);
                }
            }
        }

        tracing::trace!(attribute = self.attribute, node = ?handle, "computing");
        let result = ensure_sufficient_stack(compute);

        let mut cells = self.cells.borrow_mut();
        match result {
            Ok(value) => {
                cells.insert(handle, MemoState::Done(value.clone()));
                Ok(value)
            }
            Err(err) => {
                cells.remove(&handle);
                Err(err)
            }
        }
    }

    /// The cached value, without computing anything.
    pub fn peek(&self, handle: Handle<N>) -> Option<T> {
        match self.cells.borrow().get(&handle) {
            Some(MemoState::Done(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn state(&self, handle: Handle<N>) -> MemoState<T> {
        self.cells
            .borrow()
            .get(&handle)
            .cloned()
            .unwrap_or(MemoState::NotStarted)
    }

    /// Number of finished entries.
    pub fn computed(&self) -> usize {
        self.cells
            .borrow()
            .values()
            .filter(|state| matches!(state, MemoState::Done(_)))
            .count()
    }
}
