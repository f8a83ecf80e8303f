//! Graph substrate for attribute-grammar style compilation.
//!
//! A program is a set of typed, append-only node stores ([`Arena`]), one per
//! node *variety*, addressed by [`Handle`]s. Handles are plain values: a
//! handle minted by the builder stays valid, and compares equal, in every
//! later phase.
//!
//! Phases never mutate nodes. A phase instead owns [`Memo`] tables that
//! attach derived attributes to handles. An attribute is computed on first
//! demand, memoized, and may freely demand other attributes of any node;
//! re-entering an attribute that is still being computed is reported as a
//! cyclic-attribute error rather than overflowing the stack.
//!
//! # Design
//!
//! - Nodes live in `Vec`s; handles are `u32` indices tagged with the node
//!   type, so a `Handle<Scope>` can never index the expression store.
//! - Self-referencing construction (a loop whose body scope points back at
//!   the loop) reserves the handle first and fills the slot afterwards, see
//!   [`Graph::insert_with`].
//! - A phase is "computed" by forcing its attributes over every node of the
//!   varieties it covers; afterwards its tables are read-only.

mod arena;
mod error;
mod handle;
mod memo;
pub mod stack;

pub use arena::{Arena, Graph, Holds};
pub use error::GraphError;
pub use handle::{Handle, Variety};
pub use memo::{Memo, MemoState};
