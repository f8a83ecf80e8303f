//! Shared leaf types for the Bismuth compiler.
//!
//! - [`Span`]: byte range into the source text
//! - [`Name`] and [`StringInterner`]: 32-bit interned identifiers
//! - [`ast`]: the declaration tree produced by the parser and consumed by
//!   the graph builder
//!
//! Everything here is plain data. Nothing in this crate knows about scopes,
//! types or the program graph.

pub mod ast;
mod interner;
mod name;
mod span;

pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::{Span, SpanError};
