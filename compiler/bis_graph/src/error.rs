//! Internal-consistency failures of the graph substrate.

use bis_diagnostic::{CompileError, Diagnostic, ErrorCode};
use bis_ir::Span;
use thiserror::Error;

/// A broken graph invariant. Always a compiler bug, never a user error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no {variety} node with handle #{index}")]
    Missing { variety: &'static str, index: u32 },
    #[error("{variety} node #{index} was reserved but never filled")]
    Incomplete { variety: &'static str, index: u32 },
    #[error("{variety} node #{index} was filled twice")]
    AlreadyFilled { variety: &'static str, index: u32 },
    #[error("cyclic attribute: '{attribute}' of {variety} #{index} depends on itself")]
    Cycle {
        attribute: &'static str,
        variety: &'static str,
        index: u32,
    },
}

impl GraphError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GraphError::Cycle { .. } => ErrorCode::E9002,
            GraphError::Missing { .. }
            | GraphError::Incomplete { .. }
            | GraphError::AlreadyFilled { .. } => ErrorCode::E9001,
        }
    }
}

impl From<GraphError> for CompileError {
    fn from(err: GraphError) -> Self {
        CompileError::Internal(Box::new(
            Diagnostic::error(err.code())
                .with_message(err.to_string())
                .with_label(Span::DUMMY, "raised by the graph store"),
        ))
    }
}
