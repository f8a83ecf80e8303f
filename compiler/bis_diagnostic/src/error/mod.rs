//! The error channel of every compiler phase.

use bis_ir::Span;
use thiserror::Error;

use crate::{Diagnostic, ErrorCode};

/// A failed compilation.
///
/// `User` diagnostics describe a problem in the program being compiled.
/// `Internal` diagnostics (E9xxx) mean an earlier phase broke an invariant
/// of a later one: a dangling handle, a cyclic attribute, an impossible
/// node shape. They are never the user's fault.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{0}")]
    User(Box<Diagnostic>),
    #[error("{0}")]
    Internal(Box<Diagnostic>),
}

pub type CompileResult<T> = Result<T, CompileError>;

impl CompileError {
    /// Internal error for a state the earlier phases should have ruled out.
    #[cold]
    pub fn impossible(message: impl Into<String>, span: Span) -> Self {
        CompileError::Internal(Box::new(
            Diagnostic::error(ErrorCode::E9003)
                .with_message(message)
                .with_label(span, "while processing this"),
        ))
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            CompileError::User(d) | CompileError::Internal(d) => d,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.diagnostic().code
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

/// Routes on the code: E9xxx diagnostics become internal errors.
impl From<Diagnostic> for CompileError {
    fn from(diagnostic: Diagnostic) -> Self {
        if diagnostic.code.is_internal_error() {
            CompileError::Internal(Box::new(diagnostic))
        } else {
            CompileError::User(Box::new(diagnostic))
        }
    }
}

#[cfg(test)]
mod tests;
