//! Diagnostic system for the Bismuth checker and lowering.
//!
//! Every failure the compiler can report is a [`Diagnostic`]: an
//! [`ErrorCode`], a message that names the entities involved, and labelled
//! spans. Diagnostics travel inside [`CompileError`], which separates
//! problems in the user's program from internal-consistency failures in the
//! compiler itself.
//!
//! There is no recovery. The first error aborts the compilation, so a
//! `Result<T, CompileError>` is the only error channel.

mod diagnostic;
mod error;
mod error_code;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Label};
pub use error::{CompileError, CompileResult};
pub use error_code::{ErrorCode, Phase};
