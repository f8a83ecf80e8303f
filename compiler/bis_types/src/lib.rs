//! Semantic analysis for Bismuth.
//!
//! The builder turns the parser's declaration tree into a [`Program`]
//! graph. The checking passes then run strictly in order, each one a set of
//! memoized attribute tables over the graph that may read every attribute of
//! the passes before it:
//!
//! 1. [`KindCheck`]: type syntax to semantic [`Ty`]s, arity.
//! 2. [`NameResolve`]: variables, assignment roots, constraints, literal
//!    targets.
//! 3. [`TypeInfer`]: expression types, call-site generic inference,
//!    statement checks.
//! 4. [`InstanceResolve`]: instance validation and the evidence each call
//!    site needs.
//! 5. [`FlowCheck`]: reachability and loop control.
//!
//! Every pass exposes `run`, which forces its attributes over every node it
//! covers and fails with the first diagnostic.

pub mod algebra;
mod build;
mod builtins;
mod context;
mod flow;
mod graph;
mod infer;
mod instances;
mod kind;
pub mod nodes;
mod pool;
mod resolve;
pub mod scope;

use bis_diagnostic::{Diagnostic, ErrorCode};
use bis_ir::Span;

pub use bis_diagnostic::{CompileError, CompileResult};
pub use build::build;
pub use builtins::PRELUDE;
pub use context::Context;
pub use flow::{FlowCheck, Reach};
pub use graph::{Builtins, Item, Program, ProgramGraph};
pub use infer::TypeInfer;
pub use instances::{Evidence, InstanceInfo, InstanceRegistry, InstanceResolve};
pub use kind::KindCheck;
pub use pool::{FnSig, Ty, TypeData, TypeDecl, TypePool};
pub use resolve::{LiteralTarget, NameResolve, ValueRef};

/// A user diagnostic with a single primary label.
#[cold]
pub(crate) fn user_error(code: ErrorCode, span: Span, message: impl Into<String>) -> CompileError {
    Diagnostic::error(code)
        .with_message(message)
        .with_label(span, code.description())
        .into()
}

/// The result of every checking pass over one program.
///
/// Lowering reads attributes of all passes; this bundles the borrowed
/// passes so they travel together.
#[derive(Copy, Clone)]
pub struct Checked<'a> {
    pub program: &'a Program,
    pub cx: &'a Context<'a>,
    pub kinds: &'a KindCheck<'a>,
    pub names: &'a NameResolve<'a>,
    pub infer: &'a TypeInfer<'a>,
    pub instances: &'a InstanceResolve<'a>,
    pub flow: &'a FlowCheck<'a>,
}
