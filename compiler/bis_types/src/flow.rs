//! Control-flow legality.
//!
//! Two attributes over statements: whether control can reach the end of a
//! statement, and whether a statement contains a `break` out of its
//! innermost enclosing loop. A function with a return type must not reach
//! the end of its body, a statement after one that never falls through is
//! unreachable, and `break`/`continue` need an enclosing loop.

use bis_diagnostic::{CompileError, ErrorCode};
use bis_graph::{Graph, Handle, Memo};
use rustc_hash::FxHashSet;

use crate::graph::Program;
use crate::infer::TypeInfer;
use crate::instances::InstanceResolve;
use crate::nodes::{Expr, FunctionDecl, Stmt, StmtKind, VariantDecl};
use crate::pool::{TypeData, TypeDecl};
use crate::scope::breaks_from;
use crate::{user_error, CompileResult};

/// Whether control reaches the end of a statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reach {
    Yes,
    No,
    Maybe,
}

impl Reach {
    /// `self` followed by `next`.
    #[must_use]
    pub fn then(self, next: Reach) -> Reach {
        match (self, next) {
            (_, Reach::No) | (Reach::No, _) => Reach::No,
            (Reach::Yes, Reach::Yes) => Reach::Yes,
            _ => Reach::Maybe,
        }
    }

    /// Either of two alternatives.
    #[must_use]
    pub fn join(self, other: Reach) -> Reach {
        if self == other {
            self
        } else {
            Reach::Maybe
        }
    }
}

pub struct FlowCheck<'a> {
    instances: &'a InstanceResolve<'a>,
    reach: Memo<Stmt, Reach>,
    breaks: Memo<Stmt, bool>,
}

impl<'a> FlowCheck<'a> {
    pub fn new(instances: &'a InstanceResolve<'a>) -> Self {
        FlowCheck {
            instances,
            reach: Memo::new("reaches end"),
            breaks: Memo::new("can break"),
        }
    }

    /// Check every function body, global and instance methods alike.
    #[tracing::instrument(level = "debug", skip_all, fields(
        functions = instances.infer().kinds().program().graph.count::<FunctionDecl>(),
    ))]
    pub fn run(instances: &'a InstanceResolve<'a>) -> CompileResult<Self> {
        let pass = FlowCheck::new(instances);
        let graph = &pass.program().graph;
        graph.each::<FunctionDecl, _>(|function, _| pass.function(function))?;
        let mut breaking = 0usize;
        graph.each::<Stmt, CompileError>(|_, stmt| {
            if let StmtKind::While { body, .. } = &stmt.kind {
                breaking += usize::from(pass.can_break(*body)?);
            }
            Ok(())
        })?;
        tracing::debug!(
            statements = pass.reach.computed(),
            loops_with_break = breaking,
            "flow check complete"
        );
        Ok(pass)
    }

    pub fn instances(&self) -> &'a InstanceResolve<'a> {
        self.instances
    }

    fn infer(&self) -> &'a TypeInfer<'a> {
        self.instances.infer()
    }

    fn program(&self) -> &'a Program {
        self.infer().kinds().program()
    }

    fn function(&self, handle: Handle<FunctionDecl>) -> CompileResult<()> {
        let function = self.program().graph.get(handle)?;
        let reach = self.reaches_end(function.body)?;
        let Some(returns) = self.infer().return_type(handle)? else {
            return Ok(());
        };
        if reach == Reach::No {
            return Ok(());
        }
        Err(user_error(
            ErrorCode::E5001,
            function.name.span,
            format!(
                "function '{}' may reach the end of its body without returning a value of type '{}'",
                self.infer().kinds().cx().name(function.name.name),
                self.infer().kinds().render(returns)?
            ),
        ))
    }

    pub fn reaches_end(&self, handle: Handle<Stmt>) -> CompileResult<Reach> {
        self.reach.get(handle, || self.compute_reach(handle))
    }

    fn compute_reach(&self, handle: Handle<Stmt>) -> CompileResult<Reach> {
        let graph = &self.program().graph;
        let stmt = graph.get(handle)?;
        Ok(match &stmt.kind {
            StmtKind::Do(_) | StmtKind::Var { .. } | StmtKind::Assign { .. } => Reach::Yes,
            StmtKind::Return(_) => Reach::No,
            StmtKind::Break | StmtKind::Continue => {
                let (code, keyword) = if matches!(stmt.kind, StmtKind::Break) {
                    (ErrorCode::E5003, "break")
                } else {
                    (ErrorCode::E5004, "continue")
                };
                if breaks_from(graph, stmt.scope)?.is_none() {
                    return Err(user_error(
                        code,
                        stmt.span,
                        format!("'{keyword}' outside of a loop"),
                    ));
                }
                Reach::No
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => self
                .reaches_end(*then_block)?
                .join(self.reaches_end(*else_block)?),
            StmtKind::While { body, .. } => {
                self.reaches_end(*body)?;
                Reach::Maybe
            }
            StmtKind::Match { scrutinee, arms } => {
                let covered = self.infer().arm_variants(handle)?;
                let mut reach = if self.exhaustive(*scrutinee, &covered)? {
                    None
                } else {
                    Some(Reach::Yes)
                };
                for arm in arms {
                    let arm = self.reaches_end(arm.body)?;
                    reach = Some(reach.map_or(arm, |r| r.join(arm)));
                }
                reach.unwrap_or(Reach::No)
            }
            StmtKind::Block(statements) => {
                let mut reach = Reach::Yes;
                for statement in statements {
                    if reach == Reach::No {
                        return Err(user_error(
                            ErrorCode::E5002,
                            graph.get(*statement)?.span,
                            "unreachable statement",
                        ));
                    }
                    reach = reach.then(self.reaches_end(*statement)?);
                }
                reach
            }
        })
    }

    /// Whether the arms of a match over `scrutinee` cover every variant.
    fn exhaustive(&self, scrutinee: Handle<Expr>, covered: &[Handle<VariantDecl>]) -> CompileResult<bool> {
        let graph = &self.program().graph;
        let cx = self.infer().kinds().cx();
        let TypeData::Named {
            decl: TypeDecl::Enum(owner),
            ..
        } = cx.types.get(self.infer().ty(scrutinee)?)?
        else {
            return Err(CompileError::impossible(
                "match over a non-enum passed type inference",
                graph.get(scrutinee)?.span,
            ));
        };
        let covered: FxHashSet<_> = covered.iter().copied().collect();
        Ok(graph.get(owner)?.variants.iter().all(|v| covered.contains(v)))
    }

    /// Whether `handle` contains a `break` that leaves its innermost
    /// enclosing loop. Breaks inside nested loops do not count.
    pub fn can_break(&self, handle: Handle<Stmt>) -> CompileResult<bool> {
        self.breaks.get(handle, || {
            let stmt = self.program().graph.get(handle)?;
            Ok(match &stmt.kind {
                StmtKind::Break => true,
                StmtKind::If {
                    then_block,
                    else_block,
                    ..
                } => self.can_break(*then_block)? || self.can_break(*else_block)?,
                StmtKind::Match { arms, .. } => {
                    let mut any = false;
                    for arm in arms {
                        any |= self.can_break(arm.body)?;
                    }
                    any
                }
                StmtKind::Block(statements) => {
                    let mut any = false;
                    for statement in statements {
                        any |= self.can_break(*statement)?;
                    }
                    any
                }
                _ => false,
            })
        })
    }
}
