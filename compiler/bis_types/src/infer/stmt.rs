//! Statement checks.

use bis_diagnostic::{CompileError, Diagnostic, ErrorCode};
use bis_graph::{Graph, Handle};
use rustc_hash::FxHashMap;

use super::TypeInfer;
use crate::algebra::{bindings, substitute};
use crate::nodes::{Expr, GenericDecl, MatchArm, Stmt, StmtKind, VariantDecl};
use crate::pool::{Ty, TypeData, TypeDecl};
use crate::{user_error, CompileResult};

impl TypeInfer<'_> {
    /// Check a statement's typing rules.
    pub fn check(&self, handle: Handle<Stmt>) -> CompileResult<()> {
        self.statements.get(handle, || self.check_uncached(handle))
    }

    fn check_uncached(&self, handle: Handle<Stmt>) -> CompileResult<()> {
        let graph = &self.program().graph;
        let stmt = graph.get(handle)?;
        match &stmt.kind {
            StmtKind::Do(expr) => self.ty(*expr).map(drop),
            StmtKind::Var { decl, value } => {
                let var = graph.get(*decl)?;
                let declared = self.kinds().ty(var.ty)?;
                let found = self.ty(*value)?;
                if !self.identical(declared, found)? {
                    return Err(user_error(
                        ErrorCode::E3001,
                        graph.get(*value)?.span,
                        format!(
                            "variable '{}' is declared as '{}' but initialized with a value of type '{}'",
                            self.cx().name(var.name.name),
                            self.render(declared)?,
                            self.render(found)?
                        ),
                    ));
                }
                Ok(())
            }
            StmtKind::Assign { target, value } => {
                let declared = self.reference_type(*target)?;
                let found = self.ty(*value)?;
                if !self.identical(declared, found)? {
                    return Err(user_error(
                        ErrorCode::E3001,
                        graph.get(*value)?.span,
                        format!(
                            "cannot assign a value of type '{}' to a target of type '{}'",
                            self.render(found)?,
                            self.render(declared)?
                        ),
                    ));
                }
                Ok(())
            }
            StmtKind::Return(value) => self.check_return(stmt, *value),
            StmtKind::Break | StmtKind::Continue => Ok(()),
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.condition(*condition, "if")?;
                self.check(*then_block)?;
                self.check(*else_block)
            }
            StmtKind::While { condition, body } => {
                self.condition(*condition, "while")?;
                self.check(*body)
            }
            StmtKind::Match { scrutinee, arms } => {
                self.ty(*scrutinee)?;
                self.arm_variants(handle)?;
                for arm in arms {
                    self.check(arm.body)?;
                }
                Ok(())
            }
            StmtKind::Block(statements) => {
                for statement in statements {
                    self.check(*statement)?;
                }
                Ok(())
            }
        }
    }

    fn condition(&self, condition: Handle<Expr>, keyword: &str) -> CompileResult<()> {
        let found = self.ty(condition)?;
        if self.identical(found, self.kinds().bool())? {
            return Ok(());
        }
        Err(user_error(
            ErrorCode::E3014,
            self.program().graph.get(condition)?.span,
            format!(
                "'{keyword}' condition must be 'Bool', found '{}'",
                self.render(found)?
            ),
        ))
    }

    fn check_return(&self, stmt: &Stmt, value: Option<Handle<Expr>>) -> CompileResult<()> {
        let function = self.enclosing_function(stmt)?;
        let name = self.cx().name(self.program().graph.get(function)?.name.name);
        match (self.return_type(function)?, value) {
            (None, None) => Ok(()),
            (Some(returns), None) => Err(user_error(
                ErrorCode::E3015,
                stmt.span,
                format!(
                    "function '{name}' must return a value of type '{}'",
                    self.render(returns)?
                ),
            )),
            (None, Some(_)) => Err(user_error(
                ErrorCode::E3015,
                stmt.span,
                format!("function '{name}' has no return type, so it cannot return a value"),
            )),
            (Some(returns), Some(value)) => {
                let found = self.ty(value)?;
                if self.identical(returns, found)? {
                    return Ok(());
                }
                Err(user_error(
                    ErrorCode::E3001,
                    self.program().graph.get(value)?.span,
                    format!(
                        "function '{name}' returns '{}', but this value has type '{}'",
                        self.render(returns)?,
                        self.render(found)?
                    ),
                ))
            }
        }
    }

    /// The variant each arm of a match statement names, in arm order.
    pub fn arm_variants(&self, handle: Handle<Stmt>) -> CompileResult<Vec<Handle<VariantDecl>>> {
        self.arms.get(handle, || {
            let graph = &self.program().graph;
            let stmt = graph.get(handle)?;
            let StmtKind::Match { scrutinee, arms } = &stmt.kind else {
                return Err(CompileError::impossible(
                    "arm variants of a non-match statement",
                    stmt.span,
                ));
            };
            let scrutinee_ty = self.ty(*scrutinee)?;
            let TypeData::Named {
                decl: TypeDecl::Enum(owner),
                args,
            } = self.cx().types.get(scrutinee_ty)?
            else {
                return Err(user_error(
                    ErrorCode::E3016,
                    graph.get(*scrutinee)?.span,
                    format!(
                        "cannot match on a value of type '{}'; only enums can be matched",
                        self.render(scrutinee_ty)?
                    ),
                ));
            };
            let owner_decl = graph.get(owner)?;
            let enum_name = self.cx().name(owner_decl.name.name);
            let type_args = bindings(&owner_decl.generics, &args);

            let mut seen = FxHashMap::default();
            let mut variants = Vec::with_capacity(arms.len());
            for arm in arms {
                let arm_name = self.cx().name(arm.variant.name);
                let mut found = None;
                for variant in &owner_decl.variants {
                    if graph.get(*variant)?.name.name == arm.variant.name {
                        found = Some(*variant);
                        break;
                    }
                }
                let Some(variant) = found else {
                    return Err(user_error(
                        ErrorCode::E3016,
                        arm.variant.span,
                        format!("enum '{enum_name}' has no variant '{arm_name}'"),
                    ));
                };
                if let Some(first) = seen.insert(variant, arm.variant.span) {
                    return Err(Diagnostic::error(ErrorCode::E3016)
                        .with_message(format!("variant '{arm_name}' is matched twice"))
                        .with_label(arm.variant.span, "matched again here")
                        .with_secondary_label(first, "first matched here")
                        .into());
                }
                self.check_binder(arm, variant, &type_args)?;
                variants.push(variant);
            }
            Ok(variants)
        })
    }

    fn check_binder(
        &self,
        arm: &MatchArm,
        variant: Handle<VariantDecl>,
        type_args: &FxHashMap<Handle<GenericDecl>, Ty>,
    ) -> CompileResult<()> {
        let Some(binder) = arm.binder else {
            return Ok(());
        };
        let graph = &self.program().graph;
        let binder = graph.get(binder)?;
        let arm_name = self.cx().name(arm.variant.name);
        let Some(payload) = graph.get(variant)?.payload else {
            return Err(user_error(
                ErrorCode::E3016,
                binder.name.span,
                format!("variant '{arm_name}' has no payload to bind"),
            ));
        };
        let payload = substitute(&self.cx().types, self.kinds().ty(payload)?, type_args)?;
        let declared = self.kinds().ty(binder.ty)?;
        if self.identical(declared, payload)? {
            return Ok(());
        }
        Err(user_error(
            ErrorCode::E3016,
            binder.name.span,
            format!(
                "binder '{}' is declared as '{}', but the payload of '{arm_name}' has type '{}'",
                self.cx().name(binder.name.name),
                self.render(declared)?,
                self.render(payload)?
            ),
        ))
    }
}
