//! Statements, expressions and assignment targets.

use bis_diagnostic::{CompileError, ErrorCode};
use bis_graph::stack::ensure_sufficient_stack;
use bis_graph::{Graph, Handle};
use bis_ir::ast::{self, Ident};

use super::Builder;
use crate::nodes::{
    DeclRef, Expectation, Expr, ExprKind, FieldInit, MatchArm, Reference, ReferenceKind, Scope,
    Stmt, StmtKind, VarDecl,
};
use crate::scope::returns_from;
use crate::{user_error, CompileResult};

/// Infix operators and the functions they call.
const BINARY_OPERATORS: &[(&str, &str)] = &[
    ("+", "add"),
    ("-", "subtract"),
    ("*", "multiply"),
    ("/", "divide"),
    ("%", "mod"),
    ("^", "pow"),
    ("==", "equals"),
    ("/=", "nequals"),
    (">", "greater"),
    ("<", "less"),
    (">=", "greaterEqual"),
    ("<=", "lessEqual"),
    ("++", "append"),
];

const PREFIX_OPERATORS: &[(&str, &str)] = &[("-", "negate")];

impl Builder<'_> {
    /// Build a block. Each `var` opens a child scope for the statements
    /// after it.
    pub(super) fn block(&mut self, block: &ast::Block, scope: Handle<Scope>) -> CompileResult<Handle<Stmt>> {
        let mut current = scope;
        let mut statements = Vec::with_capacity(block.statements.len());
        for statement in &block.statements {
            let (handle, next) = self.statement(statement, current)?;
            statements.push(handle);
            if let Some(next) = next {
                current = next;
            }
        }
        Ok(self.insert(Stmt {
            span: block.span,
            scope,
            kind: StmtKind::Block(statements),
        }))
    }

    fn statement(
        &mut self,
        statement: &ast::Statement,
        scope: Handle<Scope>,
    ) -> CompileResult<(Handle<Stmt>, Option<Handle<Scope>>)> {
        let span = statement.span;
        let stmt = |kind| Stmt { span, scope, kind };

        let kind = match &statement.kind {
            ast::StmtKind::Var { name, ty, value } => {
                let ty = self.type_node(ty, scope, None)?;
                let decl = self.insert(VarDecl { name: *name, ty });
                let value = self.expr(value, scope, Some(Expectation::Declared(decl)))?;
                let handle = self.insert(stmt(StmtKind::Var { decl, value }));
                let after = self.insert(Scope::child(scope));
                self.declare(after, *name, DeclRef::Var(decl))?;
                return Ok((handle, Some(after)));
            }
            ast::StmtKind::Assign { target, value } => {
                let target = self.reference(target, scope)?;
                let value = self.expr(value, scope, Some(Expectation::Assigned(target)))?;
                StmtKind::Assign { target, value }
            }
            ast::StmtKind::Expr(expr) => StmtKind::Do(self.expr(expr, scope, None)?),
            ast::StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.expr(condition, scope, None)?;
                let then_block = self.block(then_block, scope)?;
                let else_block = match else_block {
                    Some(block) => self.block(block, scope)?,
                    None => self.insert(stmt(StmtKind::Block(Vec::new()))),
                };
                StmtKind::If {
                    condition,
                    then_block,
                    else_block,
                }
            }
            ast::StmtKind::While { condition, body } => {
                let handle = self.insert_with::<Stmt, CompileError>(|b, me| {
                    let condition = b.expr(condition, scope, None)?;
                    let body_scope = b.insert(Scope {
                        breaks_from: Some(me),
                        ..Scope::child(scope)
                    });
                    let body = b.block(body, body_scope)?;
                    Ok(stmt(StmtKind::While { condition, body }))
                })?;
                return Ok((handle, None));
            }
            ast::StmtKind::Return(value) => {
                let function = returns_from(&self.graph, scope)?;
                let value = match value {
                    Some(value) => {
                        Some(self.expr(value, scope, function.map(Expectation::Returned))?)
                    }
                    None => None,
                };
                StmtKind::Return(value)
            }
            ast::StmtKind::Break => StmtKind::Break,
            ast::StmtKind::Continue => StmtKind::Continue,
            ast::StmtKind::Match { scrutinee, arms } => {
                let scrutinee = self.expr(scrutinee, scope, None)?;
                let mut built = Vec::with_capacity(arms.len());
                for arm in arms {
                    built.push(self.match_arm(arm, scope)?);
                }
                StmtKind::Match {
                    scrutinee,
                    arms: built,
                }
            }
            ast::StmtKind::Yield => return Err(self.unimplemented(span, "'yield' statements")),
        };
        Ok((self.insert(stmt(kind)), None))
    }

    fn match_arm(&mut self, arm: &ast::MatchArm, scope: Handle<Scope>) -> CompileResult<MatchArm> {
        let (binder, arm_scope) = match &arm.binder {
            Some(binder) => {
                let ty = self.type_node(&binder.ty, scope, None)?;
                let decl = self.insert(VarDecl {
                    name: binder.name,
                    ty,
                });
                let arm_scope = self.insert(Scope::child(scope));
                self.declare(arm_scope, binder.name, DeclRef::Var(decl))?;
                (Some(decl), arm_scope)
            }
            None => (None, scope),
        };
        Ok(MatchArm {
            variant: arm.variant,
            binder,
            body: self.block(&arm.body, arm_scope)?,
        })
    }

    /// Build an assignment target: a variable or a field path rooted at one.
    fn reference(&mut self, target: &ast::Expr, scope: Handle<Scope>) -> CompileResult<Handle<Reference>> {
        let kind = match &target.kind {
            ast::ExprKind::Variable(name) => ReferenceKind::Var(*name),
            ast::ExprKind::Dot { object, field } => ReferenceKind::Dot {
                object: self.reference(object, scope)?,
                field: *field,
            },
            _ => {
                return Err(user_error(
                    ErrorCode::E3017,
                    target.span,
                    "only variables and their fields can be assigned to",
                ))
            }
        };
        Ok(self.insert(Reference {
            span: target.span,
            scope,
            kind,
        }))
    }

    pub(super) fn expr(
        &mut self,
        expr: &ast::Expr,
        scope: Handle<Scope>,
        expects: Option<Expectation>,
    ) -> CompileResult<Handle<Expr>> {
        let kind = ensure_sufficient_stack(|| self.expr_kind(expr, scope))?;
        Ok(self.insert(Expr {
            span: expr.span,
            scope,
            expects,
            kind,
        }))
    }

    fn exprs(&mut self, exprs: &[ast::Expr], scope: Handle<Scope>) -> CompileResult<Vec<Handle<Expr>>> {
        exprs.iter().map(|e| self.expr(e, scope, None)).collect()
    }

    fn expr_kind(&mut self, expr: &ast::Expr, scope: Handle<Scope>) -> CompileResult<ExprKind> {
        Ok(match &expr.kind {
            ast::ExprKind::Integer(value) => ExprKind::Integer(*value),
            ast::ExprKind::String(value) => ExprKind::String(value.clone()),
            ast::ExprKind::Boolean(value) => ExprKind::Boolean(*value),
            ast::ExprKind::Variable(name) => ExprKind::Variable(*name),
            ast::ExprKind::Dot { object, field } => ExprKind::Dot {
                object: self.expr(object, scope, None)?,
                field: *field,
            },
            ast::ExprKind::Call {
                callee,
                args,
                has_effect,
            } => ExprKind::Call {
                callee: self.expr(callee, scope, None)?,
                args: self.exprs(args, scope)?,
                has_effect: *has_effect,
            },
            ast::ExprKind::Binary { op, left, right } => {
                let callee = self.operator_callee(*op, BINARY_OPERATORS, scope)?;
                let args = vec![self.expr(left, scope, None)?, self.expr(right, scope, None)?];
                ExprKind::Operator {
                    op: *op,
                    callee,
                    args,
                }
            }
            ast::ExprKind::Prefix { op, operand } => {
                let callee = self.operator_callee(*op, PREFIX_OPERATORS, scope)?;
                let args = vec![self.expr(operand, scope, None)?];
                ExprKind::Operator {
                    op: *op,
                    callee,
                    args,
                }
            }
            ast::ExprKind::Object { name, contents } => match contents {
                ast::ObjectContents::Fields(fields) => {
                    let mut built = Vec::with_capacity(fields.len());
                    for field in fields {
                        built.push(FieldInit {
                            name: field.name,
                            value: self.expr(&field.value, scope, None)?,
                        });
                    }
                    ExprKind::Object {
                        name: *name,
                        fields: built,
                    }
                }
                ast::ObjectContents::Single(value) => ExprKind::Variant {
                    name: *name,
                    payload: Some(self.expr(value, scope, None)?),
                },
                ast::ObjectContents::Empty => ExprKind::Variant {
                    name: *name,
                    payload: None,
                },
            },
            ast::ExprKind::Array(items) => ExprKind::Array(self.exprs(items, scope)?),
            ast::ExprKind::Lambda { .. } => {
                return Err(self.unimplemented(expr.span, "anonymous functions"))
            }
            ast::ExprKind::Borrow { .. } => {
                return Err(self.unimplemented(expr.span, "borrow expressions"))
            }
            ast::ExprKind::Service { .. } => {
                return Err(self.unimplemented(expr.span, "service expressions"))
            }
            ast::ExprKind::Foreign => {
                return Err(self.unimplemented(expr.span, "foreign expressions"))
            }
        })
    }

    /// The synthetic variable an operator token calls.
    fn operator_callee(
        &mut self,
        op: Ident,
        table: &[(&str, &str)],
        scope: Handle<Scope>,
    ) -> CompileResult<Handle<Expr>> {
        let token = self.cx.name(op.name);
        let Some((_, function)) = table.iter().find(|(symbol, _)| *symbol == token) else {
            return Err(user_error(
                ErrorCode::E6001,
                op.span,
                format!("operator '{token}' is not supported"),
            ));
        };
        let name = Ident::new(self.cx.intern(function), op.span);
        Ok(self.insert(Expr {
            span: op.span,
            scope,
            expects: None,
            kind: ExprKind::Variable(name),
        }))
    }
}
