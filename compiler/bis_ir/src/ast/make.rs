//! Terse constructors for declaration trees.
//!
//! Used wherever a tree is built by hand instead of parsed: checker tests,
//! driver tests, and builtin-free embedding. Every token gets a fresh,
//! distinct span so diagnostics in tests point somewhere unambiguous.

use std::cell::Cell;

use super::{
    Binder, Block, Declaration, EnumDecl, Expr, ExprKind, Field, FieldInit, FunctionDecl,
    FunctionType, Generic, Ident, InstanceDecl, InterfaceDecl, InterfaceMethod, MatchArm,
    NamedType, ObjectContents, Param, Statement, StmtKind, StructDecl, Type, Variant,
};
use crate::{Span, StringInterner};

/// Builds syntax nodes, interning names as it goes.
pub struct SyntaxFactory<'a> {
    interner: &'a StringInterner,
    next: Cell<u32>,
}

impl<'a> SyntaxFactory<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        SyntaxFactory {
            interner,
            next: Cell::new(1),
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// A fresh span, disjoint from every span handed out before.
    pub fn span(&self) -> Span {
        let start = self.next.get();
        self.next.set(start + 4);
        Span::new(start, start + 3)
    }

    pub fn ident(&self, text: &str) -> Ident {
        Ident::new(self.interner.intern(text), self.span())
    }

    // ── Types ───────────────────────────────────────────────────────

    pub fn named(&self, name: &str, args: Vec<Type>) -> NamedType {
        NamedType {
            name: self.ident(name),
            args,
        }
    }

    /// A named type without arguments.
    pub fn ty(&self, name: &str) -> Type {
        Type::Named(self.named(name, Vec::new()))
    }

    pub fn ty_app(&self, name: &str, args: Vec<Type>) -> Type {
        Type::Named(self.named(name, args))
    }

    pub fn self_ty(&self) -> Type {
        Type::SelfType(self.span())
    }

    pub fn func_ty(
        &self,
        generics: Vec<Generic>,
        params: Vec<Type>,
        returns: Option<Type>,
    ) -> FunctionType {
        FunctionType {
            span: self.span(),
            generics,
            effects: Vec::new(),
            params,
            returns: returns.map(Box::new),
        }
    }

    pub fn generic(&self, name: &str, constraints: &[&str]) -> Generic {
        Generic {
            name: self.ident(name),
            constraints: constraints.iter().map(|c| self.ident(c)).collect(),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            span: self.span(),
            kind,
        }
    }

    pub fn int(&self, value: i64) -> Expr {
        self.expr(ExprKind::Integer(value))
    }

    pub fn string(&self, value: &str) -> Expr {
        self.expr(ExprKind::String(value.to_owned()))
    }

    pub fn boolean(&self, value: bool) -> Expr {
        self.expr(ExprKind::Boolean(value))
    }

    pub fn var(&self, name: &str) -> Expr {
        let ident = self.ident(name);
        Expr {
            span: ident.span,
            kind: ExprKind::Variable(ident),
        }
    }

    pub fn dot(&self, object: Expr, field: &str) -> Expr {
        self.expr(ExprKind::Dot {
            object: Box::new(object),
            field: self.ident(field),
        })
    }

    /// `name(args)`.
    pub fn call(&self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.var(name);
        self.call_expr(callee, args, false)
    }

    /// `name!(args)`.
    pub fn call_bang(&self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.var(name);
        self.call_expr(callee, args, true)
    }

    pub fn call_expr(&self, callee: Expr, args: Vec<Expr>, has_effect: bool) -> Expr {
        self.expr(ExprKind::Call {
            callee: Box::new(callee),
            args,
            has_effect,
        })
    }

    pub fn binary(&self, op: &str, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op: self.ident(op),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn prefix(&self, op: &str, operand: Expr) -> Expr {
        self.expr(ExprKind::Prefix {
            op: self.ident(op),
            operand: Box::new(operand),
        })
    }

    /// `#Name{ field => value, ... }`.
    pub fn object(&self, name: &str, fields: Vec<(&str, Expr)>) -> Expr {
        let fields = fields
            .into_iter()
            .map(|(field, value)| FieldInit {
                name: self.ident(field),
                value,
            })
            .collect();
        self.expr(ExprKind::Object {
            name: self.ident(name),
            contents: ObjectContents::Fields(fields),
        })
    }

    /// `#Variant(payload)` or bare `#Variant`.
    pub fn variant(&self, name: &str, payload: Option<Expr>) -> Expr {
        let contents = match payload {
            Some(value) => ObjectContents::Single(Box::new(value)),
            None => ObjectContents::Empty,
        };
        self.expr(ExprKind::Object {
            name: self.ident(name),
            contents,
        })
    }

    pub fn array(&self, items: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Array(items))
    }

    // ── Statements ──────────────────────────────────────────────────

    fn stmt(&self, kind: StmtKind) -> Statement {
        Statement {
            span: self.span(),
            kind,
        }
    }

    pub fn block(&self, statements: Vec<Statement>) -> Block {
        Block {
            span: self.span(),
            statements,
        }
    }

    pub fn var_stmt(&self, name: &str, ty: Type, value: Expr) -> Statement {
        self.stmt(StmtKind::Var {
            name: self.ident(name),
            ty,
            value,
        })
    }

    pub fn assign(&self, target: Expr, value: Expr) -> Statement {
        self.stmt(StmtKind::Assign { target, value })
    }

    pub fn expr_stmt(&self, expr: Expr) -> Statement {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn ret(&self, value: Option<Expr>) -> Statement {
        self.stmt(StmtKind::Return(value))
    }

    pub fn brk(&self) -> Statement {
        self.stmt(StmtKind::Break)
    }

    pub fn cont(&self) -> Statement {
        self.stmt(StmtKind::Continue)
    }

    pub fn if_stmt(
        &self,
        condition: Expr,
        then_body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    ) -> Statement {
        let then_block = self.block(then_body);
        let else_block = else_body.map(|body| self.block(body));
        self.stmt(StmtKind::If {
            condition,
            then_block,
            else_block,
        })
    }

    pub fn while_stmt(&self, condition: Expr, body: Vec<Statement>) -> Statement {
        let body = self.block(body);
        self.stmt(StmtKind::While { condition, body })
    }

    pub fn match_stmt(&self, scrutinee: Expr, arms: Vec<MatchArm>) -> Statement {
        self.stmt(StmtKind::Match { scrutinee, arms })
    }

    pub fn arm(&self, variant: &str, binder: Option<(&str, Type)>, body: Vec<Statement>) -> MatchArm {
        MatchArm {
            variant: self.ident(variant),
            binder: binder.map(|(name, ty)| Binder {
                name: self.ident(name),
                ty,
            }),
            body: self.block(body),
        }
    }

    // ── Declarations ────────────────────────────────────────────────

    pub fn function(
        &self,
        name: &str,
        generics: Vec<Generic>,
        params: Vec<(&str, Type)>,
        returns: Option<Type>,
        body: Vec<Statement>,
    ) -> FunctionDecl {
        FunctionDecl {
            name: self.ident(name),
            generics,
            effects: Vec::new(),
            params: params
                .into_iter()
                .map(|(name, ty)| Param {
                    name: self.ident(name),
                    ty,
                })
                .collect(),
            returns,
            body: self.block(body),
        }
    }

    pub fn struct_decl(
        &self,
        name: &str,
        generics: Vec<Generic>,
        fields: Vec<(&str, Type)>,
    ) -> Declaration {
        Declaration::Struct(StructDecl {
            name: self.ident(name),
            generics,
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: self.ident(name),
                    ty,
                })
                .collect(),
        })
    }

    pub fn enum_decl(
        &self,
        name: &str,
        generics: Vec<Generic>,
        variants: Vec<(&str, Option<Type>)>,
    ) -> Declaration {
        Declaration::Enum(EnumDecl {
            name: self.ident(name),
            generics,
            variants: variants
                .into_iter()
                .map(|(name, payload)| Variant {
                    name: self.ident(name),
                    payload,
                })
                .collect(),
        })
    }

    pub fn interface(&self, name: &str, methods: Vec<(&str, FunctionType)>) -> Declaration {
        Declaration::Interface(InterfaceDecl {
            name: self.ident(name),
            parents: Vec::new(),
            methods: methods
                .into_iter()
                .map(|(name, ty)| InterfaceMethod {
                    name: self.ident(name),
                    ty,
                })
                .collect(),
        })
    }

    pub fn instance(
        &self,
        interface: &str,
        ty: NamedType,
        generics: Vec<Generic>,
        methods: Vec<FunctionDecl>,
    ) -> Declaration {
        Declaration::Instance(InstanceDecl {
            interface: self.ident(interface),
            ty,
            generics,
            methods,
        })
    }
}

#[cfg(test)]
mod tests;
