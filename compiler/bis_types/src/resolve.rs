//! Name resolution for values, assignment targets, constraints and
//! literal targets.

use bis_diagnostic::ErrorCode;
use bis_graph::{Graph, Handle, Memo};
use bis_ir::ast::Ident;

use crate::algebra::Constraints;
use crate::context::Context;
use crate::graph::Program;
use crate::kind::KindCheck;
use crate::nodes::{
    BuiltinVarDecl, DeclRef, Expr, ExprKind, FunctionDecl, GenericDecl, InterfaceDecl, MethodDecl,
    Reference, ReferenceKind, Scope, StructDecl, VarDecl, VariantDecl,
};
use crate::scope::lookup;
use crate::{user_error, CompileResult};

/// What a variable expression refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueRef {
    Var(Handle<VarDecl>),
    Function(Handle<FunctionDecl>),
    Builtin(Handle<BuiltinVarDecl>),
    Method(Handle<MethodDecl>),
}

/// What an object or variant literal constructs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LiteralTarget {
    Struct(Handle<StructDecl>),
    Variant(Handle<VariantDecl>),
}

pub struct NameResolve<'a> {
    kinds: &'a KindCheck<'a>,
    values: Memo<Expr, ValueRef>,
    targets: Memo<Expr, LiteralTarget>,
    roots: Memo<Reference, Handle<VarDecl>>,
    constraints: Memo<GenericDecl, Vec<Handle<InterfaceDecl>>>,
}

impl<'a> NameResolve<'a> {
    pub fn new(kinds: &'a KindCheck<'a>) -> Self {
        NameResolve {
            kinds,
            values: Memo::new("value"),
            targets: Memo::new("literal target"),
            roots: Memo::new("assignment root"),
            constraints: Memo::new("constraints"),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(kinds: &'a KindCheck<'a>) -> CompileResult<Self> {
        let pass = NameResolve::new(kinds);
        let graph = &kinds.program().graph;
        graph.each::<GenericDecl, _>(|generic, _| pass.constraints(generic).map(drop))?;
        graph.each::<Expr, _>(|expr, node| match node.kind {
            ExprKind::Variable(_) => pass.value(expr).map(drop),
            ExprKind::Object { .. } | ExprKind::Variant { .. } => pass.target(expr).map(drop),
            _ => Ok(()),
        })?;
        graph.each::<Reference, _>(|reference, _| pass.root(reference).map(drop))?;
        tracing::debug!(
            values = pass.values.computed(),
            targets = pass.targets.computed(),
            "name resolution complete"
        );
        Ok(pass)
    }

    pub fn kinds(&self) -> &'a KindCheck<'a> {
        self.kinds
    }

    fn program(&self) -> &'a Program {
        self.kinds.program()
    }

    fn cx(&self) -> &'a Context<'a> {
        self.kinds.cx()
    }

    fn find(&self, scope: Handle<Scope>, name: Ident, what: &str) -> CompileResult<DeclRef> {
        match lookup(&self.program().graph, scope, name.name)? {
            Some(decl) => Ok(decl),
            None => Err(user_error(
                ErrorCode::E1001,
                name.span,
                format!("{what} '{}' is not in scope", self.cx().name(name.name)),
            )),
        }
    }

    /// The declaration a variable expression names.
    pub fn value(&self, expr: Handle<Expr>) -> CompileResult<ValueRef> {
        self.values.get(expr, || {
            let node = self.program().graph.get(expr)?;
            let ExprKind::Variable(name) = node.kind else {
                return Err(bis_diagnostic::CompileError::impossible(
                    "value lookup on a non-variable expression",
                    node.span,
                ));
            };
            let text = self.cx().name(name.name);
            match self.find(node.scope, name, "variable")? {
                DeclRef::Var(v) => Ok(ValueRef::Var(v)),
                DeclRef::Function(f) => Ok(ValueRef::Function(f)),
                DeclRef::BuiltinVar(b) => Ok(ValueRef::Builtin(b)),
                DeclRef::Method(m) => Ok(ValueRef::Method(m)),
                DeclRef::Variant(_) => Err(user_error(
                    ErrorCode::E2004,
                    name.span,
                    format!("'{text}' is an enum variant; construct it with '#{text}'"),
                )),
                other => Err(user_error(
                    ErrorCode::E2004,
                    name.span,
                    format!("'{text}' is a {}, not a value", other.describe()),
                )),
            }
        })
    }

    /// The struct or variant an object or variant literal builds.
    pub fn target(&self, expr: Handle<Expr>) -> CompileResult<LiteralTarget> {
        self.targets.get(expr, || {
            let node = self.program().graph.get(expr)?;
            match node.kind {
                ExprKind::Object { name, .. } => {
                    let text = self.cx().name(name.name);
                    match self.find(node.scope, name, "struct")? {
                        DeclRef::Struct(s) => Ok(LiteralTarget::Struct(s)),
                        DeclRef::Variant(_) => Err(user_error(
                            ErrorCode::E3018,
                            name.span,
                            format!(
                                "'{text}' is an enum variant; write '#{text}(value)' or '#{text}'"
                            ),
                        )),
                        other => Err(user_error(
                            ErrorCode::E3011,
                            name.span,
                            format!("'{text}' is a {}, not a struct", other.describe()),
                        )),
                    }
                }
                ExprKind::Variant { name, .. } => {
                    let text = self.cx().name(name.name);
                    match self.find(node.scope, name, "enum variant")? {
                        DeclRef::Variant(v) => Ok(LiteralTarget::Variant(v)),
                        other => Err(user_error(
                            ErrorCode::E3018,
                            name.span,
                            format!("'{text}' is a {}, not an enum variant", other.describe()),
                        )),
                    }
                }
                _ => Err(bis_diagnostic::CompileError::impossible(
                    "literal target lookup on a non-literal expression",
                    node.span,
                )),
            }
        })
    }

    /// The variable an assignment target is rooted at.
    pub fn root(&self, reference: Handle<Reference>) -> CompileResult<Handle<VarDecl>> {
        self.roots.get(reference, || {
            let node = self.program().graph.get(reference)?;
            match node.kind {
                ReferenceKind::Dot { object, .. } => self.root(object),
                ReferenceKind::Var(name) => match self.find(node.scope, name, "variable")? {
                    DeclRef::Var(v) => Ok(v),
                    other => Err(user_error(
                        ErrorCode::E3017,
                        name.span,
                        format!(
                            "cannot assign to '{}': it is a {}, not a variable",
                            self.cx().name(name.name),
                            other.describe()
                        ),
                    )),
                },
            }
        })
    }

    /// The interfaces a generic parameter is constrained by.
    pub fn constraints(&self, generic: Handle<GenericDecl>) -> CompileResult<Vec<Handle<InterfaceDecl>>> {
        self.constraints.get(generic, || {
            let node = self.program().graph.get(generic)?;
            let mut interfaces = Vec::with_capacity(node.constraints.len());
            for constraint in &node.constraints {
                match self.find(node.scope, *constraint, "interface")? {
                    DeclRef::Interface(i) => interfaces.push(i),
                    other => {
                        return Err(user_error(
                            ErrorCode::E2003,
                            constraint.span,
                            format!(
                                "'{}' is a {}, not an interface, so it cannot constrain '{}'",
                                self.cx().name(constraint.name),
                                other.describe(),
                                self.cx().name(node.name.name),
                            ),
                        ))
                    }
                }
            }
            Ok(interfaces)
        })
    }
}

impl Constraints for NameResolve<'_> {
    fn constraints(&self, generic: Handle<GenericDecl>) -> CompileResult<Vec<Handle<InterfaceDecl>>> {
        NameResolve::constraints(self, generic)
    }
}

#[cfg(test)]
mod tests;
