//! Type inference and statement checking.
//!
//! Every expression gets a type, computed bottom-up from its operands and,
//! for calls and literals, matched top-down against the type its context
//! expects. Generic parameters are only ever inferred at a single call or
//! literal site: there are no inference variables that outlive one
//! expression.

mod expr;
mod stmt;

use bis_diagnostic::{CompileError, ErrorCode};
use bis_graph::{Graph, Handle, Memo};

use crate::algebra::{identical, substitute, Mismatch, Unifier};
use crate::context::Context;
use crate::graph::Program;
use crate::kind::KindCheck;
use crate::nodes::{
    Expectation, Expr, ExprKind, FunctionDecl, GenericDecl, Reference, ReferenceKind, Stmt,
    VariantDecl,
};
use crate::pool::{FnSig, Ty, TypeData, TypeDecl};
use crate::resolve::{NameResolve, ValueRef};
use crate::scope::returns_from;
use crate::{user_error, CompileResult};

/// What a call or operator site resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Application {
    /// The callee's function signature, before substitution.
    pub callee: FnSig,
    /// The inferred type for each of `callee.generics`, in order.
    pub types: Vec<Ty>,
}

impl Application {
    pub fn generics(&self) -> impl Iterator<Item = (Handle<GenericDecl>, Ty)> + '_ {
        self.callee.generics.iter().copied().zip(self.types.iter().copied())
    }
}

pub struct TypeInfer<'a> {
    names: &'a NameResolve<'a>,
    functions: Memo<FunctionDecl, Ty>,
    exprs: Memo<Expr, Ty>,
    applications: Memo<Expr, Application>,
    references: Memo<Reference, Ty>,
    statements: Memo<Stmt, ()>,
    arms: Memo<Stmt, Vec<Handle<VariantDecl>>>,
}

impl<'a> TypeInfer<'a> {
    pub fn new(names: &'a NameResolve<'a>) -> Self {
        TypeInfer {
            names,
            functions: Memo::new("function type"),
            exprs: Memo::new("type"),
            applications: Memo::new("application"),
            references: Memo::new("reference type"),
            statements: Memo::new("statement check"),
            arms: Memo::new("match arms"),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(
        exprs = names.kinds().program().graph.count::<Expr>(),
        stmts = names.kinds().program().graph.count::<Stmt>(),
    ))]
    pub fn run(names: &'a NameResolve<'a>) -> CompileResult<Self> {
        let pass = TypeInfer::new(names);
        let graph = &pass.program().graph;
        graph.each::<FunctionDecl, _>(|f, _| pass.function_type(f).map(drop))?;
        graph.each::<Expr, _>(|e, _| pass.ty(e).map(drop))?;
        graph.each::<Reference, _>(|r, _| pass.reference_type(r).map(drop))?;
        graph.each::<Stmt, _>(|s, _| pass.check(s))?;
        tracing::debug!(
            typed = pass.exprs.computed(),
            applications = pass.applications.computed(),
            "type inference complete"
        );
        Ok(pass)
    }

    pub fn names(&self) -> &'a NameResolve<'a> {
        self.names
    }

    pub fn kinds(&self) -> &'a KindCheck<'a> {
        self.names.kinds()
    }

    fn program(&self) -> &'a Program {
        self.kinds().program()
    }

    fn cx(&self) -> &'a Context<'a> {
        self.kinds().cx()
    }

    fn render(&self, ty: Ty) -> CompileResult<String> {
        self.kinds().render(ty)
    }

    /// Type identity, with generic constraints taken from name resolution.
    fn identical(&self, a: Ty, b: Ty) -> CompileResult<bool> {
        identical(&self.cx().types, self.names, a, b)
    }

    fn unifier(&self, generics: &[Handle<GenericDecl>]) -> Unifier<'a> {
        Unifier::new(&self.cx().types, self.names, generics)
    }

    fn describe(&self, mismatch: &Mismatch) -> CompileResult<String> {
        mismatch.describe(|ty| self.render(ty))
    }

    /// The signature of a function declaration as a value.
    pub fn function_type(&self, function: Handle<FunctionDecl>) -> CompileResult<Ty> {
        self.functions.get(function, || {
            let kinds = self.kinds();
            let graph = &self.program().graph;
            let decl = graph.get(function)?;
            let params = decl
                .params
                .iter()
                .map(|p| kinds.ty(graph.get(*p)?.ty))
                .collect::<CompileResult<Vec<_>>>()?;
            let returns = decl.returns.map(|r| kinds.ty(r)).transpose()?;
            Ok(self.cx().types.function(FnSig {
                generics: decl.generics.clone(),
                effects: decl.effects.iter().map(|e| e.name).collect(),
                params,
                returns,
            }))
        })
    }

    /// The declared return type of a function.
    pub fn return_type(&self, function: Handle<FunctionDecl>) -> CompileResult<Option<Ty>> {
        let returns = self.program().graph.get(function)?.returns;
        returns.map(|r| self.kinds().ty(r)).transpose()
    }

    /// The type of whatever a variable expression names.
    pub fn value_type(&self, value: ValueRef) -> CompileResult<Ty> {
        let graph = &self.program().graph;
        match value {
            ValueRef::Var(v) => self.kinds().ty(graph.get(v)?.ty),
            ValueRef::Function(f) => self.function_type(f),
            ValueRef::Builtin(b) => self.kinds().ty(graph.get(b)?.ty),
            ValueRef::Method(m) => self.kinds().ty(graph.get(m)?.value_ty),
        }
    }

    /// The type an expression's context expects, if any.
    fn expected(&self, expr: &Expr) -> CompileResult<Option<Ty>> {
        match expr.expects {
            None => Ok(None),
            Some(Expectation::Declared(var)) => {
                let ty = self.program().graph.get(var)?.ty;
                Ok(Some(self.kinds().ty(ty)?))
            }
            Some(Expectation::Assigned(target)) => Ok(Some(self.reference_type(target)?)),
            Some(Expectation::Returned(function)) => self.return_type(function),
        }
    }

    pub fn ty(&self, expr: Handle<Expr>) -> CompileResult<Ty> {
        self.exprs.get(expr, || self.compute(expr))
    }

    /// Callee signature and inferred generics of a call or operator use.
    pub fn application(&self, expr: Handle<Expr>) -> CompileResult<Application> {
        self.applications.get(expr, || self.apply(expr))
    }

    /// The type of an assignment target.
    pub fn reference_type(&self, reference: Handle<Reference>) -> CompileResult<Ty> {
        self.references.get(reference, || {
            let node = self.program().graph.get(reference)?;
            match node.kind {
                ReferenceKind::Var(_) => {
                    let var = self.names.root(reference)?;
                    self.kinds().ty(self.program().graph.get(var)?.ty)
                }
                ReferenceKind::Dot { object, field } => {
                    let object = self.reference_type(object)?;
                    self.field_type(object, field)
                }
            }
        })
    }

    /// The type of `field` on a value of type `object`, with the struct's
    /// type arguments substituted in.
    fn field_type(&self, object: Ty, field: bis_ir::ast::Ident) -> CompileResult<Ty> {
        let graph = &self.program().graph;
        let field_name = self.cx().name(field.name);
        let TypeData::Named {
            decl: TypeDecl::Struct(s),
            args,
        } = self.cx().types.get(object)?
        else {
            return Err(user_error(
                ErrorCode::E3013,
                field.span,
                format!(
                    "cannot access field '{field_name}' on a value of type '{}'",
                    self.render(object)?
                ),
            ));
        };
        let decl = graph.get(s)?;
        let Some((_, found)) = decl.field(field.name) else {
            return Err(user_error(
                ErrorCode::E3013,
                field.span,
                format!(
                    "struct '{}' has no field '{field_name}'",
                    self.cx().name(decl.name.name)
                ),
            ));
        };
        let declared = self.kinds().ty(found.ty)?;
        let bindings = crate::algebra::bindings(&decl.generics, &args);
        substitute(&self.cx().types, declared, &bindings)
    }

    /// The function a statement in `stmt`'s scope returns from.
    fn enclosing_function(&self, stmt: &Stmt) -> CompileResult<Handle<FunctionDecl>> {
        returns_from(&self.program().graph, stmt.scope)?
            .ok_or_else(|| CompileError::impossible("statement outside any function", stmt.span))
    }

    /// The name a callee is called by, for diagnostics.
    fn callee_name(&self, callee: Handle<Expr>) -> CompileResult<String> {
        Ok(match self.program().graph.get(callee)?.kind {
            ExprKind::Variable(name) => format!("'{}'", self.cx().name(name.name)),
            _ => "the callee".to_owned(),
        })
    }
}
