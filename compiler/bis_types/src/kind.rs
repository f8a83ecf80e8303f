//! Kind checking: type syntax to semantic types.
//!
//! Every named type must resolve, through its scope chain, to a struct, an
//! enum, a generic parameter or a builtin type, applied to exactly as many
//! arguments as that declaration takes.

use bis_diagnostic::ErrorCode;
use bis_graph::{Graph, Handle, Memo};

use crate::context::Context;
use crate::graph::Program;
use crate::nodes::{BuiltinTypeDecl, DeclRef, TypeNode, TypeNodeKind};
use crate::pool::{FnSig, Ty, TypeData, TypeDecl};
use crate::scope::lookup;
use crate::{user_error, CompileResult};

pub struct KindCheck<'a> {
    program: &'a Program,
    cx: &'a Context<'a>,
    types: Memo<TypeNode, Ty>,
}

impl<'a> KindCheck<'a> {
    pub fn new(program: &'a Program, cx: &'a Context<'a>) -> Self {
        KindCheck {
            program,
            cx,
            types: Memo::new("type"),
        }
    }

    /// Resolve every type node of the program.
    #[tracing::instrument(level = "debug", skip_all, fields(type_nodes = program.graph.count::<TypeNode>()))]
    pub fn run(program: &'a Program, cx: &'a Context<'a>) -> CompileResult<Self> {
        let pass = KindCheck::new(program, cx);
        program.graph.each::<TypeNode, _>(|node, _| pass.ty(node).map(drop))?;
        tracing::debug!(types = cx.types.len(), "kind check complete");
        Ok(pass)
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn cx(&self) -> &'a Context<'a> {
        self.cx
    }

    /// The semantic type a type node denotes.
    pub fn ty(&self, node: Handle<TypeNode>) -> CompileResult<Ty> {
        self.types.get(node, || self.compute(node))
    }

    fn compute(&self, node: Handle<TypeNode>) -> CompileResult<Ty> {
        let graph = &self.program.graph;
        let pool = &self.cx.types;
        let type_node = graph.get(node)?;
        match &type_node.kind {
            TypeNodeKind::Named { name, args, scope } => {
                let text = self.cx.name(name.name);
                let Some(decl) = lookup(graph, *scope, name.name)? else {
                    return Err(user_error(
                        ErrorCode::E1001,
                        name.span,
                        format!("type '{text}' is not in scope"),
                    ));
                };
                let (decl, arity) = match decl {
                    DeclRef::BuiltinType(h) => (TypeDecl::Builtin(h), graph.get(h)?.arity),
                    DeclRef::Struct(h) => (TypeDecl::Struct(h), graph.get(h)?.generics.len()),
                    DeclRef::Enum(h) => (TypeDecl::Enum(h), graph.get(h)?.generics.len()),
                    DeclRef::Generic(h) => (TypeDecl::Generic(h), 0),
                    other => {
                        return Err(user_error(
                            ErrorCode::E2001,
                            name.span,
                            format!("'{text}' is a {}, not a type", other.describe()),
                        ))
                    }
                };
                if args.len() != arity {
                    let message = if matches!(decl, TypeDecl::Generic(_)) {
                        format!("generic parameter '{text}' cannot take type arguments")
                    } else {
                        format!(
                            "type '{text}' expects {arity} type argument{}, but {} {} given",
                            if arity == 1 { "" } else { "s" },
                            args.len(),
                            if args.len() == 1 { "was" } else { "were" },
                        )
                    };
                    return Err(user_error(ErrorCode::E2002, name.span, message));
                }
                let args = args
                    .iter()
                    .map(|arg| self.ty(*arg))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(pool.named(decl, args))
            }
            TypeNodeKind::Function {
                generics,
                effects,
                params,
                returns,
            } => {
                let params = params
                    .iter()
                    .map(|p| self.ty(*p))
                    .collect::<CompileResult<Vec<_>>>()?;
                let returns = returns.map(|r| self.ty(r)).transpose()?;
                Ok(pool.function(FnSig {
                    generics: generics.clone(),
                    effects: effects.iter().map(|e| e.name).collect(),
                    params,
                    returns,
                }))
            }
            TypeNodeKind::SelfType => Ok(pool.self_type()),
            TypeNodeKind::Borrow { mutable, referent } => {
                Ok(pool.borrow(*mutable, self.ty(*referent)?))
            }
            TypeNodeKind::Generic(generic) => Ok(pool.generic(*generic)),
        }
    }

    /// The declaration a named type node refers to, if it is one.
    pub fn type_decl(&self, node: Handle<TypeNode>) -> CompileResult<Option<TypeDecl>> {
        let ty = self.ty(node)?;
        Ok(match self.cx.types.get(ty)? {
            TypeData::Named { decl, .. } => Some(decl),
            _ => None,
        })
    }

    // ── Builtin types ───────────────────────────────────────────────

    pub fn int(&self) -> Ty {
        self.builtin(self.program.builtins.int)
    }

    pub fn bool(&self) -> Ty {
        self.builtin(self.program.builtins.bool)
    }

    pub fn string(&self) -> Ty {
        self.builtin(self.program.builtins.string)
    }

    pub fn unit(&self) -> Ty {
        self.builtin(self.program.builtins.unit)
    }

    pub fn array(&self, element: Ty) -> Ty {
        self.cx
            .types
            .named(TypeDecl::Builtin(self.program.builtins.array), [element])
    }

    fn builtin(&self, decl: Handle<BuiltinTypeDecl>) -> Ty {
        self.cx.types.named(TypeDecl::Builtin(decl), [])
    }

    pub fn render(&self, ty: Ty) -> CompileResult<String> {
        self.cx.render(&self.program.graph, ty)
    }
}

#[cfg(test)]
mod tests;
