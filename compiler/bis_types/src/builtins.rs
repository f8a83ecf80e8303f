//! The builtin environment every program is resolved against.
//!
//! Two scopes sit above the global scope: the builtin type scope (`Int`,
//! `Unit`, `Bool`, `String`, `Array[T]` and the universal generic `T`) and,
//! below it, the builtin value scope holding the runtime primitives. User
//! declarations may shadow builtins because they live in a child scope.

use bis_diagnostic::CompileError;
use bis_graph::{Graph, Handle};
use bis_ir::ast::Ident;
use bis_ir::Span;

use crate::context::Context;
use crate::graph::{Builtins, ProgramGraph};
use crate::nodes::{
    BuiltinTypeDecl, BuiltinVarDecl, DeclRef, GenericDecl, Scope, TypeNode, TypeNodeKind,
};
use crate::scope::bind;
use crate::CompileResult;

/// Names of the runtime primitives the lowered program links against.
pub const PRELUDE: &[&str] = &[
    "print",
    "at",
    "appendArray",
    "appendString",
    "length",
    "show",
    "less",
    "add",
];

struct Seeder<'g, 'c> {
    graph: &'g mut ProgramGraph,
    cx: &'c Context<'c>,
    type_scope: Handle<Scope>,
}

impl Seeder<'_, '_> {
    fn ident(&self, text: &str) -> Ident {
        Ident::new(self.cx.intern(text), Span::DUMMY)
    }

    fn bind(&mut self, scope: Handle<Scope>, name: Ident, decl: DeclRef) -> CompileResult<()> {
        if bind(self.graph, scope, name.name, decl)?.is_err() {
            return Err(CompileError::impossible(
                format!("builtin '{}' seeded twice", self.cx.name(name.name)),
                Span::DUMMY,
            ));
        }
        Ok(())
    }

    fn builtin_type(&mut self, text: &str, arity: usize) -> CompileResult<Handle<BuiltinTypeDecl>> {
        let name = self.ident(text);
        let decl = self.graph.insert(BuiltinTypeDecl { name, arity });
        self.bind(self.type_scope, name, DeclRef::BuiltinType(decl))?;
        Ok(decl)
    }

    fn named(&mut self, text: &str, args: Vec<Handle<TypeNode>>) -> Handle<TypeNode> {
        let name = self.ident(text);
        self.graph.insert(TypeNode {
            span: Span::DUMMY,
            kind: TypeNodeKind::Named {
                name,
                args,
                scope: self.type_scope,
            },
        })
    }

    fn array_of_t(&mut self) -> Handle<TypeNode> {
        let t = self.named("T", Vec::new());
        self.named("Array", vec![t])
    }

    fn function(
        &mut self,
        generics: Vec<Handle<GenericDecl>>,
        effects: &[&str],
        params: Vec<Handle<TypeNode>>,
        returns: Option<Handle<TypeNode>>,
    ) -> Handle<TypeNode> {
        let effects = effects.iter().map(|e| self.ident(e)).collect();
        self.graph.insert(TypeNode {
            span: Span::DUMMY,
            kind: TypeNodeKind::Function {
                generics,
                effects,
                params,
                returns,
            },
        })
    }
}

/// Create the builtin scopes and declarations.
pub fn seed(graph: &mut ProgramGraph, cx: &Context<'_>) -> CompileResult<Builtins> {
    let type_scope = graph.insert(Scope::default());
    let value_scope = graph.insert(Scope::child(type_scope));
    let mut s = Seeder {
        graph,
        cx,
        type_scope,
    };

    let int = s.builtin_type("Int", 0)?;
    let unit = s.builtin_type("Unit", 0)?;
    let bool = s.builtin_type("Bool", 0)?;
    let string = s.builtin_type("String", 0)?;
    let array = s.builtin_type("Array", 1)?;

    let t_name = s.ident("T");
    let universal = s.graph.insert(GenericDecl {
        name: t_name,
        constraints: Vec::new(),
        scope: type_scope,
    });
    s.bind(type_scope, t_name, DeclRef::Generic(universal))?;

    let mut signatures: Vec<(&str, Handle<TypeNode>)> = Vec::with_capacity(PRELUDE.len());
    {
        let string_ty = s.named("String", Vec::new());
        let print = s.function(Vec::new(), &["IO"], vec![string_ty], None);
        signatures.push(("print", print));

        let arr = s.array_of_t();
        let index = s.named("Int", Vec::new());
        let elem = s.named("T", Vec::new());
        let at = s.function(vec![universal], &[], vec![arr, index], Some(elem));
        signatures.push(("at", at));

        let left = s.array_of_t();
        let right = s.array_of_t();
        let joined = s.array_of_t();
        let append_array = s.function(vec![universal], &[], vec![left, right], Some(joined));
        signatures.push(("appendArray", append_array));

        let left = s.named("String", Vec::new());
        let right = s.named("String", Vec::new());
        let joined = s.named("String", Vec::new());
        let append_string = s.function(Vec::new(), &[], vec![left, right], Some(joined));
        signatures.push(("appendString", append_string));

        let arr = s.array_of_t();
        let len = s.named("Int", Vec::new());
        let length = s.function(vec![universal], &[], vec![arr], Some(len));
        signatures.push(("length", length));

        let value = s.named("Int", Vec::new());
        let text = s.named("String", Vec::new());
        let show = s.function(Vec::new(), &[], vec![value], Some(text));
        signatures.push(("show", show));

        let left = s.named("Int", Vec::new());
        let right = s.named("Int", Vec::new());
        let result = s.named("Bool", Vec::new());
        let less = s.function(Vec::new(), &[], vec![left, right], Some(result));
        signatures.push(("less", less));

        let left = s.named("Int", Vec::new());
        let right = s.named("Int", Vec::new());
        let sum = s.named("Int", Vec::new());
        let add = s.function(Vec::new(), &[], vec![left, right], Some(sum));
        signatures.push(("add", add));
    }

    let mut values = Vec::with_capacity(signatures.len());
    for (text, ty) in signatures {
        let name = s.ident(text);
        let decl = s.graph.insert(BuiltinVarDecl { name, ty });
        s.bind(value_scope, name, DeclRef::BuiltinVar(decl))?;
        values.push(decl);
    }

    tracing::trace!(values = values.len(), "seeded builtins");
    Ok(Builtins {
        type_scope,
        value_scope,
        int,
        unit,
        bool,
        string,
        array,
        universal,
        values,
    })
}

#[cfg(test)]
mod tests;
