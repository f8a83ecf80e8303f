//! Declaration tree to program graph.
//!
//! The builder walks the parser's tree once, creating a node for every
//! declaration, type, statement and expression and threading the enclosing
//! scope through. Nothing is resolved here: names are only bound, and every
//! lookup happens lazily in the passes. This makes global declarations
//! order-independent.

mod body;
mod types;

use bis_diagnostic::{CompileError, Diagnostic, ErrorCode};
use bis_graph::{Arena, Graph, Handle, Holds, Variety};
use bis_ir::ast::{self, Ident};
use bis_ir::Span;
use rustc_hash::FxHashMap;

use crate::builtins;
use crate::context::Context;
use crate::graph::{Builtins, Item, Program, ProgramGraph};
use crate::nodes::{
    DeclRef, EnumDecl, FieldDecl, FunctionDecl, GenericDecl, InstanceDecl, InterfaceDecl,
    MethodDecl, Scale, Scope, StructDecl, VarDecl, VariantDecl,
};
use crate::scope::bind;
use crate::{user_error, CompileResult};

/// Build the program graph for `declarations`.
#[tracing::instrument(level = "debug", skip_all, fields(declarations = declarations.len()))]
pub fn build(declarations: &[ast::Declaration], cx: &Context<'_>) -> CompileResult<Program> {
    let mut graph = ProgramGraph::default();
    let builtins = builtins::seed(&mut graph, cx)?;
    let global = graph.insert(Scope::child(builtins.value_scope));

    let mut builder = Builder {
        cx,
        graph,
        builtins,
        global,
        items: Vec::with_capacity(declarations.len()),
    };
    for declaration in declarations {
        builder.declaration(declaration)?;
    }

    tracing::debug!(
        items = builder.items.len(),
        exprs = builder.graph.count::<crate::nodes::Expr>(),
        stmts = builder.graph.count::<crate::nodes::Stmt>(),
        "program graph built"
    );
    Ok(Program {
        graph: builder.graph,
        builtins: builder.builtins,
        global_scope: builder.global,
        items: builder.items,
    })
}

pub(crate) struct Builder<'c> {
    cx: &'c Context<'c>,
    graph: ProgramGraph,
    builtins: Builtins,
    global: Handle<Scope>,
    items: Vec<Item>,
}

impl<N: Variety> Holds<N> for Builder<'_>
where
    ProgramGraph: Holds<N>,
{
    fn arena(&self) -> &Arena<N> {
        <ProgramGraph as Holds<N>>::arena(&self.graph)
    }

    fn arena_mut(&mut self) -> &mut Arena<N> {
        <ProgramGraph as Holds<N>>::arena_mut(&mut self.graph)
    }
}

impl Graph for Builder<'_> {}

impl Builder<'_> {
    /// Bind a name, reporting a redeclaration with both locations.
    fn declare(&mut self, scope: Handle<Scope>, name: Ident, decl: DeclRef) -> CompileResult<()> {
        match bind(&mut self.graph, scope, name.name, decl)? {
            Ok(()) => Ok(()),
            Err(existing) => {
                let first = self.graph.decl_ident(existing)?;
                Err(Diagnostic::error(ErrorCode::E1002)
                    .with_message(format!(
                        "'{}' is already declared in this scope",
                        self.cx.name(name.name)
                    ))
                    .with_label(name.span, "redeclared here")
                    .with_secondary_label(
                        first.span,
                        format!("first declared here as a {}", existing.describe()),
                    )
                    .into())
            }
        }
    }

    /// Reject repeated names within one list.
    fn unique<'i>(&self, names: impl IntoIterator<Item = &'i Ident>, what: &str) -> CompileResult<()> {
        let mut seen = FxHashMap::default();
        for ident in names {
            if let Some(first) = seen.insert(ident.name, ident.span) {
                return Err(Diagnostic::error(ErrorCode::E1003)
                    .with_message(format!(
                        "duplicate {what} '{}'",
                        self.cx.name(ident.name)
                    ))
                    .with_label(ident.span, "duplicate")
                    .with_secondary_label(first, "first listed here")
                    .into());
            }
        }
        Ok(())
    }

    fn unimplemented(&self, span: Span, what: &str) -> CompileError {
        user_error(ErrorCode::E6001, span, format!("{what} are not implemented"))
    }

    fn declaration(&mut self, declaration: &ast::Declaration) -> CompileResult<()> {
        match declaration {
            ast::Declaration::Struct(d) => self.struct_decl(d),
            ast::Declaration::Enum(d) => self.enum_decl(d),
            ast::Declaration::Function(d) => {
                let function = self.function(d, self.global, None)?;
                self.declare(self.global, d.name, DeclRef::Function(function))?;
                self.items.push(Item::Function(function));
                Ok(())
            }
            ast::Declaration::Interface(d) => self.interface(d),
            ast::Declaration::Instance(d) => self.instance(d),
            ast::Declaration::Effect(d) => Err(self.unimplemented(d.name.span, "effect declarations")),
            ast::Declaration::Service(d) => {
                Err(self.unimplemented(d.name.span, "service declarations"))
            }
        }
    }

    /// Create generic declarations bound in `scope`.
    fn generics(
        &mut self,
        generics: &[ast::Generic],
        scope: Handle<Scope>,
    ) -> CompileResult<Vec<Handle<GenericDecl>>> {
        self.unique(generics.iter().map(|g| &g.name), "generic parameter")?;
        let mut handles = Vec::with_capacity(generics.len());
        for generic in generics {
            self.unique(&generic.constraints, "constraint")?;
            let handle = self.insert(GenericDecl {
                name: generic.name,
                constraints: generic.constraints.clone(),
                scope,
            });
            self.declare(scope, generic.name, DeclRef::Generic(handle))?;
            handles.push(handle);
        }
        Ok(handles)
    }

    fn struct_decl(&mut self, d: &ast::StructDecl) -> CompileResult<()> {
        let scope = self.insert(Scope::child(self.global));
        let generics = self.generics(&d.generics, scope)?;
        self.unique(d.fields.iter().map(|f| &f.name), "field")?;
        let mut fields = Vec::with_capacity(d.fields.len());
        for field in &d.fields {
            fields.push(FieldDecl {
                name: field.name,
                ty: self.type_node(&field.ty, scope, None)?,
            });
        }
        let handle = self.insert(StructDecl {
            name: d.name,
            generics,
            fields,
        });
        self.declare(self.global, d.name, DeclRef::Struct(handle))?;
        self.items.push(Item::Struct(handle));
        Ok(())
    }

    fn enum_decl(&mut self, d: &ast::EnumDecl) -> CompileResult<()> {
        let scope = self.insert(Scope::child(self.global));
        let generics = self.generics(&d.generics, scope)?;
        self.unique(d.variants.iter().map(|v| &v.name), "variant")?;
        let handle = self.insert_with::<EnumDecl, CompileError>(|b, me| {
            let mut variants = Vec::with_capacity(d.variants.len());
            for (tag, variant) in (0u32..).zip(&d.variants) {
                let payload = match &variant.payload {
                    Some(ty) => Some(b.type_node(ty, scope, None)?),
                    None => None,
                };
                variants.push(b.insert(VariantDecl {
                    name: variant.name,
                    owner: me,
                    tag,
                    payload,
                }));
            }
            Ok(EnumDecl {
                name: d.name,
                generics,
                variants,
            })
        })?;

        self.declare(self.global, d.name, DeclRef::Enum(handle))?;
        let variants = self.graph.get(handle)?.variants.clone();
        for (variant, ast) in variants.into_iter().zip(&d.variants) {
            self.declare(self.global, ast.name, DeclRef::Variant(variant))?;
        }
        self.items.push(Item::Enum(handle));
        Ok(())
    }

    /// Build a function. `instance` is set for instance methods, which
    /// live in the instance's scope and are not bound globally.
    fn function(
        &mut self,
        d: &ast::FunctionDecl,
        parent: Handle<Scope>,
        instance: Option<Handle<InstanceDecl>>,
    ) -> CompileResult<Handle<FunctionDecl>> {
        let scale = match instance {
            Some(instance) => Scale::Instance {
                instance,
                unique: self.cx.fresh_unique(),
            },
            None => Scale::Global,
        };
        self.unique(&d.effects, "effect")?;
        self.unique(d.params.iter().map(|p| &p.name), "parameter")?;

        self.insert_with::<FunctionDecl, CompileError>(|b, me| {
            let signature_scope = b.insert(Scope::child(parent));
            let generics = b.generics(&d.generics, signature_scope)?;
            let body_scope = b.insert(Scope {
                returns_from: Some(me),
                ..Scope::child(signature_scope)
            });

            let mut params = Vec::with_capacity(d.params.len());
            for param in &d.params {
                let ty = b.type_node(&param.ty, signature_scope, None)?;
                let var = b.insert(VarDecl {
                    name: param.name,
                    ty,
                });
                b.declare(body_scope, param.name, DeclRef::Var(var))?;
                params.push(var);
            }
            let returns = match &d.returns {
                Some(ty) => Some(b.type_node(ty, signature_scope, None)?),
                None => None,
            };
            let body = b.block(&d.body, body_scope)?;

            Ok(FunctionDecl {
                name: d.name,
                scale,
                generics,
                effects: d.effects.clone(),
                params,
                returns,
                body,
            })
        })
    }

    fn interface(&mut self, d: &ast::InterfaceDecl) -> CompileResult<()> {
        if let Some(parent) = d.parents.first() {
            return Err(self.unimplemented(parent.span, "interfaces with parent interfaces"));
        }
        self.unique(d.methods.iter().map(|m| &m.name), "method")?;
        let scope = self.insert(Scope {
            allows_self: true,
            ..Scope::child(self.global)
        });
        let self_name = self.cx.intern("Self");

        let handle = self.insert_with::<InterfaceDecl, CompileError>(|b, me| {
            let mut methods = Vec::with_capacity(d.methods.len());
            for method in &d.methods {
                if let Some(generic) = method.ty.generics.first() {
                    return Err(b.unimplemented(generic.name.span, "generic interface methods"));
                }
                if let Some(effect) = method.ty.effects.first() {
                    return Err(b.unimplemented(effect.span, "effectful interface methods"));
                }
                let ty = b.function_type_node(&method.ty, scope, None, Vec::new())?;
                let self_generic = b.insert(GenericDecl {
                    name: Ident::new(self_name, method.name.span),
                    constraints: vec![d.name],
                    scope,
                });
                let value_ty =
                    b.function_type_node(&method.ty, scope, Some(self_generic), vec![self_generic])?;
                methods.push(b.insert(MethodDecl {
                    name: method.name,
                    interface: me,
                    ty,
                    self_generic,
                    value_ty,
                }));
            }
            Ok(InterfaceDecl {
                name: d.name,
                methods,
            })
        })?;

        self.declare(self.global, d.name, DeclRef::Interface(handle))?;
        let methods = self.graph.get(handle)?.methods.clone();
        for (method, ast) in methods.into_iter().zip(&d.methods) {
            self.declare(self.global, ast.name, DeclRef::Method(method))?;
        }
        self.items.push(Item::Interface(handle));
        Ok(())
    }

    fn instance(&mut self, d: &ast::InstanceDecl) -> CompileResult<()> {
        let scope = self.insert(Scope::child(self.global));
        self.unique(d.methods.iter().map(|m| &m.name), "method")?;

        let handle = self.insert_with::<InstanceDecl, CompileError>(|b, me| {
            let generics = b.generics(&d.generics, scope)?;
            let ty = b.named_type_node(&d.ty, scope, None)?;
            let mut methods = Vec::with_capacity(d.methods.len());
            for method in &d.methods {
                if let Some(generic) = method.generics.first() {
                    return Err(b.unimplemented(generic.name.span, "generic instance methods"));
                }
                if let Some(effect) = method.effects.first() {
                    return Err(b.unimplemented(effect.span, "effectful instance methods"));
                }
                methods.push(b.function(method, scope, Some(me))?);
            }
            Ok(InstanceDecl {
                interface: d.interface,
                ty,
                generics,
                methods,
            })
        })?;

        self.items.push(Item::Instance(handle));
        Ok(())
    }
}
