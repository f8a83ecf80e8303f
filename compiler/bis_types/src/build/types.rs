//! Type syntax to type nodes.

use bis_diagnostic::ErrorCode;
use bis_graph::stack::ensure_sufficient_stack;
use bis_graph::{Graph, Handle};
use bis_ir::ast;

use super::Builder;
use crate::nodes::{GenericDecl, Scope, TypeNode, TypeNodeKind};
use crate::scope::allows_self;
use crate::{user_error, CompileResult};

impl Builder<'_> {
    /// Build a type node. With `self_as` set, `self` becomes a reference to
    /// that generic instead of the self type.
    pub(super) fn type_node(
        &mut self,
        ty: &ast::Type,
        scope: Handle<Scope>,
        self_as: Option<Handle<GenericDecl>>,
    ) -> CompileResult<Handle<TypeNode>> {
        ensure_sufficient_stack(|| match ty {
            ast::Type::Named(named) => self.named_type_node(named, scope, self_as),
            ast::Type::Function(function) => {
                self.function_type_node(function, scope, self_as, Vec::new())
            }
            ast::Type::SelfType(span) => {
                let kind = match self_as {
                    Some(generic) => TypeNodeKind::Generic(generic),
                    None if allows_self(&self.graph, scope)? => TypeNodeKind::SelfType,
                    None => {
                        return Err(user_error(
                            ErrorCode::E1004,
                            *span,
                            "'self' can only be used inside an interface",
                        ))
                    }
                };
                Ok(self.insert(TypeNode { span: *span, kind }))
            }
            ast::Type::Borrow(borrow) => {
                let referent = self.type_node(&borrow.referent, scope, self_as)?;
                Ok(self.insert(TypeNode {
                    span: borrow.span,
                    kind: TypeNodeKind::Borrow {
                        mutable: borrow.mutable,
                        referent,
                    },
                }))
            }
            ast::Type::Never(span) => Err(self.unimplemented(*span, "'never' types")),
        })
    }

    pub(super) fn named_type_node(
        &mut self,
        named: &ast::NamedType,
        scope: Handle<Scope>,
        self_as: Option<Handle<GenericDecl>>,
    ) -> CompileResult<Handle<TypeNode>> {
        let mut args = Vec::with_capacity(named.args.len());
        for arg in &named.args {
            args.push(self.type_node(arg, scope, self_as)?);
        }
        Ok(self.insert(TypeNode {
            span: named.name.span,
            kind: TypeNodeKind::Named {
                name: named.name,
                args,
                scope,
            },
        }))
    }

    /// Build a function type. Its own generics get a fresh scope so the
    /// parameter and return types can refer to them; `leading` generics are
    /// prepended to the generic list.
    pub(super) fn function_type_node(
        &mut self,
        function: &ast::FunctionType,
        scope: Handle<Scope>,
        self_as: Option<Handle<GenericDecl>>,
        leading: Vec<Handle<GenericDecl>>,
    ) -> CompileResult<Handle<TypeNode>> {
        let inner = if function.generics.is_empty() {
            scope
        } else {
            self.insert(Scope::child(scope))
        };
        let mut generics = leading;
        generics.extend(self.generics(&function.generics, inner)?);
        self.unique(&function.effects, "effect")?;

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            params.push(self.type_node(param, inner, self_as)?);
        }
        let returns = match &function.returns {
            Some(ty) => Some(self.type_node(ty, inner, self_as)?),
            None => None,
        };
        Ok(self.insert(TypeNode {
            span: function.span,
            kind: TypeNodeKind::Function {
                generics,
                effects: function.effects.clone(),
                params,
                returns,
            },
        }))
    }
}
