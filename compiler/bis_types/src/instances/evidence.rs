//! Evidence trees: how a call site obtains each dictionary it passes.

use bis_diagnostic::{CompileError, ErrorCode};
use bis_graph::{Graph, Handle};
use bis_ir::Span;

use super::InstanceResolve;
use crate::nodes::{Expr, GenericDecl, InstanceDecl, InterfaceDecl};
use crate::pool::{Ty, TypeData, TypeDecl};
use crate::{user_error, CompileResult};

/// A proof that a type implements an interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Evidence {
    /// The dictionary the enclosing function (or instance) received for
    /// `generic: interface`.
    Parameter {
        generic: Handle<GenericDecl>,
        interface: Handle<InterfaceDecl>,
    },
    /// The dictionary built by `instance`'s constructor from the evidence
    /// of its own generics' constraints, in declaration order.
    Instance {
        instance: Handle<InstanceDecl>,
        interface: Handle<InterfaceDecl>,
        requirements: Vec<Evidence>,
    },
}

impl InstanceResolve<'_> {
    /// The evidence a call or operator use passes, one entry per
    /// `(generic, constraint)` pair of the callee in declaration order.
    pub fn evidence(&self, expr: Handle<Expr>) -> CompileResult<Vec<Evidence>> {
        self.evidence.get(expr, || {
            let span = self.program().graph.get(expr)?.span;
            let application = self.infer.application(expr)?;
            let mut evidence = Vec::new();
            for (generic, ty) in application.generics() {
                for interface in self.names().constraints(generic)? {
                    evidence.push(self.find_instance(ty, interface, span)?);
                }
            }
            Ok(evidence)
        })
    }

    /// Find evidence that `ty` implements `interface`. `span` locates the
    /// use that needs it.
    pub fn find_instance(
        &self,
        ty: Ty,
        interface: Handle<InterfaceDecl>,
        span: Span,
    ) -> CompileResult<Evidence> {
        let interface_text = self.interface_name(interface)?;
        let missing = |message: String| user_error(ErrorCode::E4001, span, message);
        match self.cx().types.get(ty)? {
            TypeData::SelfType => Err(CompileError::impossible(
                "instance search for 'self' outside an interface",
                span,
            )),
            TypeData::Function(_) | TypeData::Borrow { .. } => Err(missing(format!(
                "type '{}' cannot implement interface '{interface_text}'",
                self.render(ty)?
            ))),
            TypeData::Named {
                decl: TypeDecl::Generic(generic),
                ..
            } => {
                let supplied = self
                    .suppliers
                    .get(&interface)
                    .is_some_and(|generics| generics.contains(&generic));
                if supplied {
                    Ok(Evidence::Parameter { generic, interface })
                } else {
                    Err(missing(format!(
                        "generic parameter '{}' is not constrained by '{interface_text}'",
                        self.render(ty)?
                    )))
                }
            }
            TypeData::Named { decl, args } => {
                let Some(instance) = self.cx().instances.lookup(interface, decl) else {
                    return Err(missing(format!(
                        "no instance of '{interface_text}' for type '{}'",
                        self.render(ty)?
                    )));
                };
                let generics = self.program().graph.get(instance)?.generics.clone();
                let mut requirements = Vec::new();
                for (generic, arg) in generics.iter().zip(args.iter()) {
                    for constraint in self.names().constraints(*generic)? {
                        requirements.push(self.find_instance(*arg, constraint, span)?);
                    }
                }
                Ok(Evidence::Instance {
                    instance,
                    interface,
                    requirements,
                })
            }
        }
    }
}
