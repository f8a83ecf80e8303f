//! Instance validation and evidence construction.
//!
//! An instance `instance I for D[G..]` is checked once: `I` must be an
//! interface, `D` a struct, enum or builtin type applied to exactly the
//! instance's generics, the methods must follow the interface's methods one
//! for one, and each signature must equal the interface's with `self`
//! replaced by `D[G..]`. Valid instances are registered in the context.
//!
//! Evidence is then computed for every call site, see [`Evidence`].

mod evidence;
mod registry;

use bis_diagnostic::{Diagnostic, ErrorCode};
use bis_graph::{Graph, Handle, Memo};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::algebra::{identical, self_substitute};
use crate::context::Context;
use crate::graph::Program;
use crate::infer::TypeInfer;
use crate::nodes::{DeclRef, Expr, GenericDecl, InstanceDecl, InterfaceDecl};
use crate::pool::{Ty, TypeData, TypeDecl};
use crate::resolve::NameResolve;
use crate::scope::lookup;
use crate::{user_error, CompileResult};

pub use evidence::Evidence;
pub use registry::InstanceRegistry;

/// What a validated instance implements, and for which type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InstanceInfo {
    pub interface: Handle<InterfaceDecl>,
    pub target: TypeDecl,
    /// `D[G..]`, the type `self` stands for in this instance.
    pub target_ty: Ty,
}

pub struct InstanceResolve<'a> {
    infer: &'a TypeInfer<'a>,
    /// For each interface, the generics constrained by it.
    suppliers: FxHashMap<Handle<InterfaceDecl>, FxHashSet<Handle<GenericDecl>>>,
    infos: Memo<InstanceDecl, InstanceInfo>,
    evidence: Memo<Expr, Vec<Evidence>>,
}

impl<'a> InstanceResolve<'a> {
    /// Index every generic by the interfaces it is constrained by.
    pub fn new(infer: &'a TypeInfer<'a>) -> CompileResult<Self> {
        let names = infer.names();
        let mut suppliers: FxHashMap<_, FxHashSet<_>> = FxHashMap::default();
        names
            .kinds()
            .program()
            .graph
            .each::<GenericDecl, _>(|generic, _| {
                for interface in names.constraints(generic)? {
                    suppliers.entry(interface).or_default().insert(generic);
                }
                Ok::<_, crate::CompileError>(())
            })?;
        Ok(InstanceResolve {
            infer,
            suppliers,
            infos: Memo::new("instance"),
            evidence: Memo::new("evidence"),
        })
    }

    /// Validate and register every instance, then compute the evidence of
    /// every call and operator use.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(infer: &'a TypeInfer<'a>) -> CompileResult<Self> {
        let pass = InstanceResolve::new(infer)?;
        let program = pass.program();
        for instance in program.instances() {
            pass.info(instance)?;
        }
        program.graph.each::<Expr, _>(|expr, node| {
            if node.kind.as_application().is_some() {
                pass.evidence(expr)?;
            }
            Ok::<_, crate::CompileError>(())
        })?;
        tracing::debug!(
            instances = pass.cx().instances.len(),
            sites = pass.evidence.computed(),
            "instance resolution complete"
        );
        Ok(pass)
    }

    pub fn infer(&self) -> &'a TypeInfer<'a> {
        self.infer
    }

    fn names(&self) -> &'a NameResolve<'a> {
        self.infer.names()
    }

    fn program(&self) -> &'a Program {
        self.infer.kinds().program()
    }

    fn cx(&self) -> &'a Context<'a> {
        self.infer.kinds().cx()
    }

    fn render(&self, ty: Ty) -> CompileResult<String> {
        self.infer.kinds().render(ty)
    }

    fn interface_name(&self, interface: Handle<InterfaceDecl>) -> CompileResult<&'static str> {
        Ok(self.cx().name(self.program().graph.get(interface)?.name.name))
    }

    /// Validate an instance and register it.
    pub fn info(&self, instance: Handle<InstanceDecl>) -> CompileResult<InstanceInfo> {
        self.infos.get(instance, || self.validate(instance))
    }

    fn validate(&self, handle: Handle<InstanceDecl>) -> CompileResult<InstanceInfo> {
        let program = self.program();
        let graph = &program.graph;
        let kinds = self.infer.kinds();
        let instance = graph.get(handle)?;

        let interface_text = self.cx().name(instance.interface.name);
        let interface = match lookup(graph, program.global_scope, instance.interface.name)? {
            Some(DeclRef::Interface(i)) => i,
            Some(other) => {
                return Err(user_error(
                    ErrorCode::E2003,
                    instance.interface.span,
                    format!(
                        "'{interface_text}' is a {}, not an interface, so it cannot have instances",
                        other.describe()
                    ),
                ))
            }
            None => {
                return Err(user_error(
                    ErrorCode::E1001,
                    instance.interface.span,
                    format!("interface '{interface_text}' is not in scope"),
                ))
            }
        };

        let target_ty = kinds.ty(instance.ty)?;
        let target_span = graph.get(instance.ty)?.span;
        let TypeData::Named { decl: target, args } = self.cx().types.get(target_ty)? else {
            return Err(user_error(
                ErrorCode::E2005,
                target_span,
                "an instance must be declared for a named type",
            ));
        };
        if let TypeDecl::Generic(_) = target {
            return Err(user_error(
                ErrorCode::E2005,
                target_span,
                format!(
                    "cannot declare an instance for generic parameter '{}'; use a struct, enum or builtin type",
                    self.render(target_ty)?
                ),
            ));
        }
        let exact = args.len() == instance.generics.len()
            && args
                .iter()
                .zip(&instance.generics)
                .all(|(arg, generic)| *arg == self.cx().types.generic(*generic));
        if !exact {
            return Err(user_error(
                ErrorCode::E2005,
                target_span,
                format!(
                    "the type arguments of '{}' must be the instance's own generic parameters, in order",
                    self.render(target_ty)?
                ),
            ));
        }

        let target_text = self.render(target_ty)?;
        let declared = &graph.get(interface)?.methods;
        if declared.len() != instance.methods.len() {
            return Err(user_error(
                ErrorCode::E4004,
                instance.interface.span,
                format!(
                    "instance of '{interface_text}' for '{target_text}' defines {} method{}, but the interface declares {}",
                    instance.methods.len(),
                    if instance.methods.len() == 1 { "" } else { "s" },
                    declared.len()
                ),
            ));
        }
        for (method, function) in declared.iter().zip(&instance.methods) {
            let method = graph.get(*method)?;
            let function_handle = *function;
            let function = graph.get(function_handle)?;
            if method.name.name != function.name.name {
                return Err(user_error(
                    ErrorCode::E4004,
                    function.name.span,
                    format!(
                        "instance of '{interface_text}' for '{target_text}' defines '{}' where the interface declares '{}'",
                        self.cx().name(function.name.name),
                        self.cx().name(method.name.name)
                    ),
                ));
            }
            let required = self_substitute(&self.cx().types, kinds.ty(method.ty)?, target_ty)?;
            let actual = self.infer.function_type(function_handle)?;
            if !identical(&self.cx().types, self.names(), required, actual)? {
                return Err(Diagnostic::error(ErrorCode::E4003)
                    .with_message(format!(
                        "method '{}' of the instance of '{interface_text}' for '{target_text}' has type '{}', but the interface requires '{}'",
                        self.cx().name(function.name.name),
                        self.render(actual)?,
                        self.render(required)?
                    ))
                    .with_label(function.name.span, ErrorCode::E4003.description())
                    .with_secondary_label(method.name.span, "declared here")
                    .into());
            }
        }

        if let Err(existing) = self.cx().instances.register(interface, target, handle) {
            let first = graph.get(existing)?.interface.span;
            return Err(Diagnostic::error(ErrorCode::E4002)
                .with_message(format!(
                    "'{target_text}' already has an instance of '{interface_text}'"
                ))
                .with_label(instance.interface.span, "second instance declared here")
                .with_secondary_label(first, "first instance declared here")
                .into());
        }
        tracing::trace!(interface = interface_text, target = %target_text, "registered instance");

        Ok(InstanceInfo {
            interface,
            target,
            target_ty,
        })
    }
}

#[cfg(test)]
mod tests;
