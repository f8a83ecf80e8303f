//! Expression typing.

use bis_diagnostic::{CompileError, Diagnostic, ErrorCode};
use bis_graph::{Graph, Handle};
use bis_ir::Span;
use rustc_hash::FxHashMap;

use super::{Application, TypeInfer};
use crate::algebra::{bindings, substitute, Unifier, Unsolved};
use crate::nodes::{EnumDecl, Expr, ExprKind, FieldInit, GenericDecl, StructDecl, VariantDecl};
use crate::pool::{Ty, TypeData, TypeDecl};
use crate::resolve::LiteralTarget;
use crate::{user_error, CompileResult};

impl TypeInfer<'_> {
    pub(super) fn compute(&self, handle: Handle<Expr>) -> CompileResult<Ty> {
        let kinds = self.kinds();
        let expr = self.program().graph.get(handle)?;
        match &expr.kind {
            ExprKind::Integer(_) => Ok(kinds.int()),
            ExprKind::String(_) => Ok(kinds.string()),
            ExprKind::Boolean(_) => Ok(kinds.bool()),
            ExprKind::Variable(_) => self.value_type(self.names.value(handle)?),
            ExprKind::Dot { object, field } => {
                let object = self.ty(*object)?;
                self.field_type(object, *field)
            }
            ExprKind::Call { .. } | ExprKind::Operator { .. } => {
                let application = self.application(handle)?;
                match application.callee.returns {
                    Some(returns) => {
                        let bound = bindings(&application.callee.generics, &application.types);
                        substitute(&self.cx().types, returns, &bound)
                    }
                    None => Ok(kinds.unit()),
                }
            }
            ExprKind::Object { fields, .. } => match self.names.target(handle)? {
                LiteralTarget::Struct(s) => self.struct_literal(expr, s, fields),
                LiteralTarget::Variant(_) => Err(CompileError::impossible(
                    "object literal resolved to a variant",
                    expr.span,
                )),
            },
            ExprKind::Variant { payload, .. } => match self.names.target(handle)? {
                LiteralTarget::Variant(v) => self.variant_literal(expr, v, *payload),
                LiteralTarget::Struct(_) => Err(CompileError::impossible(
                    "variant literal resolved to a struct",
                    expr.span,
                )),
            },
            ExprKind::Array(items) => self.array_literal(expr, items),
        }
    }

    /// Type a call or operator use: check effects and argument count, then
    /// infer the callee's generics from the arguments and expected type.
    pub(super) fn apply(&self, handle: Handle<Expr>) -> CompileResult<Application> {
        let pool = &self.cx().types;
        let expr = self.program().graph.get(handle)?;
        let Some((callee, args)) = expr.kind.as_application() else {
            return Err(CompileError::impossible(
                "application of a non-call expression",
                expr.span,
            ));
        };
        let callee_ty = self.ty(callee)?;
        let TypeData::Function(sig) = pool.get(callee_ty)? else {
            return Err(user_error(
                ErrorCode::E3006,
                expr.span,
                format!(
                    "{} has type '{}', which is not a function",
                    self.callee_name(callee)?,
                    self.render(callee_ty)?
                ),
            ));
        };
        let name = self.callee_name(callee)?;

        let effects = || {
            sig.effects
                .iter()
                .map(|e| self.cx().name(*e))
                .collect::<Vec<_>>()
                .join(" ")
        };
        match &expr.kind {
            ExprKind::Operator { op, .. } if !sig.effects.is_empty() => {
                return Err(user_error(
                    ErrorCode::E3008,
                    op.span,
                    format!(
                        "operator '{}' calls {name}, which has effects {}",
                        self.cx().name(op.name),
                        effects()
                    ),
                ));
            }
            ExprKind::Call { has_effect: true, .. } if sig.effects.is_empty() => {
                return Err(user_error(
                    ErrorCode::E3008,
                    expr.span,
                    format!("{name} has no effects, so it must be called without '!'"),
                ));
            }
            ExprKind::Call { has_effect: false, .. } if !sig.effects.is_empty() => {
                return Err(user_error(
                    ErrorCode::E3008,
                    expr.span,
                    format!("{name} has effects {}, so it must be called with '!'", effects()),
                ));
            }
            _ => {}
        }

        if sig.params.len() != args.len() {
            return Err(user_error(
                ErrorCode::E3007,
                expr.span,
                format!(
                    "{name} takes {} argument{}, but {} {} given",
                    sig.params.len(),
                    if sig.params.len() == 1 { "" } else { "s" },
                    args.len(),
                    if args.len() == 1 { "was" } else { "were" },
                ),
            ));
        }

        let mut unifier = self.unifier(&sig.generics);
        for (position, (param, arg)) in sig.params.iter().zip(args).enumerate() {
            let found = self.ty(*arg)?;
            if let Err(mismatch) = unifier.match_type(*param, found)? {
                let span = self.program().graph.get(*arg)?.span;
                return Err(user_error(
                    ErrorCode::E3002,
                    span,
                    format!(
                        "argument {} of {name}: {}",
                        position + 1,
                        self.describe(&mismatch)?
                    ),
                ));
            }
        }
        if let (Some(returns), Some(expected)) = (sig.returns, self.expected(expr)?) {
            if unifier.match_type(returns, expected)?.is_err() {
                return Err(user_error(
                    ErrorCode::E3003,
                    expr.span,
                    format!(
                        "{name} returns '{}', which does not fit the expected type '{}'",
                        self.render(returns)?,
                        self.render(expected)?
                    ),
                ));
            }
        }

        let types = self.solved(&unifier, expr.span, &name)?;
        Ok(Application { callee: sig, types })
    }

    /// Solve a unifier, phrasing failures for the construct called `what`.
    fn solved(&self, unifier: &Unifier<'_>, span: Span, what: &str) -> CompileResult<Vec<Ty>> {
        match unifier.solve()? {
            Ok(types) => Ok(types),
            Err(Unsolved::Uninferred(generic)) => Err(user_error(
                ErrorCode::E3004,
                span,
                format!(
                    "cannot infer generic parameter '{}' of {what}",
                    self.generic_name(generic)?
                ),
            )),
            Err(Unsolved::Inconsistent {
                generic,
                first,
                other,
            }) => Err(Diagnostic::error(ErrorCode::E3005)
                .with_message(format!(
                    "generic parameter '{}' of {what} is inferred as both '{}' and '{}'",
                    self.generic_name(generic)?,
                    self.render(first)?,
                    self.render(other)?
                ))
                .with_label(span, ErrorCode::E3005.description())
                .into()),
        }
    }

    fn generic_name(&self, generic: Handle<GenericDecl>) -> CompileResult<&'static str> {
        Ok(self.cx().name(self.program().graph.get(generic)?.name.name))
    }

    /// `decl[G..]` with the declaration's own generics as arguments.
    fn generic_form(&self, decl: TypeDecl, generics: &[Handle<GenericDecl>]) -> Ty {
        let pool = &self.cx().types;
        pool.named(decl, generics.iter().map(|g| pool.generic(*g)).collect::<Vec<_>>())
    }

    /// Feed the expected type into `unifier` when it names the same
    /// declaration as the literal being built.
    fn expect_same_decl(
        &self,
        unifier: &mut Unifier<'_>,
        expr: &Expr,
        decl: TypeDecl,
        generics: &[Handle<GenericDecl>],
    ) -> CompileResult<()> {
        let Some(expected) = self.expected(expr)? else {
            return Ok(());
        };
        if let TypeData::Named { decl: expected_decl, .. } = self.cx().types.get(expected)? {
            if expected_decl == decl
                && unifier
                    .match_type(self.generic_form(decl, generics), expected)?
                    .is_err()
            {
                return Err(CompileError::impossible(
                    "expected type of a literal has the wrong arity",
                    expr.span,
                ));
            }
        }
        Ok(())
    }

    fn struct_literal(
        &self,
        expr: &Expr,
        handle: Handle<StructDecl>,
        inits: &[FieldInit],
    ) -> CompileResult<Ty> {
        let graph = &self.program().graph;
        let decl = graph.get(handle)?;
        let struct_name = self.cx().name(decl.name.name);

        let mut given = FxHashMap::default();
        for init in inits {
            let field_name = self.cx().name(init.name.name);
            if decl.field(init.name.name).is_none() {
                return Err(user_error(
                    ErrorCode::E3011,
                    init.name.span,
                    format!("struct '{struct_name}' has no field '{field_name}'"),
                ));
            }
            if let Some(first) = given.insert(init.name.name, init.name.span) {
                return Err(Diagnostic::error(ErrorCode::E3011)
                    .with_message(format!("field '{field_name}' is given twice"))
                    .with_label(init.name.span, "given again here")
                    .with_secondary_label(first, "first given here")
                    .into());
            }
        }
        if let Some(missing) = decl.fields.iter().find(|f| !given.contains_key(&f.name.name)) {
            return Err(user_error(
                ErrorCode::E3011,
                expr.span,
                format!(
                    "missing field '{}' in literal of struct '{struct_name}'",
                    self.cx().name(missing.name.name)
                ),
            ));
        }

        let mut unifier = self.unifier(&decl.generics);
        for init in inits {
            let Some((_, field)) = decl.field(init.name.name) else {
                continue;
            };
            let declared = self.kinds().ty(field.ty)?;
            let found = self.ty(init.value)?;
            if let Err(mismatch) = unifier.match_type(declared, found)? {
                let span = graph.get(init.value)?.span;
                return Err(user_error(
                    ErrorCode::E3012,
                    span,
                    format!(
                        "field '{}' of struct '{struct_name}': {}",
                        self.cx().name(init.name.name),
                        self.describe(&mismatch)?
                    ),
                ));
            }
        }
        let decl_ref = TypeDecl::Struct(handle);
        self.expect_same_decl(&mut unifier, expr, decl_ref, &decl.generics)?;
        let types = self.solved(&unifier, expr.span, &format!("struct '{struct_name}'"))?;
        Ok(self.cx().types.named(decl_ref, types))
    }

    fn variant_literal(
        &self,
        expr: &Expr,
        handle: Handle<VariantDecl>,
        payload: Option<Handle<Expr>>,
    ) -> CompileResult<Ty> {
        let graph = &self.program().graph;
        let variant = graph.get(handle)?;
        let owner: &EnumDecl = graph.get(variant.owner)?;
        let variant_name = self.cx().name(variant.name.name);

        let mut unifier = self.unifier(&owner.generics);
        match (variant.payload, payload) {
            (Some(declared), Some(value)) => {
                let declared = self.kinds().ty(declared)?;
                let found = self.ty(value)?;
                if let Err(mismatch) = unifier.match_type(declared, found)? {
                    return Err(user_error(
                        ErrorCode::E3018,
                        graph.get(value)?.span,
                        format!(
                            "payload of variant '{variant_name}': {}",
                            self.describe(&mismatch)?
                        ),
                    ));
                }
            }
            (Some(declared), None) => {
                let declared = self.kinds().ty(declared)?;
                return Err(user_error(
                    ErrorCode::E3018,
                    expr.span,
                    format!(
                        "variant '{variant_name}' needs a payload of type '{}'; write '#{variant_name}(value)'",
                        self.render(declared)?
                    ),
                ));
            }
            (None, Some(value)) => {
                return Err(user_error(
                    ErrorCode::E3018,
                    graph.get(value)?.span,
                    format!("variant '{variant_name}' takes no payload; write '#{variant_name}'"),
                ));
            }
            (None, None) => {}
        }

        let decl_ref = TypeDecl::Enum(variant.owner);
        self.expect_same_decl(&mut unifier, expr, decl_ref, &owner.generics)?;
        let what = format!(
            "enum '{}' in variant '{variant_name}'",
            self.cx().name(owner.name.name)
        );
        let types = self.solved(&unifier, expr.span, &what)?;
        Ok(self.cx().types.named(decl_ref, types))
    }

    fn array_literal(&self, expr: &Expr, items: &[Handle<Expr>]) -> CompileResult<Ty> {
        let Some((first, rest)) = items.split_first() else {
            let array = TypeDecl::Builtin(self.program().builtins.array);
            if let Some(expected) = self.expected(expr)? {
                if let TypeData::Named { decl, .. } = self.cx().types.get(expected)? {
                    if decl == array {
                        return Ok(expected);
                    }
                }
            }
            return Err(user_error(
                ErrorCode::E3009,
                expr.span,
                "cannot infer the element type of an empty array without an expected array type",
            ));
        };
        let element = self.ty(*first)?;
        for item in rest {
            let found = self.ty(*item)?;
            if !self.identical(element, found)? {
                return Err(user_error(
                    ErrorCode::E3010,
                    self.program().graph.get(*item)?.span,
                    format!(
                        "array element has type '{}', but the first element has type '{}'",
                        self.render(found)?,
                        self.render(element)?
                    ),
                ));
            }
        }
        Ok(self.kinds().array(element))
    }
}
