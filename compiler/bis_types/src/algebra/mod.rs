//! The type algebra: identity, substitution and one-way matching.
//!
//! All operations work on interned [`Ty`]s and never look at names; the
//! only outside knowledge they need is a generic's [`Constraints`]. Failures that can only come from a
//! broken earlier phase surface as internal errors; ordinary mismatches are
//! returned as values for the caller to phrase.

use bis_diagnostic::CompileError;
use bis_graph::Handle;
use bis_ir::Span;
use rustc_hash::FxHashMap;

use crate::nodes::{GenericDecl, InterfaceDecl};
use crate::pool::{FnSig, Ty, TypeData, TypePool};
use crate::CompileResult;

type Generic = Handle<GenericDecl>;

/// The interfaces a generic parameter requires, in declaration order.
pub trait Constraints {
    fn constraints(&self, generic: Generic) -> CompileResult<Vec<Handle<InterfaceDecl>>>;
}

impl<F> Constraints for F
where
    F: Fn(Generic) -> CompileResult<Vec<Handle<InterfaceDecl>>>,
{
    fn constraints(&self, generic: Generic) -> CompileResult<Vec<Handle<InterfaceDecl>>> {
        self(generic)
    }
}

/// Generics bound at the same position must require the same interfaces in
/// the same order.
fn same_requirements(constraints: &dyn Constraints, a: &[Generic], b: &[Generic]) -> CompileResult<bool> {
    for (ga, gb) in a.iter().zip(b) {
        if constraints.constraints(*ga)? != constraints.constraints(*gb)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether generic `a` on the left stands for generic `b` on the right. The
/// innermost binding of either side decides; unbound generics only match
/// themselves.
fn same_generic(a: Generic, b: Generic, equal: &[(Generic, Generic)]) -> bool {
    equal
        .iter()
        .rev()
        .find(|(x, y)| *x == a || *y == b)
        .map_or(a == b, |pair| *pair == (a, b))
}

/// Structural identity. Generics bound by function types at the same
/// position are treated as the same variable when they carry the same
/// constraints.
pub fn identical(pool: &TypePool, constraints: &dyn Constraints, a: Ty, b: Ty) -> CompileResult<bool> {
    identical_under(pool, constraints, a, b, &[])
}

fn identical_under(
    pool: &TypePool,
    constraints: &dyn Constraints,
    a: Ty,
    b: Ty,
    equal: &[(Generic, Generic)],
) -> CompileResult<bool> {
    // Interned equality is only conclusive while no generics are rebound.
    if a == b && equal.is_empty() {
        return Ok(true);
    }
    Ok(match (pool.get(a)?, pool.get(b)?) {
        (
            TypeData::Named {
                decl: decl_a,
                args: args_a,
            },
            TypeData::Named {
                decl: decl_b,
                args: args_b,
            },
        ) => {
            let same_decl = match (decl_a.as_generic(), decl_b.as_generic()) {
                (Some(ga), Some(gb)) => same_generic(ga, gb, equal),
                _ => decl_a == decl_b,
            };
            same_decl && all_identical(pool, constraints, &args_a, &args_b, equal)?
        }
        (TypeData::SelfType, TypeData::SelfType) => true,
        (TypeData::Function(fa), TypeData::Function(fb)) => {
            if fa.generics.len() != fb.generics.len() || fa.params.len() != fb.params.len() {
                return Ok(false);
            }
            if !same_requirements(constraints, &fa.generics, &fb.generics)? {
                return Ok(false);
            }
            let mut extended = equal.to_vec();
            extended.extend(fa.generics.iter().copied().zip(fb.generics.iter().copied()));
            if !all_identical(pool, constraints, &fa.params, &fb.params, &extended)? {
                return Ok(false);
            }
            match (fa.returns, fb.returns) {
                (None, None) => true,
                (Some(ra), Some(rb)) => identical_under(pool, constraints, ra, rb, &extended)?,
                _ => false,
            }
        }
        (
            TypeData::Borrow {
                mutable: ma,
                referent: ra,
            },
            TypeData::Borrow {
                mutable: mb,
                referent: rb,
            },
        ) => ma == mb && identical_under(pool, constraints, ra, rb, equal)?,
        _ => false,
    })
}

fn all_identical(
    pool: &TypePool,
    constraints: &dyn Constraints,
    a: &[Ty],
    b: &[Ty],
    equal: &[(Generic, Generic)],
) -> CompileResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !identical_under(pool, constraints, *x, *y, equal)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Replace every bound generic by its binding. Unbound generics, `self`
/// and the generic lists of function types are left alone.
pub fn substitute(pool: &TypePool, ty: Ty, bindings: &FxHashMap<Generic, Ty>) -> CompileResult<Ty> {
    if bindings.is_empty() {
        return Ok(ty);
    }
    rebuild(pool, ty, &mut |data| match data {
        TypeData::Named { decl, args } => {
            match decl.as_generic().and_then(|g| bindings.get(&g)) {
                Some(_) if !args.is_empty() => Err(CompileError::impossible(
                    "generic parameter applied to type arguments",
                    Span::DUMMY,
                )),
                Some(bound) => Ok(Some(*bound)),
                None => Ok(None),
            }
        }
        _ => Ok(None),
    })
}

/// Replace every `self` by `replacement`.
pub fn self_substitute(pool: &TypePool, ty: Ty, replacement: Ty) -> CompileResult<Ty> {
    rebuild(pool, ty, &mut |data| {
        Ok(matches!(data, TypeData::SelfType).then_some(replacement))
    })
}

/// Rebuild `ty` bottom-up; `leaf` may replace any node outright.
fn rebuild(
    pool: &TypePool,
    ty: Ty,
    leaf: &mut dyn FnMut(&TypeData) -> CompileResult<Option<Ty>>,
) -> CompileResult<Ty> {
    let data = pool.get(ty)?;
    if let Some(replaced) = leaf(&data)? {
        return Ok(replaced);
    }
    Ok(match data {
        TypeData::Named { decl, args } => {
            let args = args
                .iter()
                .map(|arg| rebuild(pool, *arg, &mut *leaf))
                .collect::<CompileResult<Vec<_>>>()?;
            pool.named(decl, args)
        }
        TypeData::Function(sig) => {
            let params = sig
                .params
                .iter()
                .map(|p| rebuild(pool, *p, &mut *leaf))
                .collect::<CompileResult<Vec<_>>>()?;
            let returns = match sig.returns {
                Some(r) => Some(rebuild(pool, r, leaf)?),
                None => None,
            };
            pool.function(FnSig {
                generics: sig.generics,
                effects: sig.effects,
                params,
                returns,
            })
        }
        TypeData::SelfType => ty,
        TypeData::Borrow { mutable, referent } => pool.borrow(mutable, rebuild(pool, referent, leaf)?),
    })
}

// ── Matching ────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MismatchKind {
    /// Different type constructors or declarations.
    Shape,
    /// A generic of an enclosing function type met something other than
    /// its counterpart.
    GenericOrder,
    /// Function types with different argument counts.
    Arity,
    /// Function types with different generic counts.
    Parametericity,
    /// Generics at the same position require different interfaces.
    Requirements,
    /// One function type returns a value, the other does not.
    Returns,
}

/// Why `found` does not fit `expected`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub expected: Ty,
    pub found: Ty,
}

impl Mismatch {
    /// Phrase the mismatch; `render` prints a type.
    pub fn describe(&self, mut render: impl FnMut(Ty) -> CompileResult<String>) -> CompileResult<String> {
        let expected = render(self.expected)?;
        let found = render(self.found)?;
        let reason = match self.kind {
            MismatchKind::Shape => String::new(),
            MismatchKind::GenericOrder => {
                "; generic parameters must occur in the same order and be used identically".into()
            }
            MismatchKind::Arity => "; they take different numbers of arguments".into(),
            MismatchKind::Parametericity => "; they have differing parametericity".into(),
            MismatchKind::Requirements => {
                "; their generic parameters require different interfaces".into()
            }
            MismatchKind::Returns => "; only one of them returns a value".into(),
        };
        Ok(format!("cannot match '{found}' against expected '{expected}'{reason}"))
    }
}

/// Why inference over a set of generics failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unsolved {
    /// Nothing constrained the generic.
    Uninferred(Generic),
    /// Two candidates disagree.
    Inconsistent { generic: Generic, first: Ty, other: Ty },
}

/// One-way unification of patterns over a fixed set of free generics.
///
/// Each match appends, for every free generic in the pattern, the type found
/// at the same position. Candidates are only compared by [`solve`](Self::solve),
/// after all matching is done.
pub struct Unifier<'p> {
    pool: &'p TypePool,
    constraints: &'p dyn Constraints,
    order: Vec<Generic>,
    candidates: FxHashMap<Generic, Vec<Ty>>,
}

impl<'p> Unifier<'p> {
    pub fn new(pool: &'p TypePool, constraints: &'p dyn Constraints, generics: &[Generic]) -> Self {
        Unifier {
            pool,
            constraints,
            order: generics.to_vec(),
            candidates: generics.iter().map(|g| (*g, Vec::new())).collect(),
        }
    }

    pub fn candidates(&self, generic: Generic) -> &[Ty] {
        self.candidates.get(&generic).map_or(&[], Vec::as_slice)
    }

    /// Match `against` to `pattern`, collecting candidates.
    pub fn match_type(&mut self, pattern: Ty, against: Ty) -> CompileResult<Result<(), Mismatch>> {
        self.match_under(pattern, against, &FxHashMap::default())
    }

    fn match_under(
        &mut self,
        pattern: Ty,
        against: Ty,
        equivalent: &FxHashMap<Generic, Generic>,
    ) -> CompileResult<Result<(), Mismatch>> {
        let mismatch = |kind| Ok(Err(Mismatch {
            kind,
            expected: pattern,
            found: against,
        }));
        let pattern_data = self.pool.get(pattern)?;
        let against_data = self.pool.get(against)?;

        if let Some(generic) = pattern_data.as_generic() {
            if let Some(list) = self.candidates.get_mut(&generic) {
                list.push(against);
                return Ok(Ok(()));
            }
            if let Some(counterpart) = equivalent.get(&generic) {
                return if against_data.as_generic() == Some(*counterpart) {
                    Ok(Ok(()))
                } else {
                    mismatch(MismatchKind::GenericOrder)
                };
            }
        }
        if let Some(found) = against_data.as_generic() {
            if equivalent.values().any(|g| *g == found) {
                return mismatch(MismatchKind::GenericOrder);
            }
        }

        match (pattern_data, against_data) {
            (
                TypeData::Named {
                    decl: decl_p,
                    args: args_p,
                },
                TypeData::Named {
                    decl: decl_a,
                    args: args_a,
                },
            ) => {
                if decl_p != decl_a || args_p.len() != args_a.len() {
                    return mismatch(MismatchKind::Shape);
                }
                for (p, a) in args_p.iter().zip(&args_a) {
                    if let Err(inner) = self.match_under(*p, *a, equivalent)? {
                        return Ok(Err(inner));
                    }
                }
                Ok(Ok(()))
            }
            (TypeData::SelfType, TypeData::SelfType) => Ok(Ok(())),
            (TypeData::Function(fp), TypeData::Function(fa)) => {
                if fp.params.len() != fa.params.len() {
                    return mismatch(MismatchKind::Arity);
                }
                if fp.generics.len() != fa.generics.len() {
                    return mismatch(MismatchKind::Parametericity);
                }
                if !same_requirements(self.constraints, &fp.generics, &fa.generics)? {
                    return mismatch(MismatchKind::Requirements);
                }
                let mut inner = equivalent.clone();
                inner.extend(fp.generics.iter().copied().zip(fa.generics.iter().copied()));
                for (p, a) in fp.params.iter().zip(&fa.params) {
                    if let Err(found) = self.match_under(*p, *a, &inner)? {
                        return Ok(Err(found));
                    }
                }
                match (fp.returns, fa.returns) {
                    (None, None) => Ok(Ok(())),
                    (Some(rp), Some(ra)) => self.match_under(rp, ra, &inner),
                    _ => mismatch(MismatchKind::Returns),
                }
            }
            (
                TypeData::Borrow {
                    mutable: mp,
                    referent: rp,
                },
                TypeData::Borrow {
                    mutable: ma,
                    referent: ra,
                },
            ) if mp == ma => self.match_under(rp, ra, equivalent),
            _ => mismatch(MismatchKind::Shape),
        }
    }

    /// Pick one type per generic, in declaration order. Every generic needs
    /// at least one candidate and all its candidates must be identical.
    pub fn solve(&self) -> CompileResult<Result<Vec<Ty>, Unsolved>> {
        let mut solution = Vec::with_capacity(self.order.len());
        for generic in &self.order {
            let candidates = self.candidates(*generic);
            let Some((first, rest)) = candidates.split_first() else {
                return Ok(Err(Unsolved::Uninferred(*generic)));
            };
            for other in rest {
                if !identical(self.pool, self.constraints, *first, *other)? {
                    return Ok(Err(Unsolved::Inconsistent {
                        generic: *generic,
                        first: *first,
                        other: *other,
                    }));
                }
            }
            solution.push(*first);
        }
        Ok(Ok(solution))
    }
}

/// Pair generics with their solved types.
pub fn bindings(generics: &[Generic], types: &[Ty]) -> FxHashMap<Generic, Ty> {
    generics.iter().copied().zip(types.iter().copied()).collect()
}

#[cfg(test)]
mod tests;
