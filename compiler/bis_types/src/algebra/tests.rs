use super::*;
use bis_graph::Handle;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::pool::TypeDecl;

/// A type written without a pool, for generation.
#[derive(Clone, Debug)]
enum Shape {
    Con(u32, Vec<Shape>),
    Var(u32),
    SelfTy,
    Func(Vec<Shape>, Option<Box<Shape>>),
    Borrow(bool, Box<Shape>),
}

fn generic(raw: u32) -> Generic {
    Handle::from_raw(100 + raw)
}

fn unconstrained(_: Generic) -> CompileResult<Vec<Handle<InterfaceDecl>>> {
    Ok(Vec::new())
}

fn con(raw: u32) -> TypeDecl {
    TypeDecl::Struct(Handle::from_raw(raw))
}

fn intern(pool: &TypePool, shape: &Shape) -> Ty {
    match shape {
        Shape::Con(d, args) => pool.named(con(*d), args.iter().map(|a| intern(pool, a)).collect::<Vec<_>>()),
        Shape::Var(v) => pool.generic(generic(*v)),
        Shape::SelfTy => pool.self_type(),
        Shape::Func(params, returns) => pool.function(FnSig {
            generics: Vec::new(),
            effects: Vec::new(),
            params: params.iter().map(|p| intern(pool, p)).collect(),
            returns: returns.as_ref().map(|r| intern(pool, r)),
        }),
        Shape::Borrow(m, inner) => pool.borrow(*m, intern(pool, inner)),
    }
}

fn shape(with_vars: bool) -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (0u32..4).prop_map(|d| Shape::Con(d, Vec::new())),
        Just(Shape::SelfTy),
    ];
    let leaf = if with_vars {
        prop_oneof![leaf, (0u32..3).prop_map(Shape::Var)].boxed()
    } else {
        leaf.boxed()
    };
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Con(10, vec![s])),
            (
                proptest::collection::vec(inner.clone(), 0..3),
                proptest::option::of(inner.clone())
            )
                .prop_map(|(p, r)| Shape::Func(p, r.map(Box::new))),
            (any::<bool>(), inner).prop_map(|(m, s)| Shape::Borrow(m, Box::new(s))),
        ]
    })
}

fn mentions_self(pool: &TypePool, ty: Ty) -> bool {
    match pool.get(ty).unwrap() {
        TypeData::SelfType => true,
        TypeData::Named { args, .. } => args.iter().any(|a| mentions_self(pool, *a)),
        TypeData::Function(sig) => {
            sig.params.iter().any(|p| mentions_self(pool, *p))
                || sig.returns.is_some_and(|r| mentions_self(pool, r))
        }
        TypeData::Borrow { referent, .. } => mentions_self(pool, referent),
    }
}

proptest! {
    #[test]
    fn identity_is_reflexive(s in shape(true)) {
        let pool = TypePool::new();
        let t = intern(&pool, &s);
        prop_assert!(identical(&pool, &unconstrained, t, t).unwrap());
    }

    #[test]
    fn identity_is_symmetric(a in shape(true), b in shape(true)) {
        let pool = TypePool::new();
        let ta = intern(&pool, &a);
        let tb = intern(&pool, &b);
        prop_assert_eq!(identical(&pool, &unconstrained, ta, tb).unwrap(), identical(&pool, &unconstrained, tb, ta).unwrap());
    }

    #[test]
    fn differing_declaration_is_not_identical(d in 0u32..4, args in proptest::collection::vec(shape(true), 0..3)) {
        let pool = TypePool::new();
        let a = intern(&pool, &Shape::Con(d, args.clone()));
        let b = intern(&pool, &Shape::Con(d + 1, args));
        prop_assert!(!identical(&pool, &unconstrained, a, b).unwrap());
    }

    #[test]
    fn substituting_a_closed_type_changes_nothing(s in shape(false)) {
        let pool = TypePool::new();
        let t = intern(&pool, &s);
        let int = pool.named(con(0), []);
        let all = bindings(&[generic(0), generic(1), generic(2)], &[int, int, int]);
        prop_assert_eq!(substitute(&pool, t, &all).unwrap(), t);
    }

    #[test]
    fn full_substitution_is_idempotent(s in shape(true)) {
        let pool = TypePool::new();
        let t = intern(&pool, &s);
        let int = pool.named(con(0), []);
        let text = pool.named(con(1), []);
        let all = bindings(&[generic(0), generic(1), generic(2)], &[int, text, int]);
        let once = substitute(&pool, t, &all).unwrap();
        prop_assert_eq!(substitute(&pool, once, &all).unwrap(), once);
    }

    #[test]
    fn self_substitution_removes_self(s in shape(true)) {
        let pool = TypePool::new();
        let t = intern(&pool, &s);
        let int = pool.named(con(0), []);
        let replaced = self_substitute(&pool, t, int).unwrap();
        prop_assert!(!mentions_self(&pool, replaced));
    }
}

/// `func[G](G) -> G` for a given generic.
fn identity_fn(pool: &TypePool, g: Generic) -> Ty {
    let t = pool.generic(g);
    pool.function(FnSig {
        generics: vec![g],
        effects: Vec::new(),
        params: vec![t],
        returns: Some(t),
    })
}

#[test]
fn independently_declared_generics_correspond_by_position() {
    let pool = TypePool::new();
    let a = identity_fn(&pool, generic(0));
    let b = identity_fn(&pool, generic(1));
    assert!(a != b);
    assert!(identical(&pool, &unconstrained, a, b).unwrap());
}

#[test]
fn corresponding_generics_must_require_the_same_interfaces() {
    let pool = TypePool::new();
    let show: Handle<InterfaceDecl> = Handle::from_raw(1);
    let only_first_shows = |g: Generic| -> CompileResult<Vec<Handle<InterfaceDecl>>> {
        Ok(if g == generic(0) { vec![show] } else { Vec::new() })
    };
    let shows = identity_fn(&pool, generic(0));
    let plain = identity_fn(&pool, generic(1));

    assert!(!identical(&pool, &only_first_shows, shows, plain).unwrap());
    assert!(!identical(&pool, &only_first_shows, plain, shows).unwrap());
    assert!(identical(&pool, &only_first_shows, shows, shows).unwrap());

    let mut unifier = Unifier::new(&pool, &only_first_shows, &[]);
    let mismatch = unifier.match_type(plain, shows).unwrap().unwrap_err();
    assert_eq!(mismatch.kind, MismatchKind::Requirements);
}

#[test]
fn generics_rebound_in_swapped_order_are_not_identical() {
    let pool = TypePool::new();
    let (a, b) = (generic(0), generic(1));
    let (av, bv) = (pool.generic(a), pool.generic(b));
    let sig = |generics: Vec<Generic>, params: Vec<Ty>| {
        pool.function(FnSig {
            generics,
            effects: Vec::new(),
            params,
            returns: None,
        })
    };

    // func[A, B](A, B) against func[B, A](A, B): A now stands at B's position.
    let forward = sig(vec![a, b], vec![av, bv]);
    let swapped = sig(vec![b, a], vec![av, bv]);
    assert!(!identical(&pool, &unconstrained, forward, swapped).unwrap());

    // func[B, A](B, A) is the same type as func[A, B](A, B).
    let renamed = sig(vec![b, a], vec![bv, av]);
    assert!(identical(&pool, &unconstrained, forward, renamed).unwrap());

    let mut unifier = Unifier::new(&pool, &unconstrained, &[]);
    let mismatch = unifier.match_type(forward, swapped).unwrap().unwrap_err();
    assert_eq!(mismatch.kind, MismatchKind::GenericOrder);
}

#[test]
fn free_generics_are_not_identical_to_each_other() {
    let pool = TypePool::new();
    let a = pool.generic(generic(0));
    let b = pool.generic(generic(1));
    assert!(!identical(&pool, &unconstrained, a, b).unwrap());
}

#[test]
fn function_returning_nothing_differs_from_one_returning_a_value() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    let returns = pool.function(FnSig {
        generics: Vec::new(),
        effects: Vec::new(),
        params: vec![int],
        returns: Some(int),
    });
    let silent = pool.function(FnSig {
        generics: Vec::new(),
        effects: Vec::new(),
        params: vec![int],
        returns: None,
    });
    assert!(!identical(&pool, &unconstrained, returns, silent).unwrap());
}

#[test]
fn borrow_mutability_matters() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    assert!(!identical(&pool, &unconstrained, pool.borrow(true, int), pool.borrow(false, int)).unwrap());
}

#[test]
fn substitution_keeps_unbound_generics() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    let pair = pool.named(con(5), [pool.generic(generic(0)), pool.generic(generic(1))]);
    let bound = substitute(&pool, pair, &bindings(&[generic(0)], &[int])).unwrap();
    assert_eq!(bound, pool.named(con(5), [int, pool.generic(generic(1))]));
}

#[test]
fn unifier_binds_from_argument_and_expected_return() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    let t = generic(0);
    let tv = pool.generic(t);

    let mut unifier = Unifier::new(&pool, &unconstrained, &[t]);
    assert_eq!(unifier.match_type(tv, int).unwrap(), Ok(()));
    assert_eq!(unifier.match_type(tv, int).unwrap(), Ok(()));
    assert_eq!(unifier.solve().unwrap(), Ok(vec![int]));
}

#[test]
fn unifier_reports_inconsistent_candidates() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    let text = pool.named(con(1), []);
    let t = generic(0);
    let tv = pool.generic(t);

    let mut unifier = Unifier::new(&pool, &unconstrained, &[t]);
    unifier.match_type(tv, int).unwrap().unwrap();
    unifier.match_type(tv, text).unwrap().unwrap();
    assert_eq!(unifier.candidates(t), &[int, text]);
    assert_eq!(
        unifier.solve().unwrap(),
        Err(Unsolved::Inconsistent {
            generic: t,
            first: int,
            other: text
        })
    );
}

#[test]
fn unifier_requires_a_candidate_for_every_generic() {
    let pool = TypePool::new();
    let unifier = Unifier::new(&pool, &unconstrained, &[generic(0)]);
    assert_eq!(unifier.solve().unwrap(), Err(Unsolved::Uninferred(generic(0))));
}

#[test]
fn unifier_matches_through_constructors() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    let t = generic(0);
    let pattern = pool.named(con(10), [pool.generic(t)]);
    let against = pool.named(con(10), [int]);

    let mut unifier = Unifier::new(&pool, &unconstrained, &[t]);
    unifier.match_type(pattern, against).unwrap().unwrap();
    assert_eq!(unifier.solve().unwrap(), Ok(vec![int]));

    let wrong = pool.named(con(11), [int]);
    let mismatch = unifier.match_type(pattern, wrong).unwrap().unwrap_err();
    assert_eq!(mismatch.kind, MismatchKind::Shape);
}

#[test]
fn nested_function_generics_must_line_up() {
    let pool = TypePool::new();
    let a = generic(0);
    let b = generic(1);
    let c = generic(2);
    let (av, bv, cv) = (pool.generic(a), pool.generic(b), pool.generic(c));
    let sig = |generics: Vec<Generic>, params: Vec<Ty>| {
        pool.function(FnSig {
            generics,
            effects: Vec::new(),
            params,
            returns: None,
        })
    };

    // func[A, B](A, B) against func[B, C](B, C): positions agree.
    let pattern = sig(vec![a, b], vec![av, bv]);
    let good = sig(vec![b, c], vec![bv, cv]);
    let mut unifier = Unifier::new(&pool, &unconstrained, &[]);
    assert_eq!(unifier.match_type(pattern, good).unwrap(), Ok(()));

    // func[A, B](A, B) against func[B, C](C, B): swapped.
    let swapped = sig(vec![b, c], vec![cv, bv]);
    let mismatch = unifier.match_type(pattern, swapped).unwrap().unwrap_err();
    assert_eq!(mismatch.kind, MismatchKind::GenericOrder);

    let fewer = sig(vec![a], vec![av, av]);
    let mismatch = unifier.match_type(pattern, fewer).unwrap().unwrap_err();
    assert_eq!(mismatch.kind, MismatchKind::Parametericity);

    let shorter = sig(vec![a, b], vec![av]);
    let mismatch = unifier.match_type(pattern, shorter).unwrap().unwrap_err();
    assert_eq!(mismatch.kind, MismatchKind::Arity);
}

#[test]
fn mismatch_description_names_both_types() {
    let pool = TypePool::new();
    let int = pool.named(con(0), []);
    let text = pool.named(con(1), []);
    let mismatch = Mismatch {
        kind: MismatchKind::Parametericity,
        expected: int,
        found: text,
    };
    let described = mismatch
        .describe(|ty| Ok(if ty == int { "Int".into() } else { "String".into() }))
        .unwrap();
    assert_eq!(
        described,
        "cannot match 'String' against expected 'Int'; they have differing parametericity"
    );
}
