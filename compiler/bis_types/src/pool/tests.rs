use super::*;
use pretty_assertions::assert_eq;

fn int() -> TypeDecl {
    TypeDecl::Builtin(Handle::from_raw(0))
}

fn array() -> TypeDecl {
    TypeDecl::Builtin(Handle::from_raw(4))
}

#[test]
fn interning_deduplicates() {
    let pool = TypePool::new();
    let a = pool.named(int(), []);
    let b = pool.named(int(), []);
    assert_eq!(a, b);
    assert_eq!(pool.len(), 1);

    let arr = pool.named(array(), [a]);
    assert_eq!(pool.named(array(), [b]), arr);
    assert_eq!(pool.len(), 2);
}

#[test]
fn get_returns_structure() {
    let pool = TypePool::new();
    let int_ty = pool.named(int(), []);
    let borrowed = pool.borrow(true, int_ty);
    assert_eq!(
        pool.get(borrowed),
        Ok(TypeData::Borrow {
            mutable: true,
            referent: int_ty
        })
    );
}

#[test]
fn unknown_type_is_internal_error() {
    let pool = TypePool::new();
    let other = TypePool::new();
    other.self_type();
    let foreign = other.named(int(), []);
    assert!(matches!(
        pool.get(foreign),
        Err(GraphError::Missing { variety: "Type", .. })
    ));
}

#[test]
fn generic_types_are_named_types() {
    let pool = TypePool::new();
    let g = Handle::<GenericDecl>::from_raw(2);
    let t = pool.generic(g);
    assert_eq!(pool.get(t).map(|d| d.as_generic()), Ok(Some(g)));
    assert_eq!(pool.get(pool.self_type()).map(|d| d.as_generic()), Ok(None));
}

#[test]
fn function_signatures_differing_in_generics_are_distinct() {
    let pool = TypePool::new();
    let a = Handle::<GenericDecl>::from_raw(0);
    let b = Handle::<GenericDecl>::from_raw(1);
    let sig = |g| FnSig {
        generics: vec![g],
        effects: Vec::new(),
        params: vec![pool.generic(g)],
        returns: None,
    };
    let fa = pool.function(sig(a));
    let fb = pool.function(sig(b));
    assert!(fa != fb);
}
