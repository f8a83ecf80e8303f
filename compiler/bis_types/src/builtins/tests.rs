use super::*;
use bis_ir::StringInterner;
use pretty_assertions::assert_eq;

use crate::scope::lookup;

#[test]
fn value_scope_sees_types_through_parent() {
    let interner = StringInterner::new();
    let cx = Context::new(&interner);
    let mut graph = ProgramGraph::default();
    let builtins = seed(&mut graph, &cx).unwrap();

    let int = lookup(&graph, builtins.value_scope, cx.intern("Int")).unwrap();
    assert_eq!(int, Some(DeclRef::BuiltinType(builtins.int)));
    let t = lookup(&graph, builtins.value_scope, cx.intern("T")).unwrap();
    assert_eq!(t, Some(DeclRef::Generic(builtins.universal)));
}

#[test]
fn every_prelude_primitive_is_bound() {
    let interner = StringInterner::new();
    let cx = Context::new(&interner);
    let mut graph = ProgramGraph::default();
    let builtins = seed(&mut graph, &cx).unwrap();

    assert_eq!(builtins.values.len(), PRELUDE.len());
    for name in PRELUDE {
        let found = lookup(&graph, builtins.value_scope, cx.intern(name)).unwrap();
        assert!(
            matches!(found, Some(DeclRef::BuiltinVar(_))),
            "{name} missing"
        );
    }
    // Values are not visible from the type scope.
    assert_eq!(
        lookup(&graph, builtins.type_scope, cx.intern("print")).unwrap(),
        None
    );
}

#[test]
fn array_has_arity_one() {
    let interner = StringInterner::new();
    let cx = Context::new(&interner);
    let mut graph = ProgramGraph::default();
    let builtins = seed(&mut graph, &cx).unwrap();

    assert_eq!(graph.get(builtins.array).unwrap().arity, 1);
    assert_eq!(graph.get(builtins.int).unwrap().arity, 0);
}
