use super::*;
use pretty_assertions::assert_eq;

#[test]
fn spans_are_distinct() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let a = f.ident("x");
    let b = f.ident("x");
    assert_eq!(a.name, b.name);
    assert_ne!(a.span, b.span);
    assert!(a.span.end <= b.span.start);
}

#[test]
fn object_literal_shape() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let expr = f.object("Point", vec![("x", f.int(1)), ("y", f.int(2))]);
    let ExprKind::Object { name, contents } = expr.kind else {
        panic!("expected object literal");
    };
    assert_eq!(interner.lookup(name.name), "Point");
    let ObjectContents::Fields(fields) = contents else {
        panic!("expected field list");
    };
    let names: Vec<_> = fields.iter().map(|f| interner.lookup(f.name.name)).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn function_params_keep_order() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decl = f.function(
        "pick",
        vec![f.generic("T", &["Show"])],
        vec![("a", f.ty("T")), ("b", f.ty("Int"))],
        Some(f.ty("T")),
        vec![f.ret(Some(f.var("a")))],
    );
    let params: Vec<_> = decl.params.iter().map(|p| interner.lookup(p.name.name)).collect();
    assert_eq!(params, vec!["a", "b"]);
    assert_eq!(decl.generics[0].constraints.len(), 1);
    assert_eq!(decl.body.statements.len(), 1);
}
