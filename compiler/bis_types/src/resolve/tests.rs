use bis_diagnostic::ErrorCode;
use bis_graph::Graph;
use bis_ir::ast::make::SyntaxFactory;
use bis_ir::ast::{Declaration, Statement};
use bis_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::{NameResolve, ValueRef};
use crate::build;
use crate::context::Context;
use crate::kind::KindCheck;
use crate::nodes::{Expr, ExprKind};

fn main_with(f: &SyntaxFactory<'_>, body: Vec<Statement>) -> Declaration {
    Declaration::Function(f.function("main", vec![], vec![], None, body))
}

fn resolve_error(decls: &[Declaration], interner: &StringInterner) -> (ErrorCode, String) {
    let cx = Context::new(interner);
    let program = build(decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();
    match NameResolve::run(&kinds) {
        Ok(_) => panic!("expected a resolution error"),
        Err(err) => (err.code(), err.diagnostic().message.clone()),
    }
}

#[test]
fn variables_resolve_to_their_declarations() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![main_with(
        &f,
        vec![
            f.var_stmt("x", f.ty("Int"), f.int(1)),
            f.expr_stmt(f.call_bang("print", vec![f.call("show", vec![f.var("x")])])),
            f.expr_stmt(f.call("main", vec![])),
        ],
    )];
    let cx = Context::new(&interner);
    let program = build(&decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();
    let names = NameResolve::run(&kinds).unwrap();

    let mut found = Vec::new();
    program
        .graph
        .each::<Expr, crate::CompileError>(|handle, expr| {
            if let ExprKind::Variable(name) = expr.kind {
                found.push((cx.name(name.name), names.value(handle)?));
            }
            Ok(())
        })
        .unwrap();
    let kinds_of: Vec<(&str, &str)> = found
        .iter()
        .map(|(name, value)| {
            let kind = match value {
                ValueRef::Var(_) => "var",
                ValueRef::Function(_) => "function",
                ValueRef::Builtin(_) => "builtin",
                ValueRef::Method(_) => "method",
            };
            (*name, kind)
        })
        .collect();
    assert_eq!(
        kinds_of,
        vec![
            ("print", "builtin"),
            ("show", "builtin"),
            ("x", "var"),
            ("main", "function"),
        ]
    );
}

#[test]
fn unknown_variable_is_not_in_scope() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![main_with(&f, vec![f.expr_stmt(f.var("missing"))])];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E1001);
    assert_eq!(message, "variable 'missing' is not in scope");
}

#[test]
fn variable_out_of_scope_after_its_block() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![main_with(
        &f,
        vec![
            f.if_stmt(
                f.boolean(true),
                vec![f.var_stmt("inner", f.ty("Int"), f.int(1))],
                None,
            ),
            f.expr_stmt(f.var("inner")),
        ],
    )];
    assert_eq!(resolve_error(&decls, &interner).0, ErrorCode::E1001);
}

#[test]
fn types_and_variants_are_not_values() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);

    let decls = vec![
        f.struct_decl("Point", vec![], vec![]),
        main_with(&f, vec![f.expr_stmt(f.var("Point"))]),
    ];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E2004);
    assert_eq!(message, "'Point' is a struct, not a value");

    let decls = vec![
        f.enum_decl("Opt", vec![], vec![("None", None)]),
        main_with(&f, vec![f.expr_stmt(f.var("None"))]),
    ];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E2004);
    assert!(message.contains("'#None'"), "{message}");

    let decls = vec![main_with(&f, vec![f.expr_stmt(f.var("Int"))])];
    assert_eq!(resolve_error(&decls, &interner).0, ErrorCode::E2004);
}

#[test]
fn assignment_must_be_rooted_at_a_variable() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![main_with(
        &f,
        vec![f.assign(f.dot(f.var("main"), "x"), f.int(1))],
    )];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E3017);
    assert_eq!(message, "cannot assign to 'main': it is a function, not a variable");
}

#[test]
fn constraints_must_name_interfaces() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);

    let decls = vec![Declaration::Function(f.function(
        "g",
        vec![f.generic("T", &["Int"])],
        vec![],
        None,
        vec![],
    ))];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E2003);
    assert_eq!(
        message,
        "'Int' is a builtin type, not an interface, so it cannot constrain 'T'"
    );

    let decls = vec![Declaration::Function(f.function(
        "g",
        vec![f.generic("T", &["Printable"])],
        vec![],
        None,
        vec![],
    ))];
    assert_eq!(resolve_error(&decls, &interner).0, ErrorCode::E1001);
}

#[test]
fn literal_targets_must_match_their_syntax() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);

    let decls = vec![
        f.enum_decl("Opt", vec![], vec![("None", None)]),
        main_with(&f, vec![f.expr_stmt(f.object("None", vec![]))]),
    ];
    assert_eq!(resolve_error(&decls, &interner).0, ErrorCode::E3018);

    let decls = vec![
        f.struct_decl("Point", vec![], vec![]),
        main_with(&f, vec![f.expr_stmt(f.variant("Point", None))]),
    ];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E3018);
    assert_eq!(message, "'Point' is a struct, not an enum variant");

    let decls = vec![main_with(&f, vec![f.expr_stmt(f.object("main", vec![]))])];
    assert_eq!(resolve_error(&decls, &interner).0, ErrorCode::E3011);
}
