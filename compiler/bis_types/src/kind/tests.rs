use bis_diagnostic::ErrorCode;
use bis_ir::ast::make::SyntaxFactory;
use bis_ir::ast::Declaration;
use bis_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::KindCheck;
use crate::build;
use crate::context::Context;
use crate::graph::Item;

fn kind_error(decls: &[Declaration], interner: &StringInterner) -> (ErrorCode, String) {
    let cx = Context::new(interner);
    let program = build(decls, &cx).unwrap();
    match KindCheck::run(&program, &cx) {
        Ok(_) => panic!("expected a kind error"),
        Err(err) => (err.code(), err.diagnostic().message.clone()),
    }
}

#[test]
fn unknown_type_is_not_in_scope() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![f.struct_decl("P", vec![], vec![("x", f.ty("Float"))])];
    let (code, message) = kind_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E1001);
    assert_eq!(message, "type 'Float' is not in scope");
}

#[test]
fn function_name_is_not_a_type() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        Declaration::Function(f.function("helper", vec![], vec![], None, vec![])),
        f.struct_decl("P", vec![], vec![("x", f.ty("helper"))]),
    ];
    let (code, message) = kind_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E2001);
    assert_eq!(message, "'helper' is a function, not a type");
}

#[test]
fn arity_is_checked() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);

    let bare_array = vec![f.struct_decl("P", vec![], vec![("xs", f.ty("Array"))])];
    let (code, message) = kind_error(&bare_array, &interner);
    assert_eq!(code, ErrorCode::E2002);
    assert_eq!(message, "type 'Array' expects 1 type argument, but 0 were given");

    let applied_int = vec![f.struct_decl(
        "P",
        vec![],
        vec![("x", f.ty_app("Int", vec![f.ty("Bool")]))],
    )];
    let (code, _) = kind_error(&applied_int, &interner);
    assert_eq!(code, ErrorCode::E2002);

    let applied_generic = vec![f.struct_decl(
        "Box",
        vec![f.generic("A", &[])],
        vec![("x", f.ty_app("A", vec![f.ty("Int")]))],
    )];
    let (code, message) = kind_error(&applied_generic, &interner);
    assert_eq!(code, ErrorCode::E2002);
    assert_eq!(message, "generic parameter 'A' cannot take type arguments");
}

#[test]
fn declarations_resolve_regardless_of_order() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        f.struct_decl("Line", vec![], vec![("from", f.ty("Point")), ("to", f.ty("Point"))]),
        f.struct_decl("Point", vec![], vec![("x", f.ty("Int")), ("y", f.ty("Int"))]),
    ];
    let cx = Context::new(&interner);
    let program = build(&decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();

    let Item::Struct(line) = program.items[0] else {
        panic!("expected struct");
    };
    let line = bis_graph::Graph::get(&program.graph, line).unwrap();
    let from = kinds.ty(line.fields[0].ty).unwrap();
    let to = kinds.ty(line.fields[1].ty).unwrap();
    assert_eq!(from, to);
    assert_eq!(kinds.render(from).unwrap(), "Point");
}

#[test]
fn function_types_render_as_written() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let mapper = f.func_ty(
        vec![f.generic("T", &[])],
        vec![f.ty_app("Array", vec![f.ty("T")])],
        Some(f.ty("T")),
    );
    let decls = vec![f.struct_decl(
        "Holder",
        vec![],
        vec![("pick", bis_ir::ast::Type::Function(mapper))],
    )];
    let cx = Context::new(&interner);
    let program = build(&decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();

    let Item::Struct(holder) = program.items[0] else {
        panic!("expected struct");
    };
    let holder = bis_graph::Graph::get(&program.graph, holder).unwrap();
    let ty = kinds.ty(holder.fields[0].ty).unwrap();
    assert_eq!(kinds.render(ty).unwrap(), "func[T](Array[T]) -> T");
}

#[test]
fn builtin_shortcuts_intern_once() {
    let interner = StringInterner::new();
    let cx = Context::new(&interner);
    let program = build(&[], &cx).unwrap();
    let kinds = KindCheck::new(&program, &cx);

    assert_eq!(kinds.int(), kinds.int());
    assert!(kinds.int() != kinds.string());
    assert_eq!(kinds.render(kinds.array(kinds.bool())).unwrap(), "Array[Bool]");
    assert_eq!(kinds.render(kinds.unit()).unwrap(), "Unit");
}
