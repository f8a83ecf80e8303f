use bis_diagnostic::ErrorCode;
use bis_graph::{Graph, Handle};
use bis_ir::ast::make::SyntaxFactory;
use bis_ir::ast::{Declaration, FunctionDecl, Statement};
use bis_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::{Evidence, InstanceResolve};
use crate::build;
use crate::context::Context;
use crate::graph::Item;
use crate::infer::TypeInfer;
use crate::kind::KindCheck;
use crate::nodes::{Expr, ExprKind, InstanceDecl};
use crate::resolve::NameResolve;

/// `interface Show { show: func(self) -> String }`
fn show_interface(f: &SyntaxFactory<'_>) -> Declaration {
    f.interface(
        "Show",
        vec![("show", f.func_ty(vec![], vec![f.self_ty()], Some(f.ty("String"))))],
    )
}

fn show_method(f: &SyntaxFactory<'_>, param: bis_ir::ast::Type) -> FunctionDecl {
    f.function(
        "show",
        vec![],
        vec![("x", param)],
        Some(f.ty("String")),
        vec![f.ret(Some(f.string("shown")))],
    )
}

/// `instance Show for Int`
fn show_int(f: &SyntaxFactory<'_>) -> Declaration {
    f.instance("Show", f.named("Int", vec![]), vec![], vec![show_method(f, f.ty("Int"))])
}

/// `func display[T: Show](x: T) -> String { return show(x); }`
fn display(f: &SyntaxFactory<'_>) -> Declaration {
    Declaration::Function(f.function(
        "display",
        vec![f.generic("T", &["Show"])],
        vec![("x", f.ty("T"))],
        Some(f.ty("String")),
        vec![f.ret(Some(f.call("show", vec![f.var("x")])))],
    ))
}

fn main_with(f: &SyntaxFactory<'_>, body: Vec<Statement>) -> Declaration {
    Declaration::Function(f.function("main", vec![], vec![], None, body))
}

fn resolve_error(decls: &[Declaration], interner: &StringInterner) -> (ErrorCode, String) {
    let cx = Context::new(interner);
    let program = build(decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();
    let names = NameResolve::run(&kinds).unwrap();
    let infer = TypeInfer::run(&names).unwrap();
    match InstanceResolve::run(&infer) {
        Ok(_) => panic!("expected an instance error"),
        Err(err) => (err.code(), err.diagnostic().message.clone()),
    }
}

/// Evidence of every call to `callee`, in graph order.
fn evidence_of(
    program: &crate::Program,
    instances: &InstanceResolve<'_>,
    cx: &Context<'_>,
    callee: &str,
) -> Vec<Vec<Evidence>> {
    let mut found = Vec::new();
    program
        .graph
        .each::<Expr, crate::CompileError>(|handle, expr| {
            if let ExprKind::Call { callee: c, .. } = expr.kind {
                if let ExprKind::Variable(name) = program.graph.get(c)?.kind {
                    if cx.name(name.name) == callee {
                        found.push(instances.evidence(handle)?);
                    }
                }
            }
            Ok(())
        })
        .unwrap();
    found
}

fn instances_of(program: &crate::Program) -> Vec<Handle<InstanceDecl>> {
    program.instances().collect()
}

#[test]
fn concrete_call_uses_the_registered_instance() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_int(&f),
        display(&f),
        main_with(&f, vec![f.expr_stmt(f.call("display", vec![f.int(1)]))]),
    ];
    let cx = Context::new(&interner);
    let program = build(&decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();
    let names = NameResolve::run(&kinds).unwrap();
    let infer = TypeInfer::run(&names).unwrap();
    let instances = InstanceResolve::run(&infer).unwrap();

    let Item::Interface(show) = program.items[0] else {
        panic!("expected interface");
    };
    let int_instance = instances_of(&program)[0];
    assert_eq!(cx.instances.len(), 1);
    assert_eq!(
        evidence_of(&program, &instances, &cx, "display"),
        vec![vec![Evidence::Instance {
            instance: int_instance,
            interface: show,
            requirements: Vec::new(),
        }]]
    );

    // Inside `display`, `show(x)` reads the caller-supplied dictionary.
    let Item::Function(display) = program.items[2] else {
        panic!("expected function");
    };
    let t = program.graph.get(display).unwrap().generics[0];
    assert_eq!(
        evidence_of(&program, &instances, &cx, "show"),
        vec![vec![Evidence::Parameter {
            generic: t,
            interface: show,
        }]]
    );
}

#[test]
fn instance_requirements_nest() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let box_show = f.instance(
        "Show",
        f.named("Box", vec![f.ty("A")]),
        vec![f.generic("A", &["Show"])],
        vec![f.function(
            "show",
            vec![],
            vec![("b", f.ty_app("Box", vec![f.ty("A")]))],
            Some(f.ty("String")),
            vec![f.ret(Some(f.call("show", vec![f.dot(f.var("b"), "item")])))],
        )],
    );
    let decls = vec![
        show_interface(&f),
        show_int(&f),
        f.struct_decl("Box", vec![f.generic("A", &[])], vec![("item", f.ty("A"))]),
        box_show,
        display(&f),
        main_with(
            &f,
            vec![f.expr_stmt(f.call(
                "display",
                vec![f.object("Box", vec![("item", f.int(1))])],
            ))],
        ),
    ];
    let cx = Context::new(&interner);
    let program = build(&decls, &cx).unwrap();
    let kinds = KindCheck::run(&program, &cx).unwrap();
    let names = NameResolve::run(&kinds).unwrap();
    let infer = TypeInfer::run(&names).unwrap();
    let instances = InstanceResolve::run(&infer).unwrap();

    let Item::Interface(show) = program.items[0] else {
        panic!("expected interface");
    };
    let registered = instances_of(&program);
    let (int_instance, box_instance) = (registered[0], registered[1]);
    assert_eq!(
        evidence_of(&program, &instances, &cx, "display"),
        vec![vec![Evidence::Instance {
            instance: box_instance,
            interface: show,
            requirements: vec![Evidence::Instance {
                instance: int_instance,
                interface: show,
                requirements: Vec::new(),
            }],
        }]]
    );

    let info = instances.info(box_instance).unwrap();
    assert_eq!(info.interface, show);
    assert_eq!(kinds.render(info.target_ty).unwrap(), "Box[A]");
}

#[test]
fn missing_instance_is_reported() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_int(&f),
        display(&f),
        main_with(&f, vec![f.expr_stmt(f.call("display", vec![f.boolean(true)]))]),
    ];
    assert_eq!(
        resolve_error(&decls, &interner),
        (
            ErrorCode::E4001,
            "no instance of 'Show' for type 'Bool'".to_owned()
        )
    );
}

#[test]
fn unconstrained_generic_cannot_supply_evidence() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let loose = Declaration::Function(f.function(
        "loose",
        vec![f.generic("U", &[])],
        vec![("x", f.ty("U"))],
        Some(f.ty("String")),
        vec![f.ret(Some(f.call("display", vec![f.var("x")])))],
    ));
    let decls = vec![show_interface(&f), display(&f), loose];
    assert_eq!(
        resolve_error(&decls, &interner),
        (
            ErrorCode::E4001,
            "generic parameter 'U' is not constrained by 'Show'".to_owned()
        )
    );
}

#[test]
fn function_types_never_implement_interfaces() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        display(&f),
        main_with(&f, vec![f.expr_stmt(f.call("display", vec![f.var("main")]))]),
    ];
    let (code, message) = resolve_error(&decls, &interner);
    assert_eq!(code, ErrorCode::E4001);
    assert_eq!(message, "type 'func()' cannot implement interface 'Show'");
}

#[test]
fn duplicate_instance_is_reported() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![show_interface(&f), show_int(&f), show_int(&f)];
    assert_eq!(
        resolve_error(&decls, &interner),
        (
            ErrorCode::E4002,
            "'Int' already has an instance of 'Show'".to_owned()
        )
    );
}

#[test]
fn instance_methods_must_follow_the_interface() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);

    let none = vec![
        show_interface(&f),
        f.instance("Show", f.named("Int", vec![]), vec![], vec![]),
    ];
    assert_eq!(
        resolve_error(&none, &interner),
        (
            ErrorCode::E4004,
            "instance of 'Show' for 'Int' defines 0 methods, but the interface declares 1"
                .to_owned()
        )
    );

    let renamed = vec![
        show_interface(&f),
        f.instance(
            "Show",
            f.named("Int", vec![]),
            vec![],
            vec![f.function(
                "display",
                vec![],
                vec![("x", f.ty("Int"))],
                Some(f.ty("String")),
                vec![f.ret(Some(f.string("s")))],
            )],
        ),
    ];
    assert_eq!(resolve_error(&renamed, &interner).0, ErrorCode::E4004);

    let wrong_signature = vec![
        show_interface(&f),
        f.instance("Show", f.named("Int", vec![]), vec![], vec![show_method(&f, f.ty("Bool"))]),
    ];
    assert_eq!(
        resolve_error(&wrong_signature, &interner),
        (
            ErrorCode::E4003,
            "method 'show' of the instance of 'Show' for 'Int' has type 'func(Bool) -> String', but the interface requires 'func(Int) -> String'"
                .to_owned()
        )
    );
}

#[test]
fn instance_targets_are_checked() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);

    let generic_target = vec![
        show_interface(&f),
        f.instance(
            "Show",
            f.named("A", vec![]),
            vec![f.generic("A", &[])],
            vec![show_method(&f, f.ty("A"))],
        ),
    ];
    assert_eq!(resolve_error(&generic_target, &interner).0, ErrorCode::E2005);

    let concrete_args = vec![
        show_interface(&f),
        f.struct_decl("Box", vec![f.generic("A", &[])], vec![("item", f.ty("A"))]),
        f.instance(
            "Show",
            f.named("Box", vec![f.ty("Int")]),
            vec![],
            vec![show_method(&f, f.ty_app("Box", vec![f.ty("Int")]))],
        ),
    ];
    assert_eq!(resolve_error(&concrete_args, &interner).0, ErrorCode::E2005);

    let not_interface = vec![
        f.struct_decl("Show", vec![], vec![]),
        f.instance("Show", f.named("Int", vec![]), vec![], vec![]),
    ];
    assert_eq!(resolve_error(&not_interface, &interner).0, ErrorCode::E2003);

    let unknown = vec![f.instance("Eq", f.named("Int", vec![]), vec![], vec![])];
    assert_eq!(resolve_error(&unknown, &interner).0, ErrorCode::E1001);
}
