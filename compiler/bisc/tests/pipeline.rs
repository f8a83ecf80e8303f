//! End-to-end runs of the driver over small programs.

#![allow(clippy::unwrap_used)]

use bis_ir::ast::make::SyntaxFactory;
use bis_ir::ast::{Declaration, Statement, Type};
use bis_ir::StringInterner;
use bisc::ir::{Immediate, LayoutKind, Module, Op, Statement as Lowered};
use bisc::{compile, CompileOptions, ErrorCode, Output};
use pretty_assertions::assert_eq;

fn lowered(decls: &[Declaration], interner: &StringInterner) -> Module {
    match compile(decls, interner, &CompileOptions::default()) {
        Ok(Output::Lowered(module)) => module,
        Ok(Output::Checked) => panic!("lowering was skipped"),
        Err(err) => panic!("compilation failed: {}", err.diagnostic().message),
    }
}

fn failure(decls: &[Declaration], interner: &StringInterner) -> (ErrorCode, String) {
    match compile(decls, interner, &CompileOptions::default()) {
        Ok(_) => panic!("expected a diagnostic"),
        Err(err) => {
            assert!(!err.is_internal(), "internal error: {}", err.diagnostic().message);
            (err.code(), err.diagnostic().message.clone())
        }
    }
}

fn main_with(f: &SyntaxFactory<'_>, body: Vec<Statement>) -> Declaration {
    Declaration::Function(f.function("main", vec![], vec![], None, body))
}

/// `struct Point { var x: Int; var y: Int; }`
fn point(f: &SyntaxFactory<'_>) -> Declaration {
    f.struct_decl("Point", vec![], vec![("x", f.ty("Int")), ("y", f.ty("Int"))])
}

/// `interface Show { show: func(self) -> String }`
fn show_interface(f: &SyntaxFactory<'_>) -> Declaration {
    f.interface(
        "Show",
        vec![("show", f.func_ty(vec![], vec![f.self_ty()], Some(f.ty("String"))))],
    )
}

fn show_for(f: &SyntaxFactory<'_>, target: &str) -> Declaration {
    f.instance(
        "Show",
        f.named(target, vec![]),
        vec![],
        vec![f.function(
            "show",
            vec![],
            vec![("x", f.ty(target))],
            Some(f.ty("String")),
            vec![f.ret(Some(f.string(target)))],
        )],
    )
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

#[test]
fn point_lowers_to_one_layout_and_one_allocation() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        point(&f),
        main_with(
            &f,
            vec![f.var_stmt(
                "p",
                f.ty("Point"),
                f.object("Point", vec![("x", f.int(1)), ("y", f.int(2))]),
            )],
        ),
    ];
    let module = lowered(&decls, &interner);

    let structs: Vec<_> = module
        .layouts
        .iter()
        .filter(|l| l.kind == LayoutKind::Struct)
        .map(|l| (l.name.as_str(), l.fields.clone()))
        .collect();
    assert_eq!(structs, vec![("Point", vec!["x".to_owned(), "y".to_owned()])]);

    let main = module.function("main").unwrap();
    let allocations: Vec<_> = main
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            Op::Allocate { layout, fields, .. } => Some((layout.clone(), fields.clone())),
            _ => None,
        })
        .collect();
    let [(layout, fields)] = allocations.as_slice() else {
        panic!("expected one allocation, found {allocations:?}");
    };
    assert_eq!(layout, "Point");

    // Both fields are fed by integer loads.
    let loads: Vec<_> = fields
        .iter()
        .map(|(name, reg)| {
            let op = main.body.iter().find_map(|s| match s {
                Lowered::Local { dst, op, .. } if dst == reg => Some(op.clone()),
                _ => None,
            });
            (name.as_str(), op)
        })
        .collect();
    assert_eq!(
        loads,
        vec![
            ("x", Some(Op::Immediate(Immediate::Int(1)))),
            ("y", Some(Op::Immediate(Immediate::Int(2)))),
        ]
    );
    assert_eq!(module.entry, Some("main".to_owned()));
}

#[test]
fn string_field_is_rejected_naming_the_field() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        point(&f),
        main_with(
            &f,
            vec![f.var_stmt(
                "p",
                f.ty("Point"),
                f.object("Point", vec![("x", f.int(1)), ("y", f.string("2"))]),
            )],
        ),
    ];
    assert_eq!(
        failure(&decls, &interner),
        (
            ErrorCode::E3012,
            "field 'y' of struct 'Point': cannot match 'String' against expected 'Int'".to_owned()
        )
    );
}

#[test]
fn interface_calls_pass_dictionaries() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_for(&f, "Int"),
        show_for(&f, "Bool"),
        display(&f),
        main_with(
            &f,
            vec![
                f.expr_stmt(f.call("display", vec![f.int(1)])),
                f.expr_stmt(f.call("display", vec![f.boolean(true)])),
            ],
        ),
    ];
    let module = lowered(&decls, &interner);

    let constructors: Vec<_> = module
        .constructors
        .iter()
        .map(|c| c.function.name.as_str())
        .collect();
    assert_eq!(constructors, vec!["Show.Int", "Show.Bool"]);

    let display = module.function("display").unwrap();
    let params: Vec<_> = display.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["T.Show", "x"]);

    let dictionaries: Vec<_> = module
        .function("main")
        .unwrap()
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            Op::Global(name) if name.starts_with("Show.") => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(dictionaries, vec!["Show.Int", "Show.Bool"]);
}

#[test]
fn missing_instance_is_an_error() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_for(&f, "Int"),
        display(&f),
        main_with(&f, vec![f.expr_stmt(f.call("display", vec![f.string("s")]))]),
    ];
    assert_eq!(
        failure(&decls, &interner),
        (
            ErrorCode::E4001,
            "no instance of 'Show' for type 'String'".to_owned()
        )
    );
}

#[test]
fn duplicate_instance_is_an_error() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_for(&f, "Int"),
        show_for(&f, "Int"),
    ];
    assert_eq!(failure(&decls, &interner).0, ErrorCode::E4002);
}

/// `var g: func[A constraints](A) -> String = display; g(1);`
fn bind_display(f: &SyntaxFactory<'_>, constraints: &[&str]) -> Declaration {
    let ty = Type::Function(f.func_ty(
        vec![f.generic("A", constraints)],
        vec![f.ty("A")],
        Some(f.ty("String")),
    ));
    main_with(
        f,
        vec![
            f.var_stmt("g", ty, f.var("display")),
            f.expr_stmt(f.call("g", vec![f.int(1)])),
        ],
    )
}

#[test]
fn function_values_keep_their_generic_constraints() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_for(&f, "Int"),
        display(&f),
        bind_display(&f, &[]),
    ];
    assert_eq!(
        failure(&decls, &interner),
        (
            ErrorCode::E3001,
            "variable 'g' is declared as 'func[A](A) -> String' but initialized with a value of type 'func[T Show](T) -> String'"
                .to_owned()
        )
    );

    let decls = vec![
        show_interface(&f),
        show_for(&f, "Int"),
        display(&f),
        bind_display(&f, &["Show"]),
    ];
    let module = lowered(&decls, &interner);
    let applications: Vec<_> = module
        .function("main")
        .unwrap()
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            Op::Apply { evidence, args, .. } => Some((evidence.len(), args.len())),
            _ => None,
        })
        .collect();
    assert_eq!(applications, vec![(1, 1)]);
}

#[test]
fn conflicting_generic_inference_is_an_error() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        Declaration::Function(f.function(
            "id",
            vec![f.generic("T", &[])],
            vec![("x", f.ty("T"))],
            Some(f.ty("T")),
            vec![f.ret(Some(f.var("x")))],
        )),
        main_with(
            &f,
            vec![f.var_stmt("a", f.ty("String"), f.call("id", vec![f.int(1)]))],
        ),
    ];
    assert_eq!(
        failure(&decls, &interner),
        (
            ErrorCode::E3005,
            "generic parameter 'T' of 'id' is inferred as both 'Int' and 'String'".to_owned()
        )
    );
}

#[test]
fn flow_errors_abort_before_lowering() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![Declaration::Function(f.function(
        "pick",
        vec![],
        vec![("b", f.ty("Bool"))],
        Some(f.ty("Int")),
        vec![f.if_stmt(f.var("b"), vec![f.ret(Some(f.int(1)))], None)],
    ))];
    assert_eq!(failure(&decls, &interner).0, ErrorCode::E5001);

    let stray = vec![main_with(&f, vec![f.brk()])];
    assert_eq!(failure(&stray, &interner).0, ErrorCode::E5003);
}

#[test]
fn check_only_skips_lowering() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![point(&f), main_with(&f, vec![])];
    let options = CompileOptions::new().check_only(true);
    assert_eq!(compile(&decls, &interner, &options).unwrap(), Output::Checked);
}

#[test]
fn required_entry_must_exist() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![main_with(&f, vec![])];

    let options = CompileOptions::new().entry("start").require_entry(true);
    let err = compile(&decls, &interner, &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1005);
    assert_eq!(
        err.diagnostic().message,
        "entry point function 'start' is not defined"
    );

    let options = CompileOptions::new().require_entry(true);
    let output = compile(&decls, &interner, &options).unwrap();
    assert_eq!(
        output.module().and_then(|m| m.entry.clone()),
        Some("main".to_owned())
    );

    // Without the requirement a missing entry only leaves it unset.
    let options = CompileOptions::new().entry("start");
    let output = compile(&decls, &interner, &options).unwrap();
    assert_eq!(output.module().map(|m| m.entry.clone()), Some(None));
}

#[test]
fn compilation_is_deterministic() {
    let interner = StringInterner::new();
    let f = SyntaxFactory::new(&interner);
    let decls = vec![
        show_interface(&f),
        show_for(&f, "Int"),
        display(&f),
        main_with(&f, vec![f.expr_stmt(f.call("display", vec![f.int(1)]))]),
    ];
    assert_eq!(lowered(&decls, &interner), lowered(&decls, &interner));
}
