//! The Bismuth compiler driver.
//!
//! [`compile`] runs the whole semantic core over a parsed program: the
//! graph builder, the five checking passes in order, then lowering to
//! [`ir::Module`]. The first diagnostic aborts the run; there is no
//! partial output.
//!
//! ```text
//! declarations ─▶ build ─▶ kinds ─▶ names ─▶ types ─▶ instances ─▶ flow ─▶ lower
//! ```

mod options;
mod tracing_setup;

use bis_graph::Graph;
use bis_ir::ast::Declaration;
use bis_ir::StringInterner;
use bis_types::{
    build, Checked, Context, FlowCheck, InstanceResolve, KindCheck, NameResolve, Program,
    TypeInfer,
};

pub use bis_diagnostic::{CompileError, CompileResult, Diagnostic, ErrorCode};
pub use bis_lower::ir;
pub use options::{CompileOptions, CHECK_ONLY_VAR, ENTRY_VAR};
pub use tracing_setup::{init_tracing, LOG_TREE_VAR, LOG_VAR};

/// What a successful [`compile`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// Checking succeeded and lowering was skipped.
    Checked,
    Lowered(ir::Module),
}

impl Output {
    pub fn module(&self) -> Option<&ir::Module> {
        match self {
            Output::Checked => None,
            Output::Lowered(module) => Some(module),
        }
    }
}

/// Check and lower one program.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(declarations = declarations.len(), entry = %options.entry)
)]
pub fn compile(
    declarations: &[Declaration],
    interner: &StringInterner,
    options: &CompileOptions,
) -> CompileResult<Output> {
    if options.tracing {
        init_tracing();
    }

    let cx = Context::new(interner);
    let program = build(declarations, &cx)?;
    let kinds = KindCheck::run(&program, &cx)?;
    let names = NameResolve::run(&kinds)?;
    let infer = TypeInfer::run(&names)?;
    let instances = InstanceResolve::run(&infer)?;
    let flow = FlowCheck::run(&instances)?;

    if options.require_entry {
        require_entry(&program, &cx, &options.entry)?;
    }
    if options.check_only {
        tracing::debug!("checking complete, lowering skipped");
        return Ok(Output::Checked);
    }

    let checked = Checked {
        program: &program,
        cx: &cx,
        kinds: &kinds,
        names: &names,
        infer: &infer,
        instances: &instances,
        flow: &flow,
    };
    let module = bis_lower::lower(checked, &options.entry)?;
    Ok(Output::Lowered(module))
}

fn require_entry(program: &Program, cx: &Context<'_>, entry: &str) -> CompileResult<()> {
    for function in program.functions() {
        if cx.name(program.graph.get(function)?.name.name) == entry {
            return Ok(());
        }
    }
    Err(Diagnostic::error(ErrorCode::E1005)
        .with_message(format!("entry point function '{entry}' is not defined"))
        .into())
}
