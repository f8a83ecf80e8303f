//! Checked program graph to [`Module`].
//!
//! # Entry Point
//!
//! [`lower`] turns every declaration of a checked program into module
//! artifacts:
//!
//! - structs and enums become [`Layout`]s;
//! - an interface becomes a record layout with one field per method plus
//!   `env`, and one trampoline per method that reads the method out of the
//!   dictionary it is passed;
//! - a function becomes a [`Function`] whose parameters are its
//!   dictionaries, one per `(generic, constraint)` pair, then its ordinary
//!   parameters;
//! - an instance becomes one function per method plus an
//!   [`InstanceConstructor`]. The constructor packs the dictionaries the
//!   instance's generics require into an environment record, which each
//!   method receives as its only dictionary.
//!
//! Function bodies are lowered by [`FunctionLowerer`](body::FunctionLowerer).

mod body;

use bis_diagnostic::CompileError;
use bis_graph::{Graph, Handle};
use bis_ir::Span;
use bis_types::nodes::{
    BuiltinVarDecl, EnumDecl, FunctionDecl, GenericDecl, InstanceDecl, InterfaceDecl, MethodDecl,
    Scale, StructDecl,
};
use bis_types::{Checked, CompileResult, Item, Ty, TypeData, TypeDecl, PRELUDE};

use crate::ir::{
    Function, Global, Immediate, Initializer, InstanceConstructor, Layout, LayoutKind, Module, Op,
    Param, Reg, Statement,
};

use self::body::FunctionLowerer;

/// Record field holding an instance's environment.
const ENV_FIELD: &str = "env";

/// Lower a checked program. `entry` names the function recorded as the
/// module's entry point, when the program defines it.
#[tracing::instrument(level = "debug", skip_all, fields(items = checked.program.items.len()))]
pub fn lower(checked: Checked<'_>, entry: &str) -> CompileResult<Module> {
    let mut lowerer = Lowerer {
        symbols: Symbols { checked },
        module: Module {
            prelude: PRELUDE.iter().map(|p| (*p).to_owned()).collect(),
            ..Module::default()
        },
    };
    lowerer.builtins()?;
    for item in &checked.program.items {
        match *item {
            Item::Struct(s) => lowerer.struct_layout(s)?,
            Item::Enum(e) => lowerer.enum_layout(e)?,
            Item::Interface(i) => lowerer.interface(i)?,
            Item::Function(f) => lowerer.function(f)?,
            Item::Instance(i) => lowerer.instance(i)?,
        }
        if let Item::Function(f) = *item {
            if lowerer.symbols.function(f)? == entry {
                lowerer.module.entry = Some(entry.to_owned());
            }
        }
    }

    let module = lowerer.module;
    tracing::debug!(
        layouts = module.layouts.len(),
        functions = module.functions.len(),
        constructors = module.constructors.len(),
        globals = module.globals.len(),
        "lowering complete"
    );
    Ok(module)
}

/// Lowered names of declarations, plus typed access to the checked passes.
#[derive(Copy, Clone)]
pub(crate) struct Symbols<'a> {
    checked: Checked<'a>,
}

impl<'a> Symbols<'a> {
    fn text(&self, name: bis_ir::Name) -> &'static str {
        self.checked.cx.name(name)
    }

    pub(crate) fn builtin(&self, builtin: Handle<BuiltinVarDecl>) -> CompileResult<String> {
        let name = self.checked.program.graph.get(builtin)?.name.name;
        Ok(format!("prelude.{}", self.text(name)))
    }

    pub(crate) fn interface(&self, interface: Handle<InterfaceDecl>) -> CompileResult<&'static str> {
        Ok(self.text(self.checked.program.graph.get(interface)?.name.name))
    }

    /// The trampoline of an interface method: `Interface.method`.
    pub(crate) fn method(&self, method: Handle<MethodDecl>) -> CompileResult<String> {
        let decl = self.checked.program.graph.get(method)?;
        Ok(format!(
            "{}.{}",
            self.interface(decl.interface)?,
            self.text(decl.name.name)
        ))
    }

    /// The name of the type an instance implements its interface for.
    fn target(&self, instance: Handle<InstanceDecl>) -> CompileResult<&'static str> {
        let graph = &self.checked.program.graph;
        let name = match self.checked.instances.info(instance)?.target {
            TypeDecl::Builtin(b) => graph.get(b)?.name.name,
            TypeDecl::Struct(s) => graph.get(s)?.name.name,
            TypeDecl::Enum(e) => graph.get(e)?.name.name,
            TypeDecl::Generic(_) => {
                return Err(CompileError::impossible(
                    "instance for a generic parameter passed validation",
                    graph.get(graph.get(instance)?.ty)?.span,
                ))
            }
        };
        Ok(self.text(name))
    }

    /// The constructor of an instance: `Interface.Target`.
    pub(crate) fn instance(&self, instance: Handle<InstanceDecl>) -> CompileResult<String> {
        let interface = self.checked.instances.info(instance)?.interface;
        Ok(format!(
            "{}.{}",
            self.interface(interface)?,
            self.target(instance)?
        ))
    }

    fn environment(&self, instance: Handle<InstanceDecl>) -> CompileResult<String> {
        Ok(format!("{}.{ENV_FIELD}", self.instance(instance)?))
    }

    /// Global functions keep their source name; instance methods are
    /// qualified by their instance.
    pub(crate) fn function(&self, function: Handle<FunctionDecl>) -> CompileResult<String> {
        let decl = self.checked.program.graph.get(function)?;
        let name = self.text(decl.name.name);
        Ok(match decl.scale {
            Scale::Global => name.to_owned(),
            Scale::Instance { instance, .. } => format!("{}.{name}", self.instance(instance)?),
        })
    }

    /// The parameter or environment field carrying a dictionary.
    pub(crate) fn dictionary(
        &self,
        generic: Handle<GenericDecl>,
        interface: Handle<InterfaceDecl>,
    ) -> CompileResult<String> {
        let graph = &self.checked.program.graph;
        Ok(format!(
            "{}.{}",
            self.text(graph.get(generic)?.name.name),
            self.interface(interface)?
        ))
    }

    /// Every `(generic, constraint)` pair of `generics`, in order.
    pub(crate) fn requirements(
        &self,
        generics: &[Handle<GenericDecl>],
    ) -> CompileResult<Vec<(Handle<GenericDecl>, Handle<InterfaceDecl>)>> {
        let mut pairs = Vec::new();
        for generic in generics {
            for interface in self.checked.names.constraints(*generic)? {
                pairs.push((*generic, interface));
            }
        }
        Ok(pairs)
    }

    pub(crate) fn struct_of(&self, ty: Ty, span: Span) -> CompileResult<Handle<StructDecl>> {
        match self.checked.cx.types.get(ty)? {
            TypeData::Named {
                decl: TypeDecl::Struct(s),
                ..
            } => Ok(s),
            _ => Err(CompileError::impossible("expected a struct type", span)),
        }
    }

    pub(crate) fn enum_of(&self, ty: Ty, span: Span) -> CompileResult<Handle<EnumDecl>> {
        match self.checked.cx.types.get(ty)? {
            TypeData::Named {
                decl: TypeDecl::Enum(e),
                ..
            } => Ok(e),
            _ => Err(CompileError::impossible("expected an enum type", span)),
        }
    }
}

struct Lowerer<'a> {
    symbols: Symbols<'a>,
    module: Module,
}

impl<'a> Lowerer<'a> {
    fn checked(&self) -> Checked<'a> {
        self.symbols.checked
    }

    fn global(&mut self, name: String, initializer: Initializer) {
        self.module.globals.push(Global { name, initializer });
    }

    fn builtins(&mut self) -> CompileResult<()> {
        let checked = self.checked();
        for builtin in &checked.program.builtins.values {
            let name = self.symbols.builtin(*builtin)?;
            let primitive = self.symbols.text(checked.program.graph.get(*builtin)?.name.name);
            self.global(name, Initializer::Prelude(primitive.to_owned()));
        }
        Ok(())
    }

    fn struct_layout(&mut self, handle: Handle<StructDecl>) -> CompileResult<()> {
        let checked = self.checked();
        let decl = checked.program.graph.get(handle)?;
        self.module.layouts.push(Layout {
            name: self.symbols.text(decl.name.name).to_owned(),
            kind: LayoutKind::Struct,
            fields: decl
                .fields
                .iter()
                .map(|f| self.symbols.text(f.name.name).to_owned())
                .collect(),
        });
        Ok(())
    }

    fn enum_layout(&mut self, handle: Handle<EnumDecl>) -> CompileResult<()> {
        let checked = self.checked();
        let decl = checked.program.graph.get(handle)?;
        self.module.layouts.push(Layout {
            name: self.symbols.text(decl.name.name).to_owned(),
            kind: LayoutKind::Enum,
            fields: vec!["payload".to_owned()],
        });
        Ok(())
    }

    /// The record layout and one trampoline per method.
    fn interface(&mut self, handle: Handle<InterfaceDecl>) -> CompileResult<()> {
        let checked = self.checked();
        let graph = &checked.program.graph;
        let decl = graph.get(handle)?;
        let record = self.symbols.interface(handle)?;
        let mut fields = Vec::with_capacity(decl.methods.len() + 1);
        for method in &decl.methods {
            fields.push(self.symbols.text(graph.get(*method)?.name.name).to_owned());
        }
        fields.push(ENV_FIELD.to_owned());
        self.module.layouts.push(Layout {
            name: record.to_owned(),
            kind: LayoutKind::Record,
            fields,
        });

        for method in &decl.methods {
            let trampoline = self.trampoline(*method)?;
            self.global(trampoline.name.clone(), Initializer::Function(trampoline.name.clone()));
            self.module.functions.push(trampoline);
        }
        Ok(())
    }

    /// `Interface.method(dict, args..)` calls `dict.method` with the
    /// dictionary's environment.
    fn trampoline(&self, handle: Handle<MethodDecl>) -> CompileResult<Function> {
        let checked = self.checked();
        let method = checked.program.graph.get(handle)?;
        let TypeData::Function(signature) = checked.cx.types.get(checked.kinds.ty(method.ty)?)?
        else {
            return Err(CompileError::impossible(
                "interface method without a function type",
                method.name.span,
            ));
        };
        let record = self.symbols.interface(method.interface)?;
        let field = self.symbols.text(method.name.name);

        let mut next = 0;
        let mut fresh = || {
            let reg = Reg::new(next);
            next += 1;
            reg
        };
        let dictionary = fresh();
        let mut params = vec![Param {
            reg: dictionary,
            name: "dict".to_owned(),
        }];
        let mut args = Vec::with_capacity(signature.params.len());
        for index in 0..signature.params.len() {
            let reg = fresh();
            params.push(Param {
                reg,
                name: format!("arg{index}"),
            });
            args.push(reg);
        }
        let (callee, env, result) = (fresh(), fresh(), fresh());
        let body = vec![
            Statement::Local {
                dst: callee,
                name: None,
                op: Op::FieldRead {
                    object: dictionary,
                    layout: record.to_owned(),
                    field: field.to_owned(),
                },
            },
            Statement::Local {
                dst: env,
                name: None,
                op: Op::FieldRead {
                    object: dictionary,
                    layout: record.to_owned(),
                    field: ENV_FIELD.to_owned(),
                },
            },
            Statement::Local {
                dst: result,
                name: None,
                op: Op::Apply {
                    callee,
                    evidence: vec![env],
                    args,
                },
            },
            Statement::Return(result),
        ];
        Ok(Function {
            name: self.symbols.method(handle)?,
            params,
            body,
            registers: next,
        })
    }

    fn function(&mut self, handle: Handle<FunctionDecl>) -> CompileResult<()> {
        let function = FunctionLowerer::new(self.symbols).function(handle)?;
        tracing::trace!(function = %function.name, registers = function.registers, "lowered function");
        self.global(function.name.clone(), Initializer::Function(function.name.clone()));
        self.module.functions.push(function);
        Ok(())
    }

    /// Method functions, the environment layout and the constructor.
    fn instance(&mut self, handle: Handle<InstanceDecl>) -> CompileResult<()> {
        let checked = self.checked();
        let decl = checked.program.graph.get(handle)?;
        let interface = checked.instances.info(handle)?.interface;
        let requirements = self.symbols.requirements(&decl.generics)?;

        for method in &decl.methods {
            self.function(*method)?;
        }

        let mut next = 0;
        let mut params = Vec::with_capacity(requirements.len());
        let mut env_fields = Vec::with_capacity(requirements.len());
        for (generic, constraint) in &requirements {
            let name = self.symbols.dictionary(*generic, *constraint)?;
            let reg = Reg::new(next);
            next += 1;
            params.push(Param {
                reg,
                name: name.clone(),
            });
            env_fields.push((name, reg));
        }
        let mut fresh = || {
            let reg = Reg::new(next);
            next += 1;
            reg
        };

        let mut body = Vec::new();
        let env = fresh();
        if env_fields.is_empty() {
            body.push(Statement::Local {
                dst: env,
                name: Some(ENV_FIELD.to_owned()),
                op: Op::Immediate(Immediate::Unit),
            });
        } else {
            let layout = self.symbols.environment(handle)?;
            self.module.layouts.push(Layout {
                name: layout.clone(),
                kind: LayoutKind::Environment,
                fields: env_fields.iter().map(|(name, _)| name.clone()).collect(),
            });
            body.push(Statement::Local {
                dst: env,
                name: Some(ENV_FIELD.to_owned()),
                op: Op::Allocate {
                    layout,
                    tag: None,
                    fields: env_fields,
                },
            });
        }

        let mut record_fields = Vec::with_capacity(decl.methods.len() + 1);
        for method in &decl.methods {
            let reg = fresh();
            body.push(Statement::Local {
                dst: reg,
                name: None,
                op: Op::Global(self.symbols.function(*method)?),
            });
            let field = self.symbols.text(checked.program.graph.get(*method)?.name.name);
            record_fields.push((field.to_owned(), reg));
        }
        record_fields.push((ENV_FIELD.to_owned(), env));
        let record = fresh();
        body.push(Statement::Local {
            dst: record,
            name: None,
            op: Op::Allocate {
                layout: self.symbols.interface(interface)?.to_owned(),
                tag: None,
                fields: record_fields,
            },
        });
        body.push(Statement::Return(record));

        let name = self.symbols.instance(handle)?;
        self.global(name.clone(), Initializer::Function(name.clone()));
        self.module.constructors.push(InstanceConstructor {
            interface: self.symbols.interface(interface)?.to_owned(),
            target: self.symbols.target(handle)?.to_owned(),
            function: Function {
                name,
                params,
                body,
                registers: next,
            },
        });
        Ok(())
    }
}
