//! Statement and expression lowering within one function.

use bis_diagnostic::CompileError;
use bis_graph::{Graph, Handle};
use bis_ir::Span;
use bis_types::nodes::{
    Expr, ExprKind, FunctionDecl, GenericDecl, InterfaceDecl, Reference, ReferenceKind, Scale,
    Stmt, StmtKind, VarDecl,
};
use bis_types::{CompileResult, Evidence, LiteralTarget, Reach, ValueRef};
use rustc_hash::FxHashMap;

use super::{Symbols, ENV_FIELD};
use crate::ir::{Function, Immediate, Op, Param, Reg, Statement};

/// Lowers one function body. Registers are allocated in order; source
/// variables and dictionaries keep one register for the whole function.
pub(crate) struct FunctionLowerer<'a> {
    symbols: Symbols<'a>,
    next: u32,
    vars: FxHashMap<Handle<VarDecl>, Reg>,
    dictionaries: FxHashMap<(Handle<GenericDecl>, Handle<InterfaceDecl>), Reg>,
}

impl<'a> FunctionLowerer<'a> {
    pub(crate) fn new(symbols: Symbols<'a>) -> Self {
        FunctionLowerer {
            symbols,
            next: 0,
            vars: FxHashMap::default(),
            dictionaries: FxHashMap::default(),
        }
    }

    fn fresh(&mut self) -> Reg {
        let reg = Reg::new(self.next);
        self.next += 1;
        reg
    }

    /// Declare a fresh register holding `op`.
    fn local(&mut self, op: Op, out: &mut Vec<Statement>) -> Reg {
        let dst = self.fresh();
        out.push(Statement::Local {
            dst,
            name: None,
            op,
        });
        dst
    }

    fn unit(&mut self, out: &mut Vec<Statement>) -> Reg {
        self.local(Op::Immediate(Immediate::Unit), out)
    }

    pub(crate) fn function(mut self, handle: Handle<FunctionDecl>) -> CompileResult<Function> {
        let checked = self.symbols.checked;
        let decl = checked.program.graph.get(handle)?;
        let mut params = Vec::with_capacity(decl.params.len() + decl.generics.len());
        let mut prologue = Vec::new();

        let environment = match decl.scale {
            Scale::Global => {
                for (generic, interface) in self.symbols.requirements(&decl.generics)? {
                    let reg = self.fresh();
                    params.push(Param {
                        reg,
                        name: self.symbols.dictionary(generic, interface)?,
                    });
                    self.dictionaries.insert((generic, interface), reg);
                }
                None
            }
            Scale::Instance { instance, .. } => {
                let env = self.fresh();
                params.push(Param {
                    reg: env,
                    name: ENV_FIELD.to_owned(),
                });
                Some((instance, env))
            }
        };
        for param in &decl.params {
            let reg = self.fresh();
            let name = self.symbols.text(checked.program.graph.get(*param)?.name.name);
            params.push(Param {
                reg,
                name: name.to_owned(),
            });
            self.vars.insert(*param, reg);
        }
        if let Some((instance, env)) = environment {
            let generics = &checked.program.graph.get(instance)?.generics;
            let layout = self.symbols.environment(instance)?;
            for (generic, interface) in self.symbols.requirements(generics)? {
                let field = self.symbols.dictionary(generic, interface)?;
                let dst = self.fresh();
                prologue.push(Statement::Local {
                    dst,
                    name: Some(field.clone()),
                    op: Op::FieldRead {
                        object: env,
                        layout: layout.clone(),
                        field,
                    },
                });
                self.dictionaries.insert((generic, interface), dst);
            }
        }

        let mut body = prologue;
        self.statements(decl.body, &mut body)?;
        if checked.flow.reaches_end(decl.body)? != Reach::No {
            let unit = self.unit(&mut body);
            body.push(Statement::Return(unit));
        }

        Ok(Function {
            name: self.symbols.function(handle)?,
            params,
            body,
            registers: self.next,
        })
    }

    // ── Statements ──────────────────────────────────────────────────

    /// Lower a statement, splicing the children of a block into `out`.
    fn statements(&mut self, handle: Handle<Stmt>, out: &mut Vec<Statement>) -> CompileResult<()> {
        let stmt = self.symbols.checked.program.graph.get(handle)?;
        if let StmtKind::Block(children) = &stmt.kind {
            for child in children {
                self.stmt(*child, out)?;
            }
            return Ok(());
        }
        self.stmt(handle, out)
    }

    fn body_of(&mut self, handle: Handle<Stmt>) -> CompileResult<Vec<Statement>> {
        let mut body = Vec::new();
        self.statements(handle, &mut body)?;
        Ok(body)
    }

    fn stmt(&mut self, handle: Handle<Stmt>, out: &mut Vec<Statement>) -> CompileResult<()> {
        let checked = self.symbols.checked;
        let graph = &checked.program.graph;
        let stmt = graph.get(handle)?;
        match &stmt.kind {
            StmtKind::Do(expr) => {
                let op = self.op(*expr, out)?;
                out.push(Statement::Execute(op));
            }
            StmtKind::Var { decl, value } => {
                let op = self.op(*value, out)?;
                let dst = self.fresh();
                self.vars.insert(*decl, dst);
                out.push(Statement::Local {
                    dst,
                    name: Some(self.symbols.text(graph.get(*decl)?.name.name).to_owned()),
                    op,
                });
            }
            StmtKind::Assign { target, value } => {
                let value = self.expr(*value, out)?;
                self.store(*target, value, out)?;
            }
            StmtKind::Return(value) => {
                let reg = match value {
                    Some(value) => self.expr(*value, out)?,
                    None => self.unit(out),
                };
                out.push(Statement::Return(reg));
            }
            StmtKind::Break => out.push(Statement::Break),
            StmtKind::Continue => out.push(Statement::Continue),
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.expr(*condition, out)?;
                let then_body = self.body_of(*then_block)?;
                let else_body = self.body_of(*else_block)?;
                out.push(Statement::If {
                    condition,
                    then_body,
                    else_body,
                });
            }
            StmtKind::While { condition, body } => {
                let mut looped = Vec::new();
                let condition = self.expr(*condition, &mut looped)?;
                looped.push(Statement::If {
                    condition,
                    then_body: Vec::new(),
                    else_body: vec![Statement::Break],
                });
                self.statements(*body, &mut looped)?;
                out.push(Statement::Loop(looped));
            }
            StmtKind::Match { scrutinee, arms } => {
                let scrutinee_ty = checked.infer.ty(*scrutinee)?;
                let owner = self.symbols.enum_of(scrutinee_ty, stmt.span)?;
                let layout = self.symbols.text(graph.get(owner)?.name.name).to_owned();
                let object = self.expr(*scrutinee, out)?;
                let tag = self.local(
                    Op::TagRead {
                        object,
                        layout: layout.clone(),
                    },
                    out,
                );

                let variants = checked.infer.arm_variants(handle)?;
                let mut lowered = Vec::with_capacity(arms.len());
                for (arm, variant) in arms.iter().zip(variants) {
                    let mut test = Vec::new();
                    let expected = graph.get(variant)?.tag;
                    let condition = self.local(Op::TagIs { tag, expected }, &mut test);
                    let mut body = Vec::new();
                    if let Some(binder) = arm.binder {
                        let dst = self.fresh();
                        self.vars.insert(binder, dst);
                        body.push(Statement::Local {
                            dst,
                            name: Some(self.symbols.text(graph.get(binder)?.name.name).to_owned()),
                            op: Op::PayloadRead {
                                object,
                                layout: layout.clone(),
                            },
                        });
                    }
                    self.statements(arm.body, &mut body)?;
                    lowered.push((test, condition, body));
                }

                let mut chain = Vec::new();
                for (mut test, condition, then_body) in lowered.into_iter().rev() {
                    test.push(Statement::If {
                        condition,
                        then_body,
                        else_body: chain,
                    });
                    chain = test;
                }
                out.extend(chain);
            }
            StmtKind::Block(_) => {
                let body = self.body_of(handle)?;
                out.push(Statement::Block(body));
            }
        }
        Ok(())
    }

    // ── References ──────────────────────────────────────────────────

    fn var(&self, var: Handle<VarDecl>, span: Span) -> CompileResult<Reg> {
        self.vars
            .get(&var)
            .copied()
            .ok_or_else(|| CompileError::impossible("variable used before its declaration", span))
    }

    /// The current value of a reference.
    fn load(&mut self, handle: Handle<Reference>, out: &mut Vec<Statement>) -> CompileResult<Reg> {
        let checked = self.symbols.checked;
        let reference = checked.program.graph.get(handle)?;
        match reference.kind {
            ReferenceKind::Var(_) => self.var(checked.names.root(handle)?, reference.span),
            ReferenceKind::Dot { object, field } => {
                let struct_ty = checked.infer.reference_type(object)?;
                let decl = self.symbols.struct_of(struct_ty, reference.span)?;
                let layout = self.symbols.text(checked.program.graph.get(decl)?.name.name);
                let object = self.load(object, out)?;
                Ok(self.local(
                    Op::FieldRead {
                        object,
                        layout: layout.to_owned(),
                        field: self.symbols.text(field.name).to_owned(),
                    },
                    out,
                ))
            }
        }
    }

    /// Store `value` through a reference. Records are immutable, so a
    /// field store rebuilds every record along the path.
    fn store(
        &mut self,
        handle: Handle<Reference>,
        value: Reg,
        out: &mut Vec<Statement>,
    ) -> CompileResult<()> {
        let checked = self.symbols.checked;
        let graph = &checked.program.graph;
        let reference = graph.get(handle)?;
        match reference.kind {
            ReferenceKind::Var(_) => {
                let dst = self.var(checked.names.root(handle)?, reference.span)?;
                out.push(Statement::Assign {
                    dst,
                    op: Op::Copy(value),
                });
                Ok(())
            }
            ReferenceKind::Dot { object, field } => {
                let struct_ty = checked.infer.reference_type(object)?;
                let decl = graph.get(self.symbols.struct_of(struct_ty, reference.span)?)?;
                let layout = self.symbols.text(decl.name.name).to_owned();
                let old = self.load(object, out)?;
                let mut fields = Vec::with_capacity(decl.fields.len());
                for declared in &decl.fields {
                    let name = self.symbols.text(declared.name.name).to_owned();
                    let reg = if declared.name.name == field.name {
                        value
                    } else {
                        self.local(
                            Op::FieldRead {
                                object: old,
                                layout: layout.clone(),
                                field: name.clone(),
                            },
                            out,
                        )
                    };
                    fields.push((name, reg));
                }
                let rebuilt = self.local(
                    Op::Allocate {
                        layout,
                        tag: None,
                        fields,
                    },
                    out,
                );
                self.store(object, rebuilt, out)
            }
        }
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// Lower an expression into a fresh register.
    fn expr(&mut self, handle: Handle<Expr>, out: &mut Vec<Statement>) -> CompileResult<Reg> {
        let op = self.op(handle, out)?;
        Ok(self.local(op, out))
    }

    /// Lower an expression's operands into `out` and return the op that
    /// computes its value.
    fn op(&mut self, handle: Handle<Expr>, out: &mut Vec<Statement>) -> CompileResult<Op> {
        let checked = self.symbols.checked;
        let graph = &checked.program.graph;
        let expr = graph.get(handle)?;
        Ok(match &expr.kind {
            ExprKind::Integer(value) => Op::Immediate(Immediate::Int(*value)),
            ExprKind::String(value) => Op::Immediate(Immediate::String(value.clone())),
            ExprKind::Boolean(value) => Op::Immediate(Immediate::Bool(*value)),
            ExprKind::Variable(_) => match checked.names.value(handle)? {
                ValueRef::Var(var) => Op::Copy(self.var(var, expr.span)?),
                ValueRef::Function(function) => Op::Global(self.symbols.function(function)?),
                ValueRef::Builtin(builtin) => Op::Global(self.symbols.builtin(builtin)?),
                ValueRef::Method(method) => Op::Global(self.symbols.method(method)?),
            },
            ExprKind::Dot { object, field } => {
                let struct_ty = checked.infer.ty(*object)?;
                let decl = self.symbols.struct_of(struct_ty, expr.span)?;
                let object = self.expr(*object, out)?;
                Op::FieldRead {
                    object,
                    layout: self.symbols.text(graph.get(decl)?.name.name).to_owned(),
                    field: self.symbols.text(field.name).to_owned(),
                }
            }
            ExprKind::Call { callee, args, .. } | ExprKind::Operator { callee, args, .. } => {
                let callee = self.expr(*callee, out)?;
                let mut evidence = Vec::new();
                for proof in checked.instances.evidence(handle)? {
                    evidence.push(self.evidence(&proof, expr.span, out)?);
                }
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.expr(*arg, out)?);
                }
                Op::Apply {
                    callee,
                    evidence,
                    args: lowered,
                }
            }
            ExprKind::Object { fields, .. } => {
                let LiteralTarget::Struct(target) = checked.names.target(handle)? else {
                    return Err(CompileError::impossible(
                        "object literal naming a variant",
                        expr.span,
                    ));
                };
                let mut values = FxHashMap::default();
                for init in fields {
                    values.insert(init.name.name, self.expr(init.value, out)?);
                }
                let decl = graph.get(target)?;
                let mut ordered = Vec::with_capacity(decl.fields.len());
                for declared in &decl.fields {
                    let Some(reg) = values.get(&declared.name.name) else {
                        return Err(CompileError::impossible(
                            "struct literal missing a field",
                            expr.span,
                        ));
                    };
                    ordered.push((self.symbols.text(declared.name.name).to_owned(), *reg));
                }
                Op::Allocate {
                    layout: self.symbols.text(decl.name.name).to_owned(),
                    tag: None,
                    fields: ordered,
                }
            }
            ExprKind::Variant { payload, .. } => {
                let LiteralTarget::Variant(variant) = checked.names.target(handle)? else {
                    return Err(CompileError::impossible(
                        "variant literal naming a struct",
                        expr.span,
                    ));
                };
                let variant = graph.get(variant)?;
                let fields = match payload {
                    Some(payload) => vec![("payload".to_owned(), self.expr(*payload, out)?)],
                    None => Vec::new(),
                };
                Op::Allocate {
                    layout: self.symbols.text(graph.get(variant.owner)?.name.name).to_owned(),
                    tag: Some(variant.tag),
                    fields,
                }
            }
            ExprKind::Array(items) => {
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    elements.push(self.expr(*item, out)?);
                }
                Op::Array(elements)
            }
        })
    }

    /// The register holding the dictionary `proof` describes.
    fn evidence(
        &mut self,
        proof: &Evidence,
        span: Span,
        out: &mut Vec<Statement>,
    ) -> CompileResult<Reg> {
        match proof {
            Evidence::Parameter { generic, interface } => self
                .dictionaries
                .get(&(*generic, *interface))
                .copied()
                .ok_or_else(|| {
                    CompileError::impossible("dictionary parameter not in scope", span)
                }),
            Evidence::Instance {
                instance,
                requirements,
                ..
            } => {
                let mut args = Vec::with_capacity(requirements.len());
                for requirement in requirements {
                    args.push(self.evidence(requirement, span, out)?);
                }
                let callee = self.local(Op::Global(self.symbols.instance(*instance)?), out);
                Ok(self.local(
                    Op::Apply {
                        callee,
                        evidence: Vec::new(),
                        args,
                    },
                    out,
                ))
            }
        }
    }
}
