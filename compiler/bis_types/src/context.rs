//! The resolution context threaded through every pass.
//!
//! Holds the state shared by the whole compilation: the string interner, the
//! semantic type pool, the counter behind unique instance-method names, and
//! the instance registry. There is no process-wide state; two compilations
//! with two contexts never observe each other.

use std::cell::Cell;

use bis_graph::Graph;
use bis_ir::{Name, StringInterner};

use crate::graph::ProgramGraph;
use crate::instances::InstanceRegistry;
use crate::pool::{Ty, TypeData, TypeDecl, TypePool};
use crate::CompileResult;

pub struct Context<'a> {
    interner: &'a StringInterner,
    pub types: TypePool,
    pub instances: InstanceRegistry,
    unique: Cell<u32>,
}

impl<'a> Context<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        Context {
            interner,
            types: TypePool::new(),
            instances: InstanceRegistry::default(),
            unique: Cell::new(0),
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn intern(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn name(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// A number never handed out before by this context.
    pub fn fresh_unique(&self) -> u32 {
        let next = self.unique.get();
        self.unique.set(next + 1);
        next
    }

    /// Render a type the way it is written in source.
    pub fn render(&self, graph: &ProgramGraph, ty: Ty) -> CompileResult<String> {
        let mut out = String::new();
        self.render_into(graph, ty, &mut out)?;
        Ok(out)
    }

    fn render_into(&self, graph: &ProgramGraph, ty: Ty, out: &mut String) -> CompileResult<()> {
        match self.types.get(ty)? {
            TypeData::Named { decl, args } => {
                let ident = match decl {
                    TypeDecl::Builtin(h) => graph.get(h)?.name,
                    TypeDecl::Struct(h) => graph.get(h)?.name,
                    TypeDecl::Enum(h) => graph.get(h)?.name,
                    TypeDecl::Generic(h) => graph.get(h)?.name,
                };
                out.push_str(self.name(ident.name));
                if !args.is_empty() {
                    out.push('[');
                    self.render_list(graph, &args, out)?;
                    out.push(']');
                }
            }
            TypeData::Function(sig) => {
                out.push_str("func");
                if !sig.generics.is_empty() {
                    out.push('[');
                    for (i, g) in sig.generics.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let generic = graph.get(*g)?;
                        out.push_str(self.name(generic.name.name));
                        for constraint in &generic.constraints {
                            out.push(' ');
                            out.push_str(self.name(constraint.name));
                        }
                    }
                    out.push(']');
                }
                if !sig.effects.is_empty() {
                    out.push('!');
                    let effects: Vec<_> = sig.effects.iter().map(|e| self.name(*e)).collect();
                    out.push_str(&effects.join(" "));
                }
                out.push('(');
                self.render_list(graph, &sig.params, out)?;
                out.push(')');
                if let Some(returns) = sig.returns {
                    out.push_str(" -> ");
                    self.render_into(graph, returns, out)?;
                }
            }
            TypeData::SelfType => out.push_str("self"),
            TypeData::Borrow { mutable, referent } => {
                out.push_str(if mutable { "&mut " } else { "&" });
                self.render_into(graph, referent, out)?;
            }
        }
        Ok(())
    }

    fn render_list(&self, graph: &ProgramGraph, tys: &[Ty], out: &mut String) -> CompileResult<()> {
        for (i, ty) in tys.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.render_into(graph, *ty, out)?;
        }
        Ok(())
    }
}
