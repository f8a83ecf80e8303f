//! The lowered program: a small statement-oriented language with untyped
//! registers, close to C.
//!
//! # Architecture
//!
//! - [`Module`]: every artifact of one program plus its entry point
//! - [`Layout`]: a record shape (struct, enum, interface record, instance
//!   environment)
//! - [`Function`]: parameters and a body of [`Statement`]s
//! - [`Op`]: a single computation whose result lands in a register
//!
//! Types are erased. Every value is a pointer-sized word held in a [`Reg`];
//! records are allocated and never mutated after construction.

/// A register within one [`Function`]. Numbered from 0 in order of
/// allocation; parameters come first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Reg(u32);

impl Reg {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Values ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Immediate {
    Int(i64),
    String(String),
    Bool(bool),
    Unit,
}

/// A computation producing one value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    Immediate(Immediate),
    Copy(Reg),
    /// Load the value of a [`Global`].
    Global(String),
    /// Call a function value. Dictionaries come first, then the ordinary
    /// arguments; every callee uses this one convention.
    Apply {
        callee: Reg,
        evidence: Vec<Reg>,
        args: Vec<Reg>,
    },
    FieldRead {
        object: Reg,
        layout: String,
        field: String,
    },
    /// A fresh record. Enum values carry the variant's tag.
    Allocate {
        layout: String,
        tag: Option<u32>,
        fields: Vec<(String, Reg)>,
    },
    /// The tag of an enum value.
    TagRead { object: Reg, layout: String },
    /// Whether a tag read by [`Op::TagRead`] equals `tag`.
    TagIs { tag: Reg, expected: u32 },
    PayloadRead { object: Reg, layout: String },
    /// A fresh array holding `elements` in order.
    Array(Vec<Reg>),
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    /// Declare `dst` and initialize it. `name` is the source variable the
    /// register stands for, if any.
    Local {
        dst: Reg,
        name: Option<String>,
        op: Op,
    },
    /// Overwrite an already declared register.
    Assign { dst: Reg, op: Op },
    /// Evaluate for effect and discard the result.
    Execute(Op),
    If {
        condition: Reg,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    /// Repeat until a [`Statement::Break`] or [`Statement::Return`].
    Loop(Vec<Statement>),
    Break,
    Continue,
    Return(Reg),
    Block(Vec<Statement>),
}

// ── Artifacts ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutKind {
    Struct,
    /// A tag plus a single `payload` field.
    Enum,
    /// One field per interface method plus the instance environment.
    Record,
    /// The dictionaries an instance's methods close over.
    Environment,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    pub name: String,
    pub kind: LayoutKind,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub reg: Reg,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
    /// Registers used, parameters included.
    pub registers: u32,
}

/// How a global is initialized before the entry point runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Initializer {
    /// A function value for the [`Function`] of this name.
    Function(String),
    /// A function value for the runtime primitive of this name.
    Prelude(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Global {
    pub name: String,
    pub initializer: Initializer,
}

/// Builds the dictionary of one instance from the dictionaries its own
/// generics require.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceConstructor {
    pub interface: String,
    pub target: String,
    pub function: Function,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub layouts: Vec<Layout>,
    pub functions: Vec<Function>,
    pub constructors: Vec<InstanceConstructor>,
    pub globals: Vec<Global>,
    /// The function run first, if the program defines it.
    pub entry: Option<String>,
    /// Runtime primitives the module links against.
    pub prelude: Vec<String>,
}

impl Module {
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions
            .iter()
            .chain(self.constructors.iter().map(|c| &c.function))
            .find(|f| f.name == name)
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }
}

impl Function {
    /// Every op in the body, in order, nested statements included.
    pub fn ops(&self) -> Vec<&Op> {
        fn walk<'a>(statements: &'a [Statement], out: &mut Vec<&'a Op>) {
            for statement in statements {
                match statement {
                    Statement::Local { op, .. }
                    | Statement::Assign { op, .. }
                    | Statement::Execute(op) => out.push(op),
                    Statement::If {
                        then_body,
                        else_body,
                        ..
                    } => {
                        walk(then_body, out);
                        walk(else_body, out);
                    }
                    Statement::Loop(body) | Statement::Block(body) => walk(body, out),
                    Statement::Break | Statement::Continue | Statement::Return(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.body, &mut out);
        out
    }
}
