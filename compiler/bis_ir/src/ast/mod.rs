//! The declaration tree handed over by the parser.
//!
//! This is the untyped, unresolved input of the checker. Every identifier is
//! an [`Ident`] (interned text plus source span); every statement and
//! expression carries the span of its first token. The tree is owned and
//! immutable: the graph builder walks it exactly once.
//!
//! Some constructs are representable here but rejected by the checker
//! (effects, services, `yield`, lambdas, borrow expressions, `never`):
//! the parser recognises them, the checker reports them as unimplemented.

use crate::{Name, Span};

pub mod make;

/// An identifier token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: Name,
    pub span: Span,
}

impl Ident {
    pub const fn new(name: Name, span: Span) -> Self {
        Ident { name, span }
    }
}

// ── Declarations ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Declaration {
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Interface(InterfaceDecl),
    Instance(InstanceDecl),
    Effect(EffectDecl),
    Service(ServiceDecl),
}

impl Declaration {
    /// Span of the token that names the declaration.
    pub fn span(&self) -> Span {
        match self {
            Declaration::Struct(d) => d.name.span,
            Declaration::Enum(d) => d.name.span,
            Declaration::Function(d) => d.name.span,
            Declaration::Interface(d) => d.name.span,
            Declaration::Instance(d) => d.interface.span,
            Declaration::Effect(d) => d.name.span,
            Declaration::Service(d) => d.name.span,
        }
    }
}

/// A generic parameter: `T: Show Eq`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generic {
    pub name: Ident,
    pub constraints: Vec<Ident>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDecl {
    pub name: Ident,
    pub generics: Vec<Generic>,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: Ident,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: Ident,
    pub generics: Vec<Generic>,
    pub variants: Vec<Variant>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub name: Ident,
    pub payload: Option<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub generics: Vec<Generic>,
    pub effects: Vec<Ident>,
    pub params: Vec<Param>,
    pub returns: Option<Type>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub parents: Vec<Ident>,
    pub methods: Vec<InterfaceMethod>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceMethod {
    pub name: Ident,
    pub ty: FunctionType,
}

/// `instance Show for Pair[A, B] { ... }`, with generics `A`, `B`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceDecl {
    pub interface: Ident,
    pub ty: NamedType,
    pub generics: Vec<Generic>,
    pub methods: Vec<FunctionDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectDecl {
    pub name: Ident,
    pub actions: Vec<InterfaceMethod>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDecl {
    pub name: Ident,
    pub effects: Vec<Ident>,
    pub params: Vec<Param>,
    pub returns: Option<Type>,
    pub body: Block,
}

// ── Types ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Named(NamedType),
    Function(FunctionType),
    SelfType(Span),
    Borrow(BorrowType),
    Never(Span),
}

impl Type {
    pub fn span(&self) -> Span {
        match self {
            Type::Named(t) => t.name.span,
            Type::Function(t) => t.span,
            Type::Borrow(t) => t.span,
            Type::SelfType(span) | Type::Never(span) => *span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedType {
    pub name: Ident,
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionType {
    pub span: Span,
    pub generics: Vec<Generic>,
    pub effects: Vec<Ident>,
    pub params: Vec<Type>,
    pub returns: Option<Box<Type>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorrowType {
    pub span: Span,
    pub mutable: bool,
    pub referent: Box<Type>,
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub span: Span,
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    Var {
        name: Ident,
        ty: Type,
        value: Expr,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    Expr(Expr),
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Match {
        scrutinee: Expr,
        arms: Vec<MatchArm>,
    },
    Yield,
}

/// `case Some(var x: Int) => { ... }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchArm {
    pub variant: Ident,
    pub binder: Option<Binder>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binder {
    pub name: Ident,
    pub ty: Type,
}

// ── Expressions ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Integer(i64),
    String(String),
    Boolean(bool),
    Variable(Ident),
    Dot {
        object: Box<Expr>,
        field: Ident,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        has_effect: bool,
    },
    /// Infix operator; `op` is the operator token (`+`, `==`, ...).
    Binary {
        op: Ident,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Prefix {
        op: Ident,
        operand: Box<Expr>,
    },
    /// `#Name{ f => e, }`, `#Variant(e)` or `#Variant`.
    Object {
        name: Ident,
        contents: ObjectContents,
    },
    Array(Vec<Expr>),
    Lambda {
        params: Vec<Param>,
        returns: Option<Type>,
        body: Block,
    },
    Borrow {
        mutable: bool,
        operand: Box<Expr>,
    },
    Service {
        service: Ident,
        args: Vec<Expr>,
        body: Box<Expr>,
    },
    Foreign,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectContents {
    Fields(Vec<FieldInit>),
    Single(Box<Expr>),
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}
