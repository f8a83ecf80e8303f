//! Node varieties of the program graph.
//!
//! The builder creates every node below exactly once. Nodes hold syntax-level
//! fields only (spans, identifiers, child handles, the enclosing scope);
//! everything derived lives in the passes' attribute tables.

use bis_graph::{Handle, Variety};
use bis_ir::ast::Ident;
use bis_ir::{Name, Span};
use rustc_hash::FxHashMap;

macro_rules! varieties {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Variety for $ty {
                const NAME: &'static str = stringify!($ty);
            }
        )*
    };
}

varieties!(
    Scope,
    TypeNode,
    Expr,
    Stmt,
    Reference,
    BuiltinTypeDecl,
    BuiltinVarDecl,
    GenericDecl,
    StructDecl,
    EnumDecl,
    VariantDecl,
    FunctionDecl,
    InterfaceDecl,
    MethodDecl,
    InstanceDecl,
    VarDecl,
);

// ── Scopes ──────────────────────────────────────────────────────────

/// One link of the lexical scope chain.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub parent: Option<Handle<Scope>>,
    pub bindings: FxHashMap<Name, DeclRef>,
    /// Set on a function body scope.
    pub returns_from: Option<Handle<FunctionDecl>>,
    /// Set on interface scopes, where `self` is a type.
    pub allows_self: bool,
    /// Set on a loop body scope; points at the `while` statement.
    pub breaks_from: Option<Handle<Stmt>>,
}

impl Scope {
    pub fn child(parent: Handle<Scope>) -> Self {
        Scope {
            parent: Some(parent),
            ..Scope::default()
        }
    }
}

/// Anything a name can be bound to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclRef {
    BuiltinType(Handle<BuiltinTypeDecl>),
    BuiltinVar(Handle<BuiltinVarDecl>),
    Generic(Handle<GenericDecl>),
    Struct(Handle<StructDecl>),
    Enum(Handle<EnumDecl>),
    Variant(Handle<VariantDecl>),
    Function(Handle<FunctionDecl>),
    Interface(Handle<InterfaceDecl>),
    Method(Handle<MethodDecl>),
    Var(Handle<VarDecl>),
}

impl DeclRef {
    /// Human-readable category, for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            DeclRef::BuiltinType(_) => "builtin type",
            DeclRef::BuiltinVar(_) => "builtin function",
            DeclRef::Generic(_) => "generic parameter",
            DeclRef::Struct(_) => "struct",
            DeclRef::Enum(_) => "enum",
            DeclRef::Variant(_) => "enum variant",
            DeclRef::Function(_) => "function",
            DeclRef::Interface(_) => "interface",
            DeclRef::Method(_) => "interface method",
            DeclRef::Var(_) => "variable",
        }
    }
}

// ── Type syntax ─────────────────────────────────────────────────────

/// A type as written, resolved lazily by the kind check.
#[derive(Clone, Debug)]
pub struct TypeNode {
    pub span: Span,
    pub kind: TypeNodeKind,
}

#[derive(Clone, Debug)]
pub enum TypeNodeKind {
    Named {
        name: Ident,
        args: Vec<Handle<TypeNode>>,
        scope: Handle<Scope>,
    },
    Function {
        generics: Vec<Handle<GenericDecl>>,
        effects: Vec<Ident>,
        params: Vec<Handle<TypeNode>>,
        returns: Option<Handle<TypeNode>>,
    },
    SelfType,
    Borrow {
        mutable: bool,
        referent: Handle<TypeNode>,
    },
    /// A direct reference to a generic, used where `self` was rewritten
    /// to an interface's implicit `Self` parameter.
    Generic(Handle<GenericDecl>),
}

// ── Declarations ────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct BuiltinTypeDecl {
    pub name: Ident,
    pub arity: usize,
}

#[derive(Clone, Debug)]
pub struct BuiltinVarDecl {
    pub name: Ident,
    pub ty: Handle<TypeNode>,
}

#[derive(Clone, Debug)]
pub struct GenericDecl {
    pub name: Ident,
    pub constraints: Vec<Ident>,
    /// Scope the constraint names are looked up in.
    pub scope: Handle<Scope>,
}

#[derive(Clone, Debug)]
pub struct StructDecl {
    pub name: Ident,
    pub generics: Vec<Handle<GenericDecl>>,
    pub fields: Vec<FieldDecl>,
}

impl StructDecl {
    pub fn field(&self, name: Name) -> Option<(usize, &FieldDecl)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: Handle<TypeNode>,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: Ident,
    pub generics: Vec<Handle<GenericDecl>>,
    pub variants: Vec<Handle<VariantDecl>>,
}

#[derive(Clone, Debug)]
pub struct VariantDecl {
    pub name: Ident,
    pub owner: Handle<EnumDecl>,
    /// Position in the owner's variant list; the runtime tag.
    pub tag: u32,
    pub payload: Option<Handle<TypeNode>>,
}

/// Whether a function is an ordinary global or an instance method.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scale {
    Global,
    /// `unique` disambiguates the lowered name of the method.
    Instance {
        instance: Handle<InstanceDecl>,
        unique: u32,
    },
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Ident,
    pub scale: Scale,
    pub generics: Vec<Handle<GenericDecl>>,
    pub effects: Vec<Ident>,
    pub params: Vec<Handle<VarDecl>>,
    pub returns: Option<Handle<TypeNode>>,
    /// Always a block statement.
    pub body: Handle<Stmt>,
}

#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub methods: Vec<Handle<MethodDecl>>,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: Ident,
    pub interface: Handle<InterfaceDecl>,
    /// The signature as declared, mentioning `self`.
    pub ty: Handle<TypeNode>,
    /// The implicit `Self: Interface` generic of `value_ty`.
    pub self_generic: Handle<GenericDecl>,
    /// The signature as a global value: `func[Self: I](...)` with every
    /// `self` replaced by `Self`.
    pub value_ty: Handle<TypeNode>,
}

#[derive(Clone, Debug)]
pub struct InstanceDecl {
    pub interface: Ident,
    pub ty: Handle<TypeNode>,
    pub generics: Vec<Handle<GenericDecl>>,
    pub methods: Vec<Handle<FunctionDecl>>,
}

/// A local: function parameter, `var` binding or match binder.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: Ident,
    pub ty: Handle<TypeNode>,
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Stmt {
    pub span: Span,
    pub scope: Handle<Scope>,
    pub kind: StmtKind,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Do(Handle<Expr>),
    Var {
        decl: Handle<VarDecl>,
        value: Handle<Expr>,
    },
    Assign {
        target: Handle<Reference>,
        value: Handle<Expr>,
    },
    Return(Option<Handle<Expr>>),
    Break,
    Continue,
    If {
        condition: Handle<Expr>,
        then_block: Handle<Stmt>,
        else_block: Handle<Stmt>,
    },
    While {
        condition: Handle<Expr>,
        body: Handle<Stmt>,
    },
    Match {
        scrutinee: Handle<Expr>,
        arms: Vec<MatchArm>,
    },
    Block(Vec<Handle<Stmt>>),
}

#[derive(Clone, Debug)]
pub struct MatchArm {
    pub variant: Ident,
    pub binder: Option<Handle<VarDecl>>,
    pub body: Handle<Stmt>,
}

// ── Expressions ─────────────────────────────────────────────────────

/// Where an expression's expected type comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// Initializer of a `var` with a declared type.
    Declared(Handle<VarDecl>),
    /// Right side of an assignment.
    Assigned(Handle<Reference>),
    /// Value of a `return` in this function.
    Returned(Handle<FunctionDecl>),
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub span: Span,
    pub scope: Handle<Scope>,
    pub expects: Option<Expectation>,
    pub kind: ExprKind,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Integer(i64),
    String(String),
    Boolean(bool),
    Variable(Ident),
    Dot {
        object: Handle<Expr>,
        field: Ident,
    },
    Call {
        callee: Handle<Expr>,
        args: Vec<Handle<Expr>>,
        has_effect: bool,
    },
    /// A binary or prefix operator; `callee` is a synthetic variable
    /// naming the operator function (`add`, `negate`, ...).
    Operator {
        op: Ident,
        callee: Handle<Expr>,
        args: Vec<Handle<Expr>>,
    },
    /// `#Name{ field => value, ... }`.
    Object {
        name: Ident,
        fields: Vec<FieldInit>,
    },
    /// `#Variant(value)` or `#Variant`.
    Variant {
        name: Ident,
        payload: Option<Handle<Expr>>,
    },
    Array(Vec<Handle<Expr>>),
}

impl ExprKind {
    /// Callee and arguments of a call or operator use.
    pub fn as_application(&self) -> Option<(Handle<Expr>, &[Handle<Expr>])> {
        match self {
            ExprKind::Call { callee, args, .. } | ExprKind::Operator { callee, args, .. } => {
                Some((*callee, args))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Handle<Expr>,
}

/// An assignable place: a variable or a field path rooted at one.
#[derive(Clone, Debug)]
pub struct Reference {
    pub span: Span,
    pub scope: Handle<Scope>,
    pub kind: ReferenceKind,
}

#[derive(Clone, Debug)]
pub enum ReferenceKind {
    Var(Ident),
    Dot {
        object: Handle<Reference>,
        field: Ident,
    },
}
