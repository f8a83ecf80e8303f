//! The program graph: one arena per node variety.

use bis_graph::{Arena, Graph, GraphError, Handle, Holds};
use bis_ir::ast::Ident;

use crate::nodes::{
    BuiltinTypeDecl, BuiltinVarDecl, DeclRef, EnumDecl, Expr, FunctionDecl, GenericDecl,
    InstanceDecl, InterfaceDecl, MethodDecl, Reference, Scope, Stmt, StructDecl, TypeNode,
    VarDecl, VariantDecl,
};

macro_rules! program_graph {
    ($($field:ident: $ty:ident),* $(,)?) => {
        /// Every node of one program.
        #[derive(Default)]
        pub struct ProgramGraph {
            $( $field: Arena<$ty>, )*
        }

        $(
            impl Holds<$ty> for ProgramGraph {
                fn arena(&self) -> &Arena<$ty> {
                    &self.$field
                }
                fn arena_mut(&mut self) -> &mut Arena<$ty> {
                    &mut self.$field
                }
            }
        )*
    };
}

program_graph! {
    scopes: Scope,
    type_nodes: TypeNode,
    exprs: Expr,
    stmts: Stmt,
    references: Reference,
    builtin_types: BuiltinTypeDecl,
    builtin_vars: BuiltinVarDecl,
    generics: GenericDecl,
    structs: StructDecl,
    enums: EnumDecl,
    variants: VariantDecl,
    functions: FunctionDecl,
    interfaces: InterfaceDecl,
    methods: MethodDecl,
    instances: InstanceDecl,
    vars: VarDecl,
}

impl Graph for ProgramGraph {}

impl ProgramGraph {
    /// The identifier a declaration was introduced with.
    pub fn decl_ident(&self, decl: DeclRef) -> Result<Ident, GraphError> {
        Ok(match decl {
            DeclRef::BuiltinType(h) => self.get(h)?.name,
            DeclRef::BuiltinVar(h) => self.get(h)?.name,
            DeclRef::Generic(h) => self.get(h)?.name,
            DeclRef::Struct(h) => self.get(h)?.name,
            DeclRef::Enum(h) => self.get(h)?.name,
            DeclRef::Variant(h) => self.get(h)?.name,
            DeclRef::Function(h) => self.get(h)?.name,
            DeclRef::Interface(h) => self.get(h)?.name,
            DeclRef::Method(h) => self.get(h)?.name,
            DeclRef::Var(h) => self.get(h)?.name,
        })
    }
}

/// Top-level declarations in source order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Struct(Handle<StructDecl>),
    Enum(Handle<EnumDecl>),
    Function(Handle<FunctionDecl>),
    Interface(Handle<InterfaceDecl>),
    Instance(Handle<InstanceDecl>),
}

/// Handles of the seeded builtin environment.
#[derive(Clone, Debug)]
pub struct Builtins {
    pub type_scope: Handle<Scope>,
    pub value_scope: Handle<Scope>,
    pub int: Handle<BuiltinTypeDecl>,
    pub unit: Handle<BuiltinTypeDecl>,
    pub bool: Handle<BuiltinTypeDecl>,
    pub string: Handle<BuiltinTypeDecl>,
    pub array: Handle<BuiltinTypeDecl>,
    /// The universal `T` shared by the generic builtin signatures.
    pub universal: Handle<GenericDecl>,
    pub values: Vec<Handle<BuiltinVarDecl>>,
}

/// The output of the builder: the graph plus its entry points.
pub struct Program {
    pub graph: ProgramGraph,
    pub builtins: Builtins,
    pub global_scope: Handle<Scope>,
    pub items: Vec<Item>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = Handle<FunctionDecl>> + '_ {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(*f),
            _ => None,
        })
    }

    pub fn instances(&self) -> impl Iterator<Item = Handle<InstanceDecl>> + '_ {
        self.items.iter().filter_map(|item| match item {
            Item::Instance(i) => Some(*i),
            _ => None,
        })
    }
}
