//! Interned semantic types.
//!
//! Type syntax ([`TypeNode`](crate::nodes::TypeNode)) is resolved by the kind
//! check into [`Ty`] values. Each structurally distinct type is stored once,
//! so equal `Ty`s always denote the same type. The converse does not hold:
//! two function types that differ only in which generics they bind are
//! distinct `Ty`s, and [`identical`](crate::algebra::identical) decides
//! whether they are the same type.

use std::cell::RefCell;
use std::fmt;

use bis_graph::{GraphError, Handle};
use bis_ir::Name;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::nodes::{BuiltinTypeDecl, EnumDecl, GenericDecl, StructDecl};

/// A semantic type; an index into a [`TypePool`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ty(u32);

impl Ty {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ty({})", self.0)
    }
}

/// The declaration a named type refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDecl {
    Builtin(Handle<BuiltinTypeDecl>),
    Struct(Handle<StructDecl>),
    Enum(Handle<EnumDecl>),
    Generic(Handle<GenericDecl>),
}

impl TypeDecl {
    pub fn as_generic(self) -> Option<Handle<GenericDecl>> {
        match self {
            TypeDecl::Generic(g) => Some(g),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FnSig {
    pub generics: Vec<Handle<GenericDecl>>,
    pub effects: Vec<Name>,
    pub params: Vec<Ty>,
    pub returns: Option<Ty>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Named {
        decl: TypeDecl,
        args: SmallVec<[Ty; 2]>,
    },
    Function(FnSig),
    SelfType,
    Borrow {
        mutable: bool,
        referent: Ty,
    },
}

impl TypeData {
    /// The generic a bare generic type refers to.
    pub fn as_generic(&self) -> Option<Handle<GenericDecl>> {
        match self {
            TypeData::Named { decl, .. } => decl.as_generic(),
            _ => None,
        }
    }
}

/// Deduplicating store of [`TypeData`].
#[derive(Default)]
pub struct TypePool {
    types: RefCell<Vec<TypeData>>,
    dedup: RefCell<FxHashMap<TypeData, Ty>>,
}

impl TypePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, data: TypeData) -> Ty {
        if let Some(ty) = self.dedup.borrow().get(&data) {
            return *ty;
        }
        let mut types = self.types.borrow_mut();
        let raw = u32::try_from(types.len())
            .unwrap_or_else(|_| panic!("type pool exceeded u32::MAX types"));
        let ty = Ty(raw);
        types.push(data.clone());
        self.dedup.borrow_mut().insert(data, ty);
        ty
    }

    pub fn get(&self, ty: Ty) -> Result<TypeData, GraphError> {
        self.types
            .borrow()
            .get(ty.0 as usize)
            .cloned()
            .ok_or(GraphError::Missing {
                variety: "Type",
                index: ty.0,
            })
    }

    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.borrow().is_empty()
    }

    // ── Constructors ────────────────────────────────────────────────

    pub fn named(&self, decl: TypeDecl, args: impl IntoIterator<Item = Ty>) -> Ty {
        self.intern(TypeData::Named {
            decl,
            args: args.into_iter().collect(),
        })
    }

    pub fn generic(&self, generic: Handle<GenericDecl>) -> Ty {
        self.named(TypeDecl::Generic(generic), [])
    }

    pub fn function(&self, sig: FnSig) -> Ty {
        self.intern(TypeData::Function(sig))
    }

    pub fn self_type(&self) -> Ty {
        self.intern(TypeData::SelfType)
    }

    pub fn borrow(&self, mutable: bool, referent: Ty) -> Ty {
        self.intern(TypeData::Borrow { mutable, referent })
    }
}

#[cfg(test)]
mod tests;
