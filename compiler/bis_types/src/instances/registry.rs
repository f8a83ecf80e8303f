//! The instance registry.

use std::cell::RefCell;

use bis_graph::Handle;
use rustc_hash::FxHashMap;

use crate::nodes::{InstanceDecl, InterfaceDecl};
use crate::pool::TypeDecl;

/// Every validated instance, keyed by the interface it implements and the
/// declaration of the type it implements it for.
///
/// Entries are written once, while instances are validated, and only read
/// afterwards.
#[derive(Default)]
pub struct InstanceRegistry {
    entries: RefCell<FxHashMap<(Handle<InterfaceDecl>, TypeDecl), Handle<InstanceDecl>>>,
}

impl InstanceRegistry {
    /// Record `instance`. If the pair already has an instance, that one is
    /// returned and nothing changes.
    pub fn register(
        &self,
        interface: Handle<InterfaceDecl>,
        target: TypeDecl,
        instance: Handle<InstanceDecl>,
    ) -> Result<(), Handle<InstanceDecl>> {
        let mut entries = self.entries.borrow_mut();
        if let Some(existing) = entries.get(&(interface, target)) {
            return Err(*existing);
        }
        entries.insert((interface, target), instance);
        Ok(())
    }

    pub fn lookup(&self, interface: Handle<InterfaceDecl>, target: TypeDecl) -> Option<Handle<InstanceDecl>> {
        self.entries.borrow().get(&(interface, target)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
