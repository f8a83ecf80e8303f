//! Scope chain operations.
//!
//! Scopes are ordinary graph nodes. Bindings are added only while the
//! builder runs, and a name is bound at most once per scope: shadowing
//! always goes through a child scope.

use bis_graph::{Graph, GraphError, Handle};
use bis_ir::Name;

use crate::graph::ProgramGraph;
use crate::nodes::{DeclRef, FunctionDecl, Scope, Stmt};

/// Bind `name` in `scope`. On a clash the existing binding is returned
/// and nothing changes.
pub fn bind(
    graph: &mut ProgramGraph,
    scope: Handle<Scope>,
    name: Name,
    decl: DeclRef,
) -> Result<Result<(), DeclRef>, GraphError> {
    let node = graph.get_mut(scope)?;
    if let Some(existing) = node.bindings.get(&name) {
        return Ok(Err(*existing));
    }
    node.bindings.insert(name, decl);
    Ok(Ok(()))
}

/// Walk the chain from `scope` outward and return the first binding.
pub fn lookup(
    graph: &ProgramGraph,
    scope: Handle<Scope>,
    name: Name,
) -> Result<Option<DeclRef>, GraphError> {
    let mut current = Some(scope);
    while let Some(handle) = current {
        let node = graph.get(handle)?;
        if let Some(decl) = node.bindings.get(&name) {
            return Ok(Some(*decl));
        }
        current = node.parent;
    }
    Ok(None)
}

/// First value found by `pick` along the chain.
fn find<T>(
    graph: &ProgramGraph,
    scope: Handle<Scope>,
    pick: impl Fn(&Scope) -> Option<T>,
) -> Result<Option<T>, GraphError> {
    let mut current = Some(scope);
    while let Some(handle) = current {
        let node = graph.get(handle)?;
        if let Some(found) = pick(node) {
            return Ok(Some(found));
        }
        current = node.parent;
    }
    Ok(None)
}

/// The function a `return` in `scope` returns from.
pub fn returns_from(
    graph: &ProgramGraph,
    scope: Handle<Scope>,
) -> Result<Option<Handle<FunctionDecl>>, GraphError> {
    find(graph, scope, |s| s.returns_from)
}

/// The loop a `break` or `continue` in `scope` targets.
pub fn breaks_from(
    graph: &ProgramGraph,
    scope: Handle<Scope>,
) -> Result<Option<Handle<Stmt>>, GraphError> {
    find(graph, scope, |s| s.breaks_from)
}

pub fn allows_self(graph: &ProgramGraph, scope: Handle<Scope>) -> Result<bool, GraphError> {
    Ok(find(graph, scope, |s| s.allows_self.then_some(()))?.is_some())
}
