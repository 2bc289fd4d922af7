//! Reference validation.

use crate::error::{Error, Result};
use crate::ir::{ReferenceGraph, Schemas};

use super::Pass;

/// Verifies that every `Ref` in the schemas points to a known object, that
/// object identities are unique, and that intersection chains are acyclic.
/// Purely a validation pass: the schemas flow through unchanged.
pub struct ResolveRefs;

impl Pass for ResolveRefs {
    fn name(&self) -> &'static str {
        "ResolveRefs"
    }

    fn process(&mut self, schemas: Schemas) -> Result<Schemas> {
        let graph = ReferenceGraph::from_schemas(&schemas)?;
        graph.check_resolved()?;
        if let Some(object) = graph.intersection_cycles().into_iter().next() {
            return Err(Error::IntersectionCycle { object });
        }
        Ok(schemas)
    }
}
