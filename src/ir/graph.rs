//! The object reference graph.
//!
//! Nodes are object identities, edges are `Ref` occurrences inside each
//! object's type. The graph backs reference validation: dangling references,
//! duplicate object identities, and cycles restricted to intersection
//! branches (which must be acyclic for intersection flattening to
//! terminate). Reference cycles through struct fields are legal.

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::algo::tarjan_scc;
use petgraph::visit::{EdgeFiltered, EdgeRef};

use crate::error::{Error, Result};

use super::schema::Schemas;
use super::types::{RefType, Type, TypeKind};

/// Which construct produced a reference edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum EdgeKind {
    /// A reference reached through a field, array, map, disjunction branch,
    /// or an object aliasing another object.
    Inner,
    /// A reference that is a direct branch of an intersection.
    IntersectionBranch,
}

#[derive(Debug)]
pub struct ReferenceGraph {
    graph: DiGraph<RefType, EdgeKind>,
    /// References that point to no known object, with the object they were
    /// found in.
    unresolved: Vec<(RefType, RefType)>,
}

impl ReferenceGraph {
    pub fn from_schemas(schemas: &Schemas) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut nodes: IndexMap<RefType, NodeIndex> = IndexMap::new();

        for schema in schemas.iter() {
            for object in &schema.objects {
                if nodes.contains_key(&object.self_ref) {
                    return Err(Error::DuplicateObject {
                        object: object.self_ref.clone(),
                    });
                }
                let index = graph.add_node(object.self_ref.clone());
                nodes.insert(object.self_ref.clone(), index);
            }
        }

        let mut unresolved = Vec::new();
        for schema in schemas.iter() {
            for object in &schema.objects {
                let from = nodes[&object.self_ref];
                let mut references = Vec::new();
                collect_references(&object.ty, false, &mut references);

                for (target, kind) in references {
                    match nodes.get(&target) {
                        Some(&to) => {
                            graph.add_edge(from, to, kind);
                        }
                        None => unresolved.push((object.self_ref.clone(), target)),
                    }
                }
            }
        }

        Ok(Self { graph, unresolved })
    }

    /// Fails on the first reference that points to no known object.
    pub fn check_resolved(&self) -> Result<()> {
        match self.unresolved.first() {
            Some((origin, target)) => Err(Error::UnresolvedReference(target.clone())
                .in_package(origin.referred_pkg.clone())),
            None => Ok(()),
        }
    }

    /// Objects participating in a reference cycle made solely of
    /// intersection-branch edges.
    pub fn intersection_cycles(&self) -> Vec<RefType> {
        let filtered = EdgeFiltered::from_fn(&self.graph, |edge| {
            *edge.weight() == EdgeKind::IntersectionBranch
        });

        let mut cyclic = Vec::new();
        for component in tarjan_scc(&filtered) {
            let is_cycle = component.len() > 1
                || component.iter().any(|&node| {
                    self.graph.edges(node).any(|edge| {
                        edge.target() == node && *edge.weight() == EdgeKind::IntersectionBranch
                    })
                });
            if is_cycle {
                cyclic.extend(component.iter().map(|&node| self.graph[node].clone()));
            }
        }

        cyclic
    }
}

fn collect_references(ty: &Type, intersection_branch: bool, out: &mut Vec<(RefType, EdgeKind)>) {
    match &ty.kind {
        TypeKind::Ref(reference) => {
            let kind = if intersection_branch {
                EdgeKind::IntersectionBranch
            } else {
                EdgeKind::Inner
            };
            out.push((reference.clone(), kind));
        }
        TypeKind::Array(array) => collect_references(&array.value_type, false, out),
        TypeKind::Map(map) => {
            collect_references(&map.index_type, false, out);
            collect_references(&map.value_type, false, out);
        }
        TypeKind::Struct(structure) => {
            for field in &structure.fields {
                collect_references(&field.ty, false, out);
            }
        }
        TypeKind::Disjunction(disjunction) => {
            for branch in &disjunction.branches {
                collect_references(branch, false, out);
            }
        }
        TypeKind::Intersection(intersection) => {
            for branch in &intersection.branches {
                collect_references(branch, true, out);
            }
        }
        TypeKind::Scalar(_) | TypeKind::Enum(_) | TypeKind::ComposableSlot(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::{Object, Schema, StructField};

    use super::*;

    #[test]
    fn test_dangling_reference_is_reported() {
        let schemas = Schemas::new(vec![Schema::new("pkg").with_object(Object::new(
            "pkg",
            "Holder",
            Type::struct_(vec![StructField::new("field", Type::ref_to("pkg", "Missing"))]),
        ))]);

        let graph = ReferenceGraph::from_schemas(&schemas).unwrap();
        let err = graph.check_resolved().unwrap_err();
        assert_eq!(
            err.to_string(),
            "[package pkg] reference `pkg.Missing` could not be resolved"
        );
    }

    #[test]
    fn test_field_cycles_are_legal() {
        // Linked-list shape: a struct whose field refers back to itself.
        let schemas = Schemas::new(vec![Schema::new("pkg").with_object(Object::new(
            "pkg",
            "Node",
            Type::struct_(vec![StructField::new("next", Type::ref_to("pkg", "Node"))]),
        ))]);

        let graph = ReferenceGraph::from_schemas(&schemas).unwrap();
        graph.check_resolved().unwrap();
        assert!(graph.intersection_cycles().is_empty());
    }

    #[test]
    fn test_intersection_cycle_is_detected() {
        let schemas = Schemas::new(vec![
            Schema::new("pkg")
                .with_object(Object::new(
                    "pkg",
                    "A",
                    Type::intersection(vec![Type::ref_to("pkg", "B")]),
                ))
                .with_object(Object::new(
                    "pkg",
                    "B",
                    Type::intersection(vec![Type::ref_to("pkg", "A")]),
                )),
        ]);

        let graph = ReferenceGraph::from_schemas(&schemas).unwrap();
        let cyclic = graph.intersection_cycles();
        assert_eq!(cyclic.len(), 2);
    }

    #[test]
    fn test_duplicate_object_identity() {
        let schemas = Schemas::new(vec![
            Schema::new("pkg").with_object(Object::new("pkg", "Thing", Type::string())),
            Schema::new("pkg").with_object(Object::new("pkg", "Thing", Type::null())),
        ]);

        let err = ReferenceGraph::from_schemas(&schemas).unwrap_err();
        assert!(matches!(err, Error::DuplicateObject { .. }));
    }
}
