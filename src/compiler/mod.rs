//! Ordered composition of IR rewriting passes.
//!
//! A [`Pass`] turns the current list of schemas into a new, semantically
//! equivalent (or intentionally simplified) list. Passes run sequentially;
//! the framework performs no IR introspection of its own, it only threads
//! errors and schemas forward.

use crate::error::Result;
use crate::ir::{Schemas, Type, TypeKind};

mod disjunctions;
mod intersections;
mod nullable;
mod refs;

pub use disjunctions::{
    DisjunctionOfScalarsToEnum, DisjunctionWithNullToOptional, DisjunctionWithSingleBranchToType,
};
pub use intersections::FlattenIntersections;
pub use nullable::NotRequiredFieldAsNullableType;
pub use refs::ResolveRefs;

pub trait Pass {
    /// The name used to annotate errors produced by this pass.
    fn name(&self) -> &'static str;

    /// Rewrites the schemas. Must leave the IR semantically sound: no
    /// dangling refs, no empty disjunctions.
    fn process(&mut self, schemas: Schemas) -> Result<Schemas>;
}

/// An ordered list of passes, run front to back.
#[derive(Default)]
pub struct PassList {
    passes: Vec<Box<dyn Pass>>,
}

impl PassList {
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    /// Appends another list's passes after this one's.
    pub fn concat(mut self, other: PassList) -> Self {
        self.passes.extend(other.passes);
        self
    }

    /// Runs each pass in order, short-circuiting on the first error.
    pub fn process(&mut self, schemas: Schemas) -> Result<Schemas> {
        self.passes.iter_mut().try_fold(schemas, |schemas, pass| {
            let name = pass.name();
            pass.process(schemas).map_err(|err| err.in_pass(name))
        })
    }
}

/// The passes every target language runs, before its own.
pub fn common_passes() -> PassList {
    PassList::new(vec![
        Box::new(ResolveRefs),
        Box::new(FlattenIntersections),
        Box::new(DisjunctionWithSingleBranchToType),
        Box::new(DisjunctionWithNullToOptional),
        Box::new(DisjunctionOfScalarsToEnum),
        Box::new(NotRequiredFieldAsNullableType),
    ])
}

/// Applies `f` to every type reachable from `ty`, in post-order: arrays and
/// maps recurse into their value types, structs into each field's type,
/// disjunctions and intersections into each branch, and `f` then sees the
/// current node. `f` may replace the node it is given.
pub(crate) fn walk_type(
    ty: &mut Type,
    f: &mut impl FnMut(&mut Type) -> Result<()>,
) -> Result<()> {
    match &mut ty.kind {
        TypeKind::Array(array) => walk_type(&mut array.value_type, f)?,
        TypeKind::Map(map) => {
            walk_type(&mut map.index_type, f)?;
            walk_type(&mut map.value_type, f)?;
        }
        TypeKind::Struct(structure) => {
            for field in &mut structure.fields {
                walk_type(&mut field.ty, f)?;
            }
        }
        TypeKind::Disjunction(disjunction) => {
            for branch in &mut disjunction.branches {
                walk_type(branch, f)?;
            }
        }
        TypeKind::Intersection(intersection) => {
            for branch in &mut intersection.branches {
                walk_type(branch, f)?;
            }
        }
        TypeKind::Scalar(_) | TypeKind::Ref(_) | TypeKind::Enum(_) | TypeKind::ComposableSlot(_) => {
        }
    }
    f(ty)
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::ir::{RefType, Schema};

    use super::*;

    struct Renamer;

    impl Pass for Renamer {
        fn name(&self) -> &'static str {
            "Renamer"
        }

        fn process(&mut self, mut schemas: Schemas) -> Result<Schemas> {
            for schema in schemas.iter_mut() {
                schema.package.push_str("_out");
            }
            Ok(schemas)
        }
    }

    struct Failing;

    impl Pass for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn process(&mut self, _schemas: Schemas) -> Result<Schemas> {
            Err(Error::EmptyDisjunction {
                object: RefType::new("pkg", "Broken"),
            })
        }
    }

    #[test]
    fn test_passes_run_in_order() {
        let mut passes = PassList::new(vec![Box::new(Renamer)]).concat(PassList::new(vec![
            Box::new(Renamer),
        ]));

        let schemas = passes.process(Schemas::new(vec![Schema::new("pkg")])).unwrap();
        assert_eq!(schemas[0].package, "pkg_out_out");
    }

    #[test]
    fn test_errors_are_annotated_with_the_pass_name() {
        let mut passes = PassList::new(vec![Box::new(Renamer), Box::new(Failing)]);

        let err = passes
            .process(Schemas::new(vec![Schema::new("pkg")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[pass Failing] empty disjunction in `pkg.Broken`"
        );
    }

    #[test]
    fn test_walk_type_visits_nested_nodes_post_order() {
        use crate::ir::{StructField, Type};

        let mut ty = Type::struct_(vec![StructField::new(
            "tags",
            Type::array(Type::disjunction(vec![Type::string(), Type::null()])),
        )]);

        let mut visited = Vec::new();
        walk_type(&mut ty, &mut |node| {
            visited.push(node.kind().as_str());
            Ok(())
        })
        .unwrap();

        assert_eq!(
            visited,
            ["scalar", "scalar", "disjunction", "array", "struct"]
        );
    }
}
