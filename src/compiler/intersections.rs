//! Intersection flattening.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::ir::{RefType, Schemas, StructField, Type, TypeKind};

use super::{Pass, walk_type};

/// Merges intersections of structs (and refs to structs) into a single
/// struct. Branch order is preserved; a later branch redefining a field
/// replaces the earlier definition in place.
///
/// Branches that reach anything other than a struct are a shape error, and
/// reference chains are cut with a visited set so a cyclic input cannot
/// recurse forever.
pub struct FlattenIntersections;

impl Pass for FlattenIntersections {
    fn name(&self) -> &'static str {
        "FlattenIntersections"
    }

    fn process(&mut self, mut schemas: Schemas) -> Result<Schemas> {
        // Reference targets are looked up in the pre-pass state, so branches
        // observe their siblings unflattened.
        let snapshot = schemas.clone();

        for schema in schemas.iter_mut() {
            let package = schema.package.clone();
            for object in schema.objects.iter_mut() {
                let self_ref = object.self_ref.clone();
                walk_type(&mut object.ty, &mut |ty| flatten(ty, &snapshot, &self_ref))
                    .map_err(|err| err.in_package(package.clone()))?;
            }
        }
        Ok(schemas)
    }
}

fn flatten(ty: &mut Type, schemas: &Schemas, object: &RefType) -> Result<()> {
    let TypeKind::Intersection(intersection) = &ty.kind else {
        return Ok(());
    };

    let mut fields: Vec<StructField> = Vec::new();
    let mut visited = HashSet::new();
    let branch_count = intersection.branches.len();
    for branch in &intersection.branches {
        for field in branch_fields(schemas, branch, object, &mut visited)? {
            match fields.iter().position(|existing| existing.name == field.name) {
                Some(index) => fields[index] = field,
                None => fields.push(field),
            }
        }
    }

    let mut merged = Type::struct_(fields);
    merged.nullable = ty.nullable;
    merged.default = ty.default.clone();
    merged.passes_trail = ty.passes_trail.clone();
    merged.add_to_passes_trail(format!("FlattenIntersections[{branch_count} branches]"));
    *ty = merged;
    Ok(())
}

fn branch_fields(
    schemas: &Schemas,
    branch: &Type,
    object: &RefType,
    visited: &mut HashSet<RefType>,
) -> Result<Vec<StructField>> {
    match &branch.kind {
        TypeKind::Struct(structure) => Ok(structure.fields.clone()),
        TypeKind::Ref(reference) => {
            if !visited.insert(reference.clone()) {
                // Reference already followed during this merge; cut the cycle.
                return Ok(Vec::new());
            }
            let target = schemas
                .resolve_ref(reference)
                .ok_or_else(|| Error::UnresolvedReference(reference.clone()))?;
            branch_fields(schemas, &target.ty, object, visited)
        }
        TypeKind::Intersection(nested) => {
            let mut fields = Vec::new();
            for branch in &nested.branches {
                fields.extend(branch_fields(schemas, branch, object, visited)?);
            }
            Ok(fields)
        }
        _ => Err(Error::UnmergeableIntersectionBranch {
            object: object.clone(),
            kind: branch.kind(),
        }),
    }
}
