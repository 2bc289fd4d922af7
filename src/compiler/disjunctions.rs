//! Disjunction normalization passes.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::ir::{EnumValue, RefType, ScalarKind, Schemas, Type, TypeKind};

use super::{Pass, walk_type};

/// Simplifies two-branch disjunctions where one branch is `null`: the other
/// branch survives, marked nullable.
///
/// ```text
/// MaybeString: string | null
/// ```
///
/// becomes
///
/// ```text
/// MaybeString?: string
/// ```
pub struct DisjunctionWithNullToOptional;

impl Pass for DisjunctionWithNullToOptional {
    fn name(&self) -> &'static str {
        "DisjunctionWithNullToOptional"
    }

    fn process(&mut self, mut schemas: Schemas) -> Result<Schemas> {
        for schema in schemas.iter_mut() {
            for object in schema.objects.iter_mut() {
                walk_type(&mut object.ty, &mut |ty| {
                    simplify_nullable(ty);
                    Ok(())
                })?;
            }
        }
        Ok(schemas)
    }
}

fn simplify_nullable(ty: &mut Type) {
    let TypeKind::Disjunction(disjunction) = &ty.kind else {
        return;
    };
    if disjunction.branches.len() != 2 || !disjunction.has_null_branch() {
        return;
    }
    // Both branches being `null` leaves nothing to survive.
    let Some(mut surviving) = disjunction.non_null_branches().next().cloned() else {
        return;
    };

    surviving.nullable = true;
    surviving.add_to_passes_trail(format!(
        "DisjunctionWithNullToOptional[{name}|null → {name}?]",
        name = surviving.display_name()
    ));
    *ty = surviving;
}

/// Collapses single-branch disjunctions into their branch. A disjunction
/// with no branches at all is an invariant violation and aborts the
/// compilation.
pub struct DisjunctionWithSingleBranchToType;

impl Pass for DisjunctionWithSingleBranchToType {
    fn name(&self) -> &'static str {
        "DisjunctionWithSingleBranchToType"
    }

    fn process(&mut self, mut schemas: Schemas) -> Result<Schemas> {
        for schema in schemas.iter_mut() {
            let package = schema.package.clone();
            for object in schema.objects.iter_mut() {
                let self_ref = object.self_ref.clone();
                walk_type(&mut object.ty, &mut |ty| collapse_single(ty, &self_ref))
                    .map_err(|err| err.in_package(package.clone()))?;
            }
        }
        Ok(schemas)
    }
}

fn collapse_single(ty: &mut Type, object: &RefType) -> Result<()> {
    let TypeKind::Disjunction(disjunction) = &mut ty.kind else {
        return Ok(());
    };
    match disjunction.branches.len() {
        0 => Err(Error::EmptyDisjunction {
            object: object.clone(),
        }),
        1 => {
            let mut surviving = disjunction.branches.remove(0);
            surviving.nullable |= ty.nullable;
            if surviving.default.is_none() {
                surviving.default = ty.default.take();
            }
            surviving.add_to_passes_trail(format!(
                "DisjunctionWithSingleBranchToType[{}]",
                surviving.display_name()
            ));
            *ty = surviving;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Lifts disjunctions whose branches are all concrete scalars of the same
/// kind into an enum over that kind.
pub struct DisjunctionOfScalarsToEnum;

impl Pass for DisjunctionOfScalarsToEnum {
    fn name(&self) -> &'static str {
        "DisjunctionOfScalarsToEnum"
    }

    fn process(&mut self, mut schemas: Schemas) -> Result<Schemas> {
        for schema in schemas.iter_mut() {
            for object in schema.objects.iter_mut() {
                walk_type(&mut object.ty, &mut |ty| {
                    lift_to_enum(ty);
                    Ok(())
                })?;
            }
        }
        Ok(schemas)
    }
}

fn lift_to_enum(ty: &mut Type) {
    let TypeKind::Disjunction(disjunction) = &ty.kind else {
        return;
    };
    if disjunction.branches.len() < 2 {
        return;
    }

    let mut kind: Option<ScalarKind> = None;
    let mut values = Vec::with_capacity(disjunction.branches.len());
    for branch in &disjunction.branches {
        let Some(scalar) = branch.as_scalar() else {
            return;
        };
        let Some(value) = &scalar.value else {
            return;
        };
        match kind {
            None => kind = Some(scalar.scalar_kind),
            Some(kind) if kind == scalar.scalar_kind => {}
            Some(_) => return,
        }
        values.push(EnumValue {
            name: enum_member_name(value),
            value: value.clone(),
        });
    }
    let Some(kind) = kind else {
        return;
    };

    let mut lifted = Type::enum_(kind, values);
    lifted.nullable = ty.nullable;
    lifted.default = ty.default.clone();
    lifted.passes_trail = ty.passes_trail.clone();
    lifted.add_to_passes_trail(format!("DisjunctionOfScalarsToEnum[{}]", kind.as_str()));
    *ty = lifted;
}

fn enum_member_name(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::ir::{Object, Schema, StructField};

    use super::*;

    fn single_object_schemas(ty: Type) -> Schemas {
        Schemas::new(vec![
            Schema::new("pkg").with_object(Object::new("pkg", "Subject", ty)),
        ])
    }

    fn subject(schemas: &Schemas) -> &Type {
        &schemas.locate_object("pkg", "Subject").unwrap().ty
    }

    #[test]
    fn test_null_disjunction_becomes_nullable() {
        let schemas = single_object_schemas(Type::struct_(vec![
            StructField::new(
                "name",
                Type::disjunction(vec![Type::string(), Type::null()]),
            )
            .required(),
        ]));

        let schemas = DisjunctionWithNullToOptional.process(schemas).unwrap();

        let field = &subject(&schemas).as_struct().unwrap().fields[0];
        assert_eq!(field.ty.kind(), crate::ir::Kind::Scalar);
        assert!(field.ty.nullable);
        assert_eq!(
            field.ty.passes_trail,
            ["DisjunctionWithNullToOptional[string|null → string?]"]
        );
    }

    #[test]
    fn test_null_simplification_is_idempotent() {
        let schemas = single_object_schemas(Type::disjunction(vec![
            Type::ref_to("pkg", "Other"),
            Type::null(),
        ]));

        let once = DisjunctionWithNullToOptional.process(schemas).unwrap();
        let twice = DisjunctionWithNullToOptional.process(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_three_branch_disjunctions_are_left_alone() {
        let schemas = single_object_schemas(Type::disjunction(vec![
            Type::string(),
            Type::scalar(ScalarKind::Bool),
            Type::null(),
        ]));

        let schemas = DisjunctionWithNullToOptional.process(schemas).unwrap();
        assert_eq!(subject(&schemas).kind(), crate::ir::Kind::Disjunction);
    }

    #[test]
    fn test_single_branch_disjunction_collapses() {
        let schemas = single_object_schemas(Type::disjunction(vec![Type::string()]).nullable());

        let schemas = DisjunctionWithSingleBranchToType.process(schemas).unwrap();

        let ty = subject(&schemas);
        assert_eq!(ty.kind(), crate::ir::Kind::Scalar);
        assert!(ty.nullable);
    }

    #[test]
    fn test_empty_disjunction_aborts() {
        let schemas = single_object_schemas(Type::disjunction(vec![]));

        let err = DisjunctionWithSingleBranchToType
            .process(schemas)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[package pkg] empty disjunction in `pkg.Subject`"
        );
    }

    #[test]
    fn test_concrete_scalars_lift_to_enum() {
        let schemas = single_object_schemas(Type::disjunction(vec![
            Type::constant(ScalarKind::String, json!("up")),
            Type::constant(ScalarKind::String, json!("down")),
        ]));

        let schemas = DisjunctionOfScalarsToEnum.process(schemas).unwrap();

        let enumeration = subject(&schemas).as_enum().unwrap();
        assert_eq!(enumeration.underlying, ScalarKind::String);
        let names: Vec<_> = enumeration
            .values
            .iter()
            .map(|member| member.name.as_str())
            .collect();
        assert_eq!(names, ["up", "down"]);
    }

    #[test]
    fn test_mixed_kinds_do_not_lift() {
        let schemas = single_object_schemas(Type::disjunction(vec![
            Type::constant(ScalarKind::String, json!("up")),
            Type::constant(ScalarKind::Int64, json!(1)),
        ]));

        let schemas = DisjunctionOfScalarsToEnum.process(schemas).unwrap();
        assert_eq!(subject(&schemas).kind(), crate::ir::Kind::Disjunction);
    }

    #[test]
    fn test_non_concrete_scalars_do_not_lift() {
        let schemas = single_object_schemas(Type::disjunction(vec![
            Type::string(),
            Type::constant(ScalarKind::String, json!("up")),
        ]));

        let schemas = DisjunctionOfScalarsToEnum.process(schemas).unwrap();
        assert_eq!(subject(&schemas).kind(), crate::ir::Kind::Disjunction);
    }
}
