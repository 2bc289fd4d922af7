//! Field optionality normalization.

use crate::error::Result;
use crate::ir::{Schemas, TypeKind};

use super::{Pass, walk_type};

/// Rewrites the type of every struct field not marked `required` to be
/// nullable. Only ever flips `nullable` from `false` to `true`.
pub struct NotRequiredFieldAsNullableType;

impl Pass for NotRequiredFieldAsNullableType {
    fn name(&self) -> &'static str {
        "NotRequiredFieldAsNullableType"
    }

    fn process(&mut self, mut schemas: Schemas) -> Result<Schemas> {
        for schema in schemas.iter_mut() {
            for object in schema.objects.iter_mut() {
                walk_type(&mut object.ty, &mut |ty| {
                    let TypeKind::Struct(structure) = &mut ty.kind else {
                        return Ok(());
                    };
                    for field in &mut structure.fields {
                        if !field.required && !field.ty.nullable {
                            field.ty.nullable = true;
                            field.add_to_passes_trail("NotRequiredFieldAsNullableType[nullable=true]");
                        }
                    }
                    Ok(())
                })?;
            }
        }
        Ok(schemas)
    }
}
