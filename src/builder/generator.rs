//! Builder synthesis: derives the builder IR from compiled schemas.

use serde_json::Value;

use crate::ir::{Object, Schema, Schemas, StructField, StructType, TypeKind};

use super::types::{Argument, Assignment, Builder, BuilderOption, Builders, OptionDefault, Path};

/// Derives one [`Builder`] per struct-kinded object (or ref resolving to
/// one) across all schemas.
pub struct BuilderGenerator<'a> {
    schemas: &'a Schemas,
}

impl<'a> BuilderGenerator<'a> {
    pub fn new(schemas: &'a Schemas) -> Self {
        Self { schemas }
    }

    pub fn generate(&self) -> Builders<'a> {
        let mut builders = Vec::new();
        for schema in self.schemas.iter() {
            for object in &schema.objects {
                if let Some(structure) = self.buildable_struct(object) {
                    builders.push(self.builder_for(schema, object, structure));
                }
            }
        }
        Builders(builders)
    }

    /// Builders are wanted for structs, and for objects aliasing a struct in
    /// another object. Everything else is skipped.
    fn buildable_struct(&self, object: &'a Object) -> Option<&'a StructType> {
        match &object.ty.kind {
            TypeKind::Struct(structure) => Some(structure),
            TypeKind::Ref(reference) => self.schemas.resolve_ref(reference)?.ty.as_struct(),
            _ => None,
        }
    }

    fn builder_for(
        &self,
        schema: &'a Schema,
        object: &'a Object,
        structure: &StructType,
    ) -> Builder<'a> {
        let mut builder = Builder {
            schema,
            object,
            package: schema.package.clone(),
            name: object.name.clone(),
            properties: Vec::new(),
            options: Vec::new(),
            initializations: Vec::new(),
            veneer_trail: Vec::new(),
        };

        for field in &structure.fields {
            // A concrete scalar has its value hard-coded at build time.
            if let Some(value) = field.ty.as_scalar().and_then(|scalar| scalar.value.clone()) {
                builder
                    .initializations
                    .push(Assignment::constant(Path::from_field(field), value));
                continue;
            }
            // Discriminator promotion: a mandatory ref to a constant is also
            // initialized with the referenced value.
            if field.required
                && !field.ty.nullable
                && let Some(value) = self.referenced_concrete_value(field)
            {
                builder
                    .initializations
                    .push(Assignment::constant(Path::from_field(field), value));
                continue;
            }

            builder.options.push(field_option(field));
        }

        builder
    }

    fn referenced_concrete_value(&self, field: &StructField) -> Option<Value> {
        let reference = field.ty.as_ref_type()?;
        let referred = self.schemas.resolve_ref(reference)?;
        referred
            .ty
            .as_scalar()
            .filter(|scalar| scalar.is_concrete())?
            .value
            .clone()
    }
}

fn field_option(field: &StructField) -> BuilderOption {
    BuilderOption {
        name: field.name.clone(),
        comments: field.comments.clone(),
        veneer_trail: Vec::new(),
        args: vec![Argument {
            name: field.name.clone(),
            ty: field.ty.clone(),
        }],
        assignments: vec![Assignment::from_field(field)],
        default: field.ty.default.as_ref().map(|default| OptionDefault {
            args_values: vec![default.clone()],
        }),
        is_constructor_arg: false,
    }
}
