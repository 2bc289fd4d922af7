//! Representation of fluent builder APIs.
//!
//! A [`Builder`] describes how to construct one struct-kinded object:
//! initializations applied at construction time, fluent option setters, and
//! the paths their assignments write to. Veneers restructure this freely;
//! the originating schema and object stay borrowed and read-only.

use std::fmt;
use std::ops::{Deref, DerefMut};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::ir::{Object, Schema, StructField, Type, TypeConstraint, TypeKind};

#[derive(Clone, Debug, PartialEq)]
pub struct Builder<'a> {
    /// Original data the builder was derived from, kept for read-only access
    /// by jennies and veneers.
    pub schema: &'a Schema,
    pub object: &'a Object,

    // Everything below is derived state that veneers may manipulate.
    pub package: String,
    pub name: String,
    /// Struct fields exposed directly instead of through an option.
    pub properties: Vec<StructField>,
    pub options: Vec<BuilderOption>,
    /// Assignments applied at construction time, e.g. discriminator
    /// constants.
    pub initializations: Vec<Assignment>,
    /// Append-only audit log of the veneer rules applied to this builder.
    pub veneer_trail: Vec<String>,
}

impl<'a> Builder<'a> {
    pub fn add_to_veneer_trail(&mut self, rule: impl Into<String>) {
        self.veneer_trail.push(rule.into());
    }

    /// Resolves a dotted field traversal, e.g. `"bounds.top"`, against this
    /// builder's underlying struct. `Ref` hops resolve through the builder
    /// derived for the referenced object.
    pub fn make_path(&self, builders: &Builders<'_>, path_as_string: &str) -> Result<Path> {
        if path_as_string.is_empty() {
            return Err(Error::EmptyPathInput);
        }

        let mut current = &self.object.ty;
        let mut path = Path::default();

        for part in path_as_string.split('.') {
            if let TypeKind::Ref(reference) = &current.kind {
                let referred = builders
                    .locate_by_object(&reference.referred_pkg, &reference.referred_type)
                    .ok_or_else(|| Error::UnresolvedPathReference {
                        path: path_as_string.to_owned(),
                        reference: reference.clone(),
                    })?;
                current = &referred.object.ty;
            }

            let structure = current
                .as_struct()
                .ok_or_else(|| Error::PathThroughNonStruct {
                    path: path_as_string.to_owned(),
                    traversed: path.to_string(),
                })?;
            let field =
                structure
                    .field_by_name(part)
                    .ok_or_else(|| Error::PathFieldNotFound {
                        path: path_as_string.to_owned(),
                        field: part.to_owned(),
                        traversed: path.to_string(),
                    })?;

            path.push(PathItem {
                identifier: part.to_owned(),
                ty: field.ty.clone(),
                type_hint: None,
            });
            current = &field.ty;
        }

        Ok(path)
    }
}

/// The flat list of builders for one target language.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Builders<'a>(pub Vec<Builder<'a>>);

impl<'a> Builders<'a> {
    /// Finds the builder derived from the object with the given
    /// `(package, name)` identity.
    pub fn locate_by_object(&self, pkg: &str, name: &str) -> Option<&Builder<'a>> {
        self.0.iter().find(|builder| {
            builder.object.self_ref.referred_pkg == pkg
                && builder.object.self_ref.referred_type == name
        })
    }
}

impl<'a> Deref for Builders<'a> {
    type Target = Vec<Builder<'a>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Builders<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for Builders<'a> {
    type Item = Builder<'a>;
    type IntoIter = std::vec::IntoIter<Builder<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// One fluent setter.
#[derive(Clone, Debug, PartialEq)]
pub struct BuilderOption {
    pub name: String,
    pub comments: Vec<String>,
    pub veneer_trail: Vec<String>,
    pub args: Vec<Argument>,
    pub assignments: Vec<Assignment>,
    pub default: Option<OptionDefault>,
    /// Promoted from fluent to mandatory: the option becomes a constructor
    /// argument.
    pub is_constructor_arg: bool,
}

impl BuilderOption {
    pub fn add_to_veneer_trail(&mut self, rule: impl Into<String>) {
        self.veneer_trail.push(rule.into());
    }

    /// Reconstructs the struct field this option writes to, from its first
    /// assignment's path. Used when an option is exposed as a direct
    /// property instead of a setter.
    pub fn as_struct_field(&self) -> Option<StructField> {
        let item = self.assignments.first()?.path.last()?;
        Some(StructField {
            name: item.identifier.clone(),
            ty: item.ty.clone(),
            required: false,
            comments: self.comments.clone(),
            passes_trail: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptionDefault {
    pub args_values: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: String,
    pub ty: Type,
}

/// A dotted traversal through nested struct fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path(Vec<PathItem>);

impl Path {
    pub fn from_field(field: &StructField) -> Self {
        Self(vec![PathItem {
            identifier: field.name.clone(),
            ty: field.ty.clone(),
            type_hint: None,
        }])
    }

    pub fn push(&mut self, item: PathItem) {
        self.0.push(item);
    }

    pub fn append(&self, suffix: &Path) -> Path {
        Self(self.0.iter().chain(&suffix.0).cloned().collect())
    }

    pub fn last(&self) -> Option<&PathItem> {
        self.0.last()
    }

    /// The suffix left after removing `prefix`, compared by identifiers.
    /// `None` when this path doesn't start with `prefix`.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        self.strip_identifier_prefix(prefix.0.iter().map(|item| item.identifier.as_str()))
    }

    /// Like [`Path::strip_prefix`], for a prefix given as bare identifiers.
    /// Used when the prefix no longer resolves against the current schema.
    pub fn strip_identifier_prefix<'p>(
        &self,
        prefix: impl IntoIterator<Item = &'p str>,
    ) -> Option<Path> {
        let mut len = 0;
        for identifier in prefix {
            if self.0.get(len).map(|item| item.identifier.as_str()) != Some(identifier) {
                return None;
            }
            len += 1;
        }
        Some(Self(self.0[len..].to_vec()))
    }
}

impl Deref for Path {
    type Target = [PathItem];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<PathItem>> for Path {
    fn from(items: Vec<PathItem>) -> Self {
        Self(items)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0.iter().map(|item| item.identifier.as_str()).join(".")
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathItem {
    pub identifier: String,
    pub ty: Type,
    /// Set when the field's type is `any` and something of a known type is
    /// being composed in.
    pub type_hint: Option<Type>,
}

/// How an assignment writes its value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMethod {
    /// `foo = bar`
    Direct,
    /// `foo = append(foo, bar)`
    Append,
}

/// What gets assigned: exactly one of an argument, a constant, or an
/// envelope of sub-path writes.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignmentValue {
    Argument(Argument),
    Constant(Value),
    Envelope(AssignmentEnvelope),
}

/// Multiple `(sub-path, value)` writes packaged into a single assignment
/// whose target is a struct or a ref to one.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentEnvelope {
    pub ty: Type,
    pub values: Vec<EnvelopeFieldValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnvelopeFieldValue {
    /// Where to assign within the envelope's struct.
    pub path: Path,
    pub value: AssignmentValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// Where.
    pub path: Path,
    /// What.
    pub value: AssignmentValue,
    /// How.
    pub method: AssignmentMethod,
    /// Constraints inherited from the scalar field being assigned.
    pub constraints: Vec<TypeConstraint>,
}

impl Assignment {
    pub fn constant(path: Path, value: Value) -> Self {
        Self {
            path,
            value: AssignmentValue::Constant(value),
            method: AssignmentMethod::Direct,
            constraints: Vec::new(),
        }
    }

    pub fn from_argument(path: Path, argument: Argument) -> Self {
        Self {
            path,
            value: AssignmentValue::Argument(argument),
            method: AssignmentMethod::Direct,
            constraints: Vec::new(),
        }
    }

    /// A direct assignment of the field's value into the field's own path,
    /// carrying the constraints of a scalar field.
    pub fn from_field(field: &StructField) -> Self {
        let constraints = field
            .ty
            .as_scalar()
            .map(|scalar| scalar.constraints.clone())
            .unwrap_or_default();

        Self::from_argument(
            Path::from_field(field),
            Argument {
                name: field.name.clone(),
                ty: field.ty.clone(),
            },
        )
        .with_constraints(constraints)
    }

    pub fn with_method(mut self, method: AssignmentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<TypeConstraint>) -> Self {
        self.constraints = constraints;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::ir::{ConstraintOp, ScalarKind};

    use super::*;

    #[test]
    fn test_path_display_and_prefix() {
        let bounds = PathItem {
            identifier: "bounds".to_owned(),
            ty: Type::ref_to("pkg", "Bounds"),
            type_hint: None,
        };
        let top = PathItem {
            identifier: "top".to_owned(),
            ty: Type::scalar(ScalarKind::Float64),
            type_hint: None,
        };

        let path = Path::from(vec![bounds.clone(), top]);
        assert_eq!(path.to_string(), "bounds.top");

        let suffix = path.strip_prefix(&Path::from(vec![bounds])).unwrap();
        assert_eq!(suffix.to_string(), "top");

        let other = Path::from_field(&StructField::new("title", Type::string()));
        assert!(path.strip_prefix(&other).is_none());
    }

    #[test]
    fn test_from_field_carries_scalar_constraints() {
        let field = StructField::new(
            "size",
            Type::scalar(ScalarKind::Int64).with_constraints(vec![TypeConstraint {
                op: ConstraintOp::GreaterThanOrEqual,
                args: vec![json!(0)],
            }]),
        );

        let assignment = Assignment::from_field(&field);
        assert_eq!(assignment.method, AssignmentMethod::Direct);
        assert_eq!(assignment.constraints.len(), 1);
        assert_eq!(assignment.path.to_string(), "size");
        assert!(matches!(
            &assignment.value,
            AssignmentValue::Argument(argument) if argument.name == "size"
        ));
    }
}
