//! Schema files and their ordered object containers.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{Kind, RefType, Type};

/// A named type at package scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// This object's own `(package, name)` identity.
    pub self_ref: RefType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl Object {
    pub fn new(pkg: impl Into<String>, name: impl Into<String>, ty: Type) -> Self {
        let pkg = pkg.into();
        let name = name.into();
        Self {
            self_ref: RefType::new(pkg, name.clone()),
            name,
            ty,
            comments: Vec::new(),
        }
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// The kind hint for this object, derived from its type.
    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }
}

/// An insertion-ordered mapping from object name to [`Object`].
///
/// Emitters produce declarations in the order objects were inserted, so the
/// container preserves that order across updates and removals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectMap(IndexMap<String, Object>);

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Object> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Object> {
        self.0.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Inserts or overwrites an object, keyed by its name. Updating an
    /// existing entry keeps its position.
    pub fn set(&mut self, object: Object) {
        self.0.insert(object.name.clone(), object);
    }

    /// Removes an object, shifting later entries so relative order is kept.
    pub fn remove(&mut self, name: &str) -> Option<Object> {
        self.0.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.0.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.0.values_mut()
    }

    /// Produces a new container with each object transformed. Entries keep
    /// their original keys and positions.
    pub fn map(&self, mut f: impl FnMut(&Object) -> Object) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, object)| (name.clone(), f(object)))
                .collect(),
        )
    }

    pub fn filter(&self, mut pred: impl FnMut(&Object) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, object)| pred(object))
                .map(|(name, object)| (name.clone(), object.clone()))
                .collect(),
        )
    }
}

impl FromIterator<Object> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|object| (object.name.clone(), object))
                .collect(),
        )
    }
}

impl IntoIterator for ObjectMap {
    type Item = Object;
    type IntoIter = indexmap::map::IntoValues<String, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

impl<'a> IntoIterator for &'a ObjectMap {
    type Item = &'a Object;
    type IntoIter = indexmap::map::Values<'a, String, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}

/// A single schema file: a package and its objects, in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub package: String,
    #[serde(default)]
    pub objects: ObjectMap,
}

impl Schema {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            objects: ObjectMap::new(),
        }
    }

    pub fn with_object(mut self, object: Object) -> Self {
        self.objects.set(object);
        self
    }

    pub fn locate_object(&self, name: &str) -> Option<&Object> {
        self.objects.get(name)
    }
}

/// The list of schemas flowing through the compilation pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schemas(pub Vec<Schema>);

impl Schemas {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self(schemas)
    }

    /// Looks up an object by its `(package, name)` identity.
    pub fn locate_object(&self, pkg: &str, name: &str) -> Option<&Object> {
        self.0
            .iter()
            .find(|schema| schema.package == pkg)
            .and_then(|schema| schema.locate_object(name))
    }

    pub fn resolve_ref(&self, reference: &RefType) -> Option<&Object> {
        self.locate_object(&reference.referred_pkg, &reference.referred_type)
    }
}

impl Deref for Schemas {
    type Target = Vec<Schema>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Schemas {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<Schema> for Schemas {
    fn from_iter<I: IntoIterator<Item = Schema>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Schemas {
    type Item = Schema;
    type IntoIter = std::vec::IntoIter<Schema>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ir::{ScalarKind, StructField};

    use super::*;

    fn sample_map() -> ObjectMap {
        ["First", "Second", "Third"]
            .into_iter()
            .map(|name| Object::new("pkg", name, Type::string()))
            .collect()
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let objects = sample_map();
        let names: Vec<_> = objects.iter().map(|object| object.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn test_set_keeps_position_on_update() {
        let mut objects = sample_map();
        objects.set(Object::new("pkg", "Second", Type::scalar(ScalarKind::Bool)));

        let names: Vec<_> = objects.iter().map(|object| object.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);

        let updated = objects.get("Second").unwrap();
        assert_eq!(updated.ty.as_scalar().unwrap().scalar_kind, ScalarKind::Bool);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut objects = sample_map();
        objects.remove("Second");

        let names: Vec<_> = objects.iter().map(|object| object.name.as_str()).collect();
        assert_eq!(names, ["First", "Third"]);
    }

    #[test]
    fn test_map_and_filter() {
        let objects = sample_map();

        let mapped = objects.map(|object| {
            let mut object = object.clone();
            object.comments = vec!["mapped".to_owned()];
            object
        });
        assert!(mapped.iter().all(|object| object.comments == ["mapped"]));

        let filtered = objects.filter(|object| object.name != "Second");
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_locate_object_across_packages() {
        let schemas = Schemas::new(vec![
            Schema::new("alpha").with_object(Object::new("alpha", "Thing", Type::string())),
            Schema::new("beta").with_object(Object::new("beta", "Thing", Type::null())),
        ]);

        let thing = schemas.locate_object("beta", "Thing").unwrap();
        assert_eq!(thing.self_ref, RefType::new("beta", "Thing"));
        assert!(schemas.locate_object("gamma", "Thing").is_none());
    }

    #[test]
    fn test_schema_deserializes_from_ir_file() {
        // The shape external front-ends hand to the core.
        let schema: Schema = serde_json::from_str(indoc::indoc! {r#"
            {
                "package": "events",
                "objects": {
                    "Event": {
                        "name": "Event",
                        "self_ref": {"referred_pkg": "events", "referred_type": "Event"},
                        "type": {
                            "kind": "struct",
                            "fields": [
                                {"name": "id", "required": true, "type": {"kind": "scalar", "scalar_kind": "string"}}
                            ]
                        }
                    }
                }
            }
        "#})
        .unwrap();

        let object = schema.locate_object("Event").unwrap();
        let expected = Type::struct_(vec![StructField::new("id", Type::string()).required()]);
        assert_eq!(object.ty, expected);
    }
}
