//! Language-agnostic intermediate representation types.
//!
//! Every construct appearing in an input schema is normalized to a [`Type`]:
//! a tagged [`TypeKind`] plus two orthogonal attributes, `nullable` and
//! `default`. Types are deeply copyable ([`Clone`]) and structurally
//! comparable ([`PartialEq`]). Compiler passes are the only code allowed to
//! mutate them; the `passes_trail` records which passes did.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A schema type, ready for compilation and code generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Type {
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub kind: TypeKind,
    /// Append-only audit log of the compiler passes that rewrote this type.
    /// Purely diagnostic; consumers must tolerate its absence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passes_trail: Vec<String>,
}

/// The closed set of type kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Scalar(ScalarType),
    Ref(RefType),
    Array(ArrayType),
    Map(MapType),
    Struct(StructType),
    Enum(EnumType),
    Disjunction(DisjunctionType),
    Intersection(IntersectionType),
    ComposableSlot(ComposableSlotType),
}

/// A kind discriminant, for dispatching without borrowing the payload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Scalar,
    Ref,
    Array,
    Map,
    Struct,
    Enum,
    Disjunction,
    Intersection,
    ComposableSlot,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Ref => "ref",
            Self::Array => "array",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Disjunction => "disjunction",
            Self::Intersection => "intersection",
            Self::ComposableSlot => "composable_slot",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Type {
    fn of(kind: TypeKind) -> Self {
        Self {
            nullable: false,
            default: None,
            kind,
            passes_trail: Vec::new(),
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::of(TypeKind::Scalar(ScalarType {
            scalar_kind: kind,
            value: None,
            constraints: Vec::new(),
        }))
    }

    /// A scalar carrying a fixed value, acting as a constant.
    pub fn constant(kind: ScalarKind, value: Value) -> Self {
        Self::of(TypeKind::Scalar(ScalarType {
            scalar_kind: kind,
            value: Some(value),
            constraints: Vec::new(),
        }))
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn null() -> Self {
        Self::scalar(ScalarKind::Null)
    }

    pub fn ref_to(pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Self::of(TypeKind::Ref(RefType::new(pkg, name)))
    }

    pub fn array(value_type: Type) -> Self {
        Self::of(TypeKind::Array(ArrayType {
            value_type: Box::new(value_type),
        }))
    }

    pub fn map(index_type: Type, value_type: Type) -> Self {
        Self::of(TypeKind::Map(MapType {
            index_type: Box::new(index_type),
            value_type: Box::new(value_type),
        }))
    }

    pub fn struct_(fields: Vec<StructField>) -> Self {
        Self::of(TypeKind::Struct(StructType { fields }))
    }

    pub fn enum_(underlying: ScalarKind, values: Vec<EnumValue>) -> Self {
        Self::of(TypeKind::Enum(EnumType { underlying, values }))
    }

    pub fn disjunction(branches: Vec<Type>) -> Self {
        Self::of(TypeKind::Disjunction(DisjunctionType { branches }))
    }

    pub fn intersection(branches: Vec<Type>) -> Self {
        Self::of(TypeKind::Intersection(IntersectionType { branches }))
    }

    pub fn composable_slot(variant: SchemaVariant) -> Self {
        Self::of(TypeKind::ComposableSlot(ComposableSlotType { variant }))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Attaches constraints to a scalar type. Leaves other kinds unchanged.
    pub fn with_constraints(mut self, constraints: Vec<TypeConstraint>) -> Self {
        if let TypeKind::Scalar(scalar) = &mut self.kind {
            scalar.constraints = constraints;
        }
        self
    }

    pub fn kind(&self) -> Kind {
        match &self.kind {
            TypeKind::Scalar(_) => Kind::Scalar,
            TypeKind::Ref(_) => Kind::Ref,
            TypeKind::Array(_) => Kind::Array,
            TypeKind::Map(_) => Kind::Map,
            TypeKind::Struct(_) => Kind::Struct,
            TypeKind::Enum(_) => Kind::Enum,
            TypeKind::Disjunction(_) => Kind::Disjunction,
            TypeKind::Intersection(_) => Kind::Intersection,
            TypeKind::ComposableSlot(_) => Kind::ComposableSlot,
        }
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.kind() == kind
    }

    pub fn is_any_of(&self, kinds: &[Kind]) -> bool {
        kinds.contains(&self.kind())
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match &self.kind {
            TypeKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_ref_type(&self) -> Option<&RefType> {
        match &self.kind {
            TypeKind::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match &self.kind {
            TypeKind::Struct(structure) => Some(structure),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructType> {
        match &mut self.kind {
            TypeKind::Struct(structure) => Some(structure),
            _ => None,
        }
    }

    pub fn as_disjunction(&self) -> Option<&DisjunctionType> {
        match &self.kind {
            TypeKind::Disjunction(disjunction) => Some(disjunction),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.kind {
            TypeKind::Enum(enumeration) => Some(enumeration),
            _ => None,
        }
    }

    /// True for scalars of the `null` kind, regardless of the scalar's name
    /// or value.
    pub fn is_null_scalar(&self) -> bool {
        matches!(&self.kind, TypeKind::Scalar(scalar) if scalar.scalar_kind == ScalarKind::Null)
    }

    /// A short human-readable name for this type, used in passes-trail
    /// annotations.
    pub fn display_name(&self) -> String {
        match &self.kind {
            TypeKind::Scalar(scalar) => scalar.scalar_kind.as_str().to_owned(),
            TypeKind::Ref(reference) => reference.referred_type.clone(),
            _ => self.kind().as_str().to_owned(),
        }
    }

    pub fn add_to_passes_trail(&mut self, entry: impl Into<String>) {
        self.passes_trail.push(entry.into());
    }
}

/// The fixed set of primitive kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Null,
    Any,
    Bool,
    Bytes,
    String,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
        }
    }
}

/// A primitive type, optionally constrained or carrying a constant value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarType {
    pub scalar_kind: ScalarKind,
    /// Non-`None` only when this scalar is a constant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<TypeConstraint>,
}

impl ScalarType {
    /// Whether this scalar carries a fixed value.
    pub fn is_concrete(&self) -> bool {
        self.value.is_some()
    }
}

/// A value constraint attached to a scalar, e.g. `>= 0` or `in [1, 2, 3]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeConstraint {
    pub op: ConstraintOp,
    pub args: Vec<Value>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ConstraintOp {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "in")]
    In,
}

/// A reference to a named object at package scope.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RefType {
    pub referred_pkg: String,
    pub referred_type: String,
}

impl RefType {
    pub fn new(pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            referred_pkg: pkg.into(),
            referred_type: name.into(),
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.referred_pkg, self.referred_type)
    }
}

/// An ordered sequence with a single value type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub value_type: Box<Type>,
}

/// A mapping from a scalar index type to a value type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapType {
    pub index_type: Box<Type>,
    pub value_type: Box<Type>,
}

/// An ordered list of named fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn field_by_name(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_name_mut(&mut self, name: &str) -> Option<&mut StructField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passes_trail: Vec<String>,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            comments: Vec::new(),
            passes_trail: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn add_to_passes_trail(&mut self, entry: impl Into<String>) {
        self.passes_trail.push(entry.into());
    }
}

/// An enumeration over a single underlying scalar kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub underlying: ScalarKind,
    pub values: Vec<EnumValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: Value,
}

/// An unordered, non-empty "any one of" over branch types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisjunctionType {
    pub branches: Vec<Type>,
}

impl DisjunctionType {
    pub fn has_null_branch(&self) -> bool {
        self.branches.iter().any(Type::is_null_scalar)
    }

    pub fn non_null_branches(&self) -> impl Iterator<Item = &Type> {
        self.branches
            .iter()
            .filter(|branch| !branch.is_null_scalar())
    }
}

/// An "all of simultaneously" over branch types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionType {
    pub branches: Vec<Type>,
}

/// A named extension point to be filled in by a composable schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComposableSlotType {
    pub variant: SchemaVariant,
}

/// The closed set of composable schema variants defined by the schema
/// ecosystem.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum SchemaVariant {
    #[serde(rename = "panelcfg")]
    Panel,
    #[serde(rename = "dataquery")]
    DataQuery,
}

impl SchemaVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panel => "panelcfg",
            Self::DataQuery => "dataquery",
        }
    }
}
