//! Type classifier: `(declared type, nullable)` → `FieldStrategy`.
//!
//! Scalars go through a lookup table keyed by `(ScalarKind, nullable)`; lists
//! and maps are the two structural arms. Everything else is `Unsupported`.
use serde::Serialize;

use crate::runtime::Shape;
use crate::schema::{Field, ScalarKind, Schema, TypeRef};

/// Value substituted for an absent or mismatched defaulted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ZeroValue {
    EmptyString,
    ZeroFloat,
    ZeroInt,
    False,
    EmptyList,
    EmptyMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldStrategy {
    StrictScalar(ScalarKind),
    StrictList(ScalarKind),
    StrictMap,
    DefaultedScalar(ScalarKind, ZeroValue),
    DefaultedList(ScalarKind),
    DefaultedMap,
    Unsupported(String),
}

const SCALAR_RULES: [((ScalarKind, bool), FieldStrategy); 8] = [
    ((ScalarKind::String, false), FieldStrategy::StrictScalar(ScalarKind::String)),
    ((ScalarKind::String, true), FieldStrategy::DefaultedScalar(ScalarKind::String, ZeroValue::EmptyString)),
    ((ScalarKind::Float, false), FieldStrategy::StrictScalar(ScalarKind::Float)),
    ((ScalarKind::Float, true), FieldStrategy::DefaultedScalar(ScalarKind::Float, ZeroValue::ZeroFloat)),
    ((ScalarKind::Int, false), FieldStrategy::StrictScalar(ScalarKind::Int)),
    ((ScalarKind::Int, true), FieldStrategy::DefaultedScalar(ScalarKind::Int, ZeroValue::ZeroInt)),
    ((ScalarKind::Boolean, false), FieldStrategy::StrictScalar(ScalarKind::Boolean)),
    ((ScalarKind::Boolean, true), FieldStrategy::DefaultedScalar(ScalarKind::Boolean, ZeroValue::False)),
];

pub fn classify(declared: &TypeRef, nullable: bool) -> FieldStrategy {
    match declared {
        TypeRef::Scalar(kind) => SCALAR_RULES
            .iter()
            .find(|(key, _)| *key == (*kind, nullable))
            .map(|(_, strategy)| strategy.clone())
            .unwrap_or_else(|| FieldStrategy::Unsupported(declared.to_string())),
        TypeRef::List(kind) if nullable => FieldStrategy::DefaultedList(*kind),
        TypeRef::List(kind) => FieldStrategy::StrictList(*kind),
        TypeRef::Map if nullable => FieldStrategy::DefaultedMap,
        TypeRef::Map => FieldStrategy::StrictMap,
        TypeRef::Unsupported(raw) => FieldStrategy::Unsupported(raw.clone()),
    }
}

/// A field paired with the strategy its declared type resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedField {
    pub field: Field,
    pub strategy: FieldStrategy,
}

/// Classify every field, keeping schema order.
pub fn classify_fields(schema: &Schema) -> Vec<ClassifiedField> {
    schema
        .fields
        .iter()
        .map(|field| ClassifiedField {
            strategy: classify(&field.declared_type, field.nullable),
            field: field.clone(),
        })
        .collect()
}

impl FieldStrategy {
    /// Expected runtime shape; `None` for `Unsupported`.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            FieldStrategy::StrictScalar(kind) | FieldStrategy::DefaultedScalar(kind, _) => Some(Shape::Scalar(*kind)),
            FieldStrategy::StrictList(kind) | FieldStrategy::DefaultedList(kind) => Some(Shape::List(*kind)),
            FieldStrategy::StrictMap | FieldStrategy::DefaultedMap => Some(Shape::Map),
            FieldStrategy::Unsupported(_) => None,
        }
    }

    /// Zero value for defaulted strategies; `None` means a read anomaly is fatal.
    pub fn zero(&self) -> Option<ZeroValue> {
        match self {
            FieldStrategy::DefaultedScalar(_, zero) => Some(*zero),
            FieldStrategy::DefaultedList(_) => Some(ZeroValue::EmptyList),
            FieldStrategy::DefaultedMap => Some(ZeroValue::EmptyMap),
            _ => None,
        }
    }
}

impl ZeroValue {
    pub fn to_value(self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            ZeroValue::EmptyString => json!(""),
            ZeroValue::ZeroFloat => json!(0.0),
            ZeroValue::ZeroInt => json!(0),
            ZeroValue::False => json!(false),
            ZeroValue::EmptyList => json!([]),
            ZeroValue::EmptyMap => Value::Object(Default::default()),
        }
    }
}
