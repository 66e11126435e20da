//! Support code linked into generated mappers.
//!
//! Generated `from_<record>` functions call `read_strict` for strict fields and
//! `read_or` for defaulted ones; `to_<record>_document` calls `to_value`. The
//! shape rules here are shared with the interpreted mapper in `synth`, so the
//! two can never disagree about what "runtime-assignable" means.
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::ScalarKind;

/// The untyped, string-keyed document a document store hands back.
pub type Document = Map<String, Value>;

/// The runtime shape a field expects to find under its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Shape {
    Scalar(ScalarKind),
    List(ScalarKind),
    Map,
}

/// A strict field was absent from a document or held the wrong kind of value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("field `{field}`: expected {expected}, found {}", describe(.actual.as_ref()))]
pub struct DocumentShapeError {
    pub field: String,
    pub expected: Shape,
    /// `None` when the key was missing.
    pub actual: Option<Value>,
}

fn describe(actual: Option<&Value>) -> String {
    match actual {
        None => "nothing (key missing)".to_string(),
        Some(value) => value.to_string(),
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Scalar(kind) => write!(f, "{kind:?}"),
            Shape::List(kind) => write!(f, "List<{kind:?}>"),
            Shape::Map => f.write_str("Map<String, Any>"),
        }
    }
}

impl ScalarKind {
    /// `null` never matches; `Float` takes any number, `Int` only those that fit `i64`.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ScalarKind::String => value.is_string(),
            ScalarKind::Float => value.as_f64().is_some(),
            ScalarKind::Int => value.as_i64().is_some(),
            ScalarKind::Boolean => value.is_boolean(),
        }
    }
}

impl Shape {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Scalar(kind) => kind.matches(value),
            Shape::List(kind) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| kind.matches(item))),
            Shape::Map => value.is_object(),
        }
    }

    /// The value as the typed helpers would hand it back: numbers read as
    /// `Float` come out as `f64`.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match self {
            Shape::Scalar(ScalarKind::Float) => value.as_f64().map(Value::from),
            Shape::List(ScalarKind::Float) => value
                .as_array()?
                .iter()
                .map(|item| item.as_f64().map(Value::from))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            _ if self.matches(value) => Some(value.clone()),
            _ => None,
        }
    }
}

// ------------------------------ Conversions ------------------------------ //

pub trait ScalarValue: Sized {
    const KIND: ScalarKind;
    fn from_scalar(value: &Value) -> Option<Self>;
}

pub trait FromDocumentValue: Sized {
    fn shape() -> Shape;
    fn from_value(value: &Value) -> Option<Self>;
}

/// Writes are a direct projection, with one exception JSON forces: a
/// non-finite `f64` (`NaN`, `±inf`) is written as `null`, so it reads back as
/// the zero value or fails a strict read.
pub trait IntoDocumentValue {
    fn to_document_value(&self) -> Value;
}

macro_rules! scalar_value {
    ($ty:ty, $kind:expr, |$v:ident| $extract:expr) => {
        impl ScalarValue for $ty {
            const KIND: ScalarKind = $kind;
            fn from_scalar($v: &Value) -> Option<Self> {
                $extract
            }
        }

        impl FromDocumentValue for $ty {
            fn shape() -> Shape {
                Shape::Scalar($kind)
            }
            fn from_value(value: &Value) -> Option<Self> {
                <$ty as ScalarValue>::from_scalar(value)
            }
        }

        impl IntoDocumentValue for $ty {
            fn to_document_value(&self) -> Value {
                Value::from(self.clone())
            }
        }
    };
}

scalar_value!(String, ScalarKind::String, |v| v.as_str().map(str::to_owned));
scalar_value!(f64, ScalarKind::Float, |v| v.as_f64());
scalar_value!(i64, ScalarKind::Int, |v| v.as_i64());
scalar_value!(bool, ScalarKind::Boolean, |v| v.as_bool());

impl<T: ScalarValue> FromDocumentValue for Vec<T> {
    fn shape() -> Shape {
        Shape::List(T::KIND)
    }
    fn from_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_scalar).collect()
    }
}

impl FromDocumentValue for Document {
    fn shape() -> Shape {
        Shape::Map
    }
    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

impl<T: IntoDocumentValue> IntoDocumentValue for Vec<T> {
    fn to_document_value(&self) -> Value {
        Value::Array(self.iter().map(IntoDocumentValue::to_document_value).collect())
    }
}

impl IntoDocumentValue for Document {
    fn to_document_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: IntoDocumentValue> IntoDocumentValue for Option<T> {
    fn to_document_value(&self) -> Value {
        match self {
            Some(value) => value.to_document_value(),
            None => Value::Null,
        }
    }
}

// -------------------------------- Helpers -------------------------------- //

/// Strict read: a missing key or a value of the wrong shape is an error.
pub fn read_strict<T: FromDocumentValue>(doc: &Document, key: &str) -> Result<T, DocumentShapeError> {
    let found = doc.get(key);
    found.and_then(T::from_value).ok_or_else(|| DocumentShapeError {
        field: key.to_owned(),
        expected: T::shape(),
        actual: found.cloned(),
    })
}

/// Defaulted read: a missing key or a value of the wrong shape yields `zero`.
pub fn read_or<T: FromDocumentValue>(doc: &Document, key: &str, zero: T) -> T {
    doc.get(key).and_then(T::from_value).unwrap_or(zero)
}

pub fn to_value<T: IntoDocumentValue>(value: &T) -> Value {
    value.to_document_value()
}
