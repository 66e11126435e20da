//! Expression synthesizer: per-field read/write expression trees.
//!
//! Trees are target-neutral. `emit` renders them to source text; `eval` here
//! interprets them against a live document with the same semantics the
//! generated code has, which is what `DynamicMapper` is built on.
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::classify::{ClassifiedField, FieldStrategy, ZeroValue};
use crate::error::{SchemaAcceptanceError, UnsupportedFieldError};
use crate::runtime::{Document, DocumentShapeError, Shape};
use crate::schema::Field;

// ------------------------------- Types ----------------------------------- //

/// document → field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReadExpr {
    /// `doc[key]`; absent or mismatched is a `DocumentShapeError`.
    Strict { key: String, shape: Shape },
    /// `doc[key]`; absent or mismatched yields `zero`.
    OrZero { key: String, shape: Shape, zero: ZeroValue },
    /// Wrap in `Some(..)` for `Option<T>` fields.
    Some(Box<ReadExpr>),
}

/// field value → document entry. Never fails, never defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WriteExpr {
    Entry { key: String, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldPlan {
    Mapped {
        field: Field,
        strategy: FieldStrategy,
        read: ReadExpr,
        write: WriteExpr,
    },
    /// Unsupported type with a constructor default: left out of both routines.
    Omitted { field: Field, reason: String },
}

/// Everything the emitter needs, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapperPlan {
    pub record: String,
    pub fields: Vec<FieldPlan>,
}

/// Record instance at the value level: field name → value, in schema order.
pub type RecordValues = IndexMap<String, Value>;

// --------------------------- Synthesis ----------------------------------- //

pub fn synthesize(record: &str, classified: &[ClassifiedField]) -> Result<MapperPlan, SchemaAcceptanceError> {
    let mut fields = Vec::with_capacity(classified.len());
    for ClassifiedField { field, strategy } in classified {
        if let FieldStrategy::Unsupported(reason) = strategy {
            if !field.has_default {
                return Err(SchemaAcceptanceError::UnconstructibleField {
                    record: record.to_string(),
                    field: field.name.clone(),
                    ty: reason.clone(),
                });
            }
            fields.push(FieldPlan::Omitted { field: field.clone(), reason: reason.clone() });
            continue;
        }
        let Some(shape) = strategy.shape() else { continue };
        let key = field.name.clone();
        let mut read = match strategy.zero() {
            None => ReadExpr::Strict { key: key.clone(), shape },
            Some(zero) => ReadExpr::OrZero { key: key.clone(), shape, zero },
        };
        if field.option_wrapped {
            read = ReadExpr::Some(Box::new(read));
        }
        fields.push(FieldPlan::Mapped {
            field: field.clone(),
            strategy: strategy.clone(),
            read,
            write: WriteExpr::Entry { key, field: field.name.clone() },
        });
    }
    Ok(MapperPlan { record: record.to_string(), fields })
}

// ------------------------------ Evaluation ------------------------------- //

impl ReadExpr {
    pub fn eval(&self, doc: &Document) -> Result<Value, DocumentShapeError> {
        match self {
            ReadExpr::Strict { key, shape } => {
                let found = doc.get(key);
                found.and_then(|value| shape.coerce(value)).ok_or_else(|| DocumentShapeError {
                    field: key.clone(),
                    expected: *shape,
                    actual: found.cloned(),
                })
            }
            ReadExpr::OrZero { key, shape, zero } => Ok(doc
                .get(key)
                .and_then(|value| shape.coerce(value))
                .unwrap_or_else(|| zero.to_value())),
            ReadExpr::Some(inner) => inner.eval(doc),
        }
    }
}

impl WriteExpr {
    pub fn eval(&self, record: &RecordValues, doc: &mut Document) {
        match self {
            WriteExpr::Entry { key, field } => {
                let value = record.get(field).cloned().unwrap_or(Value::Null);
                doc.insert(key.clone(), value);
            }
        }
    }
}

impl MapperPlan {
    /// Fields left out of the generated routines, one per warning.
    pub fn skipped(&self) -> Vec<UnsupportedFieldError> {
        self.fields
            .iter()
            .filter_map(|plan| match plan {
                FieldPlan::Omitted { field, reason } => Some(UnsupportedFieldError {
                    record: self.record.clone(),
                    field: field.name.clone(),
                    ty: reason.clone(),
                }),
                FieldPlan::Mapped { .. } => None,
            })
            .collect()
    }

    pub fn mapped(&self) -> impl Iterator<Item = (&Field, &ReadExpr, &WriteExpr)> {
        self.fields.iter().filter_map(|plan| match plan {
            FieldPlan::Mapped { field, read, write, .. } => Some((field, read, write)),
            FieldPlan::Omitted { .. } => None,
        })
    }
}

/// Interprets a `MapperPlan` directly: the generated mapper without compiling it.
#[derive(Debug, Clone)]
pub struct DynamicMapper {
    plan: MapperPlan,
}

impl DynamicMapper {
    pub fn new(plan: MapperPlan) -> Self {
        DynamicMapper { plan }
    }

    pub fn plan(&self) -> &MapperPlan {
        &self.plan
    }

    /// Fails on the first strict field that is missing or mistyped; no partial record.
    pub fn read(&self, doc: &Document) -> Result<RecordValues, DocumentShapeError> {
        let mut record = RecordValues::new();
        for (field, read, _) in self.plan.mapped() {
            record.insert(field.name.clone(), read.eval(doc)?);
        }
        Ok(record)
    }

    pub fn write(&self, record: &RecordValues) -> Document {
        let mut doc = Document::new();
        for (_, _, write) in self.plan.mapped() {
            write.eval(record, &mut doc);
        }
        doc
    }
}
