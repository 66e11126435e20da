//! Record schema model: the ordered, typed field list every later stage consumes.
//!
//! A `Schema` is built once per record definition (by `extract`) and never
//! mutated afterwards. Field order is the declaration order and drives the
//! order of constructor arguments and document entries downstream.
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaAcceptanceError;

// ------------------------------- Types ----------------------------------- //

/// The four scalar shapes a document value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Float,
    Int,
    Boolean,
}

/// Declared type of a field, resolved structurally during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Scalar(ScalarKind),
    List(ScalarKind),
    /// `Map<String, Any>`, i.e. a nested untyped document.
    Map,
    /// Anything else; carries the type as written for diagnostics.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: TypeRef,
    /// Absence or mismatch degrades to a zero value instead of failing.
    #[serde(default)]
    pub nullable: bool,
    /// Declared as `Option<T>`; reads are wrapped in `Some(..)`.
    #[serde(default)]
    pub option_wrapped: bool,
    /// The record can be built without a value for this field.
    #[serde(default)]
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub record: String,
    pub fields: Vec<Field>,
}

// --------------------------- Implementation ------------------------------ //

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

impl ScalarKind {
    /// Rust spelling of the kind in generated code.
    pub fn rust_type(self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Float => "f64",
            ScalarKind::Int => "i64",
            ScalarKind::Boolean => "bool",
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Scalar(kind) => write!(f, "{kind:?}"),
            TypeRef::List(kind) => write!(f, "List<{kind:?}>"),
            TypeRef::Map => f.write_str("Map<String, Any>"),
            TypeRef::Unsupported(raw) => f.write_str(raw),
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Field {
            name: name.into(),
            declared_type,
            nullable: false,
            option_wrapped: false,
            has_default: false,
        }
    }

    /// Nullable at use: `Option<T>`. Implies a constructor default (`None`).
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self.option_wrapped = true;
        self.has_default = true;
        self
    }

    /// Nullable at declaration: `#[serde(default)]` on a plain `T`.
    pub fn defaulted(mut self) -> Self {
        self.nullable = true;
        self.has_default = true;
        self
    }
}

impl Schema {
    pub fn new(record: impl Into<String>, fields: Vec<Field>) -> Self {
        Schema { record: record.into(), fields }
    }

    /// Acceptance checks that do not depend on where the schema came from.
    pub fn validate(&self) -> Result<(), SchemaAcceptanceError> {
        if !is_identifier(&self.record) || is_keyword(&self.record) {
            return Err(SchemaAcceptanceError::InvalidIdentifier {
                record: self.record.clone(),
                name: self.record.clone(),
            });
        }
        let mut seen = IndexSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !is_identifier(&field.name) || NOT_RAW.contains(&field.name.as_str()) {
                return Err(SchemaAcceptanceError::InvalidIdentifier {
                    record: self.record.clone(),
                    name: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaAcceptanceError::DuplicateField {
                    record: self.record.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Keywords that cannot be written as raw identifiers either.
const NOT_RAW: [&str; 5] = ["_", "self", "Self", "super", "crate"];

pub fn is_identifier(name: &str) -> bool {
    IDENT.is_match(name)
}

/// Reserved in generated code; `syn` does not list the 2024 `gen` keyword.
pub fn is_keyword(name: &str) -> bool {
    name == "gen" || syn::parse_str::<syn::Ident>(name).is_err()
}

/// `UserProfile` → `user_profile`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || acronym_end {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
